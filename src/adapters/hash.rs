//! FNV-1a Hash Strategies
//!
//! Non-cryptographic key hashes for shard routing. [`Fnv1a32`] is the
//! sharded cache's default.

use crate::domain::ports::HashStrategy;

const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

const FNV64_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV64_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 32-bit FNV-1a
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fnv1a32;

impl Fnv1a32 {
    /// Hash raw bytes
    #[inline]
    pub fn hash_bytes(bytes: &[u8]) -> u32 {
        bytes.iter().fold(FNV32_OFFSET_BASIS, |hash, &b| {
            (hash ^ u32::from(b)).wrapping_mul(FNV32_PRIME)
        })
    }
}

impl HashStrategy for Fnv1a32 {
    fn hash(&self, key: &str) -> u64 {
        u64::from(Self::hash_bytes(key.as_bytes()))
    }
}

/// 64-bit FNV-1a
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fnv1a64;

impl Fnv1a64 {
    /// Hash raw bytes
    #[inline]
    pub fn hash_bytes(bytes: &[u8]) -> u64 {
        bytes.iter().fold(FNV64_OFFSET_BASIS, |hash, &b| {
            (hash ^ u64::from(b)).wrapping_mul(FNV64_PRIME)
        })
    }
}

impl HashStrategy for Fnv1a64 {
    fn hash(&self, key: &str) -> u64 {
        Self::hash_bytes(key.as_bytes())
    }
}
