//! `hash_any`: a Jenkins one-at-a-time byte hash.
//!
//! The composite hash needs a fixed, deterministic, platform-
//! independent per-attribute hash, not a generically-seeded hasher. This is
//! the classic one-at-a-time mix: cheap, well distributed, and stable across
//! runs and machines, which a keyed hasher (`twox-hash`, `ahash`, ...) is
//! deliberately not.

/// Hashes an arbitrary byte string to a 32-bit word.
pub fn hash_any(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0;
    for &b in bytes {
        hash = hash.wrapping_add(b as u32);
        hash = hash.wrapping_add(hash << 10);
        hash ^= hash >> 6;
    }
    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash = hash.wrapping_add(hash << 15);
    hash
}
