//! Stable caller hashing for canary buckets.
//!
//! FNV-1a is used instead of `std::hash` because the standard hasher is
//! randomly seeded per process; bucket assignment must survive restarts.

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Number of canary buckets (one per percentage point).
pub const BUCKETS: u32 = 100;

/// 32-bit FNV-1a hash of a caller identifier.
pub fn stable_hash(caller_id: &str) -> u32 {
    caller_id.as_bytes().iter().fold(FNV_OFFSET_BASIS, |state, byte| {
        (state ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Canary bucket in `0..BUCKETS` for a caller hash from [`stable_hash`].
pub fn bucket(hash_value: u32) -> u32 {
    hash_value % BUCKETS
}
