//! FNV-1a 64-bit hashing.
//!
//! The non-cryptographic alternate hash exposed to scripts as `"fnv1a64"`.
//! Standard published constants, byte-wise accumulation over UTF-8 input.

/// FNV-1a 64-bit offset basis.
pub const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
/// FNV-1a 64-bit prime.
pub const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hash a byte string with FNV-1a 64.
///
/// Deterministic and pure; the same input always yields the same value in
/// any session, on any platform.
///
/// # Examples
///
/// ```
/// use depot_identity::fnv1a64;
///
/// assert_eq!(fnv1a64(b""), 0xcbf29ce484222325);
/// assert_eq!(fnv1a64(b"a"), 0xaf63dc4c8601ec8c);
/// ```
pub fn fnv1a64(data: &[u8]) -> u64 {
    data.iter()
        .fold(FNV_OFFSET_BASIS, |hash, byte| (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME))
}
