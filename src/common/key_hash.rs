//! Key hashing.
//!
//! Node records store a fixed-width [`KeyHash`] instead of the user key.
//! Ordering and duplicate detection inside the tree compare hashes only, so
//! the index is *hash-ordered*:
//!
//! - Integer keys hash to themselves. An integer index is key-ordered and
//!   collision-free.
//! - Byte-string keys hash with XXH64 (seed 0). Two distinct strings with the
//!   same hash are the same entry: the second insert is rejected as a
//!   duplicate. Collisions are not resolved.
//!
//! XXH64 is used instead of `std::hash` because hashes are persisted and must
//! not change between processes, platforms or compiler versions.

use std::fmt;

use xxhash_rust::xxh64::xxh64;

const XXH64_SEED: u64 = 0;

/// The hash of an index key, as stored in node records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct KeyHash(pub i64);

impl KeyHash {
    /// Hash an arbitrary byte string.
    #[inline]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        KeyHash(xxh64(bytes, XXH64_SEED) as i64)
    }

    #[inline]
    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_le_bytes(bytes: [u8; 8]) -> Self {
        KeyHash(i64::from_le_bytes(bytes))
    }
}

impl fmt::Display for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A key type that can address entries in the index.
///
/// # Example
/// ```
/// use pagetree::{IndexKey, KeyHash};
///
/// assert_eq!(7i32.key_hash(), KeyHash(7));
/// assert_eq!("apple".key_hash(), String::from("apple").key_hash());
/// ```
pub trait IndexKey {
    /// Map the key to the hash stored in the tree.
    fn key_hash(&self) -> KeyHash;
}

macro_rules! impl_index_key_lossless {
    ($($t:ty),*) => {
        $(
            impl IndexKey for $t {
                #[inline]
                fn key_hash(&self) -> KeyHash {
                    KeyHash(i64::from(*self))
                }
            }
        )*
    };
}

impl_index_key_lossless!(i8, i16, i32, i64, u8, u16, u32);

/// `u64` keys are bit-cast: distinct keys stay distinct, but keys above
/// `i64::MAX` sort before zero.
impl IndexKey for u64 {
    #[inline]
    fn key_hash(&self) -> KeyHash {
        KeyHash(*self as i64)
    }
}

impl IndexKey for usize {
    #[inline]
    fn key_hash(&self) -> KeyHash {
        KeyHash(*self as u64 as i64)
    }
}

impl IndexKey for [u8] {
    #[inline]
    fn key_hash(&self) -> KeyHash {
        KeyHash::of_bytes(self)
    }
}

impl IndexKey for Vec<u8> {
    #[inline]
    fn key_hash(&self) -> KeyHash {
        KeyHash::of_bytes(self)
    }
}

impl IndexKey for str {
    #[inline]
    fn key_hash(&self) -> KeyHash {
        KeyHash::of_bytes(self.as_bytes())
    }
}

impl IndexKey for String {
    #[inline]
    fn key_hash(&self) -> KeyHash {
        KeyHash::of_bytes(self.as_bytes())
    }
}

impl<T: IndexKey + ?Sized> IndexKey for &T {
    #[inline]
    fn key_hash(&self) -> KeyHash {
        (**self).key_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_keys_hash_to_themselves() {
        assert_eq!(0i64.key_hash(), KeyHash(0));
        assert_eq!((-5i32).key_hash(), KeyHash(-5));
        assert_eq!(u32::MAX.key_hash(), KeyHash(u32::MAX as i64));
        assert!(1i32.key_hash() < 2i32.key_hash());
    }

    #[test]
    fn test_u64_bit_cast() {
        assert_eq!(u64::MAX.key_hash(), KeyHash(-1));
        assert_ne!(u64::MAX.key_hash(), (u64::MAX - 1).key_hash());
    }

    #[test]
    fn test_string_forms_agree() {
        let owned = String::from("hello");
        assert_eq!(owned.key_hash(), "hello".key_hash());
        assert_eq!(owned.key_hash(), b"hello"[..].key_hash());
        assert_eq!(owned.key_hash(), b"hello".to_vec().key_hash());
    }

    #[test]
    fn test_string_hash_is_stable() {
        // XXH64 of the empty input with seed 0.
        assert_eq!("".key_hash(), KeyHash(0xEF46_DB37_51D8_E999_u64 as i64));
        assert_ne!("a".key_hash(), "b".key_hash());
    }

    #[test]
    fn test_key_hash_bytes() {
        let hash = KeyHash(-123_456_789);
        assert_eq!(KeyHash::from_le_bytes(hash.to_le_bytes()), hash);
    }
}
