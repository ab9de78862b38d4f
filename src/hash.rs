//! Bucket hash functions.
//!
//! Every function reduces a key to an `order`-bit bucket index using a
//! 32-bit FNV variant: each byte is xored into the running hash, which is
//! then multiplied by the FNV prime. The high bits are folded into the low
//! bits before masking because a multiplicative hash mixes its low bits
//! poorly.
//!
//! Three span policies are provided:
//! - [`StrHash`] hashes the whole byte span of the key.
//! - [`ByteHash`] hashes only the first byte.
//! - [`IdentityHash`] hashes the native-width identity word of the key
//!   (integer value or allocation address). This is the table default.
//!
//! Any `Fn(&K, u32) -> usize` closure can be used in their place.

use core::ptr::NonNull;
use std::rc::Rc;
use std::sync::Arc;

/// FNV offset basis.
pub const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
/// FNV 32-bit prime.
pub const FNV_PRIME: u32 = 0x0100_0193;

/// Smallest supported order (8 buckets).
pub const MIN_ORDER: u32 = 3;
/// Largest supported order; the hash only carries 32 bits.
pub const MAX_ORDER: u32 = 31;

/// Hash `bytes` with the 32-bit FNV variant.
#[inline]
pub fn fnv32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |h, &b| {
        (h ^ u32::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Fold `hash` down to `order` bits.
#[inline]
pub fn fold(hash: u32, order: u32) -> usize {
    debug_assert!((MIN_ORDER..=MAX_ORDER).contains(&order));
    let mask = (1u32 << order) - 1;
    (((hash >> order) ^ hash) & mask) as usize
}

/// Bucket index of `bytes` for a table of `2^order` buckets.
#[inline]
pub fn fnv_bucket(bytes: &[u8], order: u32) -> usize {
    fold(fnv32(bytes), order)
}

/// Reduces a key to a bucket index in `0..2^order`.
///
/// Implementations must be deterministic: the table hashes a key once at
/// insertion and again on every lookup, and both must agree.
pub trait BucketHash<K: ?Sized> {
    /// Bucket index for `key` in a table of `2^order` buckets.
    fn bucket(&self, key: &K, order: u32) -> usize;
}

impl<K: ?Sized, F> BucketHash<K> for F
where
    F: Fn(&K, u32) -> usize,
{
    #[inline]
    fn bucket(&self, key: &K, order: u32) -> usize {
        self(key, order)
    }
}

/// Byte view of a key, used by [`StrHash`] and [`ByteHash`].
pub trait KeyBytes {
    /// Call `f` with the key's bytes.
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R;
}

impl KeyBytes for str {
    #[inline]
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self.as_bytes())
    }
}

impl KeyBytes for [u8] {
    #[inline]
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self)
    }
}

impl KeyBytes for String {
    #[inline]
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self.as_bytes())
    }
}

impl KeyBytes for Vec<u8> {
    #[inline]
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self)
    }
}

impl KeyBytes for char {
    #[inline]
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let mut buf = [0u8; 4];
        f(self.encode_utf8(&mut buf).as_bytes())
    }
}

impl<T: ?Sized + KeyBytes> KeyBytes for &T {
    #[inline]
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        (**self).with_key_bytes(f)
    }
}

impl<T: ?Sized + KeyBytes> KeyBytes for Box<T> {
    #[inline]
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        (**self).with_key_bytes(f)
    }
}

impl<T: ?Sized + KeyBytes> KeyBytes for Rc<T> {
    #[inline]
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        (**self).with_key_bytes(f)
    }
}

macro_rules! key_bytes_int {
    ($($t:ty),*) => {$(
        impl KeyBytes for $t {
            #[inline]
            fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
                f(&self.to_ne_bytes())
            }
        }
    )*};
}

key_bytes_int!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

/// Native-width identity of a key, used by [`IdentityHash`].
///
/// Integers map to their value; pointers and shared handles map to the
/// address they refer to.
pub trait KeyIdentity {
    /// The identity word.
    fn identity(&self) -> usize;
}

macro_rules! key_identity_int {
    ($($t:ty),*) => {$(
        impl KeyIdentity for $t {
            #[inline]
            fn identity(&self) -> usize {
                *self as usize
            }
        }
    )*};
}

key_identity_int!(u8, u16, i8, i16, usize, isize);

#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
key_identity_int!(u32, i32);

#[cfg(target_pointer_width = "64")]
key_identity_int!(u64, i64);

impl<T: ?Sized> KeyIdentity for *const T {
    #[inline]
    fn identity(&self) -> usize {
        self.cast::<()>() as usize
    }
}

impl<T: ?Sized> KeyIdentity for *mut T {
    #[inline]
    fn identity(&self) -> usize {
        self.cast::<()>() as usize
    }
}

impl<T: ?Sized> KeyIdentity for NonNull<T> {
    #[inline]
    fn identity(&self) -> usize {
        self.as_ptr().identity()
    }
}

impl<T: ?Sized> KeyIdentity for Rc<T> {
    #[inline]
    fn identity(&self) -> usize {
        Rc::as_ptr(self).identity()
    }
}

impl<T: ?Sized> KeyIdentity for Arc<T> {
    #[inline]
    fn identity(&self) -> usize {
        Arc::as_ptr(self).identity()
    }
}

/// Hashes the full byte span of the key.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StrHash;

impl<K: ?Sized + KeyBytes> BucketHash<K> for StrHash {
    #[inline]
    fn bucket(&self, key: &K, order: u32) -> usize {
        key.with_key_bytes(|b| fnv_bucket(b, order))
    }
}

/// Hashes only the first byte of the key. Empty keys hash the empty span.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ByteHash;

impl<K: ?Sized + KeyBytes> BucketHash<K> for ByteHash {
    #[inline]
    fn bucket(&self, key: &K, order: u32) -> usize {
        key.with_key_bytes(|b| fnv_bucket(&b[..b.len().min(1)], order))
    }
}

/// Hashes the `usize`-wide identity word of the key.
///
/// For handle keys such as `Rc<T>` pair this with
/// [`IdentityOrder`](crate::compare::IdentityOrder), otherwise two equal
/// values behind different allocations land in different buckets.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityHash;

impl<K: ?Sized + KeyIdentity> BucketHash<K> for IdentityHash {
    #[inline]
    fn bucket(&self, key: &K, order: u32) -> usize {
        fnv_bucket(&key.identity().to_ne_bytes(), order)
    }
}
