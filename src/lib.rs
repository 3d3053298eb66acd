//! tunedmem: CPU- and cache-tuned replacements for the C memory and string
//! primitives.
//!
//! On first use the crate reads the CPU's vendor, vector extensions and cache
//! geometry, derives size thresholds from the cache sizes, and binds each
//! routine to the widest kernel the CPU supports. The crate-root functions
//! below take the C argument types and forward through that binding; [`mem`],
//! [`str`] and [`search`] wrap them for slices.
//!
//! ```
//! let src = *b"hello";
//! let mut dst = [0u8; 5];
//! unsafe { tunedmem::memcpy(dst.as_mut_ptr(), src.as_ptr(), 5) };
//! assert_eq!(&dst, b"hello");
//! ```
//!
//! With the `c-abi` feature the same routines are also exported under their C
//! symbol names.
#![allow(unsafe_op_in_unsafe_fn)]
#![cfg_attr(feature = "c-abi", no_builtins)]

pub mod config;
pub mod cpu_features;
pub mod dispatch;
pub mod mem;
pub mod memchr;
pub mod memcmp;
pub mod memcpy;
pub mod memmove;
pub mod memset;
pub mod search;
pub mod simd;
pub mod str;
pub mod strcmp;
pub mod strcpy;
pub mod strlen;
pub mod strstr;
pub mod threshold;
pub mod variants;

#[cfg(feature = "c-abi")]
pub mod capi;

#[cfg(test)]
mod test_support;

pub use config::ConfigError;
pub use dispatch::{Operation, Runtime, Variant};

use dispatch::table;

// ============================================================================
// Memory routines
// ============================================================================

/// Copies `n` bytes from `src` to `dst` and returns `dst`.
///
/// # Safety
///
/// - `src` must be readable and `dst` writable for `n` bytes
/// - The regions must not overlap
#[inline]
pub unsafe fn memcpy(dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
    (table().memcpy)(dst, src, n)
}

/// Like [`memcpy`] but returns `dst + n`.
///
/// # Safety
///
/// Same as [`memcpy`].
#[inline]
pub unsafe fn mempcpy(dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
    (table().mempcpy)(dst, src, n)
}

/// Copies `n` bytes between possibly overlapping regions and returns `dst`.
///
/// # Safety
///
/// `src` must be readable and `dst` writable for `n` bytes.
#[inline]
pub unsafe fn memmove(dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
    (table().memmove)(dst, src, n)
}

/// Sets `n` bytes at `dst` to `(unsigned char)c` and returns `dst`.
///
/// # Safety
///
/// `dst` must be writable for `n` bytes.
#[inline]
pub unsafe fn memset(dst: *mut u8, c: i32, n: usize) -> *mut u8 {
    (table().memset)(dst, c as u8, n)
}

/// Compares `n` bytes as unsigned chars.
///
/// # Safety
///
/// `a` and `b` must be readable for `n` bytes.
#[inline]
pub unsafe fn memcmp(a: *const u8, b: *const u8, n: usize) -> i32 {
    (table().memcmp)(a, b, n)
}

/// First occurrence of `(unsigned char)c` in the first `n` bytes of `s`, or
/// null.
///
/// # Safety
///
/// `s` must be readable for `n` bytes.
#[inline]
pub unsafe fn memchr(s: *const u8, c: i32, n: usize) -> *mut u8 {
    (table().memchr)(s, c as u8, n)
}

// ============================================================================
// String routines
// ============================================================================

/// # Safety
///
/// - `src` must point to a NUL-terminated string
/// - `dst` must be writable for `strlen(src) + 1` bytes and not overlap `src`
#[inline]
pub unsafe fn strcpy(dst: *mut u8, src: *const u8) -> *mut u8 {
    (table().strcpy)(dst, src)
}

/// Copies at most `n` bytes of `src`, zero-padding `dst` up to `n`. No
/// terminator is written when `strlen(src) >= n`.
///
/// # Safety
///
/// - `src` must be readable up to its terminator or `n` bytes
/// - `dst` must be writable for `n` bytes and not overlap `src`
#[inline]
pub unsafe fn strncpy(dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
    (table().strncpy)(dst, src, n)
}

/// # Safety
///
/// - `dst` and `src` must point to NUL-terminated strings
/// - `dst` must be writable for `strlen(dst) + strlen(src) + 1` bytes
#[inline]
pub unsafe fn strcat(dst: *mut u8, src: *const u8) -> *mut u8 {
    (table().strcat)(dst, src)
}

/// Appends at most `n` bytes of `src` to `dst`, then a terminator.
///
/// # Safety
///
/// - `dst` must point to a NUL-terminated string
/// - `src` must be readable up to its terminator or `n` bytes
/// - `dst` must be writable for `strlen(dst) + min(strlen(src), n) + 1` bytes
#[inline]
pub unsafe fn strncat(dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
    (table().strncat)(dst, src, n)
}

/// # Safety
///
/// `a` and `b` must point to NUL-terminated strings.
#[inline]
pub unsafe fn strcmp(a: *const u8, b: *const u8) -> i32 {
    (table().strcmp)(a, b)
}

/// # Safety
///
/// `a` and `b` must be readable up to their terminator or `n` bytes.
#[inline]
pub unsafe fn strncmp(a: *const u8, b: *const u8, n: usize) -> i32 {
    (table().strncmp)(a, b, n)
}

/// First occurrence of `needle` in `haystack`, or null. An empty needle
/// matches at `haystack`.
///
/// # Safety
///
/// `haystack` and `needle` must point to NUL-terminated strings.
#[inline]
pub unsafe fn strstr(haystack: *const u8, needle: *const u8) -> *mut u8 {
    (table().strstr)(haystack, needle)
}

/// # Safety
///
/// `s` must point to a NUL-terminated string.
#[inline]
pub unsafe fn strlen(s: *const u8) -> usize {
    (table().strlen)(s)
}

/// First occurrence of `(char)c` in `s`, or null. Searching for 0 returns the
/// terminator.
///
/// # Safety
///
/// `s` must point to a NUL-terminated string.
#[inline]
pub unsafe fn strchr(s: *const u8, c: i32) -> *mut u8 {
    (table().strchr)(s, c as u8)
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_entry_points_examples() {
        unsafe {
            let mut dst = [0u8; 5];
            let ret = super::memcpy(dst.as_mut_ptr(), b"hello".as_ptr(), 5);
            assert_eq!(ret, dst.as_mut_ptr());
            assert_eq!(&dst, b"hello");

            let end = super::mempcpy(dst.as_mut_ptr(), b"world".as_ptr(), 5);
            assert_eq!(end as usize, dst.as_ptr() as usize + 5);

            let mut buf: Vec<u8> = (0..15).collect();
            super::memmove(buf.as_mut_ptr().add(5), buf.as_ptr(), 10);
            assert_eq!(&buf[5..], &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);

            // Only the low byte of the fill value counts.
            super::memset(buf.as_mut_ptr(), 0x141, 3);
            assert_eq!(&buf[..3], &[0x41; 3]);

            let h = b"ababc\0";
            let found = super::strstr(h.as_ptr(), b"abc\0".as_ptr());
            assert_eq!(found as usize - h.as_ptr() as usize, 2);

            assert!(super::strcmp(b"abc\0".as_ptr(), b"abd\0".as_ptr()) < 0);
            assert_eq!(super::strlen(b"hello\0".as_ptr()), 5);
            assert_eq!(super::strchr(h.as_ptr(), b'c' as i32 + 256) as usize - h.as_ptr() as usize, 4);
            assert!(super::memchr(h.as_ptr(), b'z' as i32, 5).is_null());

            let mut d = [0xFFu8; 5];
            super::strncpy(d.as_mut_ptr(), b"ab\0".as_ptr(), 5);
            assert_eq!(d, [b'a', b'b', 0, 0, 0]);
        }
    }
}
