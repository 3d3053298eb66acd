//! String functions
//!
//! Safe wrappers over the dispatched string kernels. Terminated inputs are
//! `&CStr`; destinations are byte slices whose capacity is checked before the
//! kernel runs. Bounded routines take plain byte slices and never read past
//! them: the end of the slice counts as a terminator.

use core::ffi::CStr;

use crate::mem::memchr;

fn ptr(s: &CStr) -> *const u8 {
    s.as_ptr().cast()
}

/// Length of a C string
///
/// # Examples
/// ```
/// use tunedmem::str::strlen;
/// assert_eq!(strlen(c"hello"), 5);
/// assert_eq!(strlen(c""), 0);
/// ```
pub fn strlen(s: &CStr) -> usize {
    // SAFETY: `CStr` is terminated.
    unsafe { crate::strlen(ptr(s)) }
}

/// Copy a C string, terminator included, into `dest`
///
/// Returns the string length.
///
/// # Panics
///
/// If `dest` cannot hold the string and its terminator.
///
/// # Examples
/// ```
/// use tunedmem::str::strcpy;
/// let mut buf = [0xFFu8; 8];
/// assert_eq!(strcpy(&mut buf, c"hello"), 5);
/// assert_eq!(&buf[..6], b"hello\0");
/// ```
pub fn strcpy(dest: &mut [u8], src: &CStr) -> usize {
    let len = strlen(src);
    assert!(dest.len() > len, "strcpy: destination holds {} bytes, need {}", dest.len(), len + 1);
    // SAFETY: capacity checked; `dest` and `src` are distinct borrows.
    unsafe { crate::strcpy(dest.as_mut_ptr(), ptr(src)) };
    len
}

/// Copy at most `n` bytes of `src` and zero-fill `dest[..n]` past them
///
/// Copying stops at the first NUL in `src` or at its end. No terminator is
/// written when that point is at or beyond `n`. Returns the number of string
/// bytes copied.
///
/// # Panics
///
/// If `dest` is shorter than `n`.
///
/// # Examples
/// ```
/// use tunedmem::str::strncpy;
/// let mut buf = [0xFFu8; 6];
/// assert_eq!(strncpy(&mut buf, b"ab\0", 5), 2);
/// assert_eq!(buf, [b'a', b'b', 0, 0, 0, 0xFF]);
/// ```
pub fn strncpy(dest: &mut [u8], src: &[u8], n: usize) -> usize {
    assert!(dest.len() >= n, "strncpy: destination holds {} bytes, need {}", dest.len(), n);
    let k = n.min(src.len());
    // SAFETY: `src` is readable for `k` bytes and `dest` writable for `n`.
    unsafe {
        crate::strncpy(dest.as_mut_ptr(), src.as_ptr(), k);
        if k < n {
            crate::memset(dest.as_mut_ptr().add(k), 0, n - k);
        }
    }
    memchr(&src[..k], 0).unwrap_or(k)
}

/// Append a C string to the C string held in `dest`
///
/// Returns the new length.
///
/// # Panics
///
/// If `dest` holds no terminator or cannot fit the result.
///
/// # Examples
/// ```
/// use tunedmem::str::strcat;
/// let mut buf = [0u8; 16];
/// buf[..4].copy_from_slice(b"foo\0");
/// assert_eq!(strcat(&mut buf, c"bar"), 6);
/// assert_eq!(&buf[..7], b"foobar\0");
/// ```
pub fn strcat(dest: &mut [u8], src: &CStr) -> usize {
    let Some(len) = memchr(dest, 0) else {
        panic!("strcat: destination is not terminated");
    };
    let add = strlen(src);
    assert!(dest.len() > len + add, "strcat: destination holds {} bytes, need {}", dest.len(), len + add + 1);
    // SAFETY: `dest` is terminated and large enough.
    unsafe { crate::strcat(dest.as_mut_ptr(), ptr(src)) };
    len + add
}

/// Append at most `n` bytes of `src` to the C string in `dest`, then a
/// terminator
///
/// Returns the new length.
///
/// # Panics
///
/// If `dest` holds no terminator or cannot fit the result.
///
/// # Examples
/// ```
/// use tunedmem::str::strncat;
/// let mut buf = [0u8; 16];
/// buf[..4].copy_from_slice(b"foo\0");
/// assert_eq!(strncat(&mut buf, b"barbaz", 3), 6);
/// assert_eq!(&buf[..7], b"foobar\0");
/// ```
pub fn strncat(dest: &mut [u8], src: &[u8], n: usize) -> usize {
    let Some(len) = memchr(dest, 0) else {
        panic!("strncat: destination is not terminated");
    };
    let k = n.min(src.len());
    let add = memchr(&src[..k], 0).unwrap_or(k);
    assert!(dest.len() > len + add, "strncat: destination holds {} bytes, need {}", dest.len(), len + add + 1);
    // SAFETY: `src` is readable for `k` bytes; `dest` is terminated and large enough.
    unsafe { crate::strncat(dest.as_mut_ptr(), src.as_ptr(), k) };
    len + add
}

/// Compare two C strings
///
/// # Examples
/// ```
/// use tunedmem::str::strcmp;
/// assert!(strcmp(c"abc", c"abd") < 0);
/// assert_eq!(strcmp(c"abc", c"abc"), 0);
/// ```
pub fn strcmp(s1: &CStr, s2: &CStr) -> i32 {
    // SAFETY: both are terminated.
    unsafe { crate::strcmp(ptr(s1), ptr(s2)) }
}

/// Compare at most `n` bytes of two strings
///
/// A NUL or the end of a slice terminates its string.
///
/// # Examples
/// ```
/// use tunedmem::str::strncmp;
/// assert_eq!(strncmp(b"hello", b"help", 3), 0);
/// assert!(strncmp(b"hello", b"help", 4) < 0);
/// assert!(strncmp(b"ab", b"abc", 5) < 0);
/// ```
pub fn strncmp(s1: &[u8], s2: &[u8], n: usize) -> i32 {
    let m = n.min(s1.len()).min(s2.len());
    // SAFETY: both slices are readable for `m` bytes.
    let cmp = unsafe { crate::strncmp(s1.as_ptr(), s2.as_ptr(), m) };
    if cmp != 0 || m == n || memchr(&s1[..m], 0).is_some() {
        return cmp;
    }
    // Equal up to the end of the shorter slice.
    let a = s1.get(m).copied().unwrap_or(0);
    let b = s2.get(m).copied().unwrap_or(0);
    a as i32 - b as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn cstring(len: usize) -> CString {
        CString::new((0..len).map(|i| b'a' + (i % 26) as u8).collect::<Vec<u8>>()).unwrap()
    }

    #[test]
    fn test_strlen_and_strcpy() {
        for len in 0..300 {
            let s = cstring(len);
            assert_eq!(strlen(&s), len, "Failed at len {len}");
            let mut buf = vec![0xCCu8; len + 3];
            assert_eq!(strcpy(&mut buf, &s), len);
            assert_eq!(&buf[..=len], s.as_bytes_with_nul());
            assert_eq!(buf[len + 1], 0xCC);
        }
    }

    #[test]
    #[should_panic(expected = "strcpy")]
    fn test_strcpy_no_room_for_terminator() {
        let mut buf = [0u8; 5];
        strcpy(&mut buf, c"hello");
    }

    #[test]
    fn test_strncpy_slice_end_is_terminator() {
        let mut buf = [0xFFu8; 8];
        assert_eq!(strncpy(&mut buf, b"abc", 6), 3);
        assert_eq!(buf, [b'a', b'b', b'c', 0, 0, 0, 0xFF, 0xFF]);

        let mut buf = [0xFFu8; 4];
        assert_eq!(strncpy(&mut buf, b"abcdef", 3), 3);
        assert_eq!(buf, [b'a', b'b', b'c', 0xFF]);
    }

    #[test]
    fn test_strcat_strncat() {
        let mut buf = [0u8; 32];
        buf[0] = 0;
        assert_eq!(strcat(&mut buf, c"one"), 3);
        assert_eq!(strcat(&mut buf, c"two"), 6);
        assert_eq!(strncat(&mut buf, b"three", 2), 8);
        assert_eq!(strncat(&mut buf, b"xy\0zz", 5), 10);
        assert_eq!(&buf[..11], b"onetwothxy\0");
    }

    #[test]
    #[should_panic(expected = "strcat")]
    fn test_strcat_overflow_panics() {
        let mut buf = *b"abc\0\0";
        strcat(&mut buf, c"de");
    }

    #[test]
    fn test_strcmp_strncmp() {
        assert!(strcmp(c"abc", c"abd") < 0);
        assert!(strcmp(c"abcd", c"abc") > 0);
        assert_eq!(strcmp(c"", c""), 0);
        assert_eq!(strncmp(b"abc\0x", b"abc\0y", 10), 0);
        assert_eq!(strncmp(b"abc", b"abc", 10), 0);
        assert!(strncmp(b"abcd", b"abc", 10) > 0);
        assert_eq!(strncmp(b"abcd", b"abce", 3), 0);
        assert_eq!(strncmp(b"x", b"y", 0), 0);
    }
}
