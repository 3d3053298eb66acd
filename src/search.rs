//! String searching functions
//!
//! Safe wrappers over the dispatched strchr and strstr kernels.

use core::ffi::CStr;

fn offset(base: &CStr, p: *mut u8) -> Option<usize> {
    (!p.is_null()).then(|| p as usize - base.as_ptr() as usize)
}

/// Locate a byte in a C string
///
/// Returns the index of the first occurrence of `c`. Searching for `0`
/// finds the terminator.
///
/// # Examples
/// ```
/// use tunedmem::search::strchr;
/// assert_eq!(strchr(c"hello", b'l'), Some(2));
/// assert_eq!(strchr(c"hello", b'w'), None);
/// assert_eq!(strchr(c"hello", b'\0'), Some(5));
/// ```
pub fn strchr(s: &CStr, c: u8) -> Option<usize> {
    // SAFETY: `CStr` is terminated.
    let p = unsafe { crate::strchr(s.as_ptr().cast(), c as i32) };
    offset(s, p)
}

/// Locate a substring
///
/// Returns the index of the first occurrence of `needle` in `haystack`. An
/// empty needle matches at 0.
///
/// # Examples
/// ```
/// use tunedmem::search::strstr;
/// assert_eq!(strstr(c"ababc", c"abc"), Some(2));
/// assert_eq!(strstr(c"hello", c""), Some(0));
/// assert_eq!(strstr(c"", c"a"), None);
/// ```
pub fn strstr(haystack: &CStr, needle: &CStr) -> Option<usize> {
    // SAFETY: both are terminated.
    let p = unsafe { crate::strstr(haystack.as_ptr().cast(), needle.as_ptr().cast()) };
    offset(haystack, p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn test_strchr_every_position() {
        for len in [1usize, 2, 17, 64, 130, 1000] {
            let mut bytes = vec![b'.'; len];
            for i in 0..len {
                bytes[i] = b'#';
                let s = CString::new(bytes.clone()).unwrap();
                assert_eq!(strchr(&s, b'#'), Some(i), "Failed at len {len} pos {i}");
                assert_eq!(strchr(&s, 0), Some(len));
                bytes[i] = b'.';
            }
        }
    }

    #[test]
    fn test_strstr_matches_naive_search() {
        let hay = CString::new("the quick brown fox jumps over the lazy dog, the end").unwrap();
        for needle in ["the", "the end", "fox", "dog,", "cat", "d", "quick brown fox jumps over"] {
            let n = CString::new(needle).unwrap();
            let expected = hay.as_bytes().windows(needle.len()).position(|w| w == needle.as_bytes());
            assert_eq!(strstr(&hay, &n), expected, "needle {needle:?}");
        }
    }
}
