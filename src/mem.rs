//! Memory functions on byte slices
//!
//! Safe wrappers over the dispatched kernels. Destination capacity is checked
//! before any raw call; a short destination panics like `copy_from_slice`.

use core::ops::Range;

/// Copy `src` into the front of `dest`
///
/// Returns the number of bytes copied, `src.len()`.
///
/// # Panics
///
/// If `dest` is shorter than `src`.
///
/// # Examples
/// ```
/// use tunedmem::mem::memcpy;
/// let mut dest = [0u8; 5];
/// assert_eq!(memcpy(&mut dest, b"hello"), 5);
/// assert_eq!(&dest, b"hello");
/// ```
pub fn memcpy(dest: &mut [u8], src: &[u8]) -> usize {
    let n = src.len();
    assert!(dest.len() >= n, "memcpy: destination holds {} bytes, source {}", dest.len(), n);
    // SAFETY: both ranges are in bounds; `&mut` and `&` cannot overlap.
    unsafe { crate::memcpy(dest.as_mut_ptr(), src.as_ptr(), n) };
    n
}

/// Copy `buf[src]` to `buf[dest..]` within one buffer
///
/// The ranges may overlap. Returns the number of bytes moved.
///
/// # Panics
///
/// If either range falls outside `buf`.
///
/// # Examples
/// ```
/// use tunedmem::mem::memmove;
/// let mut buf = *b"0123456789.....";
/// memmove(&mut buf, 0..10, 5);
/// assert_eq!(&buf, b"012340123456789");
/// ```
pub fn memmove(buf: &mut [u8], src: Range<usize>, dest: usize) -> usize {
    assert!(src.start <= src.end && src.end <= buf.len(), "memmove: source range out of bounds");
    let n = src.end - src.start;
    assert!(dest <= buf.len() - n, "memmove: destination out of bounds");
    let base = buf.as_mut_ptr();
    // SAFETY: both ranges are inside `buf`.
    unsafe { crate::memmove(base.add(dest), base.add(src.start), n) };
    n
}

/// Fill a byte slice with a constant value
///
/// Returns the number of bytes set.
///
/// # Examples
/// ```
/// use tunedmem::mem::memset;
/// let mut buf = [0u8; 5];
/// memset(&mut buf, b'x');
/// assert_eq!(&buf, b"xxxxx");
/// ```
pub fn memset(dest: &mut [u8], c: u8) -> usize {
    // SAFETY: `dest` is writable for its length.
    unsafe { crate::memset(dest.as_mut_ptr(), c as i32, dest.len()) };
    dest.len()
}

/// Compare two byte slices
///
/// Compares up to `min(s1.len(), s2.len())` bytes as unsigned values. If
/// those are equal the shorter slice is less.
///
/// # Examples
/// ```
/// use tunedmem::mem::memcmp;
/// assert!(memcmp(b"abc", b"abd") < 0);
/// assert!(memcmp(b"abc", b"abc") == 0);
/// assert!(memcmp(b"ab", b"abc") < 0);
/// ```
pub fn memcmp(s1: &[u8], s2: &[u8]) -> i32 {
    let n = s1.len().min(s2.len());
    // SAFETY: both slices are readable for `n` bytes.
    let cmp = unsafe { crate::memcmp(s1.as_ptr(), s2.as_ptr(), n) };
    if cmp != 0 {
        return cmp;
    }
    match s1.len().cmp(&s2.len()) {
        core::cmp::Ordering::Less => -1,
        core::cmp::Ordering::Equal => 0,
        core::cmp::Ordering::Greater => 1,
    }
}

/// Locate a byte in a slice
///
/// # Examples
/// ```
/// use tunedmem::mem::memchr;
/// assert_eq!(memchr(b"hello", b'l'), Some(2));
/// assert_eq!(memchr(b"hello", b'z'), None);
/// ```
pub fn memchr(s: &[u8], c: u8) -> Option<usize> {
    // SAFETY: `s` is readable for its length.
    let p = unsafe { crate::memchr(s.as_ptr(), c as i32, s.len()) };
    (!p.is_null()).then(|| p as usize - s.as_ptr() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memcpy_sizes() {
        for n in 0..=1024 {
            let src: Vec<u8> = (0..n).map(|i| (i * 7) as u8).collect();
            let mut dest = vec![0xEEu8; n + 16];
            assert_eq!(memcpy(&mut dest, &src), n);
            assert_eq!(&dest[..n], &src[..], "Failed at size {n}");
            assert!(dest[n..].iter().all(|&b| b == 0xEE), "Overran at size {n}");
        }
    }

    #[test]
    #[should_panic(expected = "memcpy")]
    fn test_memcpy_short_destination_panics() {
        let mut dest = [0u8; 3];
        memcpy(&mut dest, b"hello");
    }

    #[test]
    fn test_memmove_both_directions() {
        for n in [0usize, 1, 9, 31, 64, 200, 700] {
            for shift in [1usize, 3, 16, 65] {
                let orig: Vec<u8> = (0..n + shift).map(|i| i as u8).collect();

                let mut buf = orig.clone();
                memmove(&mut buf, 0..n, shift);
                let mut expected = orig.clone();
                expected.copy_within(0..n, shift);
                assert_eq!(buf, expected, "forward overlap n {n} shift {shift}");

                let mut buf = orig.clone();
                memmove(&mut buf, shift..shift + n, 0);
                let mut expected = orig.clone();
                expected.copy_within(shift..shift + n, 0);
                assert_eq!(buf, expected, "backward overlap n {n} shift {shift}");
            }
        }
    }

    #[test]
    #[should_panic(expected = "memmove")]
    fn test_memmove_out_of_bounds_panics() {
        let mut buf = [0u8; 8];
        memmove(&mut buf, 0..4, 6);
    }

    #[test]
    fn test_memset_and_memchr() {
        for n in [0usize, 1, 15, 16, 100, 5000] {
            let mut buf = vec![0u8; n];
            assert_eq!(memset(&mut buf, 0x5A), n);
            assert!(buf.iter().all(|&b| b == 0x5A));
            assert_eq!(memchr(&buf, 0x5A), if n == 0 { None } else { Some(0) });
            assert_eq!(memchr(&buf, 0), None);
            if n > 0 {
                buf[n - 1] = 0;
                assert_eq!(memchr(&buf, 0), Some(n - 1));
            }
        }
    }

    #[test]
    fn test_memcmp_ordering() {
        assert_eq!(memcmp(b"", b""), 0);
        assert!(memcmp(b"", b"a") < 0);
        assert!(memcmp(b"\xff", b"\x01") > 0);
        let a = vec![9u8; 300];
        let mut b = a.clone();
        b[257] = 10;
        assert!(memcmp(&a, &b) < 0);
        assert!(memcmp(&b, &a) > 0);
        assert!(memcmp(&a[..257], &b[..257]) == 0);
    }
}
