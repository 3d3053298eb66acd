//! strcpy / strncpy / strcat / strncat kernels.
//!
//! Source registers are checked for a terminator before they are stored;
//! the register holding the terminator is stored only up to and including
//! it. strncpy then zero-fills the rest of the destination with the memset
//! kernel.
#![allow(unsafe_code)]

use crate::memcpy::BulkPolicy;
use crate::memset;
use crate::simd::{Vector, bytes_to_page_end, first_set, low_mask, store_prefix};
use crate::strlen;

/// Copies the string at `src` to `dst`, writing at most `n` bytes.
///
/// Returns the number of non-terminator bytes written, `min(strlen(src), n)`.
/// The terminator is written iff it lies within the first `n` bytes.
#[inline(always)]
pub(crate) unsafe fn copy_bounded<V: Vector>(dst: *mut u8, src: *const u8, n: usize) -> usize {
    if n == 0 {
        return 0;
    }

    let w = V::WIDTH;
    let head = w - (src as usize & (w - 1));

    let (v, valid) = if bytes_to_page_end(src) >= w {
        (V::load(src), w)
    } else {
        (V::load_partial(src, head), head)
    };
    let lim = valid.min(n);
    let z = V::zero_mask(v) & low_mask(lim);
    if z != 0 {
        let i = first_set(z);
        store_prefix(dst, v, i + 1);
        return i;
    }
    store_prefix(dst, v, lim);
    if n <= valid {
        return n;
    }

    // `src + off` is register-aligned from here on. Bytes in [head, valid)
    // were already stored and are stored again unchanged.
    let mut off = head;
    loop {
        let v = V::load_aligned(src.add(off));
        let rem = n - off;
        let lim = w.min(rem);
        let z = V::zero_mask(v) & low_mask(lim);
        if z != 0 {
            let i = first_set(z);
            store_prefix(dst.add(off), v, i + 1);
            return off + i;
        }
        if rem <= w {
            store_prefix(dst.add(off), v, rem);
            return n;
        }
        V::store(dst.add(off), v);
        off += w;
    }
}

/// # Safety
///
/// - `src` must point to a NUL-terminated string
/// - `dst` must be writable for `strlen(src) + 1` bytes and not overlap `src`
/// - The CPU must support `V`'s instruction set
#[inline(always)]
pub unsafe fn strcpy<V: Vector>(dst: *mut u8, src: *const u8) -> *mut u8 {
    copy_bounded::<V>(dst, src, usize::MAX);
    dst
}

/// Copies at most `n` bytes and pads with NUL up to `n` when the source is
/// shorter. No terminator is written when `strlen(src) >= n`.
///
/// # Safety
///
/// - `src` must be readable up to its terminator or `n` bytes, whichever
///   comes first
/// - `dst` must be writable for `n` bytes and not overlap `src`
/// - The CPU must support `V`'s instruction set
#[inline(always)]
pub unsafe fn strncpy<V: Vector>(dst: *mut u8, src: *const u8, n: usize, fill: &BulkPolicy) -> *mut u8 {
    let copied = copy_bounded::<V>(dst, src, n);
    if copied < n {
        memset::memset::<V>(dst.add(copied), 0, n - copied, fill);
    }
    dst
}

/// # Safety
///
/// - `dst` and `src` must point to NUL-terminated strings
/// - `dst` must be writable for `strlen(dst) + strlen(src) + 1` bytes
/// - The CPU must support `V`'s instruction set
#[inline(always)]
pub unsafe fn strcat<V: Vector>(dst: *mut u8, src: *const u8) -> *mut u8 {
    let end = dst.add(strlen::strlen::<V>(dst));
    copy_bounded::<V>(end, src, usize::MAX);
    dst
}

/// Appends at most `n` bytes of `src` and always terminates the result.
///
/// # Safety
///
/// - `dst` must point to a NUL-terminated string
/// - `src` must be readable up to its terminator or `n` bytes
/// - `dst` must be writable for `strlen(dst) + min(strlen(src), n) + 1` bytes
/// - The CPU must support `V`'s instruction set
#[inline(always)]
pub unsafe fn strncat<V: Vector>(dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
    let end = dst.add(strlen::strlen::<V>(dst));
    let copied = copy_bounded::<V>(end, src, n);
    *end.add(copied) = 0;
    dst
}

#[cfg(test)]
mod tests {
    use crate::dispatch::DispatchTable;
    use crate::test_support::{PageBuf, supported_variants};

    fn c_string(len: usize, seed: u8) -> Vec<u8> {
        let mut s: Vec<u8> = (0..len).map(|i| (i as u8 % 200).wrapping_add(seed).max(1)).collect();
        s.push(0);
        s
    }

    #[test]
    fn test_strcpy_lengths_and_offsets() {
        for v in supported_variants() {
            let table = DispatchTable::for_variant(v);
            for len in (0..=600).step_by(5).chain([63, 64, 65, 128, 256]) {
                for (src_off, dst_off) in [(0, 0), (1, 0), (0, 3), (17, 33), (63, 1), (31, 32)] {
                    let mut src = vec![0xEEu8; src_off];
                    src.extend(c_string(len, 7));
                    let mut dst = vec![0xCCu8; dst_off + len + 80];
                    let ret = unsafe { (table.strcpy)(dst.as_mut_ptr().add(dst_off), src.as_ptr().add(src_off)) };
                    assert_eq!(ret as usize, dst.as_ptr() as usize + dst_off);
                    assert_eq!(&dst[dst_off..dst_off + len + 1], &src[src_off..], "{v}: len {len}");
                    assert!(dst[dst_off + len + 1..].iter().all(|&b| b == 0xCC), "{v}: overran len {len}");
                    assert!(dst[..dst_off].iter().all(|&b| b == 0xCC));
                }
            }
        }
    }

    #[test]
    fn test_strncpy_padding() {
        for v in supported_variants() {
            let table = DispatchTable::for_variant(v);
            for len in [0usize, 1, 2, 15, 16, 17, 40, 64, 100, 300] {
                for n in [0usize, 1, 2, 5, 16, 31, 64, 65, 200, 1000] {
                    let src = c_string(len, 3);
                    let mut dst = vec![0xCCu8; n + 50];
                    unsafe { (table.strncpy)(dst.as_mut_ptr(), src.as_ptr(), n) };
                    let copied = len.min(n);
                    assert_eq!(&dst[..copied], &src[..copied], "{v}: len {len} n {n}");
                    assert!(dst[copied..n].iter().all(|&b| b == 0), "{v}: padding len {len} n {n}");
                    assert!(dst[n..].iter().all(|&b| b == 0xCC), "{v}: overran len {len} n {n}");
                }
            }
        }
    }

    #[test]
    fn test_strncpy_example() {
        for v in supported_variants() {
            let mut dst = [0xFFu8; 6];
            unsafe { (DispatchTable::for_variant(v).strncpy)(dst.as_mut_ptr(), b"ab\0".as_ptr(), 5) };
            assert_eq!(dst, [b'a', b'b', 0, 0, 0, 0xFF], "{v}");

            // Source at least n long: no terminator.
            let mut dst = [0xFFu8; 4];
            unsafe { (DispatchTable::for_variant(v).strncpy)(dst.as_mut_ptr(), b"abcdef\0".as_ptr(), 3) };
            assert_eq!(dst, [b'a', b'b', b'c', 0xFF], "{v}");
        }
    }

    /// Unterminated source readable for exactly n bytes before a guard page.
    #[test]
    fn test_strncpy_unterminated_source_at_page_end() {
        let page = PageBuf::new();
        for v in supported_variants() {
            let table = DispatchTable::for_variant(v);
            for n in 1..150 {
                let src = page.fill_at_end(n, b'k');
                let mut dst = vec![0u8; n + 1];
                unsafe { (table.strncpy)(dst.as_mut_ptr(), src, n) };
                assert!(dst[..n].iter().all(|&b| b == b'k'), "{v}: n {n}");
                assert_eq!(dst[n], 0);
            }
        }
    }

    #[test]
    fn test_strcat_and_strncat() {
        for v in supported_variants() {
            let table = DispatchTable::for_variant(v);
            for a_len in [0usize, 1, 7, 33, 100] {
                for b_len in [0usize, 1, 16, 70, 200] {
                    let a = c_string(a_len, 1);
                    let b = c_string(b_len, 9);
                    let mut expected = a[..a_len].to_vec();
                    expected.extend_from_slice(&b);

                    let mut dst = vec![0xCCu8; a_len + b_len + 40];
                    dst[..a.len()].copy_from_slice(&a);
                    unsafe { (table.strcat)(dst.as_mut_ptr(), b.as_ptr()) };
                    assert_eq!(&dst[..expected.len()], &expected[..], "{v}: strcat {a_len}+{b_len}");
                    assert_eq!(dst[expected.len()], 0xCC);

                    for n in [0usize, 1, 10, b_len, b_len + 5] {
                        let mut dst = vec![0xCCu8; a_len + b_len + 40];
                        dst[..a.len()].copy_from_slice(&a);
                        unsafe { (table.strncat)(dst.as_mut_ptr(), b.as_ptr(), n) };
                        let k = n.min(b_len);
                        assert_eq!(&dst[..a_len], &a[..a_len]);
                        assert_eq!(&dst[a_len..a_len + k], &b[..k], "{v}: strncat n {n}");
                        assert_eq!(dst[a_len + k], 0, "{v}: strncat terminator n {n}");
                        assert_eq!(dst[a_len + k + 1], 0xCC, "{v}: strncat overran n {n}");
                    }
                }
            }
        }
    }
}
