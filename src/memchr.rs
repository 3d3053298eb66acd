//! memchr kernel over exactly `n` bytes.
#![allow(unsafe_code)]

use crate::memcmp::locate4;
use crate::simd::{Vector, bytes_to_page_end, first_set, low_mask};

/// Pointer to the first `needle` within `n` bytes at `s`, or null.
///
/// # Safety
///
/// - `s` must be valid for reads of `n` bytes
/// - The CPU must support `V`'s instruction set
#[inline(always)]
pub unsafe fn memchr<V: Vector>(s: *const u8, needle: u8, n: usize) -> *mut u8 {
    match find_byte::<V>(s, needle, n) {
        Some(i) => s.add(i) as *mut u8,
        None => core::ptr::null_mut(),
    }
}

#[inline(always)]
pub(crate) unsafe fn find_byte<V: Vector>(s: *const u8, needle: u8, n: usize) -> Option<usize> {
    let w = V::WIDTH;
    let target = V::splat(needle);

    if n < w {
        if n == 0 {
            return None;
        }
        let v = if bytes_to_page_end(s) >= w { V::load(s) } else { V::load_partial(s, n) };
        let m = V::eq_mask(v, target) & low_mask(n);
        return (m != 0).then(|| first_set(m));
    }

    let mut off = 0;
    while off + 4 * w <= n {
        let m0 = eq_at::<V>(s, off, target);
        let m1 = eq_at::<V>(s, off + w, target);
        let m2 = eq_at::<V>(s, off + 2 * w, target);
        let m3 = eq_at::<V>(s, off + 3 * w, target);
        if (m0 | m1 | m2 | m3) != 0 {
            return Some(off + locate4(m0, m1, m2, m3, w));
        }
        off += 4 * w;
    }

    while off + w <= n {
        let m = eq_at::<V>(s, off, target);
        if m != 0 {
            return Some(off + first_set(m));
        }
        off += w;
    }

    if off < n {
        let last = n - w;
        let m = eq_at::<V>(s, last, target);
        if m != 0 {
            return Some(last + first_set(m));
        }
    }

    None
}

#[inline(always)]
unsafe fn eq_at<V: Vector>(s: *const u8, off: usize, target: V) -> u64 {
    V::eq_mask(V::load(s.add(off)), target)
}

#[cfg(test)]
mod tests {
    use crate::dispatch::DispatchTable;
    use crate::test_support::supported_variants;

    #[test]
    fn test_memchr_every_position() {
        for v in supported_variants() {
            let table = DispatchTable::for_variant(v);
            for n in (0..=520).step_by(11).chain([64, 128, 256, 512]) {
                let mut buf = vec![b'a'; n + 64];
                let found = unsafe { (table.memchr)(buf.as_ptr(), b'x', n) };
                assert!(found.is_null(), "{v}: phantom match size {n}");

                for i in 0..n {
                    buf[..].fill(b'a');
                    buf[i] = b'x';
                    if i + 2 < n {
                        buf[i + 2] = b'x';
                    }
                    let found = unsafe { (table.memchr)(buf.as_ptr(), b'x', n) };
                    assert_eq!(found as usize - buf.as_ptr() as usize, i, "{v}: size {n} at {i}");
                }

                // Matches at or beyond n are not reported.
                buf[..].fill(b'a');
                buf[n] = b'x';
                let found = unsafe { (table.memchr)(buf.as_ptr(), b'x', n) };
                assert!(found.is_null(), "{v}: match past n at size {n}");
            }
        }
    }

    #[test]
    fn test_memchr_alignment_and_zero_needle() {
        let mut buf = vec![1u8; 400];
        for v in supported_variants() {
            let table = DispatchTable::for_variant(v);
            for off in 0..64 {
                for n in [1usize, 3, 15, 16, 17, 33, 64, 100, 200, 300] {
                    buf.fill(1);
                    buf[off + n - 1] = 0;
                    let found = unsafe { (table.memchr)(buf.as_ptr().add(off), 0, n) };
                    assert_eq!(found as usize - buf.as_ptr() as usize, off + n - 1, "{v}: off {off} n {n}");
                }
            }
        }
    }
}
