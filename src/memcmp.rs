//! memcmp kernel over exactly `n` bytes.
//!
//! Compares up to four registers per step and stops at the first step whose
//! not-equal mask is non-zero; only that mask is decoded.
#![allow(unsafe_code)]

use crate::simd::{Vector, bytes_to_page_end, first_set, low_mask};

/// Lexicographic comparison of `n` unsigned bytes.
///
/// Returns `a[i] - b[i]` at the first differing index, or 0.
///
/// # Safety
///
/// - `a` and `b` must be valid for reads of `n` bytes
/// - The CPU must support `V`'s instruction set
#[inline(always)]
pub unsafe fn memcmp<V: Vector>(a: *const u8, b: *const u8, n: usize) -> i32 {
    match first_difference::<V>(a, b, n) {
        Some(i) => *a.add(i) as i32 - *b.add(i) as i32,
        None => 0,
    }
}

/// Index of the first differing byte within `n` bytes.
#[inline(always)]
pub(crate) unsafe fn first_difference<V: Vector>(a: *const u8, b: *const u8, n: usize) -> Option<usize> {
    let w = V::WIDTH;

    if n < w {
        if n == 0 {
            return None;
        }
        // A full register may be read when it stays inside the page.
        let (va, vb) = if bytes_to_page_end(a) >= w && bytes_to_page_end(b) >= w {
            (V::load(a), V::load(b))
        } else {
            (V::load_partial(a, n), V::load_partial(b, n))
        };
        let m = V::ne_mask(va, vb) & low_mask(n);
        return (m != 0).then(|| first_set(m));
    }

    if n <= 2 * w {
        let m = ne_at::<V>(a, b, 0);
        if m != 0 {
            return Some(first_set(m));
        }
        let off = n - w;
        let m = ne_at::<V>(a, b, off);
        return (m != 0).then(|| off + first_set(m));
    }

    let mut off = 0;
    while off + 4 * w <= n {
        let m0 = ne_at::<V>(a, b, off);
        let m1 = ne_at::<V>(a, b, off + w);
        let m2 = ne_at::<V>(a, b, off + 2 * w);
        let m3 = ne_at::<V>(a, b, off + 3 * w);
        if (m0 | m1 | m2 | m3) != 0 {
            return Some(off + locate4(m0, m1, m2, m3, w));
        }
        off += 4 * w;
    }

    while off + w <= n {
        let m = ne_at::<V>(a, b, off);
        if m != 0 {
            return Some(off + first_set(m));
        }
        off += w;
    }

    if off < n {
        // Overlapping last register; the bytes before `off` are known equal.
        let last = n - w;
        let m = ne_at::<V>(a, b, last);
        if m != 0 {
            return Some(last + first_set(m));
        }
    }

    None
}

#[inline(always)]
unsafe fn ne_at<V: Vector>(a: *const u8, b: *const u8, off: usize) -> u64 {
    V::ne_mask(V::load(a.add(off)), V::load(b.add(off)))
}

/// Offset of the first set bit across four consecutive register masks.
#[inline(always)]
pub(crate) fn locate4(m0: u64, m1: u64, m2: u64, m3: u64, w: usize) -> usize {
    if m0 != 0 {
        first_set(m0)
    } else if m1 != 0 {
        w + first_set(m1)
    } else if m2 != 0 {
        2 * w + first_set(m2)
    } else {
        3 * w + first_set(m3)
    }
}
