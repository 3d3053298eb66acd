//! strlen / strchr kernels.
//!
//! The first register is loaded unaligned, or byte-masked when it would
//! cross into the next page. From there the scan only issues aligned loads:
//! single registers up to a 4W boundary, then an unbounded 4-register loop.
//! An aligned load never spans two pages.
#![allow(unsafe_code)]

use crate::memcmp::locate4;
use crate::simd::{Vector, bytes_to_page_end, first_set, low_mask};

/// Which bytes end a scan.
pub(crate) trait Stop<V: Vector> {
    unsafe fn mask(&self, v: V) -> u64;
}

/// The terminator.
pub(crate) struct Nul;

impl<V: Vector> Stop<V> for Nul {
    #[inline(always)]
    unsafe fn mask(&self, v: V) -> u64 {
        V::zero_mask(v)
    }
}

/// The terminator or a given byte.
pub(crate) struct NulOr<V>(pub V);

impl<V: Vector> Stop<V> for NulOr<V> {
    #[inline(always)]
    unsafe fn mask(&self, v: V) -> u64 {
        V::zero_mask(v) | V::eq_mask(v, self.0)
    }
}

/// Offset of the first byte from `s` matching `stop`. Never returns
/// without a match.
#[inline(always)]
pub(crate) unsafe fn scan<V: Vector, S: Stop<V>>(s: *const u8, stop: &S) -> usize {
    let w = V::WIDTH;
    let head = w - (s as usize & (w - 1));

    let (v, valid) = if bytes_to_page_end(s) >= w {
        (V::load(s), w)
    } else {
        (V::load_partial(s, head), head)
    };
    let m = stop.mask(v) & low_mask(valid);
    if m != 0 {
        return first_set(m);
    }

    let mut off = head;
    while (s as usize + off) & (4 * w - 1) != 0 {
        let m = stop.mask(V::load_aligned(s.add(off)));
        if m != 0 {
            return off + first_set(m);
        }
        off += w;
    }

    loop {
        let p = s.add(off);
        let m0 = stop.mask(V::load_aligned(p));
        let m1 = stop.mask(V::load_aligned(p.add(w)));
        let m2 = stop.mask(V::load_aligned(p.add(2 * w)));
        let m3 = stop.mask(V::load_aligned(p.add(3 * w)));
        if (m0 | m1 | m2 | m3) != 0 {
            return off + locate4(m0, m1, m2, m3, w);
        }
        off += 4 * w;
    }
}

/// Length of the NUL-terminated string at `s`.
///
/// # Safety
///
/// - `s` must point to a NUL-terminated string
/// - The CPU must support `V`'s instruction set
#[inline(always)]
pub unsafe fn strlen<V: Vector>(s: *const u8) -> usize {
    scan::<V, Nul>(s, &Nul)
}

/// First occurrence of `c` in the string at `s`, the terminator included.
///
/// # Safety
///
/// Same as [`strlen`].
#[inline(always)]
pub unsafe fn strchr<V: Vector>(s: *const u8, c: u8) -> *mut u8 {
    let i = scan::<V, NulOr<V>>(s, &NulOr(V::splat(c)));
    if *s.add(i) == c { s.add(i) as *mut u8 } else { core::ptr::null_mut() }
}
