//! strstr kernel.
//!
//! The haystack is scanned like strlen with the needle's first byte
//! broadcast. Candidates are narrowed with the second and last needle bytes
//! when the shifted loads provably stay inside the current page, then
//! verified with the string-compare kernel, which is page-safe on its own.
#![allow(unsafe_code)]

use crate::simd::{Vector, bytes_to_page_end, first_set, low_mask};
use crate::strcmp::first_mismatch;
use crate::strlen;

enum Step {
    Found(*mut u8),
    Absent,
    Continue,
}

struct Needle<V> {
    ptr: *const u8,
    len: usize,
    first: V,
    second: V,
    last: V,
}

/// First occurrence of the string `needle` in the string `haystack`.
///
/// # Safety
///
/// - `haystack` and `needle` must point to NUL-terminated strings
/// - The CPU must support `V`'s instruction set
#[inline(always)]
pub unsafe fn strstr<V: Vector>(haystack: *const u8, needle: *const u8) -> *mut u8 {
    let n0 = *needle;
    if n0 == 0 {
        return haystack as *mut u8;
    }
    if *haystack == 0 {
        return core::ptr::null_mut();
    }
    if *needle.add(1) == 0 {
        return strlen::strchr::<V>(haystack, n0);
    }

    let len = strlen::strlen::<V>(needle);
    let needle = Needle {
        ptr: needle,
        len,
        first: V::splat(n0),
        second: V::splat(*needle.add(1)),
        last: V::splat(*needle.add(len - 1)),
    };

    let w = V::WIDTH;
    let head = w - (haystack as usize & (w - 1));

    // SAFETY: a full register is read only when it stays inside the page of
    // the first byte; otherwise only the bytes up to the next register
    // boundary, which share that page.
    let (v, valid) = if bytes_to_page_end(haystack) >= w {
        (V::load(haystack), w)
    } else {
        (V::load_partial(haystack, head), head)
    };
    match search_chunk(haystack, 0, v, valid, &needle) {
        Step::Found(p) => return p,
        Step::Absent => return core::ptr::null_mut(),
        Step::Continue => {}
    }

    let mut off = head;
    loop {
        // SAFETY: W-aligned, so the register cannot cross a page, and the
        // previous chunk held no terminator.
        let v = V::load_aligned(haystack.add(off));
        match search_chunk(haystack, off, v, w, &needle) {
            Step::Found(p) => return p,
            Step::Absent => return core::ptr::null_mut(),
            Step::Continue => {}
        }
        off += w;
    }
}

/// Checks the candidates in `valid` bytes of `v`, loaded from `h + off`.
#[inline(always)]
unsafe fn search_chunk<V: Vector>(h: *const u8, off: usize, v: V, valid: usize, needle: &Needle<V>) -> Step {
    let w = V::WIDTH;
    let p = h.add(off);

    let zeros = V::zero_mask(v) & low_mask(valid);
    let mut cands = V::eq_mask(v, needle.first) & low_mask(valid);

    if zeros != 0 {
        // A match must end before the terminator.
        let t = first_set(zeros);
        if t < needle.len {
            return Step::Absent;
        }
        cands &= low_mask(t - needle.len + 1);
    }

    if cands != 0 {
        // SAFETY: the shifted loads are taken only when they end inside the
        // page of `p`, which is mapped since `p` itself is readable.
        let room = bytes_to_page_end(p);
        if room > w {
            cands &= V::eq_mask(V::load(p.add(1)), needle.second);
        }
        if room >= needle.len - 1 + w {
            cands &= V::eq_mask(V::load(p.add(needle.len - 1)), needle.last);
        }
    }

    while cands != 0 {
        let i = first_set(cands);
        cands &= cands - 1;
        let cand = p.add(i);
        match first_mismatch::<V>(cand, needle.ptr, needle.len) {
            None => return Step::Found(cand as *mut u8),
            // The haystack ends inside this window: nothing later fits.
            Some(j) if *cand.add(j) == 0 => return Step::Absent,
            Some(_) => {}
        }
    }

    if zeros != 0 { Step::Absent } else { Step::Continue }
}
