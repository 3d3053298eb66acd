//! strcmp / strncmp kernels.
//!
//! Both strings are loaded together; one mask flags "terminator in `a`" or
//! "bytes differ". The first set bit is resolved by re-reading the two bytes.
//!
//! `a` is brought to a register boundary first and loaded aligned from then
//! on. `b` is loaded aligned too when it shares `a`'s misalignment; otherwise
//! it is loaded unaligned, and a register of `b` that would straddle a page
//! boundary is split there and compared in byte-masked parts.
#![allow(unsafe_code)]

use crate::simd::{Vector, bytes_to_page_end, first_set, low_mask};

#[inline(always)]
unsafe fn mismatch_mask<V: Vector>(va: V, vb: V, len: usize) -> u64 {
    (V::zero_mask(va) | V::ne_mask(va, vb)) & low_mask(len)
}

/// Mismatch mask over `len` (<= W) bytes at arbitrary addresses.
///
/// When either operand has fewer than W bytes left in its page, the chunk is
/// split at the nearer page end. The part past a boundary is only read once
/// the part before it held no terminator and no difference, so neither
/// string is read beyond its terminator's page.
#[inline(always)]
unsafe fn chunk_mask<V: Vector>(a: *const u8, b: *const u8, len: usize) -> u64 {
    let w = V::WIDTH;
    if bytes_to_page_end(a) >= w && bytes_to_page_end(b) >= w {
        // SAFETY: both full registers lie inside their current pages.
        return mismatch_mask::<V>(V::load(a), V::load(b), len);
    }

    let mut done = 0;
    while done < len {
        let (pa, pb) = (a.add(done), b.add(done));
        // The first step is below W since one page end is nearer than W.
        // Later steps start past that boundary, so `len - done` < W.
        let step = (len - done).min(bytes_to_page_end(pa)).min(bytes_to_page_end(pb));
        // SAFETY: `step` bytes from each pointer stay inside its page.
        let m = mismatch_mask::<V>(V::load_partial(pa, step), V::load_partial(pb, step), step);
        if m != 0 {
            return m << done;
        }
        done += step;
    }
    0
}

/// First index below `n` where `a` holds its terminator or differs from `b`.
///
/// `a` is the aligned stream: after a head chunk that brings it to a W
/// boundary, every `a` register is an aligned load and cannot cross a page.
/// `b`'s page room is what limits each chunk. A register of `b` that would
/// run past its page end is split there by [`chunk_mask`], so `b` is never
/// read past the page holding its terminator.
#[inline(always)]
pub(crate) unsafe fn first_mismatch<V: Vector>(a: *const u8, b: *const u8, n: usize) -> Option<usize> {
    if n == 0 {
        return None;
    }

    let w = V::WIDTH;
    let mut off = 0;

    let head = w - (a as usize & (w - 1));
    if head < w {
        let m = chunk_mask::<V>(a, b, head.min(n));
        if m != 0 {
            return Some(first_set(m));
        }
        off = head;
    }

    let congruent = (a as usize ^ b as usize) & (w - 1) == 0;
    while off < n {
        let pa = a.add(off);
        let pb = b.add(off);
        let lim = w.min(n - off);

        let m = if congruent {
            // SAFETY: both are W-aligned, so neither register crosses a page.
            mismatch_mask::<V>(V::load_aligned(pa), V::load_aligned(pb), lim)
        } else if bytes_to_page_end(pb) >= w {
            // SAFETY: `pa` is W-aligned and `pb` has a full register left in its page.
            mismatch_mask::<V>(V::load_aligned(pa), V::load(pb), lim)
        } else {
            chunk_mask::<V>(pa, pb, lim)
        };

        if m != 0 {
            return Some(off + first_set(m));
        }
        off += w;
    }

    None
}

#[inline(always)]
unsafe fn byte_diff(a: *const u8, b: *const u8, i: usize) -> i32 {
    *a.add(i) as i32 - *b.add(i) as i32
}

/// # Safety
///
/// - `a` and `b` must point to NUL-terminated strings
/// - The CPU must support `V`'s instruction set
#[inline(always)]
pub unsafe fn strcmp<V: Vector>(a: *const u8, b: *const u8) -> i32 {
    match first_mismatch::<V>(a, b, usize::MAX) {
        Some(i) => byte_diff(a, b, i),
        None => 0,
    }
}

/// Compares at most `n` bytes.
///
/// # Safety
///
/// - `a` and `b` must be readable up to their terminator or `n` bytes
/// - The CPU must support `V`'s instruction set
#[inline(always)]
pub unsafe fn strncmp<V: Vector>(a: *const u8, b: *const u8, n: usize) -> i32 {
    match first_mismatch::<V>(a, b, n) {
        Some(i) => byte_diff(a, b, i),
        None => 0,
    }
}
