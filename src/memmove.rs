//! Overlap-tolerant memmove.
//!
//! Up to 8W bytes go through the memcpy small path, which loads everything
//! before storing. Larger moves pick a direction: forward when `dst` is below
//! `src` or the regions are disjoint, backward otherwise. Both directions load
//! the first and last 4W of the source up front and store them last.
#![allow(unsafe_code)]

use crate::memcpy::{BulkPolicy, copy_forward_bulk, copy_small, load_block, store_block, store_block_aligned};
use crate::simd::Vector;

/// Moves `n` bytes from `src` to `dst`; the regions may overlap.
///
/// # Safety
///
/// - `dst` must be valid for writes and `src` for reads of `n` bytes
/// - The CPU must support `V`'s instruction set
#[inline(always)]
pub unsafe fn memmove<V: Vector>(dst: *mut u8, src: *const u8, n: usize, policy: &BulkPolicy) -> *mut u8 {
    if n == 0 || core::ptr::eq(dst as *const u8, src) {
        return dst;
    }

    if n <= 8 * V::WIDTH {
        copy_small::<V>(dst, src, n);
        return dst;
    }

    let d = dst as usize;
    let s = src as usize;

    // dst below src, or dst at/after src + n.
    if d.wrapping_sub(s) >= n {
        let disjoint = s.wrapping_sub(d) >= n;
        copy_forward_bulk::<V>(dst, src, n, policy, disjoint);
    } else {
        copy_backward_bulk::<V>(dst, src, n);
    }
    dst
}

/// High-to-low bulk copy for `src < dst < src + n`, `n > 8W`.
#[inline(always)]
unsafe fn copy_backward_bulk<V: Vector>(dst: *mut u8, src: *const u8, n: usize) {
    let w = V::WIDTH;
    let block = 4 * w;

    let head = load_block::<V>(src);
    let tail = load_block::<V>(src.add(n - block));

    // Last offset where dst is register-aligned, within one register of n.
    let mut end = n - ((dst as usize + n) & (w - 1));

    while end > block {
        let start = end - block;
        // Each block is read completely before it is written. The writes land
        // at or above `src + start + 1`, never on bytes a later iteration reads.
        let b = load_block::<V>(src.add(start));
        store_block_aligned::<V>(dst.add(start), b);
        end = start;
    }

    store_block::<V>(dst.add(n - block), tail);
    store_block::<V>(dst, head);
}
