//! memset kernel, generic over the vector width.
//!
//! Small sizes use overlapping head/tail stores. Bulk sizes store the first
//! and last 4W unaligned, then fill the middle with aligned stores, or with
//! `rep stosb` / streaming stores depending on the store breakpoints.
#![allow(unsafe_code)]

use crate::memcpy::BulkPolicy;
use crate::simd::Vector;

/// Fills `n` bytes at `dst` with `value`.
///
/// # Safety
///
/// - `dst` must be valid for writes of `n` bytes
/// - The CPU must support `V`'s instruction set
#[inline(always)]
pub unsafe fn memset<V: Vector>(dst: *mut u8, value: u8, n: usize, policy: &BulkPolicy) -> *mut u8 {
    let w = V::WIDTH;

    if n < w {
        V::set_short(dst, value, n);
        return dst;
    }

    let v = V::splat(value);

    if n <= 2 * w {
        V::store(dst, v);
        V::store(dst.add(n - w), v);
        return dst;
    }

    if n <= 4 * w {
        V::store(dst, v);
        V::store(dst.add(w), v);
        V::store(dst.add(n - 2 * w), v);
        V::store(dst.add(n - w), v);
        return dst;
    }

    if n <= 8 * w {
        fill_block::<V>(dst, v);
        fill_block::<V>(dst.add(n - 4 * w), v);
        return dst;
    }

    set_bulk::<V>(dst, v, value, n, policy);
    dst
}

#[inline(always)]
unsafe fn fill_block<V: Vector>(p: *mut u8, v: V) {
    let w = V::WIDTH;
    V::store(p, v);
    V::store(p.add(w), v);
    V::store(p.add(2 * w), v);
    V::store(p.add(3 * w), v);
}

// =============================================================================
// BULK PATH: n > 8W
// =============================================================================

#[inline(always)]
unsafe fn set_bulk<V: Vector>(dst: *mut u8, v: V, value: u8, n: usize, policy: &BulkPolicy) {
    #[cfg(target_arch = "x86_64")]
    if policy.use_rep(n) {
        rep_stosb(dst, value, n);
        return;
    }
    #[cfg(not(target_arch = "x86_64"))]
    let _ = value;

    let w = V::WIDTH;
    let block = 4 * w;

    fill_block::<V>(dst, v);

    let mut off = block - (dst as usize & (w - 1));
    let end = n - block;

    if n >= policy.nt_start {
        while off < end {
            let d = dst.add(off);
            V::store_stream(d, v);
            V::store_stream(d.add(w), v);
            V::store_stream(d.add(2 * w), v);
            V::store_stream(d.add(3 * w), v);
            off += block;
        }
        V::store_fence();
    } else {
        while off < end {
            let d = dst.add(off);
            V::store_aligned(d, v);
            V::store_aligned(d.add(w), v);
            V::store_aligned(d.add(2 * w), v);
            V::store_aligned(d.add(3 * w), v);
            off += block;
        }
    }

    fill_block::<V>(dst.add(end), v);
}

#[cfg(target_arch = "x86_64")]
#[inline(always)]
unsafe fn rep_stosb(dst: *mut u8, value: u8, n: usize) {
    // SAFETY: caller guarantees `dst` is writable for `n` bytes; DF is clear
    // per the System V ABI.
    core::arch::asm!(
        "rep stosb",
        inout("rdi") dst => _,
        inout("rcx") n => _,
        in("al") value,
        options(nostack, preserves_flags)
    );
}
