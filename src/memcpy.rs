//! memcpy / mempcpy kernels, generic over the vector width.
//!
//! Regimes, with `W` the register width:
//!
//! - `n < W`: [`Vector::copy_short`] (masked on AVX-512, scalar cascade otherwise)
//! - `n <= 2W`, `4W`, `8W`: overlapping head/tail registers, all loads first
//! - bulk: `rep movsb` inside the short-rep range, otherwise a 4-register
//!   loop with aligned stores. Above `prefetch_start` the loop prefetches,
//!   above `nt_start` it streams past the cache. The first and last 4W are
//!   loaded before the loop and stored after it.
#![allow(unsafe_code)]

use crate::simd::Vector;
use crate::threshold::Thresholds;

/// Prefetch distance in loop blocks.
const PREFETCH_BLOCKS: usize = 4;

/// Breakpoints consulted by the bulk loops of one kernel family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BulkPolicy {
    pub rep_start: usize,
    pub rep_stop: usize,
    pub nt_start: usize,
    pub prefetch_start: usize,
}

impl BulkPolicy {
    /// Copy family, vector loops with the short-rep range in between.
    pub fn copy(t: &Thresholds) -> Self {
        Self {
            rep_start: t.repmov_start,
            rep_stop: t.repmov_stop,
            nt_start: t.nt_start,
            prefetch_start: t.prefetch_start,
        }
    }

    /// Copy family, `rep movsb` for every bulk size below the
    /// non-temporal start.
    pub fn copy_rep(t: &Thresholds) -> Self {
        Self { rep_start: 0, rep_stop: t.nt_start, ..Self::copy(t) }
    }

    /// Set family.
    pub fn store(t: &Thresholds) -> Self {
        Self {
            rep_start: t.repstore_start,
            rep_stop: t.repstore_stop,
            nt_start: t.nt_store_start,
            prefetch_start: usize::MAX,
        }
    }

    /// Set family, `rep stosb` for every bulk size below the non-temporal
    /// start.
    pub fn store_rep(t: &Thresholds) -> Self {
        Self { rep_start: 0, rep_stop: t.nt_store_start, ..Self::store(t) }
    }

    #[inline(always)]
    pub fn use_rep(&self, n: usize) -> bool {
        cfg!(target_arch = "x86_64") && n >= self.rep_start && n < self.rep_stop
    }
}

/// Copies `n` bytes.
///
/// # Safety
///
/// - `dst` must be valid for writes and `src` for reads of `n` bytes
/// - The regions must not overlap
/// - The CPU must support `V`'s instruction set
#[inline(always)]
pub unsafe fn memcpy<V: Vector>(dst: *mut u8, src: *const u8, n: usize, policy: &BulkPolicy) -> *mut u8 {
    if n <= 8 * V::WIDTH {
        copy_small::<V>(dst, src, n);
    } else {
        copy_forward_bulk::<V>(dst, src, n, policy, true);
    }
    dst
}

/// Like [`memcpy`] but returns `dst + n`.
///
/// # Safety
///
/// Same as [`memcpy`].
#[inline(always)]
pub unsafe fn mempcpy<V: Vector>(dst: *mut u8, src: *const u8, n: usize, policy: &BulkPolicy) -> *mut u8 {
    memcpy::<V>(dst, src, n, policy).add(n)
}

// =============================================================================
// SMALL PATH: 0..=8W bytes, every load before the first store
// =============================================================================

/// Copies up to `8 * V::WIDTH` bytes. Overlapping regions are handled since
/// all loads complete before any store.
#[inline(always)]
pub unsafe fn copy_small<V: Vector>(dst: *mut u8, src: *const u8, n: usize) {
    let w = V::WIDTH;

    if n < w {
        V::copy_short(dst, src, n);
        return;
    }

    if n <= 2 * w {
        // SAFETY: n >= W, so both registers lie inside [0, n).
        let a = V::load(src);
        let b = V::load(src.add(n - w));
        V::store(dst, a);
        V::store(dst.add(n - w), b);
        return;
    }

    if n <= 4 * w {
        // SAFETY: n > 2W, so the four registers cover [0, n) without leaving it.
        let a = V::load(src);
        let b = V::load(src.add(w));
        let c = V::load(src.add(n - 2 * w));
        let d = V::load(src.add(n - w));
        V::store(dst, a);
        V::store(dst.add(w), b);
        V::store(dst.add(n - 2 * w), c);
        V::store(dst.add(n - w), d);
        return;
    }

    // SAFETY: n > 4W, so both blocks lie inside [0, n).
    let h = load_block::<V>(src);
    let t = load_block::<V>(src.add(n - 4 * w));
    store_block::<V>(dst, h);
    store_block::<V>(dst.add(n - 4 * w), t);
}

#[inline(always)]
pub(crate) unsafe fn load_block<V: Vector>(p: *const u8) -> [V; 4] {
    let w = V::WIDTH;
    [V::load(p), V::load(p.add(w)), V::load(p.add(2 * w)), V::load(p.add(3 * w))]
}

#[inline(always)]
pub(crate) unsafe fn store_block<V: Vector>(p: *mut u8, b: [V; 4]) {
    let w = V::WIDTH;
    V::store(p, b[0]);
    V::store(p.add(w), b[1]);
    V::store(p.add(2 * w), b[2]);
    V::store(p.add(3 * w), b[3]);
}

// =============================================================================
// BULK PATH: n > 8W
// =============================================================================

/// Forward bulk copy. Also correct for overlapping regions with
/// `dst < src`: every block is fully loaded before it is stored and the
/// head/tail snapshots are taken up front. `fast` enables `rep movsb` and
/// non-temporal stores, which require disjoint regions.
#[inline(always)]
pub(crate) unsafe fn copy_forward_bulk<V: Vector>(
    dst: *mut u8,
    src: *const u8,
    n: usize,
    policy: &BulkPolicy,
    fast: bool,
) {
    #[cfg(target_arch = "x86_64")]
    if fast && policy.use_rep(n) {
        rep_movsb(dst, src, n);
        return;
    }

    let w = V::WIDTH;
    let block = 4 * w;

    // SAFETY: n > 8W, so both snapshot blocks lie inside [0, n).
    let head = load_block::<V>(src);
    let tail = load_block::<V>(src.add(n - block));

    // First offset where dst is register-aligned, at most one block in.
    let mut off = block - (dst as usize & (w - 1));
    let end = n - block;

    if fast && n >= policy.nt_start {
        while off < end {
            V::prefetch(src.wrapping_add(off + PREFETCH_BLOCKS * block));
            let b = load_block::<V>(src.add(off));
            let d = dst.add(off);
            // SAFETY: `dst + off` is W-aligned by construction.
            V::store_stream(d, b[0]);
            V::store_stream(d.add(w), b[1]);
            V::store_stream(d.add(2 * w), b[2]);
            V::store_stream(d.add(3 * w), b[3]);
            off += block;
        }
        // REQUIRED: orders the streaming stores before the snapshot stores
        // and before the caller observes the data.
        V::store_fence();
    } else if n >= policy.prefetch_start {
        // SAFETY: prefetch is a hint and may point past the source; every
        // block starts below `end` and so ends inside [0, n).
        while off < end {
            V::prefetch(src.wrapping_add(off + PREFETCH_BLOCKS * block));
            let b = load_block::<V>(src.add(off));
            store_block_aligned::<V>(dst.add(off), b);
            off += block;
        }
    } else if (src as usize ^ dst as usize) & (w - 1) == 0 {
        // Same misalignment: `src + off` is W-aligned whenever `dst + off` is.
        while off < end {
            let s = src.add(off);
            let b = [
                V::load_aligned(s),
                V::load_aligned(s.add(w)),
                V::load_aligned(s.add(2 * w)),
                V::load_aligned(s.add(3 * w)),
            ];
            store_block_aligned::<V>(dst.add(off), b);
            off += block;
        }
    } else {
        while off < end {
            let b = load_block::<V>(src.add(off));
            store_block_aligned::<V>(dst.add(off), b);
            off += block;
        }
    }

    store_block::<V>(dst, head);
    store_block::<V>(dst.add(end), tail);
}

#[inline(always)]
pub(crate) unsafe fn store_block_aligned<V: Vector>(p: *mut u8, b: [V; 4]) {
    let w = V::WIDTH;
    V::store_aligned(p, b[0]);
    V::store_aligned(p.add(w), b[1]);
    V::store_aligned(p.add(2 * w), b[2]);
    V::store_aligned(p.add(3 * w), b[3]);
}

#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub(crate) unsafe fn rep_movsb(dst: *mut u8, src: *const u8, n: usize) {
    // SAFETY: caller guarantees both regions are valid for `n` bytes and
    // disjoint; DF is clear per the System V ABI.
    core::arch::asm!(
        "rep movsb",
        inout("rdi") dst => _,
        inout("rsi") src => _,
        inout("rcx") n => _,
        options(nostack, preserves_flags)
    );
}
