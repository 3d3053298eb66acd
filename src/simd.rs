//! Width-generic vector operations.
//!
//! Every kernel in this crate is written once against the [`Vector`] trait and
//! instantiated per register width:
//!
//! - [`Swar`]: 8-byte SWAR lanes in a `u64`, available on every target
//! - [`V128`]: SSE2 `__m128i`
//! - [`V256`]: AVX2 `__m256i`
//! - [`V512`]: AVX-512BW `__m512i` with native byte-masked loads and stores
//!
//! Comparison results are always returned as a `u64` bitmask where bit `i`
//! describes byte `i` of the register, so kernels can locate the first hit
//! with `trailing_zeros` regardless of width.
//!
//! # Safety
//!
//! The trait methods are thin wrappers over raw loads and stores. The caller
//! must guarantee the touched bytes are readable/writable and, for the x86
//! implementations, that the running CPU supports the instruction set. The
//! trait methods are `#[inline(always)]` so they are compiled with the target
//! features of the `#[target_feature]` wrapper that instantiates the kernel.

#![allow(unsafe_code)]

use core::ptr;

/// Smallest page size on every supported target. Larger pages are multiples
/// of it, so staying inside a 4 KiB page also stays inside any larger one.
pub const PAGE_SIZE: usize = 4096;

/// Number of bytes from `p` up to (not including) the next page boundary.
#[inline(always)]
pub fn bytes_to_page_end(p: *const u8) -> usize {
    PAGE_SIZE - ((p as usize) & (PAGE_SIZE - 1))
}

/// Mask with the low `len` bits set (`len` may be 0..=64).
#[inline(always)]
pub fn low_mask(len: usize) -> u64 {
    if len >= 64 { u64::MAX } else { (1u64 << len) - 1 }
}

#[inline(always)]
pub fn first_set(mask: u64) -> usize {
    mask.trailing_zeros() as usize
}

/// A SIMD register of `WIDTH` bytes.
pub trait Vector: Copy {
    /// Register width in bytes; a power of two dividing [`PAGE_SIZE`].
    const WIDTH: usize;

    unsafe fn splat(byte: u8) -> Self;

    /// Unaligned load of `WIDTH` bytes.
    unsafe fn load(p: *const u8) -> Self;

    /// Load from a `WIDTH`-aligned address.
    unsafe fn load_aligned(p: *const u8) -> Self;

    /// Reads exactly `len` (< `WIDTH`) bytes; the remaining lanes are zero.
    /// Never touches memory past `p + len`.
    #[inline(always)]
    unsafe fn load_partial(p: *const u8, len: usize) -> Self {
        let mut buf = [0u8; 64];
        copy_lt64(buf.as_mut_ptr(), p, len);
        Self::load(buf.as_ptr())
    }

    unsafe fn store(p: *mut u8, v: Self);

    unsafe fn store_aligned(p: *mut u8, v: Self);

    /// Non-temporal store to a `WIDTH`-aligned address.
    #[inline(always)]
    unsafe fn store_stream(p: *mut u8, v: Self) {
        Self::store_aligned(p, v);
    }

    /// Writes exactly the first `len` (< `WIDTH`) lanes of `v`.
    #[inline(always)]
    unsafe fn store_partial(p: *mut u8, v: Self, len: usize) {
        let mut buf = [0u8; 64];
        Self::store(buf.as_mut_ptr(), v);
        copy_lt64(p, buf.as_ptr(), len);
    }

    /// Bit `i` set iff `a[i] == b[i]`.
    unsafe fn eq_mask(a: Self, b: Self) -> u64;

    /// Bit `i` set iff `a[i] == 0`.
    unsafe fn zero_mask(a: Self) -> u64;

    /// Bit `i` set iff `a[i] != b[i]`.
    #[inline(always)]
    unsafe fn ne_mask(a: Self, b: Self) -> u64 {
        !Self::eq_mask(a, b) & low_mask(Self::WIDTH)
    }

    /// Copies `n` (< `WIDTH`) bytes. All loads complete before the first
    /// store, so overlapping regions are handled.
    #[inline(always)]
    unsafe fn copy_short(dst: *mut u8, src: *const u8, n: usize) {
        copy_lt64(dst, src, n);
    }

    /// Fills `n` (< `WIDTH`) bytes with `byte`.
    #[inline(always)]
    unsafe fn set_short(dst: *mut u8, byte: u8, n: usize) {
        set_lt64(dst, byte, n);
    }

    #[inline(always)]
    unsafe fn prefetch(_p: *const u8) {}

    /// Orders preceding non-temporal stores before later stores.
    #[inline(always)]
    unsafe fn store_fence() {}
}

/// Writes the first `k` (1..=`WIDTH`) lanes of `v`.
#[inline(always)]
pub unsafe fn store_prefix<V: Vector>(p: *mut u8, v: V, k: usize) {
    if k == V::WIDTH {
        V::store(p, v);
    } else {
        V::store_partial(p, v, k);
    }
}

// =============================================================================
// SCALAR HELPERS: overlapping head/tail cascades for 0-63 bytes
// =============================================================================

/// Copies `n` (< 64) bytes with overlapping scalar loads/stores.
/// Every load happens before the first store.
#[inline(always)]
pub unsafe fn copy_lt64(dst: *mut u8, src: *const u8, n: usize) {
    if n >= 32 {
        let a = ptr::read_unaligned(src as *const u64);
        let b = ptr::read_unaligned(src.add(8) as *const u64);
        let c = ptr::read_unaligned(src.add(16) as *const u64);
        let d = ptr::read_unaligned(src.add(24) as *const u64);
        let e = ptr::read_unaligned(src.add(n - 32) as *const u64);
        let f = ptr::read_unaligned(src.add(n - 24) as *const u64);
        let g = ptr::read_unaligned(src.add(n - 16) as *const u64);
        let h = ptr::read_unaligned(src.add(n - 8) as *const u64);
        ptr::write_unaligned(dst as *mut u64, a);
        ptr::write_unaligned(dst.add(8) as *mut u64, b);
        ptr::write_unaligned(dst.add(16) as *mut u64, c);
        ptr::write_unaligned(dst.add(24) as *mut u64, d);
        ptr::write_unaligned(dst.add(n - 32) as *mut u64, e);
        ptr::write_unaligned(dst.add(n - 24) as *mut u64, f);
        ptr::write_unaligned(dst.add(n - 16) as *mut u64, g);
        ptr::write_unaligned(dst.add(n - 8) as *mut u64, h);
        return;
    }

    if n >= 16 {
        let a = ptr::read_unaligned(src as *const u64);
        let b = ptr::read_unaligned(src.add(8) as *const u64);
        let c = ptr::read_unaligned(src.add(n - 16) as *const u64);
        let d = ptr::read_unaligned(src.add(n - 8) as *const u64);
        ptr::write_unaligned(dst as *mut u64, a);
        ptr::write_unaligned(dst.add(8) as *mut u64, b);
        ptr::write_unaligned(dst.add(n - 16) as *mut u64, c);
        ptr::write_unaligned(dst.add(n - 8) as *mut u64, d);
        return;
    }

    if n >= 8 {
        let a = ptr::read_unaligned(src as *const u64);
        let b = ptr::read_unaligned(src.add(n - 8) as *const u64);
        ptr::write_unaligned(dst as *mut u64, a);
        ptr::write_unaligned(dst.add(n - 8) as *mut u64, b);
        return;
    }

    if n >= 4 {
        let a = ptr::read_unaligned(src as *const u32);
        let b = ptr::read_unaligned(src.add(n - 4) as *const u32);
        ptr::write_unaligned(dst as *mut u32, a);
        ptr::write_unaligned(dst.add(n - 4) as *mut u32, b);
        return;
    }

    if n >= 2 {
        let a = ptr::read_unaligned(src as *const u16);
        let b = ptr::read_unaligned(src.add(n - 2) as *const u16);
        ptr::write_unaligned(dst as *mut u16, a);
        ptr::write_unaligned(dst.add(n - 2) as *mut u16, b);
        return;
    }

    if n == 1 {
        *dst = *src;
    }
}

/// Fills `n` (< 64) bytes with overlapping scalar stores.
#[inline(always)]
pub unsafe fn set_lt64(dst: *mut u8, byte: u8, n: usize) {
    let v64 = u64::from_ne_bytes([byte; 8]);

    if n >= 32 {
        ptr::write_unaligned(dst as *mut u64, v64);
        ptr::write_unaligned(dst.add(8) as *mut u64, v64);
        ptr::write_unaligned(dst.add(16) as *mut u64, v64);
        ptr::write_unaligned(dst.add(24) as *mut u64, v64);
        ptr::write_unaligned(dst.add(n - 32) as *mut u64, v64);
        ptr::write_unaligned(dst.add(n - 24) as *mut u64, v64);
        ptr::write_unaligned(dst.add(n - 16) as *mut u64, v64);
        ptr::write_unaligned(dst.add(n - 8) as *mut u64, v64);
        return;
    }

    if n >= 16 {
        ptr::write_unaligned(dst as *mut u64, v64);
        ptr::write_unaligned(dst.add(8) as *mut u64, v64);
        ptr::write_unaligned(dst.add(n - 16) as *mut u64, v64);
        ptr::write_unaligned(dst.add(n - 8) as *mut u64, v64);
        return;
    }

    if n >= 8 {
        ptr::write_unaligned(dst as *mut u64, v64);
        ptr::write_unaligned(dst.add(n - 8) as *mut u64, v64);
        return;
    }

    if n >= 4 {
        ptr::write_unaligned(dst as *mut u32, v64 as u32);
        ptr::write_unaligned(dst.add(n - 4) as *mut u32, v64 as u32);
        return;
    }

    if n >= 2 {
        ptr::write_unaligned(dst as *mut u16, v64 as u16);
        ptr::write_unaligned(dst.add(n - 2) as *mut u16, v64 as u16);
        return;
    }

    if n == 1 {
        *dst = byte;
    }
}

// =============================================================================
// PORTABLE: 8-byte SWAR lanes
// =============================================================================

/// Eight byte lanes packed into a `u64`, lane `i` being memory byte `i`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Swar(u64);

const LO7: u64 = 0x7F7F_7F7F_7F7F_7F7F;

impl Swar {
    /// High bit of each byte set iff that byte is zero. Exact for every lane
    /// (no borrow propagates between bytes).
    #[inline(always)]
    fn zero_bytes(x: u64) -> u64 {
        !(((x & LO7).wrapping_add(LO7)) | x | LO7)
    }

    /// Gathers the high bit of each byte into bits 0..8.
    #[inline(always)]
    fn movemask(hi_bits: u64) -> u64 {
        let t = if cfg!(target_endian = "big") { hi_bits.swap_bytes() } else { hi_bits };
        ((t >> 7).wrapping_mul(0x0102_0408_1020_4080)) >> 56
    }
}

impl Vector for Swar {
    const WIDTH: usize = 8;

    #[inline(always)]
    unsafe fn splat(byte: u8) -> Self {
        Swar(u64::from_ne_bytes([byte; 8]))
    }

    #[inline(always)]
    unsafe fn load(p: *const u8) -> Self {
        Swar(ptr::read_unaligned(p as *const u64))
    }

    #[inline(always)]
    unsafe fn load_aligned(p: *const u8) -> Self {
        Swar(ptr::read(p as *const u64))
    }

    #[inline(always)]
    unsafe fn store(p: *mut u8, v: Self) {
        ptr::write_unaligned(p as *mut u64, v.0);
    }

    #[inline(always)]
    unsafe fn store_aligned(p: *mut u8, v: Self) {
        ptr::write(p as *mut u64, v.0);
    }

    #[inline(always)]
    unsafe fn eq_mask(a: Self, b: Self) -> u64 {
        Self::movemask(Self::zero_bytes(a.0 ^ b.0))
    }

    #[inline(always)]
    unsafe fn zero_mask(a: Self) -> u64 {
        Self::movemask(Self::zero_bytes(a.0))
    }
}

#[cfg(target_arch = "x86_64")]
pub use x86::{V128, V256, V512};

#[cfg(target_arch = "x86_64")]
mod x86 {
    use super::{Vector, copy_lt64, low_mask, set_lt64};
    use core::arch::x86_64::*;

    // =========================================================================
    // SSE2
    // =========================================================================

    #[derive(Clone, Copy, Debug)]
    pub struct V128(__m128i);

    impl Vector for V128 {
        const WIDTH: usize = 16;

        #[inline(always)]
        unsafe fn splat(byte: u8) -> Self {
            V128(_mm_set1_epi8(byte as i8))
        }

        #[inline(always)]
        unsafe fn load(p: *const u8) -> Self {
            V128(_mm_loadu_si128(p as *const __m128i))
        }

        #[inline(always)]
        unsafe fn load_aligned(p: *const u8) -> Self {
            V128(_mm_load_si128(p as *const __m128i))
        }

        #[inline(always)]
        unsafe fn store(p: *mut u8, v: Self) {
            _mm_storeu_si128(p as *mut __m128i, v.0);
        }

        #[inline(always)]
        unsafe fn store_aligned(p: *mut u8, v: Self) {
            _mm_store_si128(p as *mut __m128i, v.0);
        }

        #[inline(always)]
        unsafe fn store_stream(p: *mut u8, v: Self) {
            _mm_stream_si128(p as *mut __m128i, v.0);
        }

        #[inline(always)]
        unsafe fn eq_mask(a: Self, b: Self) -> u64 {
            _mm_movemask_epi8(_mm_cmpeq_epi8(a.0, b.0)) as u32 as u64
        }

        #[inline(always)]
        unsafe fn zero_mask(a: Self) -> u64 {
            _mm_movemask_epi8(_mm_cmpeq_epi8(a.0, _mm_setzero_si128())) as u32 as u64
        }

        #[inline(always)]
        unsafe fn prefetch(p: *const u8) {
            _mm_prefetch::<_MM_HINT_T0>(p as *const i8);
        }

        #[inline(always)]
        unsafe fn store_fence() {
            _mm_sfence();
        }
    }

    // =========================================================================
    // AVX2
    // =========================================================================

    #[derive(Clone, Copy, Debug)]
    pub struct V256(__m256i);

    impl Vector for V256 {
        const WIDTH: usize = 32;

        #[inline(always)]
        unsafe fn splat(byte: u8) -> Self {
            V256(_mm256_set1_epi8(byte as i8))
        }

        #[inline(always)]
        unsafe fn load(p: *const u8) -> Self {
            V256(_mm256_loadu_si256(p as *const __m256i))
        }

        #[inline(always)]
        unsafe fn load_aligned(p: *const u8) -> Self {
            V256(_mm256_load_si256(p as *const __m256i))
        }

        #[inline(always)]
        unsafe fn store(p: *mut u8, v: Self) {
            _mm256_storeu_si256(p as *mut __m256i, v.0);
        }

        #[inline(always)]
        unsafe fn store_aligned(p: *mut u8, v: Self) {
            _mm256_store_si256(p as *mut __m256i, v.0);
        }

        #[inline(always)]
        unsafe fn store_stream(p: *mut u8, v: Self) {
            _mm256_stream_si256(p as *mut __m256i, v.0);
        }

        #[inline(always)]
        unsafe fn eq_mask(a: Self, b: Self) -> u64 {
            _mm256_movemask_epi8(_mm256_cmpeq_epi8(a.0, b.0)) as u32 as u64
        }

        #[inline(always)]
        unsafe fn zero_mask(a: Self) -> u64 {
            _mm256_movemask_epi8(_mm256_cmpeq_epi8(a.0, _mm256_setzero_si256())) as u32 as u64
        }

        #[inline(always)]
        unsafe fn copy_short(dst: *mut u8, src: *const u8, n: usize) {
            if n >= 16 {
                // 16-31 bytes: 2 x 16-byte loads/stores (overlapping)
                let v0 = _mm_loadu_si128(src as *const __m128i);
                let v1 = _mm_loadu_si128(src.add(n - 16) as *const __m128i);
                _mm_storeu_si128(dst as *mut __m128i, v0);
                _mm_storeu_si128(dst.add(n - 16) as *mut __m128i, v1);
                return;
            }
            copy_lt64(dst, src, n);
        }

        #[inline(always)]
        unsafe fn set_short(dst: *mut u8, byte: u8, n: usize) {
            if n >= 16 {
                let v = _mm_set1_epi8(byte as i8);
                _mm_storeu_si128(dst as *mut __m128i, v);
                _mm_storeu_si128(dst.add(n - 16) as *mut __m128i, v);
                return;
            }
            set_lt64(dst, byte, n);
        }

        #[inline(always)]
        unsafe fn prefetch(p: *const u8) {
            _mm_prefetch::<_MM_HINT_T0>(p as *const i8);
        }

        #[inline(always)]
        unsafe fn store_fence() {
            _mm_sfence();
        }
    }

    // =========================================================================
    // AVX-512BW
    // =========================================================================

    #[derive(Clone, Copy, Debug)]
    pub struct V512(__m512i);

    impl Vector for V512 {
        const WIDTH: usize = 64;

        #[inline(always)]
        unsafe fn splat(byte: u8) -> Self {
            V512(_mm512_set1_epi8(byte as i8))
        }

        #[inline(always)]
        unsafe fn load(p: *const u8) -> Self {
            V512(_mm512_loadu_epi8(p as *const i8))
        }

        #[inline(always)]
        unsafe fn load_aligned(p: *const u8) -> Self {
            V512(_mm512_load_epi32(p as *const i32))
        }

        // Masked-off lanes are not accessed, so faults cannot occur past `len`.
        #[inline(always)]
        unsafe fn load_partial(p: *const u8, len: usize) -> Self {
            V512(_mm512_maskz_loadu_epi8(low_mask(len), p as *const i8))
        }

        #[inline(always)]
        unsafe fn store(p: *mut u8, v: Self) {
            _mm512_storeu_epi8(p as *mut i8, v.0);
        }

        #[inline(always)]
        unsafe fn store_aligned(p: *mut u8, v: Self) {
            _mm512_store_epi32(p as *mut i32, v.0);
        }

        #[inline(always)]
        unsafe fn store_stream(p: *mut u8, v: Self) {
            let halves: [__m256i; 2] = core::mem::transmute(v.0);
            _mm256_stream_si256(p as *mut __m256i, halves[0]);
            _mm256_stream_si256(p.add(32) as *mut __m256i, halves[1]);
        }

        #[inline(always)]
        unsafe fn store_partial(p: *mut u8, v: Self, len: usize) {
            _mm512_mask_storeu_epi8(p as *mut i8, low_mask(len), v.0);
        }

        #[inline(always)]
        unsafe fn eq_mask(a: Self, b: Self) -> u64 {
            _mm512_cmpeq_epi8_mask(a.0, b.0)
        }

        #[inline(always)]
        unsafe fn zero_mask(a: Self) -> u64 {
            _mm512_testn_epi8_mask(a.0, a.0)
        }

        #[inline(always)]
        unsafe fn ne_mask(a: Self, b: Self) -> u64 {
            _mm512_cmpneq_epi8_mask(a.0, b.0)
        }

        #[inline(always)]
        unsafe fn copy_short(dst: *mut u8, src: *const u8, n: usize) {
            let k = low_mask(n);
            let v = _mm512_maskz_loadu_epi8(k, src as *const i8);
            _mm512_mask_storeu_epi8(dst as *mut i8, k, v);
        }

        #[inline(always)]
        unsafe fn set_short(dst: *mut u8, byte: u8, n: usize) {
            _mm512_mask_storeu_epi8(dst as *mut i8, low_mask(n), _mm512_set1_epi8(byte as i8));
        }

        #[inline(always)]
        unsafe fn prefetch(p: *const u8) {
            _mm_prefetch::<_MM_HINT_T0>(p as *const i8);
        }

        #[inline(always)]
        unsafe fn store_fence() {
            _mm_sfence();
        }
    }
}
