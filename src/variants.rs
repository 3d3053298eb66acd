//! Per-variant entry points.
//!
//! Each kernel is written once, generic over [`Vector`](crate::simd::Vector).
//! The macros below instantiate it per register type inside a
//! `#[target_feature]` function so the generic code is compiled for that
//! instruction set, and collect the instances into one [`DispatchTable`] per
//! variant.
#![allow(unsafe_code)]

use crate::dispatch::DispatchTable;

/// memcpy, mempcpy, memmove, memset. `$copy`/`$store` build the bulk policy
/// from the process thresholds.
macro_rules! copy_entries {
    ($V:ty, $copy:path, $store:path $(, $feature:literal)?) => {
        use crate::dispatch;
        use crate::memcpy::BulkPolicy;
        use crate::threshold::Thresholds;

        $(#[target_feature(enable = $feature)])?
        pub unsafe fn memcpy_with(dst: *mut u8, src: *const u8, n: usize, t: &Thresholds) -> *mut u8 {
            crate::memcpy::memcpy::<$V>(dst, src, n, &$copy(t))
        }

        $(#[target_feature(enable = $feature)])?
        pub unsafe fn memmove_with(dst: *mut u8, src: *const u8, n: usize, t: &Thresholds) -> *mut u8 {
            crate::memmove::memmove::<$V>(dst, src, n, &$copy(t))
        }

        $(#[target_feature(enable = $feature)])?
        pub unsafe fn memset_with(dst: *mut u8, value: u8, n: usize, t: &Thresholds) -> *mut u8 {
            crate::memset::memset::<$V>(dst, value, n, &$store(t))
        }

        $(#[target_feature(enable = $feature)])?
        pub unsafe fn memcpy(dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
            memcpy_with(dst, src, n, dispatch::thresholds())
        }

        $(#[target_feature(enable = $feature)])?
        pub unsafe fn mempcpy(dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
            crate::memcpy::mempcpy::<$V>(dst, src, n, &$copy(dispatch::thresholds()))
        }

        $(#[target_feature(enable = $feature)])?
        pub unsafe fn memmove(dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
            memmove_with(dst, src, n, dispatch::thresholds())
        }

        $(#[target_feature(enable = $feature)])?
        pub unsafe fn memset(dst: *mut u8, value: u8, n: usize) -> *mut u8 {
            memset_with(dst, value, n, dispatch::thresholds())
        }
    };
}

/// memcmp, memchr and the string family.
macro_rules! scan_entries {
    ($V:ty $(, $feature:literal)?) => {
        $(#[target_feature(enable = $feature)])?
        pub unsafe fn memcmp(a: *const u8, b: *const u8, n: usize) -> i32 {
            crate::memcmp::memcmp::<$V>(a, b, n)
        }

        $(#[target_feature(enable = $feature)])?
        pub unsafe fn memchr(s: *const u8, c: u8, n: usize) -> *mut u8 {
            crate::memchr::memchr::<$V>(s, c, n)
        }

        $(#[target_feature(enable = $feature)])?
        pub unsafe fn strcpy(dst: *mut u8, src: *const u8) -> *mut u8 {
            crate::strcpy::strcpy::<$V>(dst, src)
        }

        $(#[target_feature(enable = $feature)])?
        pub unsafe fn strncpy(dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
            let fill = crate::memcpy::BulkPolicy::store(crate::dispatch::thresholds());
            crate::strcpy::strncpy::<$V>(dst, src, n, &fill)
        }

        $(#[target_feature(enable = $feature)])?
        pub unsafe fn strcat(dst: *mut u8, src: *const u8) -> *mut u8 {
            crate::strcpy::strcat::<$V>(dst, src)
        }

        $(#[target_feature(enable = $feature)])?
        pub unsafe fn strncat(dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
            crate::strcpy::strncat::<$V>(dst, src, n)
        }

        $(#[target_feature(enable = $feature)])?
        pub unsafe fn strcmp(a: *const u8, b: *const u8) -> i32 {
            crate::strcmp::strcmp::<$V>(a, b)
        }

        $(#[target_feature(enable = $feature)])?
        pub unsafe fn strncmp(a: *const u8, b: *const u8, n: usize) -> i32 {
            crate::strcmp::strncmp::<$V>(a, b, n)
        }

        $(#[target_feature(enable = $feature)])?
        pub unsafe fn strstr(haystack: *const u8, needle: *const u8) -> *mut u8 {
            crate::strstr::strstr::<$V>(haystack, needle)
        }

        $(#[target_feature(enable = $feature)])?
        pub unsafe fn strlen(s: *const u8) -> usize {
            crate::strlen::strlen::<$V>(s)
        }

        $(#[target_feature(enable = $feature)])?
        pub unsafe fn strchr(s: *const u8, c: u8) -> *mut u8 {
            crate::strlen::strchr::<$V>(s, c)
        }
    };
}

/// Table from a copy-family module and a scan-family module.
macro_rules! table {
    ($copy:ident, $scan:ident) => {
        DispatchTable {
            memcpy: $copy::memcpy,
            mempcpy: $copy::mempcpy,
            memmove: $copy::memmove,
            memset: $copy::memset,
            memcmp: $scan::memcmp,
            memchr: $scan::memchr,
            strcpy: $scan::strcpy,
            strncpy: $scan::strncpy,
            strcat: $scan::strcat,
            strncat: $scan::strncat,
            strcmp: $scan::strcmp,
            strncmp: $scan::strncmp,
            strstr: $scan::strstr,
            strlen: $scan::strlen,
            strchr: $scan::strchr,
        }
    };
}

pub mod portable {
    copy_entries!(crate::simd::Swar, BulkPolicy::copy, BulkPolicy::store);
    scan_entries!(crate::simd::Swar);
}

#[cfg(target_arch = "x86_64")]
pub mod sse2 {
    copy_entries!(crate::simd::V128, BulkPolicy::copy, BulkPolicy::store, "sse2");
    scan_entries!(crate::simd::V128, "sse2");
}

/// SSE2 small paths, `rep movsb`/`rep stosb` for the bulk.
#[cfg(target_arch = "x86_64")]
pub mod erms {
    copy_entries!(crate::simd::V128, BulkPolicy::copy_rep, BulkPolicy::store_rep, "sse2");
}

#[cfg(target_arch = "x86_64")]
pub mod avx2 {
    copy_entries!(crate::simd::V256, BulkPolicy::copy, BulkPolicy::store, "avx2");
    scan_entries!(crate::simd::V256, "avx2");
}

#[cfg(target_arch = "x86_64")]
pub mod avx512 {
    copy_entries!(crate::simd::V512, BulkPolicy::copy, BulkPolicy::store, "avx512f,avx512bw");
    scan_entries!(crate::simd::V512, "avx512f,avx512bw");
}

pub const PORTABLE: DispatchTable = table!(portable, portable);
#[cfg(target_arch = "x86_64")]
pub const SSE2: DispatchTable = table!(sse2, sse2);
#[cfg(target_arch = "x86_64")]
pub const ERMS: DispatchTable = table!(erms, sse2);
#[cfg(target_arch = "x86_64")]
pub const AVX2: DispatchTable = table!(avx2, avx2);
#[cfg(target_arch = "x86_64")]
pub const AVX512: DispatchTable = table!(avx512, avx512);


#[cfg(test)]
pub(crate) use with_thresholds::{memcpy_with, memmove_with, memset_with};
