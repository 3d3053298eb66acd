//! The routines exported under their C symbol names, for `LD_PRELOAD` or
//! static interposition over the platform C library.
//!
//! The crate is built with `no_builtins` when this module is enabled, so the
//! kernels cannot be lowered back into calls to these symbols.
#![allow(unsafe_code)]
#![allow(clippy::missing_safety_doc)]

use core::ffi::{c_char, c_int, c_void};

use crate::dispatch::table;

#[unsafe(no_mangle)]
pub unsafe extern "C" fn memcpy(dst: *mut c_void, src: *const c_void, n: usize) -> *mut c_void {
    (table().memcpy)(dst.cast(), src.cast(), n).cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mempcpy(dst: *mut c_void, src: *const c_void, n: usize) -> *mut c_void {
    (table().mempcpy)(dst.cast(), src.cast(), n).cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn memmove(dst: *mut c_void, src: *const c_void, n: usize) -> *mut c_void {
    (table().memmove)(dst.cast(), src.cast(), n).cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn memset(dst: *mut c_void, c: c_int, n: usize) -> *mut c_void {
    (table().memset)(dst.cast(), c as u8, n).cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn memcmp(a: *const c_void, b: *const c_void, n: usize) -> c_int {
    (table().memcmp)(a.cast(), b.cast(), n)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn memchr(s: *const c_void, c: c_int, n: usize) -> *mut c_void {
    (table().memchr)(s.cast(), c as u8, n).cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn strcpy(dst: *mut c_char, src: *const c_char) -> *mut c_char {
    (table().strcpy)(dst.cast(), src.cast()).cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn strncpy(dst: *mut c_char, src: *const c_char, n: usize) -> *mut c_char {
    (table().strncpy)(dst.cast(), src.cast(), n).cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn strcat(dst: *mut c_char, src: *const c_char) -> *mut c_char {
    (table().strcat)(dst.cast(), src.cast()).cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn strncat(dst: *mut c_char, src: *const c_char, n: usize) -> *mut c_char {
    (table().strncat)(dst.cast(), src.cast(), n).cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn strcmp(a: *const c_char, b: *const c_char) -> c_int {
    (table().strcmp)(a.cast(), b.cast())
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn strncmp(a: *const c_char, b: *const c_char, n: usize) -> c_int {
    (table().strncmp)(a.cast(), b.cast(), n)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn strstr(haystack: *const c_char, needle: *const c_char) -> *mut c_char {
    (table().strstr)(haystack.cast(), needle.cast()).cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn strlen(s: *const c_char) -> usize {
    (table().strlen)(s.cast())
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn strchr(s: *const c_char, c: c_int) -> *mut c_char {
    (table().strchr)(s.cast(), c as u8).cast()
}

// Load-time constructor: bind the kernels before `main`.
#[cfg(target_os = "linux")]
#[used]
#[unsafe(link_section = ".init_array")]
static INIT: extern "C" fn() = init;

#[cfg(target_os = "linux")]
extern "C" fn init() {
    crate::dispatch::runtime();
}
