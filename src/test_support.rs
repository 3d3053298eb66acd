//! Fixtures shared by the kernel tests.
#![allow(unsafe_code)]

use crate::cpu_features;
use crate::dispatch::Variant;
use crate::simd::PAGE_SIZE;

/// Deterministic non-repeating-at-power-of-two byte pattern.
pub(crate) fn pattern(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i % 251) as u8).collect()
}

/// Variants the running CPU can execute.
pub(crate) fn supported_variants() -> Vec<Variant> {
    let features = cpu_features::detect();
    Variant::ALL.into_iter().filter(|v| v.supported(&features)).collect()
}

/// One readable page followed by an inaccessible one, so a kernel that
/// reads past the end of its input faults instead of passing silently.
///
/// Off Linux the guard page is not available and this is a plain buffer.
pub(crate) struct PageBuf {
    page: *mut u8,
    #[cfg(not(target_os = "linux"))]
    _backing: Vec<u8>,
}

impl PageBuf {
    #[cfg(target_os = "linux")]
    pub(crate) fn new() -> Self {
        // SAFETY: anonymous private mapping; the result is checked.
        unsafe {
            let base = libc::mmap(
                core::ptr::null_mut(),
                2 * PAGE_SIZE,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            );
            assert_ne!(base, libc::MAP_FAILED, "mmap failed");
            let base = base as *mut u8;
            let rc = libc::mprotect(base.add(PAGE_SIZE) as *mut libc::c_void, PAGE_SIZE, libc::PROT_NONE);
            assert_eq!(rc, 0, "mprotect failed");
            Self { page: base }
        }
    }

    #[cfg(not(target_os = "linux"))]
    pub(crate) fn new() -> Self {
        let mut backing = vec![0u8; PAGE_SIZE];
        Self { page: backing.as_mut_ptr(), _backing: backing }
    }

    /// Writes `len` copies of `fill` and a terminator so the terminator is
    /// the last readable byte. Returns the string's start.
    pub(crate) fn c_string_at_end(&self, len: usize, fill: u8) -> *const u8 {
        assert!(len < PAGE_SIZE);
        // SAFETY: the written range lies inside the readable page.
        unsafe {
            let start = self.page.add(PAGE_SIZE - len - 1);
            core::ptr::write_bytes(start, fill, len);
            *start.add(len) = 0;
            start
        }
    }

    /// Fills the last `n` readable bytes with `byte`, no terminator.
    pub(crate) fn fill_at_end(&self, n: usize, byte: u8) -> *const u8 {
        assert!(n <= PAGE_SIZE);
        // SAFETY: the written range lies inside the readable page.
        unsafe {
            let start = self.page.add(PAGE_SIZE - n);
            core::ptr::write_bytes(start, byte, n);
            start
        }
    }
}

#[cfg(target_os = "linux")]
impl Drop for PageBuf {
    fn drop(&mut self) {
        // SAFETY: the mapping was created in `new` with this size.
        unsafe {
            libc::munmap(self.page as *mut libc::c_void, 2 * PAGE_SIZE);
        }
    }
}
