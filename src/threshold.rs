//! Size breakpoints separating the kernel regimes.
//!
//! Sizes up to eight registers are handled by fixed multiples of the vector
//! width inside each kernel and are not configurable. The bulk breakpoints
//! (short-rep, prefetch, non-temporal) come from the cache geometry:
//!
//! | breakpoint | default |
//! |---|---|
//! | `repmov_start` / `repstore_start` | L2 / 2 + 2 KiB |
//! | `nt_start` / `nt_store_start` | 3/4 of the L3 cluster slice |
//! | `repmov_stop` / `repstore_stop` | the non-temporal start |
//! | `prefetch_start` | L2 |
//!
//! The constants were measured, not derived; re-tune them per platform.

use tracing::debug;

use crate::config::{Overrides, ThresholdOverride};
use crate::cpu_features::{CacheInfo, CpuFeatures};

const REP_MARGIN: usize = 2 * 1024;

/// Process-wide size breakpoints in bytes. Ranges are half-open:
/// a size `n` uses `rep movsb` iff `repmov_start <= n < repmov_stop`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Thresholds {
    pub repmov_start: usize,
    pub repmov_stop: usize,
    pub nt_start: usize,
    pub prefetch_start: usize,
    pub repstore_start: usize,
    pub repstore_stop: usize,
    pub nt_store_start: usize,
}

impl Thresholds {
    /// Thresholds used before detection has run: default caches, no
    /// short-rep range.
    pub const BASELINE: Thresholds = Thresholds::from_cache(CacheInfo::DEFAULT, false);

    /// Derives every breakpoint from the cache geometry.
    pub const fn from_cache(cache: CacheInfo, fast_rep: bool) -> Self {
        let nt = cache.l3 / 4 * 3;
        let rep = cache.l2 / 2 + REP_MARGIN;
        let (rep_start, rep_stop) = if fast_rep { (rep, nt) } else { (usize::MAX, usize::MAX) };
        Self {
            repmov_start: rep_start,
            repmov_stop: rep_stop,
            nt_start: nt,
            prefetch_start: cache.l2,
            repstore_start: rep_start,
            repstore_stop: rep_stop,
            nt_store_start: nt,
        }
    }

    /// Applies a user-supplied threshold triple verbatim to both the copy
    /// and the set family.
    pub fn with_override(mut self, o: &ThresholdOverride) -> Self {
        self.repmov_start = o.rep_start;
        self.repmov_stop = o.rep_end;
        self.nt_start = o.nt_start;
        self.repstore_start = o.rep_start;
        self.repstore_stop = o.rep_end;
        self.nt_store_start = o.nt_start;
        self
    }

    /// `n` falls in the short-rep copy range.
    #[inline(always)]
    pub fn rep_copy(&self, n: usize) -> bool {
        n >= self.repmov_start && n < self.repmov_stop
    }

    /// `n` falls in the short-rep store range.
    #[inline(always)]
    pub fn rep_store(&self, n: usize) -> bool {
        n >= self.repstore_start && n < self.repstore_stop
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::BASELINE
    }
}

/// Computes the process-wide thresholds.
///
/// An operation override pins the static baseline (default geometry) and
/// skips the cache-derived values; a threshold override replaces the bulk
/// breakpoints verbatim.
pub fn compute_thresholds(features: &CpuFeatures, overrides: &Overrides) -> Thresholds {
    let fast_rep = features.has_fast_rep();

    let thresholds = if overrides.has_operations() {
        Thresholds::from_cache(CacheInfo::DEFAULT, fast_rep)
    } else if let Some(o) = &overrides.threshold {
        Thresholds::from_cache(CacheInfo::DEFAULT, fast_rep).with_override(o)
    } else {
        Thresholds::from_cache(features.cache, fast_rep)
    };

    debug!(?thresholds, "computed thresholds");
    thresholds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu_features::{FeatureFlags, Vendor};
    use crate::dispatch::{Operation, Variant};

    fn zen4() -> CpuFeatures {
        CpuFeatures {
            vendor: Vendor::Amd,
            flags: FeatureFlags {
                sse2: true,
                avx2: true,
                avx512f: true,
                avx512bw: true,
                erms: true,
                fsrm: true,
                ..FeatureFlags::default()
            },
            cache: CacheInfo { l1d: 32 * 1024, l2: 1024 * 1024, l3: 32 * 1024 * 1024 },
        }
    }

    #[test]
    fn test_cache_derived_breakpoints() {
        let mut f = zen4();
        f.cache.l2 = 2 * 1024 * 1024;
        f.cache.l3 = 96 * 1024 * 1024;
        let t = compute_thresholds(&f, &Overrides::default());
        assert_eq!(t.repmov_start, 1024 * 1024 + 2048);
        assert_eq!(t.nt_start, 72 * 1024 * 1024);
        assert_eq!(t.repmov_stop, t.nt_start);
        assert_eq!(t.prefetch_start, 2 * 1024 * 1024);
        assert_eq!(t.repstore_start, t.repmov_start);
        assert_eq!(t.nt_store_start, t.nt_start);
    }

    #[test]
    fn test_no_fast_rep_disables_rep_range() {
        let mut f = zen4();
        f.flags.erms = false;
        f.flags.fsrm = false;
        let t = compute_thresholds(&f, &Overrides::default());
        assert!(!t.rep_copy(t.nt_start - 1));
        assert!(!t.rep_store(1 << 20));
        assert!(!t.rep_copy(usize::MAX - 1));
    }

    #[test]
    fn test_rep_range_is_half_open() {
        let t = compute_thresholds(&zen4(), &Overrides::default());
        assert!(!t.rep_copy(t.repmov_start - 1));
        assert!(t.rep_copy(t.repmov_start));
        assert!(t.rep_copy(t.repmov_stop - 1));
        assert!(!t.rep_copy(t.repmov_stop));
    }

    #[test]
    fn test_operation_override_uses_baseline_geometry() {
        let mut f = zen4();
        f.cache.l3 = 256 * 1024 * 1024;
        let mut o = Overrides::default();
        o.set_operation(Operation::Memcpy, Variant::Erms);
        let t = compute_thresholds(&f, &o);
        assert_eq!(t, Thresholds::from_cache(CacheInfo::DEFAULT, true));
    }

    #[test]
    fn test_threshold_override_is_verbatim() {
        let o = Overrides {
            threshold: Some(ThresholdOverride {
                rep_start: 4096,
                rep_end: 1 << 20,
                nt_start: 1 << 20,
            }),
            ..Overrides::default()
        };
        let t = compute_thresholds(&zen4(), &o);
        assert_eq!((t.repmov_start, t.repmov_stop, t.nt_start), (4096, 1 << 20, 1 << 20));
        assert_eq!((t.repstore_start, t.repstore_stop, t.nt_store_start), (4096, 1 << 20, 1 << 20));
    }

    #[test]
    fn test_baseline_constant() {
        let t = Thresholds::BASELINE;
        assert_eq!(t.repmov_stop, usize::MAX);
        assert_eq!(t.repmov_start, usize::MAX);
        assert_eq!(t.nt_start, 24 * 1024 * 1024);
    }
}
