//! CPU vendor, instruction-set and cache-geometry detection.
//!
//! [`detect`] queries CPUID once; the result is cached by the dispatch
//! runtime and never mutated. An unrecognized vendor (or a non-x86_64 target)
//! yields [`CpuFeatures::baseline`], which routes every operation to the
//! portable kernels.

use tracing::{debug, info};

/// CPU vendor as reported by CPUID leaf 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vendor {
    Amd,
    Intel,
    Unknown,
}

/// Instruction-set extensions relevant to the memory kernels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeatureFlags {
    pub sse2: bool,
    pub avx2: bool,
    pub avx512f: bool,
    pub avx512bw: bool,
    /// Enhanced `rep movsb`/`rep stosb`.
    pub erms: bool,
    /// Fast short `rep movsb`.
    pub fsrm: bool,
    pub movdiri: bool,
    pub vpclmulqdq: bool,
    pub rdpid: bool,
    pub rdseed: bool,
}

impl FeatureFlags {
    /// Decodes CPUID leaf 7 subleaf 0.
    pub fn from_leaf7(ebx: u32, ecx: u32, edx: u32) -> Self {
        let bit = |reg: u32, n: u32| reg & (1 << n) != 0;
        Self {
            sse2: false,
            avx2: bit(ebx, 5),
            avx512f: bit(ebx, 16),
            avx512bw: bit(ebx, 30),
            erms: bit(ebx, 9),
            fsrm: bit(edx, 4),
            movdiri: bit(ecx, 27),
            vpclmulqdq: bit(ecx, 10),
            rdpid: bit(ecx, 22),
            rdseed: bit(ebx, 18),
        }
    }

    fn enabled(&self) -> impl Iterator<Item = &'static str> {
        [
            ("SSE2", self.sse2),
            ("AVX2", self.avx2),
            ("AVX512F", self.avx512f),
            ("AVX512BW", self.avx512bw),
            ("ERMS", self.erms),
            ("FSRM", self.fsrm),
            ("MOVDIRI", self.movdiri),
            ("VPCLMULQDQ", self.vpclmulqdq),
            ("RDPID", self.rdpid),
            ("RDSEED", self.rdseed),
        ]
        .into_iter()
        .filter_map(|(name, on)| on.then_some(name))
    }
}

/// Cache sizes in bytes. L1d and L2 are per core; L3 is the size of the
/// slice shared by one core cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheInfo {
    pub l1d: usize,
    pub l2: usize,
    pub l3: usize,
}

impl CacheInfo {
    pub const DEFAULT: CacheInfo = CacheInfo {
        l1d: 32 * 1024,
        l2: 1024 * 1024,
        l3: 32 * 1024 * 1024,
    };
}

impl Default for CacheInfo {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Everything the threshold policy and the dispatcher need to know about the
/// running CPU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CpuFeatures {
    pub vendor: Vendor,
    pub flags: FeatureFlags,
    pub cache: CacheInfo,
}

impl CpuFeatures {
    /// No vector extensions, default cache geometry.
    pub const fn baseline() -> Self {
        Self {
            vendor: Vendor::Unknown,
            flags: FeatureFlags {
                sse2: false,
                avx2: false,
                avx512f: false,
                avx512bw: false,
                erms: false,
                fsrm: false,
                movdiri: false,
                vpclmulqdq: false,
                rdpid: false,
                rdseed: false,
            },
            cache: CacheInfo::DEFAULT,
        }
    }

    pub fn has_avx512(&self) -> bool {
        self.flags.avx512f && self.flags.avx512bw
    }

    /// `rep movsb`/`rep stosb` are worth using for bulk ranges.
    pub fn has_fast_rep(&self) -> bool {
        self.flags.erms || self.flags.fsrm
    }

    /// Width in bytes of the widest usable vector register.
    pub fn vector_width(&self) -> usize {
        if self.has_avx512() {
            64
        } else if self.flags.avx2 {
            32
        } else if self.flags.sse2 {
            16
        } else {
            8
        }
    }
}

impl Default for CpuFeatures {
    fn default() -> Self {
        Self::baseline()
    }
}

/// Decodes the vendor string held in EBX, EDX, ECX of leaf 0.
pub fn vendor_from_leaf0(ebx: u32, ecx: u32, edx: u32) -> Vendor {
    let mut id = [0u8; 12];
    id[..4].copy_from_slice(&ebx.to_le_bytes());
    id[4..8].copy_from_slice(&edx.to_le_bytes());
    id[8..].copy_from_slice(&ecx.to_le_bytes());
    match &id {
        b"AuthenticAMD" => Vendor::Amd,
        b"GenuineIntel" => Vendor::Intel,
        _ => Vendor::Unknown,
    }
}

/// One subleaf of the deterministic cache-parameters leaf
/// (AMD `0x8000_001D`, Intel `4`; both share the register layout).
#[derive(Clone, Copy, Debug)]
pub struct CacheLeaf {
    pub eax: u32,
    pub ebx: u32,
    pub ecx: u32,
}

impl CacheLeaf {
    /// 0 = no more caches, 1 = data, 2 = instruction, 3 = unified.
    fn kind(&self) -> u32 {
        self.eax & 0x1F
    }

    fn level(&self) -> u32 {
        (self.eax >> 5) & 0x7
    }

    /// ways × partitions × line size × sets.
    fn size(&self) -> usize {
        let line = (self.ebx & 0xFFF) as usize + 1;
        let partitions = ((self.ebx >> 12) & 0x3FF) as usize + 1;
        let ways = ((self.ebx >> 22) & 0x3FF) as usize + 1;
        let sets = self.ecx as usize + 1;
        ways * partitions * line * sets
    }
}

/// Folds the cache-parameter subleaves into a [`CacheInfo`]. Stops at the
/// first null entry; levels that never appear keep their defaults.
pub fn cache_from_leaves(leaves: impl IntoIterator<Item = CacheLeaf>) -> CacheInfo {
    let mut info = CacheInfo::DEFAULT;
    for leaf in leaves {
        match (leaf.kind(), leaf.level()) {
            (0, _) => break,
            (2, _) => {}
            (_, 1) => info.l1d = leaf.size(),
            (_, 2) => info.l2 = leaf.size(),
            (_, 3) => info.l3 = leaf.size(),
            _ => {}
        }
    }
    info
}

/// Queries the running CPU. Logs the vendor and every enabled feature.
pub fn detect() -> CpuFeatures {
    let features = detect_arch();
    match features.vendor {
        Vendor::Amd => info!("Is AMD CPU"),
        Vendor::Intel => info!("Is Intel CPU"),
        Vendor::Unknown => info!("CPU vendor not recognized, using portable kernels"),
    }
    for name in features.flags.enabled() {
        info!("CPU feature {name} enabled");
    }
    debug!(
        vector_width = features.vector_width(),
        l1d = features.cache.l1d,
        l2 = features.cache.l2,
        l3 = features.cache.l3,
        "register width and cache geometry"
    );
    features
}

#[cfg(target_arch = "x86_64")]
#[allow(unused_unsafe)]
fn detect_arch() -> CpuFeatures {
    use core::arch::x86_64::{__cpuid, __cpuid_count};

    // SAFETY: CPUID is available on every x86_64 processor.
    let leaf0 = unsafe { __cpuid(0) };
    let vendor = vendor_from_leaf0(leaf0.ebx, leaf0.ecx, leaf0.edx);
    if vendor == Vendor::Unknown {
        return CpuFeatures::baseline();
    }

    let mut flags = if leaf0.eax >= 7 {
        // SAFETY: leaf 7 is supported (max basic leaf checked above).
        let l7 = unsafe { __cpuid_count(7, 0) };
        FeatureFlags::from_leaf7(l7.ebx, l7.ecx, l7.edx)
    } else {
        FeatureFlags::default()
    };

    // CPUID reports silicon support; the OS must also save the wider register
    // state, which `is_x86_feature_detected!` checks through XGETBV.
    flags.sse2 = std::is_x86_feature_detected!("sse2");
    flags.avx2 &= std::is_x86_feature_detected!("avx2");
    flags.avx512f &= std::is_x86_feature_detected!("avx512f");
    flags.avx512bw &= std::is_x86_feature_detected!("avx512bw");

    let (cache_leaf, available) = match vendor {
        Vendor::Amd => {
            // SAFETY: extended leaf 0x8000_0000 always exists on x86_64.
            let max_ext = unsafe { __cpuid(0x8000_0000) }.eax;
            let topo_ext = max_ext >= 0x8000_0001
                && unsafe { __cpuid(0x8000_0001) }.ecx & (1 << 22) != 0;
            (0x8000_001D, topo_ext && max_ext >= 0x8000_001D)
        }
        _ => (4, leaf0.eax >= 4),
    };

    let cache = if available {
        cache_from_leaves((0..8).map(|sub| {
            // SAFETY: leaf availability checked above.
            let r = unsafe { __cpuid_count(cache_leaf, sub) };
            CacheLeaf { eax: r.eax, ebx: r.ebx, ecx: r.ecx }
        }))
    } else {
        CacheInfo::DEFAULT
    };

    CpuFeatures { vendor, flags, cache }
}

#[cfg(not(target_arch = "x86_64"))]
fn detect_arch() -> CpuFeatures {
    CpuFeatures::baseline()
}
