//! Binding of every public operation to one kernel variant.
//!
//! The [`Runtime`] (capabilities, thresholds, dispatch table) is built once
//! and stored in a [`OnceLock`]. Public entry points make one indirect call
//! through the [`DispatchTable`]; no further dispatch happens per call.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use tracing::{info, warn};

use crate::config::{ConfigError, Overrides};
use crate::cpu_features::{self, CpuFeatures};
use crate::threshold::{self, Thresholds};
use crate::variants;

/// Public operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Memcpy,
    Mempcpy,
    Memmove,
    Memset,
    Memcmp,
    Memchr,
    Strcpy,
    Strncpy,
    Strcat,
    Strncat,
    Strcmp,
    Strncmp,
    Strstr,
    Strlen,
    Strchr,
}

/// Operation families sharing a priority ladder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
    /// memcpy, mempcpy, memmove, memset
    CopySet,
    /// Everything that scans or compares.
    Scan,
}

impl Operation {
    pub const COUNT: usize = 15;

    pub const ALL: [Operation; Operation::COUNT] = [
        Operation::Memcpy,
        Operation::Mempcpy,
        Operation::Memmove,
        Operation::Memset,
        Operation::Memcmp,
        Operation::Memchr,
        Operation::Strcpy,
        Operation::Strncpy,
        Operation::Strcat,
        Operation::Strncat,
        Operation::Strcmp,
        Operation::Strncmp,
        Operation::Strstr,
        Operation::Strlen,
        Operation::Strchr,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Operation::Memcpy => "memcpy",
            Operation::Mempcpy => "mempcpy",
            Operation::Memmove => "memmove",
            Operation::Memset => "memset",
            Operation::Memcmp => "memcmp",
            Operation::Memchr => "memchr",
            Operation::Strcpy => "strcpy",
            Operation::Strncpy => "strncpy",
            Operation::Strcat => "strcat",
            Operation::Strncat => "strncat",
            Operation::Strcmp => "strcmp",
            Operation::Strncmp => "strncmp",
            Operation::Strstr => "strstr",
            Operation::Strlen => "strlen",
            Operation::Strchr => "strchr",
        }
    }

    pub const fn family(self) -> Family {
        match self {
            Operation::Memcpy | Operation::Mempcpy | Operation::Memmove | Operation::Memset => Family::CopySet,
            _ => Family::Scan,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| ConfigError::UnknownOperation(s.to_string()))
    }
}

/// Kernel variants, one per instruction-set generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    /// 64-byte AVX-512BW registers with masked loads/stores.
    Avx512,
    /// 32-byte AVX2 registers.
    Avx2,
    /// SSE2 small paths with `rep movsb`/`rep stosb` bulk (copy/set only).
    Erms,
    /// 16-byte SSE2 registers.
    Sse2,
    /// 8-byte SWAR over `u64`, any target.
    Portable,
}

const COPY_LADDER: [Variant; 5] = [Variant::Avx512, Variant::Avx2, Variant::Erms, Variant::Sse2, Variant::Portable];
const SCAN_LADDER: [Variant; 4] = [Variant::Avx512, Variant::Avx2, Variant::Sse2, Variant::Portable];

impl Variant {
    pub const ALL: [Variant; 5] = COPY_LADDER;

    pub const fn name(self) -> &'static str {
        match self {
            Variant::Avx512 => "avx512",
            Variant::Avx2 => "avx2",
            Variant::Erms => "erms",
            Variant::Sse2 => "sse2",
            Variant::Portable => "portable",
        }
    }

    /// Register width in bytes.
    pub const fn width(self) -> usize {
        match self {
            Variant::Avx512 => 64,
            Variant::Avx2 => 32,
            Variant::Erms | Variant::Sse2 => 16,
            Variant::Portable => 8,
        }
    }

    /// The running CPU can execute this variant.
    pub fn supported(self, features: &CpuFeatures) -> bool {
        match self {
            Variant::Avx512 => features.has_avx512(),
            Variant::Avx2 => features.flags.avx2,
            Variant::Erms => features.has_fast_rep() && features.flags.sse2,
            Variant::Sse2 => features.flags.sse2,
            Variant::Portable => true,
        }
    }

    /// The variant provides a distinct kernel for `op`.
    pub fn applies_to(self, op: Operation) -> bool {
        self != Variant::Erms || op.family() == Family::CopySet
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| ConfigError::UnknownVariant(s.to_string()))
    }
}

/// Picks the first variant on the operation's ladder the CPU supports.
pub fn resolve(op: Operation, features: &CpuFeatures) -> Variant {
    let ladder: &[Variant] = match op.family() {
        Family::CopySet => &COPY_LADDER,
        Family::Scan => &SCAN_LADDER,
    };
    ladder
        .iter()
        .copied()
        .find(|v| v.supported(features))
        .unwrap_or(Variant::Portable)
}

pub type CopyFn = unsafe fn(*mut u8, *const u8, usize) -> *mut u8;
pub type SetFn = unsafe fn(*mut u8, u8, usize) -> *mut u8;
pub type CmpFn = unsafe fn(*const u8, *const u8, usize) -> i32;
pub type ChrFn = unsafe fn(*const u8, u8, usize) -> *mut u8;
pub type StrCopyFn = unsafe fn(*mut u8, *const u8) -> *mut u8;
pub type StrCmpFn = unsafe fn(*const u8, *const u8) -> i32;
pub type StrStrFn = unsafe fn(*const u8, *const u8) -> *mut u8;
pub type StrLenFn = unsafe fn(*const u8) -> usize;
pub type StrChrFn = unsafe fn(*const u8, u8) -> *mut u8;

/// One entry point per operation.
#[derive(Clone, Copy, Debug)]
pub struct DispatchTable {
    pub memcpy: CopyFn,
    pub mempcpy: CopyFn,
    pub memmove: CopyFn,
    pub memset: SetFn,
    pub memcmp: CmpFn,
    pub memchr: ChrFn,
    pub strcpy: StrCopyFn,
    pub strncpy: CopyFn,
    pub strcat: StrCopyFn,
    pub strncat: CopyFn,
    pub strcmp: StrCmpFn,
    pub strncmp: CmpFn,
    pub strstr: StrStrFn,
    pub strlen: StrLenFn,
    pub strchr: StrChrFn,
}

impl DispatchTable {
    /// Every operation bound to `variant`. For [`Variant::Erms`] the scan
    /// family is bound to the SSE2 kernels.
    ///
    /// The caller must make sure the CPU supports `variant` before calling
    /// through the table.
    pub fn for_variant(variant: Variant) -> &'static DispatchTable {
        #[cfg(target_arch = "x86_64")]
        {
            match variant {
                Variant::Avx512 => &variants::AVX512,
                Variant::Avx2 => &variants::AVX2,
                Variant::Erms => &variants::ERMS,
                Variant::Sse2 => &variants::SSE2,
                Variant::Portable => &variants::PORTABLE,
            }
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            let _ = variant;
            &variants::PORTABLE
        }
    }

    /// Copies the entry for `op` from `from`.
    fn bind(&mut self, op: Operation, from: &DispatchTable) {
        match op {
            Operation::Memcpy => self.memcpy = from.memcpy,
            Operation::Mempcpy => self.mempcpy = from.mempcpy,
            Operation::Memmove => self.memmove = from.memmove,
            Operation::Memset => self.memset = from.memset,
            Operation::Memcmp => self.memcmp = from.memcmp,
            Operation::Memchr => self.memchr = from.memchr,
            Operation::Strcpy => self.strcpy = from.strcpy,
            Operation::Strncpy => self.strncpy = from.strncpy,
            Operation::Strcat => self.strcat = from.strcat,
            Operation::Strncat => self.strncat = from.strncat,
            Operation::Strcmp => self.strcmp = from.strcmp,
            Operation::Strncmp => self.strncmp = from.strncmp,
            Operation::Strstr => self.strstr = from.strstr,
            Operation::Strlen => self.strlen = from.strlen,
            Operation::Strchr => self.strchr = from.strchr,
        }
    }
}

/// Capabilities, thresholds and bindings for the process.
#[derive(Debug)]
pub struct Runtime {
    pub features: CpuFeatures,
    pub thresholds: Thresholds,
    pub table: DispatchTable,
    pub bindings: [Variant; Operation::COUNT],
    pub overrides: Overrides,
}

impl Runtime {
    /// Resolves every operation. An override naming a variant the CPU lacks,
    /// or one that has no kernel for that operation, is ignored.
    pub fn new(features: CpuFeatures, overrides: Overrides) -> Self {
        let thresholds = threshold::compute_thresholds(&features, &overrides);
        let mut table = variants::PORTABLE;
        let mut bindings = [Variant::Portable; Operation::COUNT];

        for op in Operation::ALL {
            let requested = overrides.operation(op).filter(|&v| {
                let usable = v.supported(&features) && v.applies_to(op);
                if !usable {
                    warn!(operation = op.name(), variant = v.name(), "override not usable on this CPU, ignoring");
                }
                usable
            });
            let variant = requested.unwrap_or_else(|| resolve(op, &features));
            table.bind(op, DispatchTable::for_variant(variant));
            bindings[op.index()] = variant;
            info!(operation = op.name(), variant = variant.name(), "bound");
        }

        Self { features, thresholds, table, bindings, overrides }
    }

    /// Detects the CPU and reads the environment overrides.
    pub fn from_env() -> Self {
        Self::new(cpu_features::detect(), Overrides::from_env())
    }

    pub fn binding(&self, op: Operation) -> Variant {
        self.bindings[op.index()]
    }
}

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// The process runtime, initializing it on first use.
pub fn runtime() -> &'static Runtime {
    RUNTIME.get_or_init(Runtime::from_env)
}

/// The process runtime if initialization has completed.
pub fn try_runtime() -> Option<&'static Runtime> {
    RUNTIME.get()
}

/// Thresholds for kernels: the process values once initialized, the
/// baseline before.
#[inline]
pub fn thresholds() -> &'static Thresholds {
    match RUNTIME.get() {
        Some(rt) => &rt.thresholds,
        None => &Thresholds::BASELINE,
    }
}

/// The table behind the public entry points.
#[cfg(not(feature = "c-abi"))]
#[inline]
pub(crate) fn table() -> &'static DispatchTable {
    &runtime().table
}

/// The table behind the exported symbols. Calls arriving while the runtime
/// is being built (from the allocator, say) use the portable kernels instead
/// of re-entering initialization.
#[cfg(feature = "c-abi")]
#[inline]
pub(crate) fn table() -> &'static DispatchTable {
    match RUNTIME.get() {
        Some(rt) => &rt.table,
        None => &variants::PORTABLE,
    }
}
