//! Environment overrides, read once at initialization.
//!
//! Two variables are recognized:
//!
//! - `LIBMEM_OPERATIONS`: a bare variant name applied to every operation
//!   (`avx2`), or a comma-separated list of `operation:variant` pairs
//!   (`memcpy:erms,strlen:sse2`).
//! - `LIBMEM_THRESHOLD`: three half-open ranges for the vector, short-rep and
//!   non-temporal regimes, `[0,2048):[2048,1048576):[1048576,-1)`, where `-1`
//!   means unbounded. The vector regime is fixed by the register width, so
//!   the first range only has to be well-formed and ordered before the
//!   others. Ignored while an operation override is active.
//!
//! Malformed values are reported through [`ConfigError`], logged at `warn`
//! and otherwise ignored; the computed defaults stay in effect.

use std::num::ParseIntError;

use thiserror::Error;
use tracing::{info, warn};

use crate::dispatch::{Operation, Variant};

pub const OPERATIONS_VAR: &str = "LIBMEM_OPERATIONS";
pub const THRESHOLD_VAR: &str = "LIBMEM_THRESHOLD";

/// Override parsing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Operation name not in the public surface.
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),

    /// Variant name not one of avx512, avx2, erms, sse2, portable.
    #[error("unknown variant `{0}`")]
    UnknownVariant(String),

    /// List entry not of the form `operation:variant`.
    #[error("malformed operation override `{0}`, expected operation:variant")]
    MalformedPair(String),

    /// Threshold value not of the form `[a,b):[c,d):[e,-1)`.
    #[error("malformed threshold `{0}`")]
    MalformedThreshold(String),

    #[error("invalid number `{value}`: {source}")]
    InvalidNumber {
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// Breakpoints must be non-decreasing from range to range.
    #[error("threshold ranges out of order: {0}")]
    UnorderedThreshold(String),
}

/// Bulk breakpoints from `LIBMEM_THRESHOLD`. `usize::MAX` stands for an
/// unbounded end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThresholdOverride {
    pub rep_start: usize,
    pub rep_end: usize,
    pub nt_start: usize,
}

/// User overrides. The default value overrides nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Overrides {
    pub operations: [Option<Variant>; Operation::COUNT],
    pub threshold: Option<ThresholdOverride>,
}

impl Overrides {
    /// Reads both variables from the process environment.
    pub fn from_env() -> Self {
        let operations = std::env::var(OPERATIONS_VAR).ok();
        let threshold = std::env::var(THRESHOLD_VAR).ok();
        Self::from_values(operations.as_deref(), threshold.as_deref())
    }

    /// Builds overrides from raw variable values, logging and dropping
    /// anything malformed.
    pub fn from_values(operations: Option<&str>, threshold: Option<&str>) -> Self {
        let mut overrides = Overrides::default();

        if let Some(raw) = operations.map(str::trim).filter(|s| !s.is_empty()) {
            match parse_operations(raw) {
                Ok(ops) => {
                    info!(value = raw, "operation override active");
                    overrides.operations = ops;
                }
                Err(err) => warn!(%err, var = OPERATIONS_VAR, "ignoring override"),
            }
        }

        if overrides.has_operations() {
            return overrides;
        }

        if let Some(raw) = threshold.map(str::trim).filter(|s| !s.is_empty()) {
            match parse_threshold(raw) {
                Ok(t) => {
                    info!(value = raw, "threshold override active");
                    overrides.threshold = Some(t);
                }
                Err(err) => warn!(%err, var = THRESHOLD_VAR, "ignoring override"),
            }
        }

        overrides
    }

    pub fn has_operations(&self) -> bool {
        self.operations.iter().any(Option::is_some)
    }

    pub fn operation(&self, op: Operation) -> Option<Variant> {
        self.operations[op.index()]
    }

    pub fn set_operation(&mut self, op: Operation, variant: Variant) {
        self.operations[op.index()] = Some(variant);
    }
}

/// Parses `LIBMEM_OPERATIONS`.
pub fn parse_operations(raw: &str) -> Result<[Option<Variant>; Operation::COUNT], ConfigError> {
    let mut ops = [None; Operation::COUNT];

    if !raw.contains(':') {
        let variant: Variant = raw.trim().parse()?;
        return Ok([Some(variant); Operation::COUNT]);
    }

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (op, variant) = entry
            .split_once(':')
            .ok_or_else(|| ConfigError::MalformedPair(entry.to_string()))?;
        let op: Operation = op.trim().parse()?;
        let variant: Variant = variant.trim().parse()?;
        ops[op.index()] = Some(variant);
    }

    Ok(ops)
}

/// Parses `LIBMEM_THRESHOLD`.
pub fn parse_threshold(raw: &str) -> Result<ThresholdOverride, ConfigError> {
    let malformed = || ConfigError::MalformedThreshold(raw.to_string());

    let mut ranges = raw.split(':').map(|r| parse_range(r.trim(), raw));
    let (vec_start, vec_end) = ranges.next().ok_or_else(malformed)??;
    let (rep_start, rep_end) = ranges.next().ok_or_else(malformed)??;
    let (nt_start, nt_end) = ranges.next().ok_or_else(malformed)??;
    if ranges.next().is_some() || nt_end != usize::MAX {
        return Err(malformed());
    }

    let ordered = vec_start <= vec_end && vec_end <= rep_start && rep_start <= rep_end && rep_end <= nt_start;
    if !ordered {
        return Err(ConfigError::UnorderedThreshold(raw.to_string()));
    }

    Ok(ThresholdOverride { rep_start, rep_end, nt_start })
}

/// `[start,end)` with `end == -1` meaning unbounded.
fn parse_range(range: &str, raw: &str) -> Result<(usize, usize), ConfigError> {
    let malformed = || ConfigError::MalformedThreshold(raw.to_string());
    let inner = range
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(malformed)?;
    let (start, end) = inner.split_once(',').ok_or_else(malformed)?;

    let start = parse_number(start.trim())?;
    let end = match end.trim() {
        "-1" => usize::MAX,
        e => parse_number(e)?,
    };
    Ok((start, end))
}

fn parse_number(value: &str) -> Result<usize, ConfigError> {
    value.parse().map_err(|source| ConfigError::InvalidNumber { value: value.to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_variant_applies_to_all() {
        let ops = parse_operations("avx2").unwrap();
        assert!(ops.iter().all(|v| *v == Some(Variant::Avx2)));
    }

    #[test]
    fn test_operation_pairs() {
        let ops = parse_operations("memcpy:erms, strlen:sse2").unwrap();
        assert_eq!(ops[Operation::Memcpy.index()], Some(Variant::Erms));
        assert_eq!(ops[Operation::Strlen.index()], Some(Variant::Sse2));
        assert_eq!(ops[Operation::Memset.index()], None);
    }

    #[test]
    fn test_operation_errors() {
        assert_eq!(
            parse_operations("memcopy:avx2"),
            Err(ConfigError::UnknownOperation("memcopy".into()))
        );
        assert_eq!(parse_operations("memcpy:avx3"), Err(ConfigError::UnknownVariant("avx3".into())));
        assert_eq!(parse_operations("fast"), Err(ConfigError::UnknownVariant("fast".into())));
        assert_eq!(
            parse_operations("memcpy:erms,strlen"),
            Err(ConfigError::MalformedPair("strlen".into()))
        );
    }

    #[test]
    fn test_threshold_parse() {
        let t = parse_threshold("[0,2048):[2048,1048576):[1048576,-1)").unwrap();
        assert_eq!(
            t,
            ThresholdOverride { rep_start: 2048, rep_end: 1048576, nt_start: 1048576 }
        );
    }

    #[test]
    fn test_threshold_errors() {
        assert!(matches!(parse_threshold("[0,2048):[2048,4096)"), Err(ConfigError::MalformedThreshold(_))));
        assert!(matches!(
            parse_threshold("[0,2048):[2048,4096):[4096,8192)"),
            Err(ConfigError::MalformedThreshold(_))
        ));
        assert!(matches!(
            parse_threshold("[0,2k):[2048,4096):[4096,-1)"),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_threshold("[0,4096):[2048,4096):[4096,-1)"),
            Err(ConfigError::UnorderedThreshold(_))
        ));
        assert!(matches!(parse_threshold("0,2048:[2048,4096):[4096,-1)"), Err(ConfigError::MalformedThreshold(_))));
    }

    #[test]
    fn test_from_values_drops_bad_input() {
        let o = Overrides::from_values(Some("memcpy:nope"), Some("garbage"));
        assert_eq!(o, Overrides::default());
    }

    #[test]
    fn test_threshold_ignored_with_operation_override() {
        let o = Overrides::from_values(Some("memset:sse2"), Some("[0,1):[1,2):[2,-1)"));
        assert_eq!(o.operation(Operation::Memset), Some(Variant::Sse2));
        assert!(o.threshold.is_none());

        let o = Overrides::from_values(Some("  "), Some("[0,1):[1,2):[2,-1)"));
        assert!(!o.has_operations());
        assert_eq!(o.threshold.map(|t| t.nt_start), Some(2));
    }
}
