//! Tuning knobs for policy selection.
//!
//! The cost constants only steer which execution path is taken (linear, per-column
//! or cached). They never change the values an evaluation produces, so every field
//! can be changed freely without affecting correctness.

use std::env;

use crate::error::{invalid_argument, Result};

/// Row count below which the per-column path pays a fixed penalty.
pub const SHORTVEC_LENGTH_THRESHOLD: usize = 4;

/// Penalty added to per-column traversal of short columns.
pub const SHORTVEC_PERCOL_COST: u32 = 200;

/// Estimated cost of touching a source that is not directly dense.
pub const CACHE_COST: u32 = 1000;

/// Evaluation configuration, passed explicitly to every `*_with` entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
    /// Columns with fewer rows than this are considered short.
    pub shortvec_threshold: usize,
    /// Cost added to the per-column path for short columns.
    pub shortvec_percol_cost: u32,
    /// Cost of reading a non-dense source in place.
    pub cache_cost: u32,
    /// When `false` every evaluation takes the scalar kernel path.
    pub allow_simd: bool,
    /// When `false` non-dense sources are never materialized first.
    pub allow_cache: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            shortvec_threshold: SHORTVEC_LENGTH_THRESHOLD,
            shortvec_percol_cost: SHORTVEC_PERCOL_COST,
            cache_cost: CACHE_COST,
            allow_simd: true,
            allow_cache: true,
        }
    }
}

impl EvalConfig {
    pub fn with_shortvec_threshold(mut self, rows: usize) -> Self {
        self.shortvec_threshold = rows;
        self
    }

    pub fn with_shortvec_percol_cost(mut self, cost: u32) -> Self {
        self.shortvec_percol_cost = cost;
        self
    }

    pub fn with_cache_cost(mut self, cost: u32) -> Self {
        self.cache_cost = cost;
        self
    }

    pub fn with_simd(mut self, allow: bool) -> Self {
        self.allow_simd = allow;
        self
    }

    pub fn with_cache(mut self, allow: bool) -> Self {
        self.allow_cache = allow;
        self
    }

    /// Builds a configuration from the `SIMDMAT_*` environment variables.
    ///
    /// Unset variables keep their default value. A variable that is set but
    /// does not parse is reported as [`MatError::InvalidArgument`](crate::MatError).
    ///
    /// | variable | field |
    /// |---|---|
    /// | `SIMDMAT_SHORTVEC_THRESHOLD` | `shortvec_threshold` |
    /// | `SIMDMAT_SHORTVEC_PERCOL_COST` | `shortvec_percol_cost` |
    /// | `SIMDMAT_CACHE_COST` | `cache_cost` |
    /// | `SIMDMAT_NO_SIMD` | `allow_simd = false` when `1` or `true` |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup("SIMDMAT_SHORTVEC_THRESHOLD") {
            config.shortvec_threshold = parse_number("SIMDMAT_SHORTVEC_THRESHOLD", &value)?;
        }
        if let Some(value) = lookup("SIMDMAT_SHORTVEC_PERCOL_COST") {
            config.shortvec_percol_cost = parse_number("SIMDMAT_SHORTVEC_PERCOL_COST", &value)?;
        }
        if let Some(value) = lookup("SIMDMAT_CACHE_COST") {
            config.cache_cost = parse_number("SIMDMAT_CACHE_COST", &value)?;
        }
        if let Some(value) = lookup("SIMDMAT_NO_SIMD") {
            config.allow_simd = match value.trim() {
                "1" | "true" => false,
                "0" | "false" | "" => true,
                other => {
                    return Err(invalid_argument(format!(
                        "SIMDMAT_NO_SIMD must be a boolean, got `{other}`"
                    )))
                }
            };
        }

        log::debug!("evaluation config: {config:?}");
        Ok(config)
    }
}

fn parse_number<N: std::str::FromStr>(key: &str, value: &str) -> Result<N> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid_argument(format!("{key} must be a non-negative integer, got `{value}`")))
}
