//! Per-algorithm configuration, defaults per spec.md §6.
//!
//! Named `const` defaults at module scope, matching the teacher's pattern in
//! `src/lib.rs` (e.g. `KMEANS_FLOP_CLUSTER_COUNT`), plus `serde::Deserialize`
//! so a future driver can decode these from the out-of-scope config file.

use crate::error::SynchroError;
use serde::{Deserialize, Serialize};

/// Default initial upper bound on MLSW for an automaton of `n` states:
/// floor(n^3 / 6).
pub fn default_upper_bound(n: usize) -> u64 {
    ((n as u64).pow(3)) / 6
}

pub const THREADS_MIN: usize = 1;
pub const THREADS_MAX: usize = 64;

pub const BEAM_EXACT_RATIO_DEFAULT: f64 = 0.01;
pub const DFS_COST_WEIGHT_DEFAULT: f64 = 0.25;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Presort {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "indeg")]
    InDegree,
    /// Catches any value the deserializer saw that isn't `none`/`indeg`
    /// (serde's standard unrecognized-variant fallback), so a bad config
    /// value survives deserialization as data instead of failing parse, and
    /// is rejected by `BeamConfig::validate` with a typed error instead.
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BeamConfig {
    /// default: floor(log2(n)), resolved against the automaton at call time
    /// when `None`.
    pub beam_size: Option<usize>,
    pub dynamic: bool,
    pub min_beam_size: Option<usize>,
    pub max_beam_size: Option<usize>,
    pub beam_exact_ratio: f64,
    /// -1 (no cap) in the source; `None` here.
    pub max_iter: Option<u64>,
    pub presort: Presort,
}

impl Default for BeamConfig {
    fn default() -> Self {
        BeamConfig {
            beam_size: None,
            dynamic: false,
            min_beam_size: None,
            max_beam_size: None,
            beam_exact_ratio: BEAM_EXACT_RATIO_DEFAULT,
            max_iter: None,
            presort: Presort::None,
        }
    }
}

impl BeamConfig {
    pub fn validate(&self) -> Result<(), SynchroError> {
        if let (Some(lo), Some(hi)) = (self.min_beam_size, self.max_beam_size) {
            if lo > hi {
                return Err(SynchroError::InvalidConfiguration(
                    "min_beam_size must be <= max_beam_size".into(),
                ));
            }
        }
        if self.presort == Presort::Unknown {
            return Err(SynchroError::InvalidConfiguration(
                "presort must be one of {none, indeg}".into(),
            ));
        }
        Ok(())
    }

    pub fn resolved_beam_size(&self, n: usize) -> usize {
        self.beam_size.unwrap_or_else(|| (n as f64).log2().floor().max(1.0) as usize)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BruteConfig {
    pub max_n: usize,
}

pub const BRUTE_MAX_N_DEFAULT: usize = 20;
/// Hard ceiling: a `u32` bitmask is used for the power-set BFS, so `max_n`
/// can never exceed 32 regardless of configuration (mirrors the source's
/// `MAX_N > 32` fatal guard).
pub const BRUTE_MAX_N_HARD_LIMIT: usize = 32;

impl Default for BruteConfig {
    fn default() -> Self {
        BruteConfig { max_n: BRUTE_MAX_N_DEFAULT }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EppsteinConfig {
    pub transition_tables: bool,
    pub find_word: bool,
}

impl Default for EppsteinConfig {
    fn default() -> Self {
        EppsteinConfig { transition_tables: false, find_word: false }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReduceConfig {
    pub min_n: usize,
    /// default 16 * n, resolved at call time when `None`.
    pub list_size_threshold: Option<usize>,
}

pub const REDUCE_MIN_N_DEFAULT: usize = 80;

impl Default for ReduceConfig {
    fn default() -> Self {
        ReduceConfig { min_n: REDUCE_MIN_N_DEFAULT, list_size_threshold: None }
    }
}

impl ReduceConfig {
    pub fn resolved_list_size_threshold(&self, n: usize) -> usize {
        self.list_size_threshold.unwrap_or(16 * n)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExactConfig {
    pub dfs: bool,
    pub dfs_shortcut: bool,
    pub strict_memory_limit: bool,
    pub max_memory_mb: u64,
    pub dfs_min_list_size: usize,
    /// default 16 * n, resolved at call time when `None`.
    pub bfs_small_list_size: Option<usize>,
    pub dfs_cost_weight: f64,
}

pub const EXACT_MAX_MEMORY_MB_DEFAULT: u64 = 2048;
pub const EXACT_DFS_MIN_LIST_SIZE_DEFAULT: usize = 10_000;

impl Default for ExactConfig {
    fn default() -> Self {
        ExactConfig {
            dfs: true,
            dfs_shortcut: true,
            strict_memory_limit: false,
            max_memory_mb: EXACT_MAX_MEMORY_MB_DEFAULT,
            dfs_min_list_size: EXACT_DFS_MIN_LIST_SIZE_DEFAULT,
            bfs_small_list_size: None,
            dfs_cost_weight: DFS_COST_WEIGHT_DEFAULT,
        }
    }
}

impl ExactConfig {
    pub fn validate(&self) -> Result<(), SynchroError> {
        if self.dfs_shortcut && !self.dfs {
            return Err(SynchroError::InvalidConfiguration(
                "dfs_shortcut: true depends on dfs: true".into(),
            ));
        }
        Ok(())
    }

    pub fn resolved_bfs_small_list_size(&self, n: usize) -> usize {
        self.bfs_small_list_size.unwrap_or(16 * n)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum AlgorithmName {
    Beam,
    Eppstein,
    Exact,
    Brute,
    Reduce,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    pub threads: usize,
    pub gpu: bool,
    pub gpu_max_memory_mb: u64,
    pub beam: BeamConfig,
    pub eppstein: EppsteinConfig,
    pub brute: BruteConfig,
    pub reduce: ReduceConfig,
    pub exact: ExactConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            threads: 1,
            gpu: false,
            gpu_max_memory_mb: 2048,
            beam: BeamConfig::default(),
            eppstein: EppsteinConfig::default(),
            brute: BruteConfig::default(),
            reduce: ReduceConfig::default(),
            exact: ExactConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), SynchroError> {
        if self.threads < THREADS_MIN || self.threads > THREADS_MAX {
            return Err(SynchroError::InvalidConfiguration(format!(
                "threads must be in [{THREADS_MIN}, {THREADS_MAX}]"
            )));
        }
        self.beam.validate()?;
        self.exact.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_dfs_shortcut_requires_dfs() {
        let cfg = ExactConfig { dfs: false, dfs_shortcut: true, ..ExactConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn default_upper_bound_matches_floor_n_cubed_over_6() {
        assert_eq!(default_upper_bound(6), 36);
    }

    #[test]
    fn beam_presort_unknown_value_is_rejected() {
        let cfg = BeamConfig { presort: Presort::Unknown, ..BeamConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn beam_size_defaults_to_log2_n() {
        let cfg = BeamConfig::default();
        assert_eq!(cfg.resolved_beam_size(4), 2);
        assert_eq!(cfg.resolved_beam_size(50), 5);
    }
}
