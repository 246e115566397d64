//! The shared result record and the algorithm orchestrator (spec.md §3,
//! §4.J): `AlgoResult`/`ReduceData` plus `run_pipeline`, the typed entry
//! point that replaces the source's driver + JIT-dispatch boundary
//! (`synchrolib.hpp`'s `make_algorithm`/`make_algo_config`).

pub mod beam;
pub mod brute;
pub mod eppstein;
pub mod exact;
pub mod reduce;

use crate::automaton::{Automaton, InverseAutomaton};
use crate::config::{AlgorithmName, RunConfig};
use crate::subset::Subset;
use std::time::{Duration, Instant};

/// One completed pipeline stage: its name and elapsed wall time
/// (`AlgoRun` in `algorithm.hpp`).
#[derive(Clone, Debug)]
pub struct AlgoRun {
    pub name: AlgorithmName,
    pub elapsed: Duration,
}

/// The residual automaton and BFS frontier left behind by Reduce (§4.F),
/// plus the re-entry bookkeeping the orchestrator needs.
#[derive(Clone, Debug)]
pub struct ReduceData {
    pub automaton: Automaton,
    pub list_bfs: Vec<Subset>,
    pub bfs_steps: u64,
    pub done: bool,
}

/// The shared, mutated-in-place result of running a pipeline of algorithms
/// against one automaton (`AlgoResult` in `algorithm.hpp`).
#[derive(Clone, Debug)]
pub struct AlgoResult {
    pub non_synchro: bool,
    pub mlsw_lower: u64,
    pub mlsw_upper: u64,
    pub word: Option<Vec<usize>>,
    pub algorithms_run: Vec<AlgoRun>,
    pub reduce: Option<ReduceData>,
}

impl AlgoResult {
    /// A fresh result for an automaton with `n` states: `[0, default_upper_bound(n)]`.
    pub fn new(n: usize) -> Self {
        AlgoResult {
            non_synchro: false,
            mlsw_lower: 0,
            mlsw_upper: crate::config::default_upper_bound(n),
            word: None,
            algorithms_run: Vec::new(),
            reduce: None,
        }
    }

    /// Invariant 1 (spec.md §8): `0 <= mlsw_lower <= mlsw_upper`.
    pub fn is_consistent(&self) -> bool {
        self.mlsw_lower <= self.mlsw_upper
    }

    fn converged(&self) -> bool {
        self.mlsw_lower == self.mlsw_upper
    }

    fn record(&mut self, name: AlgorithmName, started: Instant) {
        self.algorithms_run.push(AlgoRun { name, elapsed: started.elapsed() });
    }
}

/// True for the algorithms the source considers undefined against a
/// residual (reduced) automaton in the same semantic sense (§4.J, §7's
/// "Algorithm incompatibility after reduction").
fn incompatible_with_reduction(name: AlgorithmName) -> bool {
    matches!(name, AlgorithmName::Beam | AlgorithmName::Brute | AlgorithmName::Eppstein)
}

/// Run `algorithms` in order against `aut`, mutating `result`.
///
/// If Reduce emits a residual automaton (`result.reduce = Some(ReduceData{done:
/// false, ..})`), the remaining algorithm names are *not* run against the
/// original automaton: the function returns immediately so the caller can
/// rebuild an `Automaton` from `ReduceData.automaton`, set `done = true`,
/// and re-invoke `run_pipeline` with the remaining names (§6).
pub fn run_pipeline(
    aut: &Automaton,
    algorithms: &[AlgorithmName],
    config: &RunConfig,
    result: &mut AlgoResult,
) -> anyhow::Result<()> {
    config.validate()?;
    let invaut = InverseAutomaton::build(aut);

    for (idx, &name) in algorithms.iter().enumerate() {
        if result.non_synchro {
            log::debug!("[{name:?}] skipped: non_synchro already set");
            continue;
        }
        if result.converged() {
            log::debug!("[{name:?}] skipped: bounds already converged at {}", result.mlsw_lower);
            continue;
        }
        if result.reduce.is_some() && incompatible_with_reduction(name) {
            log::debug!("[{name:?}] skipped: undefined against a reduced automaton");
            continue;
        }

        let started = Instant::now();
        match name {
            AlgorithmName::Beam => beam::run(aut, &invaut, &config.beam, result)?,
            AlgorithmName::Eppstein => eppstein::run(aut, &invaut, &config.eppstein, result)?,
            AlgorithmName::Brute => brute::run(aut, &config.brute, result)?,
            AlgorithmName::Reduce => reduce::run(aut, &config.reduce, result)?,
            AlgorithmName::Exact => exact::run(aut, &invaut, &config.exact, result)?,
        }
        result.record(name, started);
        debug_assert!(result.is_consistent(), "{name:?} violated mlsw_lower <= mlsw_upper");

        if let Some(data) = &result.reduce {
            if !data.done {
                log::info!(
                    "[Reduce] emitted a {}-state residual after {} BFS steps; remaining algorithms: {:?}",
                    data.automaton.n(),
                    data.bfs_steps,
                    &algorithms[idx + 1..]
                );
                return Ok(());
            }
        }
    }
    Ok(())
}
