//! Meet-in-the-middle scheduler (`MeetInTheMiddle` in `meet_in_the_middle.cpp`):
//! alternates forward-BFS and inverse-BFS subset-frontier steps, picking the
//! cheaper direction each round from a live cost model, until the two
//! frontiers overlap (a synchronizing word of the current length exists) or
//! the model judges switching to inverse-DFS (component L) is cheaper.
//!
//! Simplification from the source (documented in DESIGN.md): `list_invbfs`
//! and its visited list are kept in the crate's normal (non-negated)
//! `Subset` representation throughout; the source's repeated
//! negate-before/negate-after dance around every visited-list touch is
//! folded into [`trie_implicit::reduce_self`] / [`trie_implicit::reduce_against`]
//! calls on the representation that already matches what those helpers
//! expect, rather than ported literally.

use crate::automaton::{Automaton, InverseAutomaton};
use crate::config::ExactConfig;
use crate::error::SynchroError;
use crate::memory::MemoryUsage;
use crate::subset::{Subset, sort_dedup};
use crate::transition::PreprocessedTransition;
use crate::trie_implicit;

#[derive(Clone, Copy, Debug, Default)]
struct ReductionHistory {
    reduced_duplicates: f64,
    reduced_visited: f64,
    reduced_self: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Bfs,
    Ibfs,
    Idfs,
}

pub struct MeetInTheMiddle {
    n: usize,
    k: usize,
    ptrans: Vec<PreprocessedTransition>,
    invptrans: Vec<PreprocessedTransition>,
    pub list_bfs: Vec<Subset>,
    pub list_invbfs: Vec<Subset>,
    list_bfs_visited: Vec<Subset>,
    list_invbfs_visited: Vec<Subset>,
    bfs_hist: ReductionHistory,
    invbfs_hist: ReductionHistory,
    last_bfs_list_size: usize,
    last_invbfs_list_size: usize,
    last_reduction_bfs_visited_size: usize,
    last_reduction_invbfs_visited_size: usize,
    bfs_novisited_mode: bool,
    invbfs_novisited_mode: bool,
    pub reset_threshold: u64,
    max_reset_threshold: u64,
    max_memory: usize,
    subset_bytes: usize,
    dfs_cost_weight: f64,
    dfs_min_list_size: usize,
    dfs_shortcut: bool,
    dfs_enabled: bool,
    pub steps_bfs: u64,
    pub steps_invbfs: u64,
}

impl MeetInTheMiddle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        aut: &Automaton,
        invaut: &InverseAutomaton,
        list_bfs: Vec<Subset>,
        list_invbfs: Vec<Subset>,
        reset_threshold: u64,
        max_reset_threshold: u64,
        cfg: &ExactConfig,
        max_memory: usize,
    ) -> Self {
        let ptrans = (0..aut.k()).map(|l| PreprocessedTransition::from_automaton(aut, l)).collect();
        let invptrans =
            (0..aut.k()).map(|l| PreprocessedTransition::from_inverse_automaton(invaut, l)).collect();
        MeetInTheMiddle {
            n: aut.n(),
            k: aut.k(),
            ptrans,
            invptrans,
            list_bfs,
            list_invbfs,
            list_bfs_visited: Vec::new(),
            list_invbfs_visited: Vec::new(),
            bfs_hist: ReductionHistory::default(),
            invbfs_hist: ReductionHistory::default(),
            last_bfs_list_size: 0,
            last_invbfs_list_size: 0,
            last_reduction_bfs_visited_size: 0,
            last_reduction_invbfs_visited_size: 0,
            bfs_novisited_mode: false,
            invbfs_novisited_mode: false,
            reset_threshold,
            max_reset_threshold,
            max_memory,
            subset_bytes: Subset::empty(aut.n()).memory_usage(),
            dfs_cost_weight: cfg.dfs_cost_weight,
            dfs_min_list_size: cfg.dfs_min_list_size,
            dfs_shortcut: cfg.dfs_shortcut,
            dfs_enabled: cfg.dfs,
            steps_bfs: 0,
            steps_invbfs: 0,
        }
    }

    fn memory_usage(&self) -> usize {
        self.ptrans.memory_usage()
            + self.invptrans.memory_usage()
            + self.list_bfs.memory_usage()
            + self.list_invbfs.memory_usage()
            + self.list_bfs_visited.memory_usage()
            + self.list_invbfs_visited.memory_usage()
    }

    /// Run until the frontiers meet, the budget is exhausted, or the
    /// scheduler hands off to inverse-DFS. Returns `true` iff a word of
    /// length `reset_threshold` was found (in which case `reset_threshold`
    /// is that length); on an inverse-DFS handoff, `reset_threshold` is left
    /// at the last length the meet-in-the-middle search completed.
    pub fn run(&mut self) -> Result<bool, SynchroError> {
        let mut found = false;
        while self.reset_threshold < self.max_reset_threshold {
            if self.memory_usage() > self.max_memory {
                log::warn!("[Exact/MITM] memory limit reached, handing off to DFS");
                break;
            }
            let phase = self.calculate_decision();
            if phase == Phase::Idfs {
                log::debug!("[Exact/MITM] cost model prefers inverse-DFS at depth {}", self.reset_threshold);
                break;
            }
            let prev = self.reset_threshold;
            self.reset_threshold += 1;
            let outcome = match phase {
                Phase::Bfs => self.process_bfs_step(),
                Phase::Ibfs => self.process_invbfs_step(),
                Phase::Idfs => unreachable!(),
            };
            match outcome {
                Err(SynchroError::OutOfMemory) => {
                    self.reset_threshold = prev;
                    log::warn!("[Exact/MITM] step exceeded the memory limit, handing off to DFS");
                    break;
                }
                Err(e) => return Err(e),
                Ok(()) => {}
            }
            if trie_implicit::any_covered(&self.list_bfs, &self.list_invbfs) {
                log::info!("[Exact/MITM] frontiers meet at depth {}", self.reset_threshold);
                found = true;
                break;
            }
        }
        self.list_bfs_visited.clear();
        self.list_invbfs_visited.clear();
        Ok(found)
    }

    fn densities(&self) -> (f64, f64) {
        let d = |list: &[Subset]| -> f64 {
            if list.is_empty() || self.n == 0 {
                return 0.0;
            }
            let total: f64 = list.iter().map(|s| s.size() as f64).sum();
            total / (self.n as f64 * list.len() as f64)
        };
        (d(&self.list_bfs), d(&self.list_invbfs))
    }

    /// The live (non-commented-out) branch of `MeetInTheMiddle::calculate_decision`:
    /// compares expected remaining search cost for four step variants (BFS/IBFS,
    /// each with or without their visited list) plus an inverse-DFS projection,
    /// and returns the cheapest.
    fn calculate_decision(&mut self) -> Phase {
        if self.list_bfs.len() <= 1 || self.list_invbfs.len() <= 1 {
            return if self.list_bfs.len() <= self.list_invbfs.len() { Phase::Bfs } else { Phase::Ibfs };
        }

        let n = self.n as f64;
        let k = self.k as f64;
        let (density_bfs, density_invbfs) = self.densities();
        let card_visited_bfs: f64 = self.list_bfs_visited.iter().map(|s| s.size() as f64).sum();
        let card_visited_invbfs: f64 = self.list_invbfs_visited.iter().map(|s| s.size() as f64).sum();

        let mut branching_bfs_visited = k * (1.0 - self.bfs_hist.reduced_duplicates);
        let mut cost_bfs_visited = branching_bfs_visited
            * self.list_bfs.len() as f64
            * trie_evn(
                branching_bfs_visited * self.list_bfs.len() as f64 + self.list_bfs_visited.len() as f64,
                density_bfs,
                (branching_bfs_visited * self.list_bfs.len() as f64 * density_bfs + card_visited_bfs)
                    / (n * (branching_bfs_visited * self.list_bfs.len() as f64
                        + self.list_bfs_visited.len() as f64)
                        .max(1.0)),
                n,
            );
        branching_bfs_visited *= 1.0 - self.bfs_hist.reduced_visited;
        cost_bfs_visited += self.list_invbfs.len() as f64
            * trie_evn(branching_bfs_visited * self.list_bfs.len() as f64, density_invbfs, density_bfs, n);

        let mut branching_invbfs_visited = k * (1.0 - self.invbfs_hist.reduced_duplicates);
        let mut cost_invbfs_visited = branching_invbfs_visited
            * self.list_invbfs.len() as f64
            * trie_evn(
                branching_invbfs_visited * self.list_invbfs.len() as f64,
                1.0 - density_invbfs,
                1.0 - density_invbfs,
                n,
            );
        branching_invbfs_visited *= 1.0 - self.invbfs_hist.reduced_self;
        cost_invbfs_visited += branching_invbfs_visited
            * self.list_invbfs.len() as f64
            * trie_evn(
                self.list_invbfs_visited.len() as f64,
                1.0 - density_invbfs,
                1.0 - card_visited_invbfs / (n * self.list_invbfs_visited.len().max(1) as f64),
                n,
            );
        branching_invbfs_visited *= 1.0 - self.invbfs_hist.reduced_visited;
        cost_invbfs_visited += branching_invbfs_visited
            * self.list_invbfs.len() as f64
            * trie_evn(self.list_bfs.len() as f64, density_invbfs, density_bfs, n);

        let mut branching_bfs_novisited = k * (1.0 - self.bfs_hist.reduced_duplicates);
        let mut cost_bfs_novisited = branching_bfs_novisited
            * self.list_bfs.len() as f64
            * trie_evn(branching_bfs_novisited * self.list_bfs.len() as f64, density_bfs, density_bfs, n);
        branching_bfs_novisited *= 1.0 - self.bfs_hist.reduced_visited;
        cost_bfs_novisited += self.list_invbfs.len() as f64
            * trie_evn(branching_bfs_novisited * self.list_bfs.len() as f64, density_invbfs, density_bfs, n);

        let mut branching_invbfs_novisited = k * (1.0 - self.invbfs_hist.reduced_duplicates);
        let mut cost_invbfs_novisited = branching_invbfs_novisited
            * self.list_invbfs.len() as f64
            * trie_evn(
                branching_invbfs_novisited * self.list_invbfs.len() as f64,
                1.0 - density_invbfs,
                1.0 - density_invbfs,
                n,
            );
        branching_invbfs_novisited *= 1.0 - self.invbfs_hist.reduced_self;
        cost_invbfs_novisited += branching_invbfs_novisited
            * self.list_invbfs.len() as f64
            * trie_evn(self.list_bfs.len() as f64, density_invbfs, density_bfs, n);

        let mut inf_cnt = 0;
        let usage = self.memory_usage() as f64;
        let sb = self.subset_bytes as f64;
        let max_memory = self.max_memory as f64;
        if self.bfs_novisited_mode
            || usage + self.list_bfs_visited.len() as f64 * sb > max_memory
            || usage + 2.0 * sb * self.list_bfs.len() as f64 * k > max_memory
            || self.out_of_memory_dfs(self.list_bfs.len())
        {
            cost_bfs_visited = f64::INFINITY;
            inf_cnt += 1;
        }
        if usage - self.list_bfs_visited.len() as f64 * sb + 2.0 * sb * self.list_bfs.len() as f64 * k
            > max_memory
            || self.out_of_memory_dfs(self.list_bfs.len())
        {
            cost_bfs_novisited = f64::INFINITY;
            inf_cnt += 1;
        }
        if self.invbfs_novisited_mode
            || usage + self.list_invbfs_visited.len() as f64 * sb > max_memory
            || usage + 2.0 * sb * self.list_invbfs.len() as f64 * k > max_memory
            || self.out_of_memory_dfs(self.list_invbfs.len())
        {
            cost_invbfs_visited = f64::INFINITY;
            inf_cnt += 1;
        }
        if usage - self.list_invbfs_visited.len() as f64 * sb + sb * self.list_invbfs.len() as f64 * k
            > max_memory
            || self.out_of_memory_dfs(self.list_invbfs.len())
        {
            cost_invbfs_novisited = f64::INFINITY;
            inf_cnt += 1;
        }
        if inf_cnt == 4 {
            return Phase::Idfs;
        }

        let remaining_total = self.max_reset_threshold.saturating_sub(self.reset_threshold) as f64;
        let remaining_after = (remaining_total - 1.0).max(0.0);
        let branching_invdfs = k * (1.0 - self.invbfs_hist.reduced_duplicates);
        let w = self.dfs_cost_weight;

        let prediction_bfs_visited = cost_bfs_visited
            + w * self.list_invbfs.len() as f64
                * dfs_total_factor(branching_invdfs, remaining_after)
                * trie_evn(branching_bfs_visited * self.list_bfs.len() as f64, density_invbfs, density_bfs, n);
        let prediction_invbfs_visited = cost_invbfs_visited
            + w * branching_invbfs_visited
                * self.list_invbfs.len() as f64
                * dfs_total_factor(branching_invdfs, remaining_after)
                * trie_evn(self.list_bfs.len() as f64, density_invbfs, density_bfs, n);
        let prediction_bfs_novisited = cost_bfs_novisited
            + w * self.list_invbfs.len() as f64
                * dfs_total_factor(branching_invdfs, remaining_after)
                * trie_evn(branching_bfs_novisited * self.list_bfs.len() as f64, density_invbfs, density_bfs, n);
        let prediction_invbfs_novisited = cost_invbfs_novisited
            + w * branching_invbfs_novisited
                * self.list_invbfs.len() as f64
                * dfs_total_factor(branching_invdfs, remaining_after)
                * trie_evn(self.list_bfs.len() as f64, density_invbfs, density_bfs, n);
        let prediction_invdfs = w
            * self.list_invbfs.len() as f64
            * dfs_total_factor(branching_invdfs, remaining_total)
            * trie_evn(self.list_bfs.len() as f64, density_invbfs, density_bfs, n);

        let minimum = prediction_bfs_visited
            .min(prediction_invbfs_visited)
            .min(prediction_bfs_novisited)
            .min(prediction_invbfs_novisited);

        if self.dfs_shortcut
            && self.last_bfs_list_size < self.list_bfs.len()
            && self.last_invbfs_list_size < self.list_invbfs.len()
            && prediction_invdfs < minimum
        {
            return Phase::Idfs;
        }

        if prediction_bfs_visited <= prediction_bfs_novisited
            && prediction_invbfs_visited <= prediction_invbfs_novisited
        {
            return if cost_invbfs_visited < cost_bfs_visited { Phase::Ibfs } else { Phase::Bfs };
        }
        if minimum == prediction_bfs_visited {
            return Phase::Bfs;
        }
        if minimum == prediction_bfs_novisited {
            self.bfs_novisited_mode = true;
            self.list_bfs_visited.clear();
            return Phase::Bfs;
        }
        if minimum == prediction_invbfs_visited {
            return Phase::Ibfs;
        }
        self.invbfs_novisited_mode = true;
        self.list_invbfs_visited.clear();
        Phase::Ibfs
    }

    fn out_of_memory_dfs(&self, list_size: usize) -> bool {
        if !self.dfs_enabled {
            return false;
        }
        let additional = list_size as f64 * (self.k as f64 - 1.0) * self.subset_bytes as f64;
        let taken = self.dfs_min_list_size as f64 * self.subset_bytes as f64 * (self.k as f64 + 1.0);
        if additional <= taken {
            return false;
        }
        let remaining = self.max_reset_threshold.saturating_sub(self.reset_threshold) as f64;
        taken * remaining + (additional - taken) > self.max_memory as f64
    }

    fn process_bfs_step(&mut self) -> Result<(), SynchroError> {
        self.steps_bfs += 1;
        self.last_bfs_list_size = self.list_bfs.len();
        let mut next = Vec::with_capacity(self.list_bfs.len() * self.k);
        for table in &self.ptrans {
            for s in &self.list_bfs {
                next.push(table.apply(s));
            }
        }
        let before_dup = next.len();
        sort_dedup(&mut next);
        self.bfs_hist.reduced_duplicates = reduced_fraction(before_dup, next.len());

        if self.bfs_novisited_mode {
            let before_self = next.len();
            trie_implicit::reduce_self(&mut next);
            self.bfs_hist.reduced_visited = reduced_fraction(before_self, next.len());
        } else {
            trie_implicit::reduce_against(&self.list_bfs_visited, &mut next);
            self.bfs_hist.reduced_visited = 0.0;
            self.list_bfs_visited.extend(next.iter().cloned());
            sort_dedup(&mut self.list_bfs_visited);
            if self.list_bfs_visited.len()
                >= self.k * self.k * self.last_reduction_bfs_visited_size.max(1)
            {
                trie_implicit::reduce_self(&mut self.list_bfs_visited);
                self.last_reduction_bfs_visited_size = self.list_bfs_visited.len();
            }
        }
        self.list_bfs = next;
        Ok(())
    }

    fn process_invbfs_step(&mut self) -> Result<(), SynchroError> {
        self.steps_invbfs += 1;
        self.last_invbfs_list_size = self.list_invbfs.len();
        let mut next = Vec::with_capacity(self.list_invbfs.len() * self.k);
        for table in &self.invptrans {
            for s in &self.list_invbfs {
                next.push(table.apply(s));
            }
        }
        let before_dup = next.len();
        sort_dedup(&mut next);
        self.invbfs_hist.reduced_duplicates = reduced_fraction(before_dup, next.len());

        let before_self = next.len();
        trie_implicit::reduce_self(&mut next);
        self.invbfs_hist.reduced_self = reduced_fraction(before_self, next.len());

        if self.invbfs_novisited_mode {
            self.invbfs_hist.reduced_visited = 0.0;
        } else {
            let before_visited = next.len();
            trie_implicit::reduce_against(&self.list_invbfs_visited, &mut next);
            self.invbfs_hist.reduced_visited = reduced_fraction(before_visited, next.len());
            self.list_invbfs_visited.extend(next.iter().cloned());
            sort_dedup(&mut self.list_invbfs_visited);
            if self.list_invbfs_visited.len()
                >= self.k * self.k * self.last_reduction_invbfs_visited_size.max(1)
            {
                trie_implicit::reduce_self(&mut self.list_invbfs_visited);
                self.last_reduction_invbfs_visited_size = self.list_invbfs_visited.len();
            }
        }
        self.list_invbfs = next;
        Ok(())
    }
}

fn reduced_fraction(before: usize, after: usize) -> f64 {
    if before == 0 {
        0.0
    } else {
        1.0 - after as f64 / before as f64
    }
}

fn dfs_total_factor(branching: f64, depth: f64) -> f64 {
    if depth <= 0.0 {
        return 0.0;
    }
    if (branching - 1.0).abs() < 1e-9 {
        depth
    } else {
        branching * (branching.powf(depth) - 1.0) / (branching - 1.0)
    }
}

/// `get_trie_evn`: the expected-visited-nodes closed form for a packed trie
/// probe, with the source's validity clamp (falls back to the trivial
/// `m * n` bound whenever the analytic formula is undefined or exceeds it).
fn trie_evn(m: f64, p: f64, q: f64, n: f64) -> f64 {
    if n <= 0.0 || m <= 0.0 || p <= 0.0 || p >= 1.0 || q <= 0.0 {
        return m * n;
    }
    let denom = 1.0 + p * q - q;
    if denom <= 0.0 {
        return m * n;
    }
    let base = (1.0 + p) / denom;
    if base <= 1.0 {
        return m * n;
    }
    let exponent = (1.0 + p).ln() / base.ln();
    let e = ((1.0 + p) / p + 1.0 / (q - p * q)) * m.powf(exponent);
    if e.is_finite() && e >= 0.0 && e < m * n { e } else { m * n }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Automaton;

    #[test]
    fn trie_evn_clamps_to_trivial_bound_for_degenerate_inputs() {
        assert_eq!(trie_evn(10.0, 0.0, 0.5, 8.0), 80.0);
        assert_eq!(trie_evn(10.0, 0.5, 0.0, 8.0), 80.0);
        assert!(trie_evn(10.0, 0.5, 0.5, 8.0) <= 80.0);
    }

    #[test]
    fn dfs_total_factor_is_zero_at_zero_depth() {
        assert_eq!(dfs_total_factor(2.0, 0.0), 0.0);
        assert!(dfs_total_factor(2.0, 3.0) > 0.0);
    }

    #[test]
    fn cerny4_meet_in_the_middle_finds_the_exact_length() {
        let aut = Automaton::cerny(4, 0);
        let invaut = InverseAutomaton::build(&aut);
        let cfg = ExactConfig::default();
        let list_bfs = vec![Subset::complete(4)];
        let list_invbfs: Vec<Subset> = (0..4).map(|i| Subset::singleton(4, i)).collect();
        let mut mitm =
            MeetInTheMiddle::new(&aut, &invaut, list_bfs, list_invbfs, 0, 9, &cfg, 64 * 1024 * 1024);
        let found = mitm.run().unwrap();
        assert!(found);
        assert_eq!(mitm.reset_threshold, 9);
    }

    #[test]
    fn budget_of_zero_returns_without_stepping() {
        let aut = Automaton::new(3, 1, vec![1, 2, 2]).unwrap();
        let invaut = InverseAutomaton::build(&aut);
        let cfg = ExactConfig::default();
        let list_bfs = vec![Subset::singleton(3, 0)];
        let list_invbfs = vec![Subset::singleton(3, 1)];
        let mut mitm = MeetInTheMiddle::new(&aut, &invaut, list_bfs, list_invbfs, 0, 0, &cfg, 1024 * 1024);
        let found = mitm.run().unwrap();
        assert!(!found);
        assert_eq!(mitm.steps_bfs + mitm.steps_invbfs, 0);
    }
}
