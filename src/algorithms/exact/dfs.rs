//! Inverse-DFS fallback (`Dfs` in `dfs.cpp`): when the meet-in-the-middle
//! cost model judges that extending the inverse-BFS frontier through every
//! remaining depth by explicit depth-first search is cheaper than another
//! meet-in-the-middle round, recurse through the frontier batch instead of
//! tracking a visited list at every depth.
//!
//! Simplification from the source (documented in DESIGN.md): the source
//! recurses natively over `(begin, end)` index ranges into one shared,
//! growing `list_invbfs` buffer. Here each branch owns its own `Vec<Subset>`
//! and the traversal is driven by an explicit work stack rather than
//! function-call recursion, so the per-branch memory-budget checkpoint
//! ([`update_max_list_size`]) is a plain loop condition rather than
//! reasoning about call-stack depth.

use crate::automaton::{Automaton, InverseAutomaton};
use crate::config::ExactConfig;
use crate::error::SynchroError;
use crate::memory::MemoryUsage;
use crate::subset::Subset;
use crate::transition::PreprocessedTransition;
use crate::trie_implicit;
use crate::trie_packed::PackedTrie;

/// Ascending-occurrence-frequency relabeling (`Dfs::get_order`): states that
/// appear in few `list_bfs` elements are likely to prune the search sooner
/// when checked early, so they get the low indices.
fn get_order(n: usize, list_bfs: &[Subset]) -> Vec<usize> {
    let mut occurrences = vec![0u64; n];
    for s in list_bfs {
        for i in s.iter() {
            occurrences[i] += 1;
        }
    }
    let mut by_freq: Vec<usize> = (0..n).collect();
    by_freq.sort_by_key(|&s| occurrences[s]);
    let mut order = vec![0usize; n];
    for (rank, &state) in by_freq.iter().enumerate() {
        order[state] = rank;
    }
    order
}

/// Depth-dependent reduction policy (SPEC_FULL.md §4.L.1): at shallow depths
/// (where the per-node cost of a reduction pass is cheap relative to the
/// branch it might prune) deduplicate every step; self-reduce against a
/// capped prefix only occasionally and only while there's enough depth
/// budget left to make pruning worthwhile.
fn reduction_policy(depth: u64, remaining: u64) -> (bool, usize) {
    let reduce_duplicates = depth <= 3 || depth % 2 == 0;
    let reduce_subsets_cap = if depth % 3 == 0 && depth <= 6 && remaining > 10 { 20_000 } else { 0 };
    (reduce_duplicates, reduce_subsets_cap)
}

struct Task {
    items: Vec<Subset>,
    lsw: u64,
    depth: u64,
}

pub struct Dfs {
    k: usize,
    invptrans: Vec<PreprocessedTransition>,
    trie_bfs: PackedTrie,
    base_usage: usize,
    subset_bytes: usize,
    max_memory: usize,
    dfs_min_list_size: usize,
    strict_memory_limit: bool,
    pub reset_threshold: u64,
    pub max_depth: u64,
    list_size_cap: usize,
}

impl Dfs {
    /// Permute `aut`/`invaut`/the two frontiers by occurrence frequency,
    /// build the goal trie from `list_bfs`, and prepare for `run`
    /// (`Dfs::get_order` + `Dfs::prepare` in the source).
    /// Returns the constructed search plus the permuted `list_invbfs` that
    /// must be passed to [`Dfs::run`].
    pub fn new(
        aut: &Automaton,
        list_bfs: Vec<Subset>,
        list_invbfs: Vec<Subset>,
        reset_threshold: u64,
        max_depth: u64,
        cfg: &ExactConfig,
        max_memory: usize,
    ) -> Result<(Self, Vec<Subset>), SynchroError> {
        let order = get_order(aut.n(), &list_bfs);
        let perm_aut = aut.permuted(&order);
        let perm_invaut = InverseAutomaton::build(&perm_aut);
        let invptrans: Vec<PreprocessedTransition> = (0..perm_aut.k())
            .map(|l| PreprocessedTransition::from_inverse_automaton(&perm_invaut, l))
            .collect();
        let permuted_bfs: Vec<Subset> = list_bfs.into_iter().map(|s| s.permuted(&order)).collect();
        let list_invbfs: Vec<Subset> = list_invbfs.into_iter().map(|s| s.permuted(&order)).collect();

        let trie_bfs = PackedTrie::build(permuted_bfs);
        let subset_bytes = Subset::empty(perm_aut.n()).memory_usage();
        let base_usage = trie_bfs.memory_usage() + invptrans.memory_usage();

        let mut dfs = Dfs {
            k: perm_aut.k(),
            invptrans,
            trie_bfs,
            base_usage,
            subset_bytes,
            max_memory,
            dfs_min_list_size: cfg.dfs_min_list_size,
            strict_memory_limit: cfg.strict_memory_limit,
            reset_threshold,
            max_depth,
            list_size_cap: 0,
        };
        dfs.list_size_cap = dfs.update_max_list_size()?;
        Ok((dfs, list_invbfs))
    }

    /// `(max_memory - base_usage) / (subset_bytes * (K+1) * remaining_depth)`,
    /// floored at `dfs_min_list_size` (`Dfs::update_dfs_max_list_size`).
    fn update_max_list_size(&self) -> Result<usize, SynchroError> {
        if self.base_usage > self.max_memory {
            if self.strict_memory_limit {
                return Err(SynchroError::OutOfMemory);
            }
            log::warn!("[Exact/DFS] base memory usage already exceeds the budget");
            return Ok(self.dfs_min_list_size);
        }
        let remaining_depth = self.max_depth.saturating_sub(self.reset_threshold).max(1) as usize;
        let denom = self.subset_bytes * (self.k + 1) * remaining_depth;
        let mut size = if denom == 0 { usize::MAX } else { (self.max_memory - self.base_usage) / denom };
        if size < self.dfs_min_list_size {
            if self.strict_memory_limit {
                return Err(SynchroError::OutOfMemory);
            }
            log::warn!(
                "[Exact/DFS] computed list size {size} below the minimum {}, using the minimum",
                self.dfs_min_list_size
            );
            size = self.dfs_min_list_size;
        }
        Ok(size)
    }

    /// Run the depth-first search. Returns `true` if some descendant batch
    /// reached a subset already covered by `trie_bfs`, in which case
    /// `max_depth` has been tightened to the depth at which it happened.
    pub fn run(&mut self, list_invbfs: Vec<Subset>) -> Result<bool, SynchroError> {
        if self.reset_threshold == self.max_depth {
            return Ok(true);
        }
        let mut stack = vec![Task { items: list_invbfs, lsw: self.reset_threshold, depth: 0 }];
        let mut found = false;

        while let Some(task) = stack.pop() {
            if task.lsw + 1 > self.max_depth {
                continue;
            }
            let remaining = self.max_depth.saturating_sub(task.lsw);
            let (reduce_duplicates, reduce_subsets_cap) = reduction_policy(task.depth, remaining);
            let (hit, next) = self.step(&task.items, reduce_duplicates, reduce_subsets_cap)?;
            if hit {
                self.max_depth = task.lsw + 1;
                self.list_size_cap = self.update_max_list_size()?;
                found = true;
                log::debug!("[Exact/DFS] found a covered subset, new max depth {}", self.max_depth);
                continue;
            }
            if task.lsw + 1 >= self.max_depth {
                continue;
            }
            let partsize = self.list_size_cap.max(1).min(next.len().max(1));
            let mut remaining_items = next;
            let mut chunks = Vec::new();
            while !remaining_items.is_empty() {
                let take = partsize.min(remaining_items.len());
                chunks.push(remaining_items.drain(..take).collect::<Vec<_>>());
            }
            for chunk in chunks.into_iter().rev() {
                stack.push(Task { items: chunk, lsw: task.lsw + 1, depth: task.depth + 1 });
            }
        }
        Ok(found)
    }

    /// One batch expansion: apply every letter to every element, sort,
    /// optionally dedup, optionally self-reduce against a capped prefix,
    /// then probe each survivor against `trie_bfs`
    /// (`Dfs::invbfs_step_dfs`).
    fn step(
        &self,
        items: &[Subset],
        reduce_duplicates: bool,
        reduce_subsets_cap: usize,
    ) -> Result<(bool, Vec<Subset>), SynchroError> {
        let usage = self.base_usage + items.len() * self.subset_bytes * (self.k + 1);
        if usage > self.max_memory {
            if self.strict_memory_limit {
                return Err(SynchroError::OutOfMemory);
            }
            log::warn!("[Exact/DFS] batch of {} exceeds the memory budget", items.len());
        }

        let mut next = Vec::with_capacity(items.len() * self.k);
        for table in &self.invptrans {
            for s in items {
                next.push(table.apply(s));
            }
        }
        crate::subset::sort_cardinality_descending(&mut next);
        if reduce_duplicates {
            next.dedup();
        }
        if reduce_subsets_cap > 0 && next.len() > 1 {
            let cap = reduce_subsets_cap.min(next.len());
            let reference = next[..cap].to_vec();
            trie_implicit::reduce_subsets_of(&reference, &mut next);
        }
        let found = if next.len() > 64 {
            crate::concurrency::any_parallel(&next, |s| self.trie_bfs.contains_subset_of(s, false))
        } else {
            next.iter().any(|s| self.trie_bfs.contains_subset_of(s, false))
        };
        Ok((found, next))
    }
}
