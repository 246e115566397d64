//! Reduce (component J): short forward-BFS prefix on the complete subset,
//! producing either an exact MLSW or a residual automaton restricted to the
//! states still reachable once the frontier shrinks (`reduce.hpp`).

use crate::algorithms::{AlgoResult, ReduceData};
use crate::automaton::Automaton;
use crate::config::ReduceConfig;
use crate::graph;
use crate::subset::{Subset, sort_dedup};
use crate::trie_implicit;

pub fn run(aut: &Automaton, cfg: &ReduceConfig, result: &mut AlgoResult) -> anyhow::Result<()> {
    if aut.n() < cfg.min_n {
        log::debug!("[Reduce] n={} below min_n={}, skipping", aut.n(), cfg.min_n);
        return Ok(());
    }
    let list_size_threshold = cfg.resolved_list_size_threshold(aut.n());

    let mut list_bfs = vec![Subset::complete(aut.n())];
    let mut list_bfs_visited: Vec<Subset> = Vec::new();
    let max_mlsw = result.mlsw_upper.saturating_sub(1);
    let mut mlsw: u64 = 0;
    let mut found = false;

    while mlsw < max_mlsw {
        if list_bfs.len() > list_size_threshold {
            break;
        }
        mlsw += 1;
        if bfs_step(aut, &mut list_bfs, &mut list_bfs_visited) {
            found = true;
            break;
        }
    }
    // Boundary case (SPEC_FULL.md §4.F.1): exhausting the step budget without
    // a separate threshold stop counts as "found one step later".
    if !found && mlsw == max_mlsw {
        mlsw += 1;
        found = true;
    }

    if found {
        log::info!("[Reduce] mlsw: {mlsw}");
        debug_assert!(result.mlsw_lower <= mlsw && mlsw <= result.mlsw_upper);
        result.mlsw_lower = mlsw;
        result.mlsw_upper = mlsw;
        return Ok(());
    }

    let mut reachable = graph::reachable_closure(aut, list_bfs.iter().flat_map(|s| s.iter()));
    if reachable.len() == aut.n() || reachable.is_empty() {
        log::info!("[Reduce] no smaller reachable closure, skipping");
        return Ok(());
    }
    reachable.sort_unstable();

    let (reduced, map) = aut.restricted(&reachable);
    let list_bfs: Vec<Subset> = list_bfs
        .iter()
        .map(|s| {
            let mut r = Subset::empty(reduced.n());
            for i in s.iter() {
                if let Some(new_idx) = map[i] {
                    r.set(new_idx);
                }
            }
            r
        })
        .collect();

    log::info!("[Reduce] reduced to n={} in {mlsw} bfs steps", reduced.n());
    result.mlsw_lower = result.mlsw_lower.saturating_sub(mlsw);
    debug_assert!(mlsw < result.mlsw_upper);
    result.mlsw_upper -= mlsw;
    result.reduce = Some(ReduceData { automaton: reduced, list_bfs, bfs_steps: mlsw, done: false });
    Ok(())
}

fn apply_letter(aut: &Automaton, subset: &Subset, letter: usize) -> Subset {
    let mut next = Subset::empty(subset.n());
    for i in subset.iter() {
        next.set(aut.apply(i, letter));
    }
    next
}

/// One forward-BFS step: expand, dedup, reduce against the visited list
/// (remove subsets already covered), self-reduce (keep only minimal
/// elements), then extend the visited list. Returns true if a singleton
/// appeared.
fn bfs_step(aut: &Automaton, list_bfs: &mut Vec<Subset>, list_bfs_visited: &mut Vec<Subset>) -> bool {
    let mut list_next = Vec::with_capacity(list_bfs.len() * aut.k());
    for subset in list_bfs.iter() {
        for letter in 0..aut.k() {
            list_next.push(apply_letter(aut, subset, letter));
        }
    }
    sort_dedup(&mut list_next);
    trie_implicit::reduce_against(list_bfs_visited, &mut list_next);
    trie_implicit::reduce_self(&mut list_next);

    list_bfs_visited.extend(list_next.iter().cloned());
    let found = list_next.iter().any(|s| s.size() == 1);
    *list_bfs = list_next;
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Automaton;
    use crate::config::ReduceConfig;

    fn disjoint_union_automaton(big_n: usize, small_n: usize) -> Automaton {
        // `small_n` states form a synchronizing Cerny block reachable from
        // everywhere; the remaining states are an isolated identity block,
        // so after a few BFS steps only the Cerny block stays reachable.
        let cerny = Automaton::cerny(small_n, 0);
        let mut delta = vec![0u32; big_n * 2];
        for i in 0..big_n {
            if i < small_n {
                delta[i * 2] = cerny.apply(i, 0) as u32;
                delta[i * 2 + 1] = cerny.apply(i, 1) as u32;
            } else {
                delta[i * 2] = i as u32;
                delta[i * 2 + 1] = i as u32;
            }
        }
        Automaton::new(big_n, 2, delta).unwrap()
    }

    #[test]
    fn below_min_n_is_skipped() {
        let aut = Automaton::cerny(10, 0);
        let mut result = AlgoResult::new(10);
        let before = result.clone();
        run(&aut, &ReduceConfig::default(), &mut result).unwrap();
        assert_eq!(result.mlsw_lower, before.mlsw_lower);
        assert_eq!(result.mlsw_upper, before.mlsw_upper);
        assert!(result.reduce.is_none());
    }

    #[test]
    fn emits_a_smaller_residual_when_applicable() {
        let aut = disjoint_union_automaton(90, 5);
        let mut result = AlgoResult::new(90);
        let cfg = ReduceConfig { min_n: 80, list_size_threshold: Some(10_000) };
        run(&aut, &cfg, &mut result).unwrap();
        if let Some(data) = &result.reduce {
            assert!(data.automaton.n() < 90);
            assert!(!data.done);
        } else {
            // BFS might also find the exact answer directly; either outcome
            // keeps the result consistent.
            assert!(result.is_consistent());
        }
    }
}
