//! Beam search (component G): bounded-width truncated inverse-BFS yielding
//! an upper bound (`get_automaton_lsw_cutoffinvbfs` in `beam.hpp`).

use crate::algorithms::AlgoResult;
use crate::automaton::{Automaton, InverseAutomaton};
use crate::config::{BeamConfig, Presort};
use crate::graph;
use crate::subset::{Subset, dedup_sorted, sort_cardinality_descending};
use crate::transition::PreprocessedTransition;

/// Ascending-indegree relabeling (`get_indeg_permutation`): `order[old]` is
/// the rank of state `old` among all states sorted by total indegree.
fn indegree_permutation(aut: &Automaton, invaut: &InverseAutomaton) -> Vec<usize> {
    let n = aut.n();
    let indegree: Vec<usize> =
        (0..n).map(|s| (0..aut.k()).map(|k| invaut.preimage_count(s, k)).sum()).collect();
    let mut by_indegree: Vec<usize> = (0..n).collect();
    by_indegree.sort_by_key(|&s| indegree[s]);
    let mut order = vec![0usize; n];
    for (rank, &state) in by_indegree.iter().enumerate() {
        order[state] = rank;
    }
    order
}

pub fn run(
    aut: &Automaton,
    invaut: &InverseAutomaton,
    cfg: &BeamConfig,
    result: &mut AlgoResult,
) -> anyhow::Result<()> {
    cfg.validate()?;
    let n = aut.n();
    let beam_size = cfg.resolved_beam_size(n).max(1);

    let (aut, invaut) = match cfg.presort {
        Presort::None => (aut.clone(), invaut.clone()),
        Presort::InDegree => {
            let order = indegree_permutation(aut, invaut);
            let permuted = aut.permuted(&order);
            let permuted_inv = InverseAutomaton::build(&permuted);
            (permuted, permuted_inv)
        }
        Presort::Unknown => unreachable!("cfg.validate() above rejects Presort::Unknown"),
    };

    let sink = graph::sink_component(&aut);
    let mut frontier: Vec<Subset> = sink
        .iter()
        .copied()
        .filter(|&s| (0..aut.k()).any(|k| invaut.preimage_count(s, k) >= 2))
        .map(|s| Subset::singleton(n, s))
        .collect();
    if frontier.is_empty() {
        log::debug!("[Beam] no eligible sink-component seed state, skipping");
        return Ok(());
    }
    sort_cardinality_descending(&mut frontier);
    dedup_sorted(&mut frontier);

    let inv_tables: Vec<PreprocessedTransition> =
        (0..aut.k()).map(|k| PreprocessedTransition::from_inverse_automaton(&invaut, k)).collect();

    let max_depth = result.mlsw_upper.saturating_sub(1);
    let mut depth: u64 = 0;
    loop {
        if let Some(cap) = cfg.max_iter {
            if depth >= cap {
                break;
            }
        }
        if depth >= max_depth {
            break;
        }
        depth += 1;

        let mut next = Vec::with_capacity(frontier.len() * aut.k());
        for subset in &frontier {
            for table in &inv_tables {
                let preimage = table.apply(subset);
                if preimage.size() as usize == n {
                    log::info!("[Beam] found a full-cover preimage at depth {depth}");
                    result.mlsw_upper = result.mlsw_upper.min(depth);
                    return Ok(());
                }
                next.push(preimage);
            }
        }
        sort_cardinality_descending(&mut next);
        dedup_sorted(&mut next);
        next.truncate(beam_size);
        frontier = next;
    }
    log::debug!("[Beam] exhausted depth/iteration budget without a full-cover preimage");
    Ok(())
}
