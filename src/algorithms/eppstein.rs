//! Eppstein (component H): pair-by-pair collapsing upper bound built on the
//! pairs-distance tree (component F). Thin wrapper over
//! `pairs_tree::eppstein_upper_bound` (`eppstein.hpp` in the source).

use crate::algorithms::AlgoResult;
use crate::automaton::{Automaton, InverseAutomaton};
use crate::config::EppsteinConfig;
use crate::pairs_tree::{self, PairsTree};

pub fn run(
    aut: &Automaton,
    invaut: &InverseAutomaton,
    cfg: &EppsteinConfig,
    result: &mut AlgoResult,
) -> anyhow::Result<()> {
    let tree = PairsTree::build(aut, invaut);
    if !tree.is_synchronizing() {
        let (u, v) = tree.unreachable_pair().expect("non-synchronizing tree has an unreachable pair");
        log::info!("[Eppstein] unreachable pair ({u}, {v}): automaton is non-synchronizing");
        result.non_synchro = true;
        return Ok(());
    }

    // `transition_tables` amortizes the per-merge apply cost and, per
    // spec.md §4.D, never emits a witness word.
    let find_word = cfg.find_word && !cfg.transition_tables;
    match pairs_tree::eppstein_upper_bound(aut, &tree, result.mlsw_upper, find_word) {
        Some((len, word)) => {
            log::info!("[Eppstein] upper bound {len}");
            if len < result.mlsw_upper {
                result.mlsw_upper = len;
                if find_word {
                    result.word = word;
                }
            }
        }
        None => log::debug!("[Eppstein] no collapsing sequence stayed within the incumbent upper bound"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cerny4_matches_scenario_s1_lower_bound_on_upper() {
        let aut = Automaton::cerny(4, 0);
        let invaut = InverseAutomaton::build(&aut);
        let mut result = AlgoResult::new(4);
        run(&aut, &invaut, &EppsteinConfig::default(), &mut result).unwrap();
        assert!(!result.non_synchro);
        assert!(result.mlsw_upper >= 9, "upper bound {} should be >= exact MLSW 9", result.mlsw_upper);
    }

    #[test]
    fn non_synchronizing_automaton_sets_flag() {
        let aut = Automaton::new(2, 1, vec![1, 0]).unwrap();
        let invaut = InverseAutomaton::build(&aut);
        let mut result = AlgoResult::new(2);
        let before_upper = result.mlsw_upper;
        run(&aut, &invaut, &EppsteinConfig::default(), &mut result).unwrap();
        assert!(result.non_synchro);
        assert_eq!(result.mlsw_upper, before_upper);
    }

    #[test]
    fn find_word_produces_a_witness_that_synchronizes() {
        let aut = Automaton::cerny(5, 1);
        let invaut = InverseAutomaton::build(&aut);
        let mut result = AlgoResult::new(5);
        let cfg = EppsteinConfig { find_word: true, ..EppsteinConfig::default() };
        run(&aut, &invaut, &cfg, &mut result).unwrap();
        let word = result.word.expect("find_word should produce a witness");
        let mut states: Vec<usize> = (0..5).collect();
        for &letter in &word {
            states = states.iter().map(|&s| aut.apply(s, letter)).collect();
        }
        states.dedup();
        assert_eq!(states.len(), 1, "witness word should synchronize all states");
    }
}
