//! Brute force (component I): exact BFS on the full 2^N power set for small
//! N (`get_automaton_lsw_brute` in `brute.hpp`).

use crate::algorithms::AlgoResult;
use crate::automaton::Automaton;
use crate::config::{BruteConfig, BRUTE_MAX_N_HARD_LIMIT};
use std::collections::VecDeque;

pub fn run(aut: &Automaton, cfg: &BruteConfig, result: &mut AlgoResult) -> anyhow::Result<()> {
    let n = aut.n();
    let max_n = cfg.max_n.min(BRUTE_MAX_N_HARD_LIMIT);
    if n > max_n {
        log::debug!("[Brute] n={n} exceeds max_n={max_n}, skipping");
        return Ok(());
    }

    let full: u32 = if n == 32 { u32::MAX } else { (1u32 << n) - 1 };
    let mut dist = vec![u32::MAX; 1usize << n];
    dist[full as usize] = 0;
    let mut queue = VecDeque::new();
    queue.push_back(full);

    while let Some(mask) = queue.pop_front() {
        let depth = dist[mask as usize];
        if mask.count_ones() == 1 {
            log::info!("[Brute] exact MLSW {depth}");
            result.mlsw_lower = depth as u64;
            result.mlsw_upper = depth as u64;
            return Ok(());
        }
        for letter in 0..aut.k() {
            let mut next = 0u32;
            let mut remaining = mask;
            while remaining != 0 {
                let state = remaining.trailing_zeros() as usize;
                next |= 1 << aut.apply(state, letter);
                remaining &= remaining - 1;
            }
            if dist[next as usize] == u32::MAX {
                dist[next as usize] = depth + 1;
                queue.push_back(next);
            }
        }
    }

    log::info!("[Brute] BFS exhausted the power set without reaching a singleton");
    result.non_synchro = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Automaton;

    #[test]
    fn cerny4_matches_scenario_s1_exact_mlsw() {
        let aut = Automaton::cerny(4, 0);
        let mut result = AlgoResult::new(4);
        run(&aut, &BruteConfig::default(), &mut result).unwrap();
        assert_eq!(result.mlsw_lower, 9);
        assert_eq!(result.mlsw_upper, 9);
    }

    #[test]
    fn trivial_single_state_has_mlsw_zero() {
        let aut = Automaton::new(1, 1, vec![0]).unwrap();
        let mut result = AlgoResult::new(1);
        run(&aut, &BruteConfig::default(), &mut result).unwrap();
        assert_eq!(result.mlsw_lower, 0);
        assert_eq!(result.mlsw_upper, 0);
    }

    #[test]
    fn non_synchronizing_automaton_sets_flag() {
        let aut = Automaton::new(2, 1, vec![1, 0]).unwrap();
        let mut result = AlgoResult::new(2);
        run(&aut, &BruteConfig::default(), &mut result).unwrap();
        assert!(result.non_synchro);
    }

    #[test]
    fn n_above_max_n_is_skipped_without_mutation() {
        let aut = Automaton::cerny(25, 2);
        let mut result = AlgoResult::new(25);
        let before = result.clone();
        let cfg = BruteConfig { max_n: 20 };
        run(&aut, &cfg, &mut result).unwrap();
        assert_eq!(result.mlsw_lower, before.mlsw_lower);
        assert_eq!(result.mlsw_upper, before.mlsw_upper);
        assert!(!result.non_synchro);
    }
}
