//! End-to-end scenarios from spec.md §8: each test drives `run_pipeline`
//! through the public API the way a caller actually would, rather than
//! exercising a single algorithm module in isolation.

use synchroword::algorithms::{run_pipeline, AlgoResult, ReduceData};
use synchroword::automaton::Automaton;
use synchroword::config::{AlgorithmName, RunConfig};

/// S1: the Černý automaton on 4 states has MLSW (n-1)^2 = 9. Running Exact
/// alone must converge on the exact value.
#[test]
fn s1_cerny4_exact_mlsw_is_nine() {
    let aut = Automaton::cerny(4, 0);
    let mut result = AlgoResult::new(4);
    let config = RunConfig::default();
    run_pipeline(&aut, &[AlgorithmName::Exact], &config, &mut result).unwrap();
    assert_eq!(result.mlsw_lower, 9);
    assert_eq!(result.mlsw_upper, 9);
    assert!(!result.non_synchro);
}

/// S2: a single-state automaton is trivially synchronizing with MLSW 0,
/// regardless of which algorithm is asked to confirm it.
#[test]
fn s2_single_state_converges_at_zero() {
    let aut = Automaton::new(1, 2, vec![0, 0]).unwrap();
    let mut result = AlgoResult::new(1);
    let config = RunConfig::default();
    run_pipeline(
        &aut,
        &[AlgorithmName::Brute, AlgorithmName::Eppstein, AlgorithmName::Exact],
        &config,
        &mut result,
    )
    .unwrap();
    assert_eq!(result.mlsw_lower, 0);
    assert_eq!(result.mlsw_upper, 0);
}

/// S3: a permutation automaton on 2 states (the two letters just swap the
/// states) is never synchronizing: no word can collapse both states into
/// one, since every letter is a bijection.
#[test]
fn s3_permutation_automaton_is_non_synchronizing() {
    let aut = Automaton::new(2, 1, vec![1, 0]).unwrap();
    let mut result = AlgoResult::new(2);
    let config = RunConfig::default();
    run_pipeline(
        &aut,
        &[AlgorithmName::Eppstein, AlgorithmName::Exact],
        &config,
        &mut result,
    )
    .unwrap();
    assert!(result.non_synchro);
    assert!(result.is_consistent());
}

/// S4: Reduce on a large automaton with an isolated, unreachable block
/// should emit a residual automaton; continuing with Exact against that
/// residual (the caller's job per `run_pipeline`'s doc comment) must land
/// on bounds consistent with the un-reduced problem.
#[test]
fn s4_reduce_then_exact_continuation() {
    // A 5-state Cerny block reachable from everywhere, plus 35 isolated
    // states that fall out of the reachable closure within a few BFS steps.
    let small_n = 5;
    let big_n = 40;
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
    let aut = Automaton::new(big_n, 2, delta).unwrap();

    let mut result = AlgoResult::new(big_n);
    let mut config = RunConfig::default();
    config.reduce.min_n = 20;
    config.reduce.list_size_threshold = Some(10_000);

    run_pipeline(&aut, &[AlgorithmName::Reduce, AlgorithmName::Exact], &config, &mut result).unwrap();

    match &result.reduce {
        Some(data) if !data.done => {
            // Reduce emitted a residual smaller than the original automaton;
            // per the orchestrator contract, re-invoke with the residual.
            assert!(data.automaton.n() < big_n);
            let residual = data.automaton.clone();
            let mut continued = AlgoResult {
                reduce: Some(ReduceData { done: true, ..data.clone() }),
                ..result.clone()
            };
            run_pipeline(&residual, &[AlgorithmName::Exact], &config, &mut continued).unwrap();
            assert!(continued.is_consistent());
            assert_eq!(continued.mlsw_lower, continued.mlsw_upper);
        }
        _ => {
            // Reduce's own BFS prefix might already have found the exact
            // answer; that is a valid outcome too.
            assert!(result.is_consistent());
            assert_eq!(result.mlsw_lower, result.mlsw_upper);
        }
    }
}

/// S5: Exact under a memory budget too small to hold even the base
/// bookkeeping must not panic in either lenient or strict mode, and must
/// leave `result` in a consistent state either way.
#[test]
fn s5_memory_bound_exact_stays_consistent() {
    let aut = Automaton::cerny(30, 0);

    let mut lenient = AlgoResult::new(30);
    let mut lenient_config = RunConfig::default();
    lenient_config.exact.max_memory_mb = 1;
    lenient_config.exact.strict_memory_limit = false;
    let outcome = run_pipeline(&aut, &[AlgorithmName::Exact], &lenient_config, &mut lenient);
    assert!(outcome.is_ok());
    assert!(lenient.is_consistent());

    let mut strict = AlgoResult::new(30);
    let mut strict_config = RunConfig::default();
    strict_config.exact.max_memory_mb = 1;
    strict_config.exact.strict_memory_limit = true;
    match run_pipeline(&aut, &[AlgorithmName::Exact], &strict_config, &mut strict) {
        Ok(()) => assert!(strict.is_consistent()),
        Err(_) => {} // strict mode is allowed to surface the budget failure as an error
    }
}

/// S6: on this fixed-seed random automaton, Beam with width floor(log2(50))=5
/// returns a strictly smaller MLSW upper bound than Eppstein (spec.md §8 S6).
#[test]
fn s6_beam_is_strictly_tighter_than_eppstein() {
    let aut = Automaton::random(50, 2, 1);
    let config = RunConfig::default();

    let mut eppstein_result = AlgoResult::new(50);
    run_pipeline(&aut, &[AlgorithmName::Eppstein], &config, &mut eppstein_result).unwrap();

    let mut beam_result = AlgoResult::new(50);
    run_pipeline(&aut, &[AlgorithmName::Beam], &config, &mut beam_result).unwrap();

    assert!(eppstein_result.is_consistent());
    assert!(beam_result.is_consistent());
    assert!(!eppstein_result.non_synchro);
    assert!(!beam_result.non_synchro);
    assert!(beam_result.mlsw_upper < eppstein_result.mlsw_upper);
}
