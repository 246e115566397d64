//! Graph utilities (component C): strongly-connected components, the sink
//! component, forward reachability, and a stationary-distribution solver.
//!
//! SCC detection is delegated to `petgraph::algo::tarjan_scc` (the teacher
//! depends on `petgraph` directly, e.g. `crates/.../cfr/rps/node.rs`) rather
//! than porting the source's hand-rolled recursive Tarjan
//! (`synchrolib/utils/connectivity.hpp`).

use crate::automaton::Automaton;
use petgraph::graph::DiGraph;

/// Forward-reachable states from `start` under all letters
/// (`get_automaton_reachable_states` in `connectivity.cpp`).
pub fn reachable_states(aut: &Automaton, start: usize) -> Vec<usize> {
    let mut visited = vec![false; aut.n()];
    let mut stack = vec![start];
    visited[start] = true;
    let mut order = Vec::new();
    while let Some(v) = stack.pop() {
        order.push(v);
        for letter in 0..aut.k() {
            let next = aut.apply(v, letter);
            if !visited[next] {
                visited[next] = true;
                stack.push(next);
            }
        }
    }
    order
}

/// Transitive closure under delta of the union of `starts`
/// (used by Reduce, §4.F / Testable Property 4).
pub fn reachable_closure(aut: &Automaton, starts: impl IntoIterator<Item = usize>) -> Vec<usize> {
    let mut visited = vec![false; aut.n()];
    let mut stack: Vec<usize> = Vec::new();
    for s in starts {
        if !visited[s] {
            visited[s] = true;
            stack.push(s);
        }
    }
    let mut order = Vec::new();
    while let Some(v) = stack.pop() {
        order.push(v);
        for letter in 0..aut.k() {
            let next = aut.apply(v, letter);
            if !visited[next] {
                visited[next] = true;
                stack.push(next);
            }
        }
    }
    order
}

fn build_graph(aut: &Automaton) -> DiGraph<(), ()> {
    let mut g = DiGraph::with_capacity(aut.n(), aut.n() * aut.k());
    let nodes: Vec<_> = (0..aut.n()).map(|_| g.add_node(())).collect();
    for state in 0..aut.n() {
        for letter in 0..aut.k() {
            let target = aut.apply(state, letter);
            g.add_edge(nodes[state], nodes[target], ());
        }
    }
    g
}

/// Strongly-connected components, each a list of state indices
/// (`get_automaton_strongly_connected_components`).
pub fn strongly_connected_components(aut: &Automaton) -> Vec<Vec<usize>> {
    let g = build_graph(aut);
    petgraph::algo::tarjan_scc(&g)
        .into_iter()
        .map(|comp| comp.into_iter().map(|idx| idx.index()).collect())
        .collect()
}

/// A sink component: a strongly-connected component with no outgoing edges
/// to any other component (GLOSSARY). Every automaton has at least one.
/// Returns the component's member states.
pub fn sink_component(aut: &Automaton) -> Vec<usize> {
    let sccs = strongly_connected_components(aut);
    let mut owner = vec![0usize; aut.n()];
    for (idx, comp) in sccs.iter().enumerate() {
        for &s in comp {
            owner[s] = idx;
        }
    }
    for (idx, comp) in sccs.iter().enumerate() {
        let mut is_sink = true;
        'outer: for &s in comp {
            for letter in 0..aut.k() {
                if owner[aut.apply(s, letter)] != idx {
                    is_sink = false;
                    break 'outer;
                }
            }
        }
        if is_sink {
            return comp.clone();
        }
    }
    unreachable!("a functional graph always has at least one sink component")
}

/// A single representative state of a sink component
/// (`get_automaton_sink_component_vertex`).
pub fn sink_component_vertex(aut: &Automaton) -> usize {
    sink_component(aut)[0]
}

/// Solve `pi = pi * P` for a smoothed transition matrix via
/// `pi (I - P + U) = u`, where `U`/`u` are all-ones (the source's
/// `get_stationary_distribution`, `distribution.cpp`). `prob[i*n+j]` is the
/// transition probability from `i` to `j`; rows sum to 1.
pub fn stationary_distribution(n: usize, prob: &[f64]) -> Vec<f64> {
    debug_assert_eq!(prob.len(), n * n);
    // a[i][j] = (I - P)[j][i] + 1, solved for pi via Gaussian elimination
    // against the all-ones right-hand side (matches the source's row-major
    // linear system orientation: columns are the unknowns pi_j).
    let mut a = vec![vec![0.0f64; n + 1]; n];
    for row in 0..n {
        for col in 0..n {
            let identity = if row == col { 1.0 } else { 0.0 };
            a[row][col] = identity - prob[col * n + row] + 1.0;
        }
        a[row][n] = 1.0;
    }
    gaussian_solve(&mut a, n)
}

fn gaussian_solve(a: &mut [Vec<f64>], n: usize) -> Vec<f64> {
    for col in 0..n {
        let mut pivot = col;
        for row in (col + 1)..n {
            if a[row][col].abs() > a[pivot][col].abs() {
                pivot = row;
            }
        }
        a.swap(col, pivot);
        let p = a[col][col];
        if p.abs() < 1e-12 {
            continue;
        }
        for j in col..=n {
            a[col][j] /= p;
        }
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in col..=n {
                a[row][j] -= factor * a[col][j];
            }
        }
    }
    (0..n).map(|i| a[i][n]).collect()
}

/// Build a smoothed transition-probability matrix over `states` (a
/// contiguous 0..states.len() index space already) for the given
/// automaton restricted to those states, mixing a uniform term with a
/// structural edge-weight term (`get_automaton_stationary_distribution` in
/// `distribution.cpp`).
pub fn smoothed_transition_matrix(aut: &Automaton, mixing: f64) -> Vec<f64> {
    let n = aut.n();
    let uniform = mixing / n as f64;
    let mut prob = vec![uniform; n * n];
    let weight = (1.0 - mixing) / aut.k() as f64;
    for state in 0..n {
        for letter in 0..aut.k() {
            let target = aut.apply(state, letter);
            prob[state * n + target] += weight;
        }
    }
    prob
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cerny_is_strongly_connected() {
        let aut = Automaton::cerny(5, 2);
        let sccs = strongly_connected_components(&aut);
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0].len(), 5);
    }

    #[test]
    fn sink_component_has_no_outgoing_edges() {
        // state 2 is an absorbing sink under both letters
        let aut = Automaton::new(3, 1, vec![1, 2, 2]).unwrap();
        let sink = sink_component(&aut);
        assert_eq!(sink, vec![2]);
    }

    #[test]
    fn reachable_states_follows_all_letters() {
        let aut = Automaton::cerny(5, 2);
        let reach = reachable_states(&aut, 0);
        assert_eq!(reach.len(), 5);
    }

    #[test]
    fn stationary_distribution_sums_to_one_and_is_nonnegative() {
        let aut = Automaton::cerny(4, 2);
        let prob = smoothed_transition_matrix(&aut, 0.1);
        let pi = stationary_distribution(4, &prob);
        let sum: f64 = pi.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6, "sum was {sum}");
        assert!(pi.iter().all(|&p| p >= -1e-9));
    }
}
