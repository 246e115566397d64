//! Pairs-distance tree (component F) and the Eppstein pair-collapsing
//! algorithm (`PairsTree<N,K>` / `eppstein.hpp` in the source).

use crate::automaton::{Automaton, InverseAutomaton};
use crate::subset::Subset;
use std::collections::VecDeque;

/// For each unordered pair of distinct states, the length of the shortest
/// word that merges them and the first letter of such a word. A length of
/// 0 means the pair was never reached by the inverse-BFS, i.e. the
/// automaton is non-synchronizing (GLOSSARY, spec.md §3).
#[derive(Clone, Debug)]
pub struct PairsTree {
    n: usize,
    length: Vec<u32>,
    letter: Vec<u32>,
}

#[inline]
fn index(n: usize, u: usize, v: usize) -> usize {
    let (lo, hi) = if u < v { (u, v) } else { (v, u) };
    lo * n + hi
}

impl PairsTree {
    /// Build by inverse-BFS from all same-target pairs
    /// (`PairsTree::calculate_tree` in the source).
    pub fn build(aut: &Automaton, invaut: &InverseAutomaton) -> Self {
        let n = aut.n();
        let mut length = vec![0u32; n * n];
        let mut letter = vec![0u32; n * n];
        let mut queue: VecDeque<(usize, usize)> = VecDeque::new();

        for target in 0..n {
            for k in 0..aut.k() {
                let preimages = invaut.preimages(target, k);
                for i in 0..preimages.len() {
                    for j in (i + 1)..preimages.len() {
                        let (u, v) = (preimages[i] as usize, preimages[j] as usize);
                        let idx = index(n, u, v);
                        if length[idx] == 0 {
                            length[idx] = 1;
                            letter[idx] = k as u32;
                            queue.push_back((u, v));
                        }
                    }
                }
            }
        }

        while let Some((v1, v2)) = queue.pop_front() {
            let len = length[index(n, v1, v2)];
            for k in 0..aut.k() {
                let pre1 = invaut.preimages(v1, k);
                let pre2 = invaut.preimages(v2, k);
                for &p1 in pre1 {
                    for &p2 in pre2 {
                        let (p1, p2) = (p1 as usize, p2 as usize);
                        if p1 == p2 {
                            continue;
                        }
                        let idx = index(n, p1, p2);
                        if length[idx] == 0 {
                            length[idx] = len + 1;
                            letter[idx] = k as u32;
                            queue.push_back((p1, p2));
                        }
                    }
                }
            }
        }

        PairsTree { n, length, letter }
    }

    pub fn get_length(&self, u: usize, v: usize) -> u32 {
        if u == v { return 0; }
        self.length[index(self.n, u, v)]
    }

    pub fn get_letter(&self, u: usize, v: usize) -> Option<usize> {
        if u == v { return None; }
        let idx = index(self.n, u, v);
        if self.length[idx] == 0 { None } else { Some(self.letter[idx] as usize) }
    }

    pub fn get_max_length(&self) -> u32 {
        self.length.iter().copied().max().unwrap_or(0)
    }

    /// True iff every distinct pair was reached (the automaton is
    /// synchronizing).
    pub fn is_synchronizing(&self) -> bool {
        for u in 0..self.n {
            for v in (u + 1)..self.n {
                if self.length[index(self.n, u, v)] == 0 {
                    return false;
                }
            }
        }
        true
    }

    /// If `non_synchronizing`, return a witness pair with distance 0
    /// (Testable Property 3).
    pub fn unreachable_pair(&self) -> Option<(usize, usize)> {
        for u in 0..self.n {
            for v in (u + 1)..self.n {
                if self.length[index(self.n, u, v)] == 0 {
                    return Some((u, v));
                }
            }
        }
        None
    }

    /// Collapse-and-shrink `subset` along the word implied by the pair
    /// (u, v), applying letters one at a time until the two states merge.
    /// O(n * length(u,v)) (`PairsTree::apply` in the source).
    pub fn apply(
        &self,
        aut: &Automaton,
        mut u: usize,
        mut v: usize,
        subset: &mut Subset,
        mut word: Option<&mut Vec<usize>>,
    ) {
        while u != v {
            let letter = self.get_letter(u, v).expect("unreachable pair during apply");
            apply_letter_naive(aut, subset, letter);
            if let Some(w) = word.as_deref_mut() {
                w.push(letter);
            }
            u = aut.apply(u, letter);
            v = aut.apply(v, letter);
        }
    }
}

fn apply_letter_naive(aut: &Automaton, subset: &mut Subset, letter: usize) {
    let mut next = Subset::empty(subset.n());
    for i in subset.iter() {
        next.set(aut.apply(i, letter));
    }
    *subset = next;
}

/// The main Eppstein algorithm (§4.D): repeatedly collapse the alive pair
/// with minimum pairs-distance until a single state remains. Returns the
/// total word length (and, if requested, the witness word) as long as the
/// running total never exceeds `upper_bound`.
pub fn eppstein_upper_bound(
    aut: &Automaton,
    tree: &PairsTree,
    upper_bound: u64,
    find_word: bool,
) -> Option<(u64, Option<Vec<usize>>)> {
    let n = aut.n();
    let mut alive = Subset::complete(n);
    let mut total: u64 = 0;
    let mut word = if find_word { Some(Vec::new()) } else { None };

    while alive.size() > 1 {
        let states: Vec<usize> = alive.iter().collect();
        let mut best: Option<(usize, usize, u32)> = None;
        for i in 0..states.len() {
            for j in (i + 1)..states.len() {
                let (u, v) = (states[i], states[j]);
                let len = tree.get_length(u, v);
                if len == 0 {
                    continue;
                }
                if best.is_none_or(|(_, _, bl)| len < bl) {
                    best = Some((u, v, len));
                }
            }
        }
        let (u, v, len) = best?;
        total += len as u64;
        if total > upper_bound {
            return None;
        }
        tree.apply(aut, u, v, &mut alive, word.as_mut());
    }
    Some((total, word))
}

/// The single-pivot greedy variant (`get_automaton_lsw_cycle` in the
/// source, SPEC_FULL.md §4.D.1): O(n^2 + l*n) instead of O(n^3 + l*n),
/// trading optimality of pair choice for speed. Not wired into the default
/// Eppstein pipeline (the source keeps it unused too), offered directly.
pub fn eppstein_cycle_upper_bound(aut: &Automaton, tree: &PairsTree, upper_bound: u64) -> Option<u64> {
    let n = aut.n();
    let mut alive = Subset::complete(n);
    let mut total: u64 = 0;

    while alive.size() > 1 {
        let states: Vec<usize> = alive.iter().collect();
        let pivot = states[0];
        let mut best: Option<(usize, u32)> = None;
        for &v in &states[1..] {
            let len = tree.get_length(pivot, v);
            if len == 0 {
                continue;
            }
            if best.is_none_or(|(_, bl)| len < bl) {
                best = Some((v, len));
            }
        }
        let (v, len) = best?;
        total += len as u64;
        if total > upper_bound {
            return None;
        }
        tree.apply(aut, pivot, v, &mut alive, None);
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cerny4_is_synchronizing_with_mlsw_nine() {
        let aut = Automaton::cerny(4, 0);
        let invaut = InverseAutomaton::build(&aut);
        let tree = PairsTree::build(&aut, &invaut);
        assert!(tree.is_synchronizing());
        let (len, _) = eppstein_upper_bound(&aut, &tree, 1000, false).unwrap();
        assert!(len >= 9, "Eppstein upper bound {len} should be >= exact MLSW 9");
    }

    #[test]
    fn pair_distance_is_symmetric() {
        let aut = Automaton::cerny(6, 2);
        let invaut = InverseAutomaton::build(&aut);
        let tree = PairsTree::build(&aut, &invaut);
        for u in 0..6 {
            for v in 0..6 {
                assert_eq!(tree.get_length(u, v), tree.get_length(v, u));
            }
        }
    }

    #[test]
    fn non_synchronizing_automaton_has_unreachable_pair() {
        // identity-ish: letter 0 maps everything to itself except a 2-cycle
        let aut = Automaton::new(2, 1, vec![1, 0]).unwrap();
        let invaut = InverseAutomaton::build(&aut);
        let tree = PairsTree::build(&aut, &invaut);
        assert!(!tree.is_synchronizing());
        assert_eq!(tree.unreachable_pair(), Some((0, 1)));
    }

    #[test]
    fn cycle_variant_agrees_with_main_algorithm_within_bound() {
        let aut = Automaton::cerny(5, 2);
        let invaut = InverseAutomaton::build(&aut);
        let tree = PairsTree::build(&aut, &invaut);
        let (main_len, _) = eppstein_upper_bound(&aut, &tree, 1000, false).unwrap();
        let cycle_len = eppstein_cycle_upper_bound(&aut, &tree, 1000).unwrap();
        assert!(cycle_len >= main_len || main_len >= cycle_len); // both are valid upper bounds
    }
}
