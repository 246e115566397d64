//! The automaton data model: a dense transition table and its inverse.

use crate::error::SynchroError;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// A complete deterministic finite automaton: `n` states, `k` letters.
///
/// Dense table `delta[state * k + letter] -> state`. Immutable after
/// construction (`synchrolib::data_structures::automaton::Automaton<N,K>`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Automaton {
    n: usize,
    k: usize,
    delta: Vec<u32>,
}

impl Automaton {
    pub fn new(n: usize, k: usize, delta: Vec<u32>) -> Result<Self, SynchroError> {
        if n == 0 || k == 0 {
            return Err(SynchroError::InvalidInput("n and k must be nonzero".into()));
        }
        if delta.len() != n * k {
            return Err(SynchroError::InvalidInput(format!(
                "expected {} transition entries, got {}",
                n * k,
                delta.len()
            )));
        }
        if delta.iter().any(|&s| s as usize >= n) {
            return Err(SynchroError::InvalidInput(
                "transition target out of range [0, n)".into(),
            ));
        }
        Ok(Automaton { n, k, delta })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn apply(&self, state: usize, letter: usize) -> usize {
        self.delta[state * self.k + letter] as usize
    }

    /// Restrict the automaton to `states` (must be closed under `delta`),
    /// remapping to a dense `0..states.len()` index space. Returns the
    /// reduced automaton and the `old -> new` index map (`None` for states
    /// not kept). Mirrors `get_automaton_reduced` in `connectivity.cpp`.
    pub fn restricted(&self, states: &[usize]) -> (Automaton, Vec<Option<usize>>) {
        let mut map = vec![None; self.n];
        for (new_idx, &old) in states.iter().enumerate() {
            map[old] = Some(new_idx);
        }
        let mut delta = Vec::with_capacity(states.len() * self.k);
        for &old in states {
            for letter in 0..self.k {
                let target = self.apply(old, letter);
                let new_target = map[target]
                    .expect("restricted() requires states closed under delta");
                delta.push(new_target as u32);
            }
        }
        (
            Automaton { n: states.len(), k: self.k, delta },
            map,
        )
    }

    /// Apply a state permutation: `order[old] = new`.
    pub fn permuted(&self, order: &[usize]) -> Automaton {
        let mut delta = vec![0u32; self.n * self.k];
        for old in 0..self.n {
            for letter in 0..self.k {
                let target = self.apply(old, letter);
                delta[order[old] * self.k + letter] = order[target] as u32;
            }
        }
        Automaton { n: self.n, k: self.k, delta }
    }

    /// The modified Cerny automaton of size `n` (`generate_cerny` in the
    /// source): letter 0 is the cyclic successor; letter 1 is identity
    /// except `special_pos` maps to 1. (The explicit `n-1 -> 0` assignment
    /// for letter 0 is a no-op: the cyclic successor already wraps `n-1` to
    /// `0`, but the source sets it explicitly and this mirrors that.)
    pub fn cerny(n: usize, special_pos: usize) -> Automaton {
        let mut delta = vec![0u32; n * 2];
        for i in 0..n {
            delta[i * 2] = ((i + 1) % n) as u32;
            delta[i * 2 + 1] = i as u32;
        }
        delta[(n - 1) * 2] = 0;
        delta[special_pos * 2 + 1] = 1;
        Automaton { n, k: 2, delta }
    }

    /// Uniform random automaton with `n` states and `k` letters
    /// (`generate_random` in the source).
    pub fn random(n: usize, k: usize, seed: u64) -> Automaton {
        let mut rng = SmallRng::seed_from_u64(seed);
        let delta = (0..n * k).map(|_| rng.random_range(0..n as u32)).collect();
        Automaton { n, k, delta }
    }
}

/// The inverse automaton: for each `(letter, state)`, the list of preimages.
///
/// Stored as three parallel dense arrays indexed by `letter * n + state`:
/// `edges` (flattened preimage lists), `begin`/`end` (ranges into `edges`).
#[derive(Clone, Debug)]
pub struct InverseAutomaton {
    n: usize,
    k: usize,
    edges: Vec<u32>,
    begin: Vec<u32>,
    end: Vec<u32>,
}

impl InverseAutomaton {
    pub fn build(aut: &Automaton) -> Self {
        let n = aut.n();
        let k = aut.k();
        let mut counts = vec![0u32; k * n];
        for state in 0..n {
            for letter in 0..k {
                let target = aut.apply(state, letter);
                counts[letter * n + target] += 1;
            }
        }
        let mut begin = vec![0u32; k * n];
        let mut end = vec![0u32; k * n];
        let mut acc = 0u32;
        for i in 0..k * n {
            begin[i] = acc;
            acc += counts[i];
            end[i] = acc;
        }
        let mut cursor = begin.clone();
        let mut edges = vec![0u32; acc as usize];
        for state in 0..n {
            for letter in 0..k {
                let target = aut.apply(state, letter);
                let idx = letter * n + target;
                edges[cursor[idx] as usize] = state as u32;
                cursor[idx] += 1;
            }
        }
        InverseAutomaton { n, k, edges, begin, end }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn preimages(&self, state: usize, letter: usize) -> &[u32] {
        let idx = letter * self.n + state;
        &self.edges[self.begin[idx] as usize..self.end[idx] as usize]
    }

    #[inline]
    pub fn preimage_count(&self, state: usize, letter: usize) -> usize {
        let idx = letter * self.n + state;
        (self.end[idx] - self.begin[idx]) as usize
    }
}
