//! Preprocessed transition table: slice-indexed lookup for applying one
//! letter to a subset in O(n / SLICE) (`PreprocessedTransition<N,K>` in the
//! source, `preprocessed_transition.hpp`).

use crate::automaton::{Automaton, InverseAutomaton};
use crate::memory::MemoryUsage;
use crate::subset::Subset;

pub const SLICE: usize = 8;
const SLICE_VALUES: usize = 1 << SLICE;

/// Precomputed per-slice union table for one letter.
///
/// `table[slice][value]` = union of `delta(slice*SLICE + b, letter)` over
/// bits `b` set in `value`.
#[derive(Clone, Debug)]
pub struct PreprocessedTransition {
    n: usize,
    slices: usize,
    table: Vec<Subset>, // flattened slices * SLICE_VALUES
}

impl PreprocessedTransition {
    fn build(n: usize, letter: usize, image_of: impl Fn(usize) -> usize) -> Self {
        let slices = n.div_ceil(SLICE);
        let mut table = vec![Subset::empty(n); slices * SLICE_VALUES];
        for slice in 0..slices {
            for value in 0..SLICE_VALUES {
                let mut acc = Subset::empty(n);
                for b in 0..SLICE {
                    if (value >> b) & 1 == 1 {
                        let state = slice * SLICE + b;
                        if state < n {
                            acc.set(image_of(state));
                        }
                    }
                }
                table[slice * SLICE_VALUES + value] = acc;
            }
        }
        let _ = letter;
        PreprocessedTransition { n, slices, table }
    }

    /// Build the forward table for `letter` from `aut`.
    pub fn from_automaton(aut: &Automaton, letter: usize) -> Self {
        Self::build(aut.n(), letter, |state| aut.apply(state, letter))
    }

    /// Build the inverse table for `letter`: the image of slice bit `state`
    /// is the union of preimages of `state` under `letter`.
    pub fn from_inverse_automaton(invaut: &InverseAutomaton, letter: usize) -> Self {
        let n = invaut.n();
        let slices = n.div_ceil(SLICE);
        let mut table = vec![Subset::empty(n); slices * SLICE_VALUES];
        for slice in 0..slices {
            for value in 0..SLICE_VALUES {
                let mut acc = Subset::empty(n);
                for b in 0..SLICE {
                    if (value >> b) & 1 == 1 {
                        let state = slice * SLICE + b;
                        if state < n {
                            for &pre in invaut.preimages(state, letter) {
                                acc.set(pre as usize);
                            }
                        }
                    }
                }
                table[slice * SLICE_VALUES + value] = acc;
            }
        }
        PreprocessedTransition { n, slices, table }
    }

    fn slice_value(from: &Subset, slice: usize) -> usize {
        let mut value = 0usize;
        for b in 0..SLICE {
            let state = slice * SLICE + b;
            if state < from.n() && from.is_set(state) {
                value |= 1 << b;
            }
        }
        value
    }

    /// Apply the letter to a single subset.
    pub fn apply(&self, from: &Subset) -> Subset {
        let mut result = Subset::empty(self.n);
        for slice in 0..self.slices {
            let value = Self::slice_value(from, slice);
            if value != 0 {
                result.union_with(&self.table[slice * SLICE_VALUES + value]);
            }
        }
        result
    }

    /// Batched application: apply the letter to every element of `from`,
    /// writing into `to` (same length). Sharded across threads when the
    /// `parallel` feature is enabled and the batch is large enough;
    /// sequential otherwise. Both paths produce identical output
    /// (SPEC_FULL.md §5).
    pub fn apply_batch(&self, from: &[Subset], to: &mut [Subset]) {
        debug_assert_eq!(from.len(), to.len());
        crate::concurrency::map_slices(from, to, |f| self.apply(f));
    }
}

impl MemoryUsage for PreprocessedTransition {
    fn memory_usage(&self) -> usize {
        self.table.capacity() * std::mem::size_of::<Subset>()
            + self.table.iter().map(|s| s.words().len() * 8).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Automaton;

    #[test]
    fn apply_matches_naive_image_law() {
        let aut = Automaton::cerny(10, 3);
        for letter in 0..aut.k() {
            let ptrans = PreprocessedTransition::from_automaton(&aut, letter);
            // naive image of {0,2,5,9}
            let mut from = Subset::empty(aut.n());
            for i in [0, 2, 5, 9] {
                from.set(i);
            }
            let got = ptrans.apply(&from);
            let mut expected = Subset::empty(aut.n());
            for i in from.iter() {
                expected.set(aut.apply(i, letter));
            }
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn inverse_apply_matches_naive_preimage() {
        use crate::automaton::InverseAutomaton;
        let aut = Automaton::cerny(9, 2);
        let invaut = InverseAutomaton::build(&aut);
        for letter in 0..aut.k() {
            let invptrans = PreprocessedTransition::from_inverse_automaton(&invaut, letter);
            let mut from = Subset::empty(aut.n());
            from.set(0);
            from.set(4);
            let got = invptrans.apply(&from);
            let mut expected = Subset::empty(aut.n());
            for i in from.iter() {
                for &pre in invaut.preimages(i, letter) {
                    expected.set(pre as usize);
                }
            }
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn batched_apply_matches_per_element_apply() {
        let aut = Automaton::random(40, 3, 7);
        let ptrans = PreprocessedTransition::from_automaton(&aut, 0);
        let froms: Vec<Subset> = (0..20)
            .map(|i| Subset::singleton(aut.n(), i % aut.n()))
            .collect();
        let mut batch = vec![Subset::empty(aut.n()); froms.len()];
        ptrans.apply_batch(&froms, &mut batch);
        for (f, b) in froms.iter().zip(batch.iter()) {
            assert_eq!(*b, ptrans.apply(f));
        }
    }
}
