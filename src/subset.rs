//! Bitset representation of a subset of automaton states.
//!
//! Bits are packed into 64-bit buckets (`synchrolib::data_structures::subset::Subset<S>`
//! in the source). Width `n` is a runtime parameter rather than a compile-time
//! const generic — see SPEC_FULL.md §3.

use std::cmp::Ordering;

/// A subset of `{0, .., n-1}`, packed into 64-bit words.
///
/// Invariant: bits at index >= `n` are always zero. Every mutating operation
/// that could otherwise set a tail bit (e.g. `complement`) masks them back out.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Subset {
    words: Vec<u64>,
    n: usize,
}

fn word_count(n: usize) -> usize {
    n.div_ceil(64)
}

fn tail_mask(n: usize) -> u64 {
    let rem = n % 64;
    if rem == 0 { u64::MAX } else { (1u64 << rem) - 1 }
}

impl Subset {
    pub fn empty(n: usize) -> Self {
        Subset { words: vec![0; word_count(n)], n }
    }

    pub fn complete(n: usize) -> Self {
        let mut words = vec![u64::MAX; word_count(n)];
        if let Some(last) = words.last_mut() {
            *last &= tail_mask(n);
        }
        Subset { words, n }
    }

    pub fn singleton(n: usize, i: usize) -> Self {
        let mut s = Subset::empty(n);
        s.set(i);
        s
    }

    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_set(&self, i: usize) -> bool {
        debug_assert!(i < self.n);
        (self.words[i / 64] >> (i % 64)) & 1 == 1
    }

    #[inline]
    pub fn set(&mut self, i: usize) {
        debug_assert!(i < self.n);
        self.words[i / 64] |= 1u64 << (i % 64);
    }

    #[inline]
    pub fn unset(&mut self, i: usize) {
        debug_assert!(i < self.n);
        self.words[i / 64] &= !(1u64 << (i % 64));
    }

    pub fn size(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Iterate set bit indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        let n = self.n;
        self.words.iter().enumerate().flat_map(move |(wi, &w)| {
            let base = wi * 64;
            (0..64)
                .filter(move |b| base + b < n && (w >> b) & 1 == 1)
                .map(move |b| base + b)
        })
    }

    pub fn union_with(&mut self, other: &Subset) {
        debug_assert_eq!(self.n, other.n);
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a |= b;
        }
    }

    pub fn intersect_with(&mut self, other: &Subset) {
        debug_assert_eq!(self.n, other.n);
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a &= b;
        }
    }

    pub fn union(&self, other: &Subset) -> Subset {
        let mut r = self.clone();
        r.union_with(other);
        r
    }

    pub fn intersection(&self, other: &Subset) -> Subset {
        let mut r = self.clone();
        r.intersect_with(other);
        r
    }

    /// Complement within [0, n), masking tail bits back to zero.
    pub fn complement(&self) -> Subset {
        let mut words: Vec<u64> = self.words.iter().map(|w| !w).collect();
        if let Some(last) = words.last_mut() {
            *last &= tail_mask(self.n);
        }
        Subset { words, n: self.n }
    }

    pub fn negate(&mut self) {
        for w in self.words.iter_mut() {
            *w = !*w;
        }
        if let Some(last) = self.words.last_mut() {
            *last &= tail_mask(self.n);
        }
    }

    pub fn is_subset_of(&self, other: &Subset) -> bool {
        debug_assert_eq!(self.n, other.n);
        self.words.iter().zip(other.words.iter()).all(|(a, b)| a & !b == 0)
    }

    pub fn is_proper_subset_of(&self, other: &Subset) -> bool {
        self.is_subset_of(other) && self != other
    }

    /// Bit-reversed-per-word ordering used as the deterministic sort key
    /// (`Subset::operator<` in the source, via `reverse64`). Buckets compare
    /// from the highest word down.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Apply a state permutation: `order[i]` is the new index of old state `i`.
    pub fn permuted(&self, order: &[usize]) -> Subset {
        let mut r = Subset::empty(self.n);
        for i in self.iter() {
            r.set(order[i]);
        }
        r
    }
}

impl PartialOrd for Subset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Subset {
    fn cmp(&self, other: &Self) -> Ordering {
        debug_assert_eq!(self.n, other.n);
        for (a, b) in self.words.iter().rev().zip(other.words.iter().rev()) {
            let ra = a.reverse_bits();
            let rb = b.reverse_bits();
            match ra.cmp(&rb) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

/// Sort `subsets` by cardinality descending; within each cardinality bucket,
/// order by `Subset`'s deterministic total order. Mirrors
/// `sort_sets_cardinality_descending` in `subset_utils.hpp`: a counting sort
/// by popcount into descending buckets, then a comparator-driven sort inside
/// each bucket.
pub fn sort_cardinality_descending(subsets: &mut [Subset]) {
    if subsets.is_empty() {
        return;
    }
    let n = subsets[0].n();
    let mut buckets: Vec<Vec<Subset>> = vec![Vec::new(); n + 1];
    for s in subsets.iter() {
        buckets[s.size() as usize].push(s.clone());
    }
    let mut out = Vec::with_capacity(subsets.len());
    for bucket in buckets.iter_mut().rev() {
        bucket.sort();
        out.append(bucket);
    }
    subsets.clone_from_slice(&out);
}

/// Remove adjacent duplicates from a sorted list (`keep_unique`).
pub fn dedup_sorted(subsets: &mut Vec<Subset>) {
    subsets.dedup();
}

/// Sort then dedup (`sort_keep_unique`).
pub fn sort_dedup(subsets: &mut Vec<Subset>) {
    subsets.sort();
    dedup_sorted(subsets);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_complete() {
        let n = 70; // spans two words
        let empty = Subset::empty(n);
        assert_eq!(empty.size(), 0);
        let complete = Subset::complete(n);
        assert_eq!(complete.size(), n as u32);
        for i in 0..n {
            assert!(complete.is_set(i));
        }
    }

    #[test]
    fn complement_masks_tail() {
        let n = 70;
        let empty = Subset::empty(n);
        let comp = empty.complement();
        assert_eq!(comp.size(), n as u32);
        // words beyond n must be zero in the final word
        let last = *comp.words().last().unwrap();
        assert_eq!(last & !tail_mask(n), 0);
    }

    #[test]
    fn singleton_and_subset_relation() {
        let n = 10;
        let a = Subset::singleton(n, 3);
        let mut b = Subset::empty(n);
        b.set(3);
        b.set(5);
        assert!(a.is_subset_of(&b));
        assert!(a.is_proper_subset_of(&b));
        assert!(!b.is_subset_of(&a));
    }

    #[test]
    fn sort_by_cardinality_descending_then_order() {
        let n = 8;
        let mut a = Subset::empty(n);
        a.set(0);
        let mut b = Subset::empty(n);
        b.set(0);
        b.set(1);
        let mut c = Subset::empty(n);
        c.set(2);
        let mut v = vec![a.clone(), b.clone(), c.clone()];
        sort_cardinality_descending(&mut v);
        assert_eq!(v[0].size(), 2);
        assert_eq!(v[1].size(), 1);
        assert_eq!(v[2].size(), 1);
    }

    #[test]
    fn union_and_intersection() {
        let n = 8;
        let mut a = Subset::empty(n);
        a.set(0);
        a.set(1);
        let mut b = Subset::empty(n);
        b.set(1);
        b.set(2);
        let u = a.union(&b);
        assert_eq!(u.size(), 3);
        let i = a.intersection(&b);
        assert_eq!(i.size(), 1);
        assert!(i.is_set(1));
    }
}
