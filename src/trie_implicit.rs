//! Implicit subset trie (component D): in-place partitioning to remove
//! candidate subsets that are a (proper) superset of some reference element
//! — i.e. keep only the minimal candidates not already dominated by a
//! reference element (`SubsetsImplicitTrie<N,Proper,Threads>` in
//! `subsets_implicit_trie.hpp`; per that header's `Subset::is_subset`
//! receiver/argument convention, `X.is_subset(Y)` means `Y ⊆ X`, so
//! `it->is_subset(*set)` there tests "reference ⊆ candidate").
//!
//! Not a persisted structure — each call recurses over bit positions,
//! partitioning the candidate range and (conservatively, for the "bit set"
//! branch) recursing against the full reference set. The pruning that *is*
//! load-bearing for correctness is the low/low restriction: a candidate with
//! bit `d` unset can only be a superset of a reference element that also has
//! bit `d` unset, since `reference ⊆ candidate` requires every reference bit
//! to also be set in the candidate (SPEC_FULL.md §4.C).
//!
//! The source reuses this same primitive for the mirror-image query too:
//! `dfs.cpp`'s capped-prefix reduction brackets its `reduce` call with
//! `sub.negate()`/`sub.negate()`, which flips every `reference ⊆ candidate`
//! test into `candidate ⊆ reference` for that one call site (its reference
//! there is deliberately the *largest* elements, used to discard smaller
//! elements already contained in one of them). Rather than port the negation
//! dance literally, [`reduce_subsets_of`] exposes that direction directly as
//! its own function, sharing the bit-position recursion via a `ref_is_subset`
//! flag on [`mark_survivors`].

use crate::subset::Subset;

/// Naive-fallback threshold: below this many reference elements, run the
/// direct O(|ref| * |cand|) pairwise test instead of recursing further.
const M: usize = 6;

fn naive_mark(
    reference: &[Subset],
    candidate: &[(Subset, usize)],
    proper: bool,
    ref_is_subset: bool,
    keep: &mut [bool],
) {
    for (sub, idx) in candidate {
        let is_covered = reference.iter().any(|r| {
            let (a, b) = if ref_is_subset { (r, sub) } else { (sub, r) };
            if proper { a.is_proper_subset_of(b) } else { a.is_subset_of(b) }
        });
        if is_covered {
            keep[*idx] = false;
        }
    }
}

fn partition_by_bit(items: &mut [(Subset, usize)], bit: usize) -> usize {
    let mut lo = 0;
    let mut hi = items.len();
    while lo < hi {
        if !items[lo].0.is_set(bit) {
            lo += 1;
        } else {
            hi -= 1;
            items.swap(lo, hi);
        }
    }
    lo
}

fn recurse(
    reference: &[Subset],
    candidate: &mut [(Subset, usize)],
    depth: usize,
    n: usize,
    proper: bool,
    ref_is_subset: bool,
    keep: &mut [bool],
) {
    if reference.len() <= M || candidate.is_empty() || depth >= n {
        naive_mark(reference, candidate, proper, ref_is_subset, keep);
        return;
    }
    let split = partition_by_bit(candidate, depth);
    let (cand_lo, cand_hi) = candidate.split_at_mut(split);
    if ref_is_subset {
        // bit `depth` = 0 candidates: a covering reference element must also
        // have bit `depth` unset (reference ⊆ candidate forces ref's bit <=
        // candidate's bit at every position).
        if !cand_lo.is_empty() {
            let ref_lo: Vec<Subset> = reference.iter().filter(|r| !r.is_set(depth)).cloned().collect();
            recurse(&ref_lo, cand_lo, depth + 1, n, proper, ref_is_subset, keep);
        }
        // bit `depth` = 1 candidates: any reference element could still cover
        // them, set or unset at this bit.
        recurse(reference, cand_hi, depth + 1, n, proper, ref_is_subset, keep);
    } else {
        // Mirror image (candidate ⊆ reference): bit `depth` = 1 candidates
        // can only be covered by a reference element that also has bit
        // `depth` set; bit `depth` = 0 candidates are unrestricted.
        recurse(reference, cand_lo, depth + 1, n, proper, ref_is_subset, keep);
        if !cand_hi.is_empty() {
            let ref_hi: Vec<Subset> = reference.iter().filter(|r| r.is_set(depth)).cloned().collect();
            recurse(&ref_hi, cand_hi, depth + 1, n, proper, ref_is_subset, keep);
        }
    }
}

/// Mark, for each candidate, whether it survives. `ref_is_subset` selects
/// the direction of the covering test: `true` tests "reference ⊆ candidate"
/// (remove candidates dominating a reference element), `false` tests
/// "candidate ⊆ reference" (remove candidates dominated by a reference
/// element). `reference` and `candidate` should already be sorted and
/// deduplicated (the source's `SortUniqueDone` parameter).
fn mark_survivors(reference: &[Subset], candidate: &[Subset], proper: bool, ref_is_subset: bool) -> Vec<bool> {
    let n = candidate.first().or_else(|| reference.first()).map(|s| s.n()).unwrap_or(0);
    let mut tagged: Vec<(Subset, usize)> =
        candidate.iter().cloned().enumerate().map(|(i, s)| (s, i)).collect();
    let mut keep = vec![true; candidate.len()];
    recurse(reference, &mut tagged, 0, n, proper, ref_is_subset, &mut keep);
    keep
}

/// Remove from `candidate` every element that is a superset of some element
/// of `reference`, preserving the relative order of survivors.
pub fn reduce_against(reference: &[Subset], candidate: &mut Vec<Subset>) {
    let keep = mark_survivors(reference, candidate, false, true);
    let mut it = keep.into_iter();
    candidate.retain(|_| it.next().unwrap());
}

/// Remove from `candidate` every element that is a *proper* subset of some
/// element of `reference` — the mirror image of [`reduce_against`], used by
/// the Exact DFS fallback's capped-prefix reduction (SPEC_FULL.md §4.L.1),
/// whose reference is deliberately the largest-cardinality elements and
/// wants to discard smaller elements they already contain (the source
/// achieves this by negating every subset around the equivalent call in
/// `dfs.cpp`, which flips "reference ⊆ candidate" into "candidate ⊆
/// reference"; this function takes that direction directly).
pub fn reduce_subsets_of(reference: &[Subset], candidate: &mut Vec<Subset>) {
    let keep = mark_survivors(reference, candidate, true, false);
    let mut it = keep.into_iter();
    candidate.retain(|_| it.next().unwrap());
}

/// True iff some element of `reference` is a subset of some element of
/// `candidate` (`check_contains_subset` in `subsets_implicit_trie.hpp`,
/// used by the Exact meet-in-the-middle goal check, SPEC_FULL.md §4.H, where
/// `reference` is the forward frontier and `candidate` the inverse frontier).
pub fn any_covered(reference: &[Subset], candidate: &[Subset]) -> bool {
    mark_survivors(reference, candidate, false, true).iter().any(|&k| !k)
}

/// Self-reduction: remove every element that is a *proper* superset of
/// another element in the same list, keeping only minimal elements
/// (`SubsetsImplicitTrie<N,true>::reduce(set)`).
pub fn reduce_self(candidate: &mut Vec<Subset>) {
    let reference = candidate.clone();
    let keep = mark_survivors(&reference, candidate, true, true);
    let mut it = keep.into_iter();
    candidate.retain(|_| it.next().unwrap());
}

/// Parallel variant: statically partition `candidate` across worker
/// threads; each shard runs the same recursion against the full
/// `reference`, and survivors are concatenated back in order.
pub fn reduce_against_parallel(reference: &[Subset], candidate: &mut Vec<Subset>) {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        let threads = crate::concurrency::default_thread_count().max(1);
        if candidate.len() >= threads * 64 {
            let chunk = candidate.len().div_ceil(threads);
            let survivors: Vec<Vec<Subset>> = candidate
                .par_chunks(chunk)
                .map(|shard| {
                    let mut owned = shard.to_vec();
                    reduce_against(reference, &mut owned);
                    owned
                })
                .collect();
            *candidate = survivors.into_iter().flatten().collect();
            return;
        }
    }
    reduce_against(reference, candidate);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subset(n: usize, bits: &[usize]) -> Subset {
        let mut s = Subset::empty(n);
        for &b in bits {
            s.set(b);
        }
        s
    }

    #[test]
    fn reduce_against_removes_supersets_of_reference() {
        let n = 8;
        let reference = vec![subset(n, &[0, 1])];
        let mut candidate = vec![subset(n, &[0, 1, 2, 3]), subset(n, &[4, 5])];
        reduce_against(&reference, &mut candidate);
        assert_eq!(candidate.len(), 1);
        assert_eq!(candidate[0], subset(n, &[4, 5]));
    }

    #[test]
    fn reduce_self_keeps_only_minimal_elements() {
        let n = 8;
        let mut candidate = vec![
            subset(n, &[0]),
            subset(n, &[0, 1]),
            subset(n, &[2, 3]),
        ];
        reduce_self(&mut candidate);
        assert_eq!(candidate.len(), 2);
        assert!(candidate.contains(&subset(n, &[0])));
        assert!(candidate.contains(&subset(n, &[2, 3])));
    }

    #[test]
    fn reduce_against_is_identity_when_nothing_covered() {
        let n = 10;
        let reference = vec![subset(n, &[0, 1])];
        let mut candidate = vec![subset(n, &[2, 3]), subset(n, &[4])];
        let before = candidate.clone();
        reduce_against(&reference, &mut candidate);
        assert_eq!(candidate, before);
    }

    #[test]
    fn reduce_subsets_of_removes_elements_contained_in_reference() {
        let n = 8;
        // reference is the larger element; candidate has one it properly
        // contains (should be removed) and one it doesn't (kept).
        let reference = vec![subset(n, &[0, 1, 2, 3])];
        let mut candidate = vec![subset(n, &[0, 1]), subset(n, &[4, 5])];
        reduce_subsets_of(&reference, &mut candidate);
        assert_eq!(candidate.len(), 1);
        assert_eq!(candidate[0], subset(n, &[4, 5]));
    }

    #[test]
    fn any_covered_detects_a_single_hit() {
        let n = 8;
        let reference = vec![subset(n, &[0, 1])];
        let disjoint = vec![subset(n, &[4, 5]), subset(n, &[6])];
        assert!(!any_covered(&reference, &disjoint));
        let hit = vec![subset(n, &[4, 5]), subset(n, &[0, 1, 2])];
        assert!(any_covered(&reference, &hit));
    }

    #[test]
    fn parallel_variant_matches_sequential() {
        let n = 16;
        let reference: Vec<Subset> = (0..5).map(|i| subset(n, &[2 * i, 2 * i + 1])).collect();
        let mut a: Vec<Subset> = (0..200)
            .map(|i| {
                if i % 2 == 0 {
                    // a superset of reference pair `i % 5`, should be removed.
                    let base = 2 * (i % 5);
                    subset(n, &[base, base + 1, (i * 3 + 1) % n])
                } else {
                    subset(n, &[i % n])
                }
            })
            .collect();
        let before = a.len();
        let mut b = a.clone();
        reduce_against(&reference, &mut a);
        reduce_against_parallel(&reference, &mut b);
        assert_eq!(a, b);
        assert!(a.len() < before);
    }
}
