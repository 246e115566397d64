//! Packed subset trie (component E): a persistent, flat-array binary trie
//! over bit positions with subtree pop-count pruning, built once from a
//! sorted deduplicated list and queried read-only afterwards
//! (`SubsetsTrie<N,Threads>` in `subsets_trie.hpp`).
//!
//! Simplification from the source (documented in DESIGN.md): internal
//! nodes hold only `zero`/`one` child indices, never an inline subset
//! bucket — every stored subset lives in a leaf. This keeps the structure
//! and the query recursion simple while preserving the two properties the
//! rest of the system depends on: the subtree-minimum pruning rule and
//! "always descend zero, conditionally descend one".

use crate::memory::MemoryUsage;
use crate::subset::{Subset, sort_dedup};

const LEAF_MAX: usize = 10;

#[derive(Clone, Debug)]
enum Node {
    Leaf { begin: usize, end: usize, min_popcount: u32 },
    Branch { zero: Option<usize>, one: Option<usize>, division_bit: usize, min_popcount: u32 },
}

impl Node {
    fn min_popcount(&self) -> u32 {
        match self {
            Node::Leaf { min_popcount, .. } => *min_popcount,
            Node::Branch { min_popcount, .. } => *min_popcount,
        }
    }
}

/// A built, read-only packed trie of subsets.
#[derive(Clone, Debug)]
pub struct PackedTrie {
    nodes: Vec<Node>,
    subsets: Vec<Subset>,
    root: Option<usize>,
}

fn get_division_bit(items: &[Subset], n: usize) -> Option<usize> {
    let mut best_bit = None;
    let mut best_count = 0usize;
    for bit in 0..n {
        let count = items.iter().filter(|s| s.is_set(bit)).count();
        if count == 0 || count == items.len() {
            continue;
        }
        if count > best_count {
            best_count = count;
            best_bit = Some(bit);
        }
    }
    best_bit
}

fn partition_by_bit(items: &mut [Subset], bit: usize) -> usize {
    let mut lo = 0;
    let mut hi = items.len();
    while lo < hi {
        if !items[lo].is_set(bit) {
            lo += 1;
        } else {
            hi -= 1;
            items.swap(lo, hi);
        }
    }
    lo
}

impl PackedTrie {
    /// Build the trie from `items` (sorted and deduplicated in place here).
    pub fn build(mut items: Vec<Subset>) -> Self {
        sort_dedup(&mut items);
        let n = items.first().map(|s| s.n()).unwrap_or(0);
        let mut nodes = Vec::new();
        let mut flat = items;
        let root = if flat.is_empty() {
            None
        } else {
            Some(Self::build_range(&mut flat, 0, flat.len(), n, &mut nodes))
        };
        PackedTrie { nodes, subsets: flat, root }
    }

    fn build_range(flat: &mut [Subset], begin: usize, end: usize, n: usize, nodes: &mut Vec<Node>) -> usize {
        let len = end - begin;
        if len <= LEAF_MAX {
            let min_popcount = flat[begin..end].iter().map(|s| s.size()).min().unwrap_or(0);
            nodes.push(Node::Leaf { begin, end, min_popcount });
            return nodes.len() - 1;
        }
        let slice = &mut flat[begin..end];
        let division_bit = match get_division_bit(slice, n) {
            Some(bit) => bit,
            None => {
                // all remaining elements identical on every bit: leaf.
                let min_popcount = slice.iter().map(|s| s.size()).min().unwrap_or(0);
                nodes.push(Node::Leaf { begin, end, min_popcount });
                return nodes.len() - 1;
            }
        };
        let split = partition_by_bit(slice, division_bit) + begin;

        let zero = if split > begin {
            Some(Self::build_range(flat, begin, split, n, nodes))
        } else {
            None
        };
        let one = if end > split {
            Some(Self::build_range(flat, split, end, n, nodes))
        } else {
            None
        };
        let min_popcount = zero
            .map(|i| nodes[i].min_popcount())
            .into_iter()
            .chain(one.map(|i| nodes[i].min_popcount()))
            .min()
            .unwrap_or(0);
        nodes.push(Node::Branch { zero, one, division_bit, min_popcount });
        nodes.len() - 1
    }

    pub fn len(&self) -> usize {
        self.subsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subsets.is_empty()
    }

    /// Does the trie contain an element that is a (proper) subset of `query`?
    pub fn contains_subset_of(&self, query: &Subset, proper: bool) -> bool {
        match self.root {
            Some(root) => self.query(root, query, proper),
            None => false,
        }
    }

    fn query(&self, node_idx: usize, query: &Subset, proper: bool) -> bool {
        let node = &self.nodes[node_idx];
        if query.size() < node.min_popcount() {
            return false;
        }
        match node {
            Node::Leaf { begin, end, .. } => self.subsets[*begin..*end].iter().any(|s| {
                if proper { s.is_proper_subset_of(query) } else { s.is_subset_of(query) }
            }),
            Node::Branch { zero, one, division_bit, .. } => {
                if let Some(z) = zero {
                    if self.query(*z, query, proper) {
                        return true;
                    }
                }
                if let Some(o) = one {
                    if query.is_set(*division_bit) && self.query(*o, query, proper) {
                        return true;
                    }
                }
                false
            }
        }
    }
}

impl MemoryUsage for PackedTrie {
    fn memory_usage(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<Node>() + self.subsets.memory_usage()
    }
}
