//! Concurrency infrastructure (component M): sharded batched-apply and
//! parallel sort, replacing the source's hand-rolled `ThreadPool`
//! (`synchrolib/utils/thread_pool.hpp`) and `parallel_sort`
//! (`synchrolib/utils/vector.hpp`).
//!
//! Per SPEC_FULL.md §5, this uses `rayon`'s work-stealing pool (the
//! teacher's own concurrency dependency) behind the `parallel` feature;
//! with the feature disabled the same functions run sequentially and
//! produce byte-identical output, satisfying "both paths produce
//! identical output; choice is invisible to callers."

use crate::subset::Subset;

/// Apply `f` to every element of `from`, writing into `to` (same length),
/// sharding across worker threads when `parallel` is enabled.
pub fn map_slices<F>(from: &[Subset], to: &mut [Subset], f: F)
where
    F: Fn(&Subset) -> Subset + Sync,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        to.par_iter_mut().zip(from.par_iter()).for_each(|(dst, src)| {
            *dst = f(src);
        });
    }
    #[cfg(not(feature = "parallel"))]
    {
        for (dst, src) in to.iter_mut().zip(from.iter()) {
            *dst = f(src);
        }
    }
}

/// Default worker count: `num_cpus::get()` when the `parallel` feature is
/// enabled (mirrors `workers::Pool::new` in the teacher), else 1.
pub fn default_thread_count() -> usize {
    #[cfg(feature = "parallel")]
    {
        num_cpus::get()
    }
    #[cfg(not(feature = "parallel"))]
    {
        1
    }
}

/// Logical OR of a predicate over a batch, sharded across worker threads and
/// short-circuiting as soon as any shard finds a hit
/// (`Dfs::check_nextlist_multithreaded` in `dfs.cpp`).
pub fn any_parallel<T, F>(items: &[T], f: F) -> bool
where
    T: Sync,
    F: Fn(&T) -> bool + Sync,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        items.par_iter().any(|item| f(item))
    }
    #[cfg(not(feature = "parallel"))]
    {
        items.iter().any(|item| f(item))
    }
}

/// Sort `items` in place, sharding the comparison work across worker
/// threads when large enough and `parallel` is enabled
/// (`parallel_sort` in `vector.hpp`).
pub fn parallel_sort<T: Ord + Send>(items: &mut [T]) {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        if items.len() > 4096 {
            items.par_sort_unstable();
            return;
        }
    }
    items.sort_unstable();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_slices_applies_function_elementwise() {
        let from = vec![Subset::singleton(8, 0), Subset::singleton(8, 1)];
        let mut to = vec![Subset::empty(8); 2];
        map_slices(&from, &mut to, |s| {
            let mut r = s.clone();
            r.negate();
            r
        });
        assert_eq!(to[0], from[0].complement());
        assert_eq!(to[1], from[1].complement());
    }

    #[test]
    fn any_parallel_short_circuits_correctly() {
        let items = vec![1, 2, 3, 4];
        assert!(any_parallel(&items, |&x| x == 3));
        assert!(!any_parallel(&items, |&x| x == 10));
    }

    #[test]
    fn parallel_sort_matches_sequential() {
        let mut a = vec![5, 3, 1, 4, 2];
        let mut b = a.clone();
        parallel_sort(&mut a);
        b.sort_unstable();
        assert_eq!(a, b);
    }
}
