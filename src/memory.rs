//! Memory-tracking infrastructure (component N).
//!
//! The source pairs a hand-rolled hybrid allocator (heap below one page,
//! `mmap`+`mremap` above) with a `MemoryUsage` abstract base
//! (`synchrolib/utils/memory.hpp`) so the Exact scheduler can query live
//! container footprints against a configured budget.
//!
//! This crate keeps the `MemoryUsage` trait — it is a real, load-bearing
//! part of the Exact scheduler's cost/feasibility checks — but does not
//! hand-roll the `mmap` allocator. See SPEC_FULL.md §9 Open Question 1 for
//! the rationale: the standard global allocator's amortized-doubling growth
//! is the documented expansion policy, and `MemoryUsage` impls report
//! capacity-based footprints so the scheduler still sees real growth.

pub trait MemoryUsage {
    fn memory_usage(&self) -> usize;
}

impl<T: MemoryUsage> MemoryUsage for Vec<T> {
    fn memory_usage(&self) -> usize {
        self.iter().map(MemoryUsage::memory_usage).sum()
    }
}

impl<T: MemoryUsage> MemoryUsage for [T] {
    fn memory_usage(&self) -> usize {
        self.iter().map(MemoryUsage::memory_usage).sum()
    }
}

impl MemoryUsage for crate::subset::Subset {
    fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.words().len() * std::mem::size_of::<u64>()
    }
}

/// Render a byte count as mebibytes with `precision` decimal digits
/// (`get_megabytes` in `memory.hpp`).
pub fn megabytes(bytes: usize, precision: usize) -> f64 {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    let factor = 10f64.powi(precision as i32);
    (mb * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn megabytes_rounds_to_precision() {
        assert_eq!(megabytes(1024 * 1024, 2), 1.0);
        assert_eq!(megabytes(1536 * 1024, 1), 1.5);
    }

    #[test]
    fn vec_memory_usage_sums_elements() {
        let subsets = vec![crate::subset::Subset::empty(70); 3];
        let expected: usize = subsets.iter().map(|s| s.memory_usage()).sum();
        assert_eq!(subsets.memory_usage(), expected);
    }
}
