//! Benchmark workloads for the Cairn allocator.
//!
//! Three fixed allocation patterns over one-byte objects:
//!
//! - [`Workload::Immediate`]: allocate and release straight away, [`OBJECT_COUNT`] times
//! - [`Workload::Batch`]: allocate [`OBJECT_COUNT`] objects, then release them all
//! - [`Workload::Churn`]: seeded coin flips between allocating and releasing a
//!   random live object, then release whatever is left
//!
//! Each run returns the number of allocate and release calls it made, so
//! callers can report per-operation timings.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use cairn_arena::{ArenaConfig, ConfigError, DiagnosticSink, Heap, HeapError, NullSink, Ptr};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Objects per workload run.
pub const OBJECT_COUNT: usize = 60;

/// Rounds the `memgrind` example runs each workload for.
pub const ROUNDS: usize = 50;

/// An allocation pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Workload {
    /// Allocate one byte and release it immediately.
    Immediate,
    /// Allocate every object, then release every object.
    Batch,
    /// Random interleaving of allocations and releases.
    Churn {
        /// RNG seed.
        seed: u64,
    },
}

impl Workload {
    /// All three workloads, churn seeded with `seed`.
    pub fn all(seed: u64) -> [Workload; 3] {
        [Workload::Immediate, Workload::Batch, Workload::Churn { seed }]
    }

    /// Short name for reports and benchmark ids.
    pub fn name(&self) -> &'static str {
        match self {
            Workload::Immediate => "immediate",
            Workload::Batch => "batch",
            Workload::Churn { .. } => "churn",
        }
    }

    /// Run the workload against `heap`.
    ///
    /// Returns the number of allocate plus release calls. Any heap error
    /// aborts the run.
    pub fn run<S: DiagnosticSink>(&self, heap: &mut Heap<S>) -> Result<usize, HeapError> {
        match *self {
            Workload::Immediate => immediate(heap),
            Workload::Batch => batch(heap),
            Workload::Churn { seed } => churn(heap, seed),
        }
    }
}

/// A fresh heap sized for the workloads, with diagnostics discarded.
pub fn bench_heap() -> Result<Heap<NullSink>, ConfigError> {
    // 60 one-byte objects need 960 bytes; the default arena is plenty.
    Heap::with_sink(ArenaConfig::default(), NullSink)
}

/// Allocate and release one byte, [`OBJECT_COUNT`] times.
pub fn immediate<S: DiagnosticSink>(heap: &mut Heap<S>) -> Result<usize, HeapError> {
    for _ in 0..OBJECT_COUNT {
        let p = heap.allocate(1)?;
        heap.release(p)?;
    }
    Ok(2 * OBJECT_COUNT)
}

/// Allocate [`OBJECT_COUNT`] one-byte objects, then release them in order.
pub fn batch<S: DiagnosticSink>(heap: &mut Heap<S>) -> Result<usize, HeapError> {
    let ptrs = (0..OBJECT_COUNT)
        .map(|_| heap.allocate(1))
        .collect::<Result<Vec<Ptr>, _>>()?;
    for p in ptrs {
        heap.release(p)?;
    }
    Ok(2 * OBJECT_COUNT)
}

/// [`OBJECT_COUNT`] coin flips: heads allocates, tails releases a random
/// live object (if any). Remaining objects are released at the end.
pub fn churn<S: DiagnosticSink>(heap: &mut Heap<S>, seed: u64) -> Result<usize, HeapError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut live: Vec<Ptr> = Vec::with_capacity(OBJECT_COUNT);
    let mut ops = 0;

    for _ in 0..OBJECT_COUNT {
        if rng.next_u32() % 2 == 0 {
            live.push(heap.allocate(1)?);
            ops += 1;
        } else if !live.is_empty() {
            let index = rng.next_u32() as usize % live.len();
            heap.release(live.swap_remove(index))?;
            ops += 1;
        }
    }
    ops += live.len();
    for p in live {
        heap.release(p)?;
    }
    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_test_utils::{assert_partitioned, layout, recording_heap, reported};

    #[test]
    fn every_workload_leaves_one_free_block() {
        for workload in Workload::all(42) {
            let mut heap = recording_heap(4096);
            let ops = workload.run(&mut heap).unwrap();
            assert!(ops > 0, "{} made no calls", workload.name());
            assert!(reported(&heap).is_empty(), "{} reported", workload.name());
            assert_eq!(layout(&heap), vec![(0, 4088, false)], "{}", workload.name());
            assert_partitioned(&heap);
        }
    }

    #[test]
    fn fixed_workloads_count_both_halves() {
        let mut heap = bench_heap().unwrap();
        assert_eq!(immediate(&mut heap).unwrap(), 120);
        assert_eq!(batch(&mut heap).unwrap(), 120);
    }

    #[test]
    fn churn_is_deterministic() {
        let a = churn(&mut recording_heap(4096), 7).unwrap();
        let b = churn(&mut recording_heap(4096), 7).unwrap();
        assert_eq!(a, b);
        // Every allocation is matched by exactly one release.
        assert_eq!(a % 2, 0);
    }

    #[test]
    fn workloads_survive_repeated_rounds() {
        let mut heap = bench_heap().unwrap();
        for round in 0..ROUNDS {
            for workload in Workload::all(round as u64) {
                workload.run(&mut heap).unwrap();
            }
        }
        assert_eq!(heap.stats().used_blocks, 0);
    }

    #[test]
    fn names_are_distinct() {
        let names: Vec<_> = Workload::all(0).iter().map(Workload::name).collect();
        assert_eq!(names, ["immediate", "batch", "churn"]);
    }
}
