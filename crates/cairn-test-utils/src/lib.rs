//! Test utilities and heap inspection helpers for Cairn development.
//!
//! Provides a [`recording_heap`] constructor whose diagnostics land in a
//! `Vec` for inspection, plus assertions for the arena invariants that
//! most tests want to check after every step.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use cairn_arena::{ArenaConfig, Diagnostic, Heap, HeapError, Ptr, HEADER_SIZE};

/// A heap that collects its diagnostics.
pub type RecordingHeap = Heap<Vec<Diagnostic>>;

/// Build a [`RecordingHeap`] of `capacity` bytes with the default split policy.
///
/// # Panics
///
/// Panics if `capacity` fails validation.
pub fn recording_heap(capacity: usize) -> RecordingHeap {
    Heap::with_sink(ArenaConfig::new(capacity), Vec::new())
        .unwrap_or_else(|e| panic!("invalid test capacity {capacity}: {e}"))
}

/// The errors reported so far, in order.
pub fn reported(heap: &RecordingHeap) -> Vec<HeapError> {
    heap.sink().iter().map(|d| d.error).collect()
}

/// Drain and return the collected diagnostics.
pub fn take_reports(heap: &mut RecordingHeap) -> Vec<Diagnostic> {
    std::mem::take(heap.sink_mut())
}

/// `(offset, size, occupied)` for every block, in address order.
pub fn layout<S>(heap: &Heap<S>) -> Vec<(usize, usize, bool)> {
    heap.blocks()
        .map(|b| (b.offset, b.size, b.occupied))
        .collect()
}

/// Assert the walk from offset 0 lands exactly on the arena's end and
/// that [`Heap::check`] agrees.
pub fn assert_partitioned<S>(heap: &Heap<S>) {
    if !heap.is_initialized() {
        return;
    }
    let end = heap
        .blocks()
        .fold(0, |offset, b| {
            assert_eq!(b.offset, offset, "gap or overlap before block at {}", b.offset);
            offset + HEADER_SIZE + b.size
        });
    assert_eq!(end, heap.capacity(), "blocks do not tile the arena");
    if let Err(e) = heap.check() {
        panic!("arena invariant broken: {e}");
    }
}

/// Assert no two live allocations share a byte.
pub fn assert_disjoint<S>(heap: &Heap<S>, ptrs: &[Ptr]) {
    let mut ranges: Vec<(usize, usize)> = ptrs
        .iter()
        .map(|&p| {
            let len = heap
                .payload(p)
                .unwrap_or_else(|| panic!("{p} is not a live allocation"))
                .len();
            (p.offset(), p.offset() + len)
        })
        .collect();
    ranges.sort_unstable();
    for pair in ranges.windows(2) {
        assert!(
            pair[0].1 <= pair[1].0,
            "allocations {:?} and {:?} overlap",
            pair[0],
            pair[1]
        );
    }
}

/// Allocate `size`-byte objects until the heap refuses, returning them.
pub fn fill(heap: &mut RecordingHeap, size: usize) -> Vec<Ptr> {
    let mut ptrs = Vec::new();
    while let Ok(p) = heap.allocate(size) {
        ptrs.push(p);
    }
    ptrs
}
