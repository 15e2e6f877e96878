//! Reusable heap layouts.
//!
//! - [`checkerboard`]: alternating live and free blocks of one size.
//! - [`stamp`] / [`verify_stamp`]: distinct per-object byte patterns.

use cairn_arena::{DiagnosticSink, Heap, Ptr};

/// Allocate `count` objects of `size` bytes, then release every other one.
///
/// Returns `(live, released)`. The released blocks cannot merge because
/// each is fenced in by live neighbours, so the heap ends up with at
/// least `count / 2` free holes of exactly `size` (rounded) bytes.
///
/// # Panics
///
/// Panics if the heap cannot hold `count` objects.
pub fn checkerboard<S: DiagnosticSink>(
    heap: &mut Heap<S>,
    count: usize,
    size: usize,
) -> (Vec<Ptr>, Vec<Ptr>) {
    let all: Vec<Ptr> = (0..count)
        .map(|i| {
            heap.allocate(size)
                .unwrap_or_else(|e| panic!("checkerboard object {i}: {e}"))
        })
        .collect();
    let mut live = Vec::with_capacity(count / 2 + 1);
    let mut released = Vec::with_capacity(count / 2);
    for (i, p) in all.into_iter().enumerate() {
        if i % 2 == 0 {
            heap.release(p)
                .unwrap_or_else(|e| panic!("checkerboard release {i}: {e}"));
            released.push(p);
        } else {
            live.push(p);
        }
    }
    (live, released)
}

/// Byte pattern for the `index`-th object. Never zero.
pub fn pattern(index: usize) -> u8 {
    (index % 255) as u8 + 1
}

/// Fill a live allocation with its pattern.
///
/// # Panics
///
/// Panics if `ptr` is not a live allocation.
pub fn stamp<S>(heap: &mut Heap<S>, ptr: Ptr, index: usize) {
    heap.payload_mut(ptr)
        .unwrap_or_else(|| panic!("{ptr} is not a live allocation"))
        .fill(pattern(index));
}

/// Whether a live allocation still holds its pattern.
pub fn verify_stamp<S>(heap: &Heap<S>, ptr: Ptr, index: usize) -> bool {
    heap.payload(ptr)
        .is_some_and(|bytes| bytes.iter().all(|&b| b == pattern(index)))
}
