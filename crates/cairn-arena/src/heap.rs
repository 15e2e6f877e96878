//! The allocator instance.
//!
//! [`Heap`] owns one [`Arena`] for its whole lifetime and ties together the
//! header model, first-fit allocation, release validation, coalescing and
//! diagnostics. Allocation lives in `alloc.rs`, release in `release.rs`;
//! this module holds construction and inspection.

use std::panic::Location;

use crate::arena::Arena;
use crate::coalesce::coalesce;
use crate::config::ArenaConfig;
use crate::diagnostic::{Diagnostic, DiagnosticSink, LogSink};
use crate::error::{ConfigError, Corruption, HeapError};
use crate::handle::Ptr;
use crate::header::{BlockInfo, Blocks, ALIGN, HEADER_SIZE};

/// A first-fit allocator over a fixed-capacity arena.
///
/// Strictly single-threaded: every mutating operation takes `&mut self`.
/// The arena is lazily initialised by the first successful `allocate`.
///
/// ```
/// use cairn_arena::{ArenaConfig, Heap};
///
/// let mut heap = Heap::new(ArenaConfig::new(4096)).unwrap();
/// let p = heap.allocate(100).unwrap();
/// heap.payload_mut(p).unwrap()[0] = 7;
/// heap.release(p).unwrap();
/// ```
pub struct Heap<S = LogSink> {
    pub(crate) arena: Arena,
    pub(crate) config: ArenaConfig,
    pub(crate) sink: S,
}

impl Heap<LogSink> {
    /// Create a heap that reports diagnostics through the `log` facade.
    pub fn new(config: ArenaConfig) -> Result<Self, ConfigError> {
        Self::with_sink(config, LogSink)
    }
}

impl Default for Heap<LogSink> {
    /// A 4096-byte heap with the default split policy.
    fn default() -> Self {
        let config = ArenaConfig::default();
        Self {
            arena: Arena::new(config.capacity),
            config,
            sink: LogSink,
        }
    }
}

impl<S: DiagnosticSink> Heap<S> {
    /// Create a heap that delivers diagnostics to `sink`.
    pub fn with_sink(config: ArenaConfig, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            arena: Arena::new(config.capacity),
            config,
            sink,
        })
    }

    /// Merge all runs of adjacent free blocks. Returns the number of merges.
    ///
    /// `allocate` and `release` already do this; calling it directly is
    /// only useful for inspection.
    pub fn coalesce(&mut self) -> usize {
        coalesce(&mut self.arena)
    }

    /// Send `error` to the sink, tagged with the caller's location.
    #[track_caller]
    pub(crate) fn report(&mut self, error: HeapError) -> HeapError {
        self.sink.report(Diagnostic {
            error,
            location: Location::caller(),
        });
        error
    }
}

impl<S> Heap<S> {
    /// The configuration this heap was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Total arena size in bytes.
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Whether any allocation has happened yet.
    pub fn is_initialized(&self) -> bool {
        self.arena.is_initialized()
    }

    /// The diagnostic sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the diagnostic sink, e.g. to drain collected reports.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the heap and return its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Walk the blocks in address order.
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks::new(&self.arena)
    }

    /// Raw arena contents, headers included.
    pub fn bytes(&self) -> &[u8] {
        self.arena.bytes()
    }

    /// The occupied block whose payload starts at `ptr`.
    fn live_block(&self, ptr: Ptr) -> Option<BlockInfo> {
        let target = ptr.header_offset()?;
        self.blocks()
            .take_while(|b| b.offset <= target)
            .find(|b| b.offset == target && b.occupied)
    }

    /// Payload of a live allocation, rounded size included.
    ///
    /// Returns `None` if `ptr` is not the start of an occupied block.
    pub fn payload(&self, ptr: Ptr) -> Option<&[u8]> {
        let block = self.live_block(ptr)?;
        Some(self.arena.slice(block.payload_offset(), block.size))
    }

    /// Mutable payload of a live allocation.
    ///
    /// Returns `None` if `ptr` is not the start of an occupied block.
    pub fn payload_mut(&mut self, ptr: Ptr) -> Option<&mut [u8]> {
        let block = self.live_block(ptr)?;
        Some(self.arena.slice_mut(block.payload_offset(), block.size))
    }

    /// The real address `ptr` corresponds to.
    ///
    /// Useful for callers that trade in raw pointers; hand it back through
    /// [`release_raw`](Heap::release_raw). Not meant to be dereferenced:
    /// go through [`payload_mut`](Heap::payload_mut) for access.
    pub fn as_ptr(&self, ptr: Ptr) -> *const u8 {
        self.arena.base().wrapping_add(ptr.offset())
    }

    /// Block and byte counts for the current layout.
    pub fn stats(&self) -> HeapStats {
        let mut stats = HeapStats {
            capacity: self.capacity(),
            ..HeapStats::default()
        };
        for block in self.blocks() {
            stats.blocks += 1;
            if block.occupied {
                stats.used_blocks += 1;
                stats.used_bytes += block.size;
            } else {
                stats.free_blocks += 1;
                stats.free_bytes += block.size;
                stats.largest_free = stats.largest_free.max(block.size);
            }
        }
        stats
    }

    /// Verify the arena invariants.
    ///
    /// The blocks must tile the arena exactly, every size must be a
    /// multiple of 8, and no two neighbouring blocks may both be free.
    /// An uninitialized arena trivially passes.
    pub fn check(&self) -> Result<(), Corruption> {
        if !self.arena.is_initialized() {
            return Ok(());
        }
        let capacity = self.capacity();
        let mut offset = 0;
        let mut prev_free: Option<usize> = None;
        while offset < capacity {
            if offset + HEADER_SIZE > capacity {
                return Err(Corruption::TruncatedHeader { offset });
            }
            let header = self.arena.header(offset);
            if header.size() % ALIGN != 0 {
                return Err(Corruption::UnalignedSize {
                    offset,
                    size: header.size(),
                });
            }
            let end = offset.saturating_add(header.span());
            if end > capacity {
                return Err(Corruption::Overrun { offset, end });
            }
            match (prev_free, header.occupied()) {
                (Some(left), false) => {
                    return Err(Corruption::Uncoalesced {
                        left,
                        right: offset,
                    })
                }
                (_, false) => prev_free = Some(offset),
                (_, true) => prev_free = None,
            }
            offset = end;
        }
        Ok(())
    }
}

/// Summary of a heap's block layout.
///
/// Before the first allocation every count is zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Arena size in bytes.
    pub capacity: usize,
    /// Number of blocks.
    pub blocks: usize,
    /// Number of occupied blocks.
    pub used_blocks: usize,
    /// Number of free blocks.
    pub free_blocks: usize,
    /// Payload bytes in occupied blocks.
    pub used_bytes: usize,
    /// Payload bytes in free blocks.
    pub free_bytes: usize,
    /// Payload size of the largest free block.
    pub largest_free: usize,
}

impl HeapStats {
    /// Bytes spent on headers.
    pub fn header_bytes(&self) -> usize {
        self.blocks * HEADER_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Header;

    fn collecting(capacity: usize) -> Heap<Vec<Diagnostic>> {
        Heap::with_sink(ArenaConfig::new(capacity), Vec::new()).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(matches!(
            Heap::new(ArenaConfig::new(100)),
            Err(ConfigError::CapacityNotAligned { capacity: 100 })
        ));
    }

    #[test]
    fn default_heap_is_4k_and_uninitialized() {
        let heap = Heap::default();
        assert_eq!(heap.capacity(), 4096);
        assert!(!heap.is_initialized());
        assert_eq!(heap.blocks().count(), 0);
        assert_eq!(heap.stats().blocks, 0);
    }

    #[test]
    fn stats_count_blocks_and_bytes() {
        let mut heap = collecting(256);
        let a = heap.allocate(16).unwrap();
        let _b = heap.allocate(40).unwrap();
        heap.release(a).unwrap();

        let stats = heap.stats();
        assert_eq!(stats.blocks, 3);
        assert_eq!(stats.used_blocks, 1);
        assert_eq!(stats.free_blocks, 2);
        assert_eq!(stats.used_bytes, 40);
        assert_eq!(stats.free_bytes, 16 + (256 - 8 - 16 - 8 - 40 - 8));
        assert_eq!(
            stats.used_bytes + stats.free_bytes + stats.header_bytes(),
            256
        );
    }

    #[test]
    fn payload_is_only_available_for_live_blocks() {
        let mut heap = collecting(256);
        let p = heap.allocate(3).unwrap();
        assert_eq!(heap.payload(p).map(<[u8]>::len), Some(8));
        assert!(heap.payload(p.add(1)).is_none());
        heap.release(p).unwrap();
        assert!(heap.payload(p).is_none());
    }

    #[test]
    fn payload_writes_are_visible_in_arena_bytes() {
        let mut heap = collecting(64);
        let p = heap.allocate(8).unwrap();
        heap.payload_mut(p).unwrap().fill(0xAB);
        assert_eq!(&heap.bytes()[p.offset()..p.offset() + 8], &[0xAB; 8]);
    }

    #[test]
    fn as_ptr_is_base_plus_offset() {
        let mut heap = collecting(64);
        let p = heap.allocate(8).unwrap();
        assert_eq!(
            heap.as_ptr(p).addr() - heap.bytes().as_ptr().addr(),
            p.offset()
        );
    }

    #[test]
    fn check_flags_uncoalesced_neighbours() {
        let mut heap = collecting(64);
        heap.arena.set_header(0, Header::free(16));
        heap.arena.set_header(24, Header::free(32));
        assert_eq!(
            heap.check(),
            Err(Corruption::Uncoalesced { left: 0, right: 24 })
        );
        heap.coalesce();
        assert_eq!(heap.check(), Ok(()));
    }

    #[test]
    fn check_flags_overrun() {
        let mut heap = collecting(64);
        heap.arena.set_header(0, Header::used(16));
        heap.arena.set_header(24, Header::free(48));
        assert_eq!(heap.check(), Err(Corruption::Overrun { offset: 24, end: 80 }));
    }

    #[test]
    fn into_sink_returns_reports() {
        let mut heap = collecting(64);
        let _ = heap.release(Ptr::new(8));
        let reports = heap.into_sink();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].error, HeapError::UninitializedFree);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Alloc(usize),
            Release(usize),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (1usize..400).prop_map(Op::Alloc),
                any::<usize>().prop_map(Op::Release),
            ]
        }

        /// Apply `ops`, tagging each live payload with a distinct byte.
        fn run(ops: &[Op]) -> (Heap<Vec<Diagnostic>>, Vec<(Ptr, u8)>) {
            let mut heap = collecting(4096);
            let mut live: Vec<(Ptr, u8)> = Vec::new();
            let mut tag = 0u8;
            for op in ops {
                match *op {
                    Op::Alloc(size) => {
                        if let Ok(p) = heap.allocate(size) {
                            tag = tag.wrapping_add(1);
                            heap.payload_mut(p).unwrap().fill(tag);
                            live.push((p, tag));
                        }
                    }
                    Op::Release(pick) if !live.is_empty() => {
                        let (p, _) = live.swap_remove(pick % live.len());
                        heap.release(p).unwrap();
                    }
                    Op::Release(_) => {}
                }
            }
            (heap, live)
        }

        proptest! {
            #[test]
            fn blocks_always_tile_the_arena(ops in proptest::collection::vec(op(), 1..80)) {
                let (heap, _) = run(&ops);
                prop_assert_eq!(heap.check(), Ok(()));
                // A run of releases only never initializes the arena.
                prop_assume!(heap.is_initialized());
                let spans: usize = heap.blocks().map(|b| HEADER_SIZE + b.size).sum();
                prop_assert_eq!(spans, heap.capacity());
            }

            #[test]
            fn live_payloads_keep_their_contents(ops in proptest::collection::vec(op(), 1..80)) {
                let (heap, live) = run(&ops);
                for (p, tag) in &live {
                    let payload = heap.payload(*p).unwrap();
                    prop_assert!(payload.iter().all(|b| b == tag));
                }
            }

            #[test]
            fn live_allocations_are_disjoint(ops in proptest::collection::vec(op(), 1..80)) {
                let (heap, live) = run(&ops);
                let mut ranges: Vec<(usize, usize)> = live
                    .iter()
                    .map(|(p, _)| (p.offset(), p.offset() + heap.payload(*p).unwrap().len()))
                    .collect();
                ranges.sort_unstable();
                for pair in ranges.windows(2) {
                    prop_assert!(pair[0].1 <= pair[1].0);
                }
            }

            #[test]
            fn coalesce_is_idempotent(ops in proptest::collection::vec(op(), 1..80)) {
                let (mut heap, _) = run(&ops);
                heap.coalesce();
                let once = heap.bytes().to_vec();
                prop_assert_eq!(heap.coalesce(), 0);
                prop_assert_eq!(heap.bytes(), &once[..]);
            }

            #[test]
            fn valid_sequences_report_nothing(ops in proptest::collection::vec(op(), 1..80)) {
                let (heap, _) = run(&ops);
                let only_oom = heap
                    .sink()
                    .iter()
                    .all(|d| matches!(d.error, HeapError::OutOfMemory { .. }));
                prop_assert!(only_oom);
            }
        }
    }
}
