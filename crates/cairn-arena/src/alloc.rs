//! First-fit allocation with splitting.

use crate::coalesce::coalesce;
use crate::diagnostic::DiagnosticSink;
use crate::error::HeapError;
use crate::handle::Ptr;
use crate::header::{round_up, BlockInfo, Header, HEADER_SIZE};
use crate::heap::Heap;

impl<S: DiagnosticSink> Heap<S> {
    /// Allocate `size` bytes and return the payload handle.
    ///
    /// The size is rounded up to a multiple of 8. Zero and oversized
    /// requests fail with [`HeapError::InvalidSize`] without a diagnostic.
    /// When no free block is large enough, an
    /// [`OutOfMemory`](HeapError::OutOfMemory) diagnostic is reported with
    /// the caller's location and the same error is returned.
    #[track_caller]
    pub fn allocate(&mut self, size: usize) -> Result<Ptr, HeapError> {
        if size == 0 || size > self.config.max_request() {
            return Err(HeapError::InvalidSize { requested: size });
        }
        let size = round_up(size);

        coalesce(&mut self.arena);

        if !self.arena.is_initialized() {
            return Ok(self.initialize(size));
        }

        let fit = self.blocks().find(|b| !b.occupied && b.size >= size);
        let Some(block) = fit else {
            return Err(self.report(HeapError::OutOfMemory { requested: size }));
        };
        Ok(self.claim(block, size))
    }

    /// Turn the whole arena into one free block and carve the first
    /// allocation out of it.
    fn initialize(&mut self, size: usize) -> Ptr {
        let whole = BlockInfo {
            offset: 0,
            size: self.arena.capacity() - HEADER_SIZE,
            occupied: false,
        };
        log::debug!(
            target: "cairn::heap",
            "initializing arena of {} bytes",
            self.arena.capacity()
        );
        self.claim(whole, size)
    }

    /// Mark `block` occupied for a request of `size` bytes, splitting off
    /// the tail as a new free block when it is large enough to be useful.
    fn claim(&mut self, block: BlockInfo, size: usize) -> Ptr {
        debug_assert!(!block.occupied && block.size >= size);
        let remainder = block.size - size;
        if remainder >= self.config.split_threshold() {
            let tail = block.payload_offset() + size;
            self.arena.set_header(block.offset, Header::used(size));
            self.arena
                .set_header(tail, Header::free(remainder - HEADER_SIZE));
            log::trace!(
                target: "cairn::heap",
                "split block at {}: {size} used, {} free at {tail}",
                block.offset,
                remainder - HEADER_SIZE
            );
        } else {
            self.arena
                .set_header(block.offset, Header::used(block.size));
        }
        block.ptr()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ArenaConfig;
    use crate::diagnostic::Diagnostic;
    use crate::error::HeapError;
    use crate::heap::Heap;

    fn collecting(capacity: usize) -> Heap<Vec<Diagnostic>> {
        Heap::with_sink(ArenaConfig::new(capacity), Vec::new()).unwrap()
    }

    fn layout<S>(heap: &Heap<S>) -> Vec<(usize, usize, bool)> {
        heap.blocks()
            .map(|b| (b.offset, b.size, b.occupied))
            .collect()
    }

    #[test]
    fn zero_size_is_silent_null() {
        let mut heap = collecting(4096);
        assert_eq!(
            heap.allocate(0),
            Err(HeapError::InvalidSize { requested: 0 })
        );
        assert!(heap.sink().is_empty());
        assert!(!heap.is_initialized());
    }

    #[test]
    fn oversized_request_is_silent_null() {
        let mut heap = collecting(4096);
        assert_eq!(
            heap.allocate(4089),
            Err(HeapError::InvalidSize { requested: 4089 })
        );
        assert!(heap.sink().is_empty());
    }

    #[test]
    fn largest_request_takes_the_whole_arena() {
        let mut heap = collecting(4096);
        let p = heap.allocate(4088).unwrap();
        assert_eq!(p.offset(), 8);
        assert_eq!(layout(&heap), vec![(0, 4088, true)]);
    }

    #[test]
    fn first_allocation_initializes_and_splits() {
        let mut heap = collecting(4096);
        let p = heap.allocate(1).unwrap();
        assert_eq!(p.offset(), 8);
        assert_eq!(layout(&heap), vec![(0, 8, true), (16, 4072, false)]);
    }

    #[test]
    fn first_allocation_absorbs_unsplittable_tail() {
        let mut heap = collecting(64);
        // 64 - 8 - 40 leaves 16 bytes: exactly header + minimum payload.
        let _ = heap.allocate(40).unwrap();
        assert_eq!(layout(&heap), vec![(0, 40, true), (48, 8, false)]);

        let mut heap = collecting(64);
        // 64 - 8 - 48 leaves 8 bytes: too small, so the block keeps them.
        let _ = heap.allocate(48).unwrap();
        assert_eq!(layout(&heap), vec![(0, 56, true)]);
    }

    #[test]
    fn sizes_round_up_to_eight() {
        let mut heap = collecting(4096);
        let a = heap.allocate(9).unwrap();
        let b = heap.allocate(1).unwrap();
        assert_eq!(b.offset() - a.offset(), 8 + 16);
    }

    #[test]
    fn first_fit_takes_the_lowest_address() {
        let mut heap = collecting(4096);
        let a = heap.allocate(64).unwrap();
        let _guard1 = heap.allocate(8).unwrap();
        let b = heap.allocate(64).unwrap();
        let _guard2 = heap.allocate(8).unwrap();
        heap.release(b).unwrap();
        heap.release(a).unwrap();

        let c = heap.allocate(32).unwrap();
        assert_eq!(c, a);
    }

    #[test]
    fn exact_fit_reuses_without_split() {
        let mut heap = collecting(4096);
        let a = heap.allocate(32).unwrap();
        let _guard = heap.allocate(8).unwrap();
        heap.release(a).unwrap();
        let before = heap.stats().blocks;

        let again = heap.allocate(32).unwrap();
        assert_eq!(again, a);
        assert_eq!(heap.stats().blocks, before);
    }

    #[test]
    fn small_remainder_is_handed_out_whole() {
        let mut heap = collecting(4096);
        let a = heap.allocate(24).unwrap();
        let _guard = heap.allocate(8).unwrap();
        heap.release(a).unwrap();

        // 24 - 16 = 8 bytes left, less than header + 8: no split.
        let again = heap.allocate(16).unwrap();
        assert_eq!(again, a);
        assert_eq!(heap.payload(again).unwrap().len(), 24);
    }

    #[test]
    fn split_produces_exact_remainder() {
        let mut heap = collecting(4096);
        let a = heap.allocate(128).unwrap();
        let _guard = heap.allocate(8).unwrap();
        heap.release(a).unwrap();

        let _ = heap.allocate(40).unwrap();
        let blocks = layout(&heap);
        assert_eq!(blocks[0], (0, 40, true));
        // 128 - 40 - 8 bytes of free remainder right behind it.
        assert_eq!(blocks[1], (48, 80, false));
        assert_eq!(blocks[1].0 + 8 + blocks[1].1, 136);
    }

    #[test]
    fn exhaustion_reports_out_of_memory() {
        let mut heap = collecting(64);
        let _ = heap.allocate(40).unwrap();
        let _ = heap.allocate(8).unwrap();

        let err = heap.allocate(8).unwrap_err();
        assert_eq!(err, HeapError::OutOfMemory { requested: 8 });
        assert_eq!(heap.sink().len(), 1);
        assert_eq!(heap.sink()[0].error, err);
        assert_eq!(heap.sink()[0].file(), file!());
    }

    #[test]
    fn custom_split_threshold_keeps_small_tails() {
        let config = ArenaConfig::new(4096).with_min_split_payload(64);
        let mut heap = Heap::with_sink(config, Vec::new()).unwrap();
        let a = heap.allocate(96).unwrap();
        let _guard = heap.allocate(8).unwrap();
        heap.release(a).unwrap();

        // 96 - 40 = 56 < 8 + 64: handed out whole.
        let again = heap.allocate(40).unwrap();
        assert_eq!(heap.payload(again).unwrap().len(), 96);
    }
}
