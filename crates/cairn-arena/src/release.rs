//! Release with pointer validation.
//!
//! A release is checked in order: the arena must be initialised, the
//! pointer must fall inside the arena, and it must sit exactly at the
//! payload start of some block. Only an occupied block is flipped to free;
//! every other case reports a diagnostic and leaves the arena untouched.

use crate::coalesce::coalesce;
use crate::diagnostic::DiagnosticSink;
use crate::error::HeapError;
use crate::handle::Ptr;
use crate::header::Header;
use crate::heap::Heap;

impl<S: DiagnosticSink> Heap<S> {
    /// Return the block at `ptr` to the free pool.
    ///
    /// Misuse (release before the first allocation, out-of-range or
    /// mid-block pointers, double frees) is reported to the sink with the
    /// caller's location and returned as an error. Callers that only care
    /// about the report may ignore the result, as they would with `free`.
    #[track_caller]
    pub fn release(&mut self, ptr: Ptr) -> Result<(), HeapError> {
        let inside = ptr.offset() < self.arena.capacity();
        self.release_at(inside.then_some(ptr), ptr.offset())
    }

    /// Release by real address, as obtained from [`Heap::as_ptr`].
    ///
    /// Addresses outside the arena, including ones below its base, are
    /// reported as [`PointerOutOfRange`](HeapError::PointerOutOfRange).
    /// A null pointer is ignored, like `free(NULL)`.
    #[track_caller]
    pub fn release_raw(&mut self, raw: *const u8) -> Result<(), HeapError> {
        if raw.is_null() {
            return Ok(());
        }
        let ptr = raw
            .addr()
            .checked_sub(self.arena.base().addr())
            .filter(|&offset| offset < self.arena.capacity())
            .map(Ptr::new);
        self.release_at(ptr, raw.addr())
    }

    /// Shared release path. `ptr` is `None` when the caller's pointer does
    /// not map into the arena; `addr` is what the caller passed, for the
    /// diagnostic.
    #[track_caller]
    fn release_at(&mut self, ptr: Option<Ptr>, addr: usize) -> Result<(), HeapError> {
        if !self.arena.is_initialized() {
            return Err(self.report(HeapError::UninitializedFree));
        }
        let Some(ptr) = ptr else {
            return Err(self.report(HeapError::PointerOutOfRange { addr }));
        };

        let block = ptr.header_offset().and_then(|target| {
            self.blocks()
                .take_while(|b| b.offset <= target)
                .find(|b| b.offset == target)
        });
        let Some(block) = block else {
            return Err(self.report(HeapError::MisalignedFree {
                offset: ptr.offset(),
            }));
        };

        if !block.occupied {
            let error = self.report(HeapError::DoubleFree {
                offset: ptr.offset(),
            });
            coalesce(&mut self.arena);
            return Err(error);
        }

        self.arena.set_header(block.offset, Header::free(block.size));
        coalesce(&mut self.arena);
        Ok(())
    }
}
