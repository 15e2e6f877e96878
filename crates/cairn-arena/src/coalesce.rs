//! Merging of adjacent free blocks.
//!
//! A single forward pass from offset 0 to the arena's true end. When two
//! neighbouring blocks are both free the left header absorbs the right
//! block, and the enlarged block is compared against its new neighbour
//! before the scan moves on, so runs of any length collapse into one block.

use crate::arena::Arena;
use crate::header::{Header, HEADER_SIZE};

/// Merge every run of adjacent free blocks. Returns the number of merges.
///
/// A no-op on an uninitialized arena. Running it twice in a row never
/// merges anything the second time.
pub(crate) fn coalesce(arena: &mut Arena) -> usize {
    if !arena.is_initialized() {
        return 0;
    }
    let capacity = arena.capacity();
    let mut merges = 0;
    let mut offset = 0;

    while offset + HEADER_SIZE <= capacity {
        let current = arena.header(offset);
        let next = offset.saturating_add(current.span());
        if next.saturating_add(HEADER_SIZE) > capacity {
            break;
        }
        let right = arena.header(next);
        if !current.occupied() && !right.occupied() && next.saturating_add(right.span()) <= capacity {
            let merged = Header::free(current.size() + right.span());
            arena.set_header(offset, merged);
            log::trace!(
                target: "cairn::heap",
                "merged free blocks at {offset} and {next} into {} bytes",
                merged.size()
            );
            merges += 1;
            continue;
        }
        offset = next;
    }

    merges
}
