//! Cairn: a first-fit allocator over one fixed-capacity arena.
//!
//! This is the top-level facade crate. It re-exports the allocator engine
//! from `cairn-arena`; most users only need the [`prelude`].
//!
//! # Quick start
//!
//! ```rust
//! use cairn::prelude::*;
//!
//! let mut heap = Heap::with_sink(ArenaConfig::new(4096), Vec::new()).unwrap();
//!
//! let small = heap.allocate(1).unwrap();
//! let large = heap.allocate(1024).unwrap();
//! assert_ne!(small, large);
//!
//! heap.release(small).unwrap();
//! assert_eq!(heap.allocate(1).unwrap(), small);
//!
//! // Misuse is reported, not fatal.
//! assert!(heap.release(small.add(1)).is_err());
//! let reports: &Vec<Diagnostic> = heap.sink();
//! assert_eq!(reports.len(), 1);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `cairn-arena` | `Heap`, headers, handles, diagnostics, config |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// The allocator engine (`cairn-arena`).
pub use cairn_arena as arena;

/// Common imports for working with a heap.
pub mod prelude {
    pub use cairn_arena::{
        ArenaConfig, Diagnostic, DiagnosticSink, HeapError, Heap, LogSink, NullSink, Ptr,
    };
}
