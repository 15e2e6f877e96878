//! First-fit block allocation over a fixed-capacity arena.
//!
//! A [`Heap`] owns one zero-initialised byte arena that is never resized.
//! The arena is always fully partitioned into blocks, each an 8-byte
//! header followed by its payload:
//!
//! ```text
//! offset 0                                                        capacity
//! ┌────┬──────────┬────┬──────────────────┬────┬────────────────────────┐
//! │ H  │ payload  │ H  │ payload (free)   │ H  │ payload                │
//! └────┴──────────┴────┴──────────────────┴────┴────────────────────────┘
//!        ▲
//!        └── Ptr handed to the caller
//! ```
//!
//! # Operations
//!
//! - **allocate:** coalesce, then first-fit search in address order,
//!   splitting the chosen block when the leftover can hold a header plus
//!   the configured minimum payload.
//! - **release:** validate the pointer (initialised arena, in range, at a
//!   payload start, not already free), flip the block to free, coalesce.
//! - **coalesce:** one forward pass merging every run of adjacent free
//!   blocks, bounded by the arena's true end.
//!
//! # Diagnostics
//!
//! Misuse never aborts. Each fault is returned as a [`HeapError`] and also
//! sent to the heap's [`DiagnosticSink`] together with the call site,
//! captured through `#[track_caller]`.
//!
//! All arena access goes through offsets and typed header accessors; the
//! crate contains no `unsafe`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

mod alloc;
mod arena;
mod coalesce;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod handle;
pub mod header;
pub mod heap;
mod release;

// Public re-exports for the primary API surface.
pub use config::ArenaConfig;
pub use diagnostic::{Diagnostic, DiagnosticSink, FnSink, LogSink, NullSink};
pub use error::{ConfigError, Corruption, HeapError};
pub use handle::Ptr;
pub use header::{BlockInfo, Blocks, Header, ALIGN, HEADER_SIZE};
pub use heap::{Heap, HeapStats};
