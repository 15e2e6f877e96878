//! The fixed-capacity backing store.
//!
//! [`Arena`] is a boxed byte slice addressed by integer offsets. Headers are
//! read and written through typed accessors; nothing outside this module
//! touches the raw bytes mutably except via payload slices handed out by
//! the heap.

use crate::header::{Header, HEADER_SIZE};

/// A zero-initialised byte buffer that is never resized.
///
/// The first header doubles as the initialisation sentinel: while its
/// recorded size is zero, no allocation has happened yet.
pub(crate) struct Arena {
    bytes: Box<[u8]>,
}

impl Arena {
    /// Allocate a zeroed arena of `capacity` bytes.
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            bytes: vec![0u8; capacity].into_boxed_slice(),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.capacity() >= HEADER_SIZE && self.header(0).size() != 0
    }

    /// Read the header at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + HEADER_SIZE` exceeds the capacity.
    pub(crate) fn header(&self, offset: usize) -> Header {
        let mut word = [0u8; HEADER_SIZE];
        word.copy_from_slice(&self.bytes[offset..offset + HEADER_SIZE]);
        Header::decode(word)
    }

    /// Write the header at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + HEADER_SIZE` exceeds the capacity.
    pub(crate) fn set_header(&mut self, offset: usize, header: Header) {
        self.bytes[offset..offset + HEADER_SIZE].copy_from_slice(&header.encode());
    }

    pub(crate) fn slice(&self, offset: usize, len: usize) -> &[u8] {
        &self.bytes[offset..offset + len]
    }

    pub(crate) fn slice_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        &mut self.bytes[offset..offset + len]
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Address of the first arena byte.
    pub(crate) fn base(&self) -> *const u8 {
        self.bytes.as_ptr()
    }
}
