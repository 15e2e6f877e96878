//! Arena configuration parameters.

use crate::error::ConfigError;
use crate::header::{ALIGN, HEADER_SIZE};

/// Configuration for a [`Heap`](crate::Heap).
///
/// Controls the arena capacity and the split policy. Validated at
/// construction; all values are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Total size of the backing arena in bytes, headers included.
    ///
    /// Default: 4096. Must be a multiple of 8 and large enough to hold
    /// two headers and one minimum payload.
    pub capacity: usize,

    /// Smallest payload a free remainder may have when a block is split.
    ///
    /// A free block is only split when the leftover after the request can
    /// hold a header plus this many bytes; otherwise the whole block is
    /// handed out. Default: 8. Must be a non-zero multiple of 8.
    pub min_split_payload: usize,
}

impl ArenaConfig {
    /// Default arena capacity in bytes.
    pub const DEFAULT_CAPACITY: usize = 4096;

    /// Default minimum payload of a split-off free block.
    pub const DEFAULT_MIN_SPLIT_PAYLOAD: usize = 8;

    /// Create a config for an arena of `capacity` bytes.
    ///
    /// Uses the default split policy.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            min_split_payload: Self::DEFAULT_MIN_SPLIT_PAYLOAD,
        }
    }

    /// Override the minimum split payload.
    pub fn with_min_split_payload(mut self, min_split_payload: usize) -> Self {
        self.min_split_payload = min_split_payload;
        self
    }

    /// Smallest capacity that passes validation for this split policy.
    pub fn min_capacity(&self) -> usize {
        2 * HEADER_SIZE + self.min_split_payload.max(ALIGN)
    }

    /// Largest request `allocate` accepts: the capacity minus one header.
    pub fn max_request(&self) -> usize {
        self.capacity.saturating_sub(HEADER_SIZE)
    }

    /// Leftover bytes (header included) required before a block is split.
    pub(crate) fn split_threshold(&self) -> usize {
        HEADER_SIZE + self.min_split_payload
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_split_payload == 0 {
            return Err(ConfigError::SplitPayloadZero);
        }
        if self.min_split_payload % ALIGN != 0 {
            return Err(ConfigError::SplitPayloadNotAligned {
                value: self.min_split_payload,
            });
        }
        if self.capacity % ALIGN != 0 {
            return Err(ConfigError::CapacityNotAligned {
                capacity: self.capacity,
            });
        }
        let minimum = self.min_capacity();
        if self.capacity < minimum {
            return Err(ConfigError::CapacityTooSmall {
                capacity: self.capacity,
                minimum,
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
