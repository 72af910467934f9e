//! Stream configuration and validation.

use std::error::Error;
use std::fmt;

/// Default limit on a single slice's declared payload size: 16 MiB.
pub const DEFAULT_MAX_SLICE_SIZE: usize = 16 * 1024 * 1024;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`StreamConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_slice_size` is zero.
    ZeroMaxSliceSize,
    /// `max_slice_size` does not fit the 32-bit header size field.
    MaxSliceSizeOverflow {
        /// The configured value.
        configured: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroMaxSliceSize => write!(f, "max_slice_size must be at least 1"),
            Self::MaxSliceSizeOverflow { configured } => {
                write!(f, "max_slice_size {configured} exceeds u32::MAX")
            }
        }
    }
}

impl Error for ConfigError {}

// ── StreamConfig ───────────────────────────────────────────────────

/// Tunables for a [`SliceStream`](crate::SliceStream).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamConfig {
    /// Largest declared payload size accepted in a header, and largest
    /// payload a handler may substitute. Default: 16 MiB.
    pub max_slice_size: usize,
    /// Payload bytes reserved when a slice is first seen, capped at its
    /// declared size. Default: 0 (grow on demand).
    pub initial_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_slice_size: DEFAULT_MAX_SLICE_SIZE,
            initial_capacity: 0,
        }
    }
}

impl StreamConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Some payload must be allowed.
        if self.max_slice_size == 0 {
            return Err(ConfigError::ZeroMaxSliceSize);
        }
        // 2. Header sizes are varint32.
        if u32::try_from(self.max_slice_size).is_err() {
            return Err(ConfigError::MaxSliceSizeOverflow {
                configured: self.max_slice_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = StreamConfig::default();
        assert_eq!(config.max_slice_size, 16 * 1024 * 1024);
        assert_eq!(config.initial_capacity, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_zero_max_slice_size_fails() {
        let config = StreamConfig {
            max_slice_size: 0,
            ..StreamConfig::default()
        };
        match config.validate() {
            Err(ConfigError::ZeroMaxSliceSize) => {}
            other => panic!("expected ZeroMaxSliceSize, got {other:?}"),
        }
    }

    #[test]
    fn validate_max_slice_size_bounds() {
        let at_limit = StreamConfig {
            max_slice_size: u32::MAX as usize,
            ..StreamConfig::default()
        };
        assert!(at_limit.validate().is_ok());

        // Only representable where usize is wider than u32.
        if let Some(over) = (u32::MAX as usize).checked_add(1) {
            let config = StreamConfig {
                max_slice_size: over,
                ..StreamConfig::default()
            };
            match config.validate() {
                Err(ConfigError::MaxSliceSizeOverflow { configured }) => {
                    assert_eq!(configured, over)
                }
                other => panic!("expected MaxSliceSizeOverflow, got {other:?}"),
            }
        }
    }
}
