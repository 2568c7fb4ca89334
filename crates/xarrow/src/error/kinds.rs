//! xarrow error types.
//!
//! Covers allocation, element access and the type/format boundary of the
//! interchange layer.

use std::fmt;
use thiserror::Error;

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and
/// are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Unknown or unspecified error.
    Unknown = 0x0000,
    /// Operation not supported.
    NotSupported = 0x0002,
    /// Invalid argument provided.
    InvalidArgument = 0x0003,

    // Memory errors (0x0100 - 0x01FF)
    /// The allocator returned null.
    AllocationFailed = 0x0100,
    /// A requested size does not fit in `usize`.
    CapacityOverflow = 0x0101,

    // Access errors (0x0200 - 0x02FF)
    /// Bounds-checked access out of range.
    IndexOutOfRange = 0x0200,

    // Interchange errors (0x0300 - 0x03FF)
    /// Unknown format string.
    UnsupportedFormat = 0x0300,
    /// Unknown type tag.
    UnsupportedType = 0x0301,
    /// Requested element type differs from the column type.
    TypeMismatch = 0x0302,
    /// The interchange struct was already released.
    Released = 0x0303,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "Memory",
            0x02 => "Access",
            0x03 => "Interchange",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The main error type for xarrow.
///
/// # Example
///
/// ```rust
/// use xarrow::error::{ErrorCode, XArrowError};
///
/// let err = XArrowError::IndexOutOfRange { index: 4, len: 4 };
/// assert_eq!(err.code(), ErrorCode::IndexOutOfRange);
/// assert!(err.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum XArrowError {
    // ==========================================================================
    // General Errors
    // ==========================================================================
    /// Operation not supported.
    #[error("operation not supported: {feature}")]
    NotSupported {
        /// The unsupported feature.
        feature: String,
    },

    /// Invalid argument provided.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Error message.
        message: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },

    // ==========================================================================
    // Memory Errors
    // ==========================================================================
    /// The platform allocator returned null.
    #[error("failed to allocate {size} bytes aligned to {alignment}")]
    Allocation {
        /// Requested size in bytes, after alignment rounding.
        size: usize,
        /// Requested alignment in bytes.
        alignment: usize,
    },

    /// Element count times element width overflowed.
    #[error("capacity overflow: {requested} elements")]
    CapacityOverflow {
        /// Requested element count.
        requested: usize,
    },

    // ==========================================================================
    // Access Errors
    // ==========================================================================
    /// Bounds-checked access out of range.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Length at the time of access.
        len: usize,
    },

    // ==========================================================================
    // Interchange Errors
    // ==========================================================================
    /// Format string has no entry in the type table.
    #[error("unsupported format '{format}'")]
    UnsupportedFormat {
        /// The format string as received.
        format: String,
    },

    /// Type tag has no entry in the type table.
    #[error("unsupported type tag {tag}")]
    UnsupportedType {
        /// The raw tag.
        tag: u8,
    },

    /// Typed access with the wrong element type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Type stored in the column.
        expected: String,
        /// Type requested by the caller.
        actual: String,
    },

    /// The interchange struct was already released by its producer.
    #[error("{what} was already released")]
    Released {
        /// Which struct ("schema" or "array").
        what: &'static str,
    },
}

impl XArrowError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotSupported { .. } => ErrorCode::NotSupported,
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::InvalidConfig { .. } => ErrorCode::InvalidArgument,
            Self::Allocation { .. } => ErrorCode::AllocationFailed,
            Self::CapacityOverflow { .. } => ErrorCode::CapacityOverflow,
            Self::IndexOutOfRange { .. } => ErrorCode::IndexOutOfRange,
            Self::UnsupportedFormat { .. } => ErrorCode::UnsupportedFormat,
            Self::UnsupportedType { .. } => ErrorCode::UnsupportedType,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::Released { .. } => ErrorCode::Released,
        }
    }

    /// Returns true if the caller can reasonably continue after this error.
    ///
    /// Allocation failures abort the current operation and are not
    /// recoverable locally.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::Allocation { .. } | Self::CapacityOverflow { .. }
        )
    }

    /// Returns true if this error signals a producer/consumer mismatch.
    #[must_use]
    pub const fn is_compatibility(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. }
                | Self::UnsupportedType { .. }
                | Self::NotSupported { .. }
        )
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a not-supported error.
    #[must_use]
    pub fn not_supported(feature: impl Into<String>) -> Self {
        Self::NotSupported {
            feature: feature.into(),
        }
    }
}
