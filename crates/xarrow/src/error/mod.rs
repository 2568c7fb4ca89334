//! Error handling for xarrow.
//!
//! This module provides a unified error type and result alias used
//! across the memory, type and interchange layers.

mod kinds;

pub use kinds::{ErrorCode, XArrowError};

/// Result type alias for xarrow operations.
pub type XArrowResult<T> = std::result::Result<T, XArrowError>;
