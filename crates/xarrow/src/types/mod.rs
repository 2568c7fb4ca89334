//! Core types for xarrow.
//!
//! This module contains the closed set of element types a column can hold
//! and the bidirectional table mapping them to Arrow format strings.

mod data_type;
mod native;

pub use data_type::DataType;
pub use native::NativeType;
