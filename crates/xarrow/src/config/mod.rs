//! Configuration for xarrow.
//!
//! This module provides configuration structures for column handles.

mod column;

pub use column::ColumnConfig;
