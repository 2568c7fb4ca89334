//! Producer-side columns.
//!
//! - [`PrimitiveColumn`]: a named, non-nullable column of one primitive type
//!   with borrowed and owned Arrow export
//! - [`AnyColumn`]: the same over the closed set of supported types

mod any;
mod primitive;

pub use any::{AnyColumn, ColumnType};
pub use primitive::{BorrowedArray, BorrowedSchema, ColumnVector, PrimitiveColumn};
