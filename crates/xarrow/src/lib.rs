//! # xarrow
//!
//! Aligned primitive column buffers with zero-copy export through the
//! [Arrow C Data Interface](https://arrow.apache.org/docs/format/CDataInterface.html).
//!
//! The crate has two halves:
//!
//! - **Memory**: [`memory::AlignedVector`], a growable, 64-byte aligned
//!   buffer of fixed-width values whose allocation can be leaked and handed
//!   to a foreign owner
//! - **Interchange**: [`column::PrimitiveColumn`] exposes that buffer as a
//!   borrowed `ArrowArray` view or transfers it outright, and
//!   [`ffi::ReleaseManager`] releases received structs exactly once
//!
//! ## Example
//!
//! ```rust
//! use xarrow::column::PrimitiveColumn;
//! use xarrow::ffi::import;
//! use xarrow::XArrowResult;
//!
//! fn example() -> XArrowResult<()> {
//!     let mut column = PrimitiveColumn::<i32>::new("x")?;
//!     column.data_mut().extend_from_slice(&[1, 2, 3, 4])?;
//!
//!     // Borrowed view: the column stays the owner.
//!     let view = column.array_ref();
//!     assert_eq!(view.length, 4);
//!     drop(view);
//!
//!     // Owned handoff: the column is left empty.
//!     let (schema, array) = column.export()?;
//!     assert!(column.is_empty());
//!
//!     // SAFETY: both structs were just exported
//!     let imported = unsafe { import(schema, array)? };
//!     assert_eq!(imported.values::<i32>()?, &[1, 2, 3, 4]);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod column;
pub mod config;
pub mod constants;
pub mod error;
pub mod ffi;
pub mod memory;
pub mod types;

// Re-export commonly used items at the crate root
pub use column::{AnyColumn, PrimitiveColumn};
pub use config::ColumnConfig;
pub use error::{ErrorCode, XArrowError, XArrowResult};
pub use memory::AlignedVector;
pub use types::{DataType, NativeType};
