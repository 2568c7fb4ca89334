//! Arrow C Data Interface plumbing.
//!
//! - [`abi`]: the `#[repr(C)]` structs exchanged with foreign code
//! - [`ReleaseManager`]: exactly-once release of received structs
//! - [`ImportedSchema`] / [`ImportedArray`]: validated consumer-side views
//!
//! Producer-side export lives on [`crate::column::PrimitiveColumn`].

pub mod abi;
mod import;
mod release;

pub use abi::{ArrowArray, ArrowSchema};
pub use import::{import, ImportedArray, ImportedSchema, MetadataEntry};
pub use release::{GuardState, ReleaseManager, Releasable};
