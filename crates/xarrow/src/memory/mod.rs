//! Memory management for column buffers.
//!
//! Three layers, each owning the one below:
//!
//! - **AlignedBuffer**: one raw allocation, size rounded up to the alignment
//! - **AlignedArray**: a fixed-length typed view over one buffer
//! - **AlignedVector**: a growable sequence over one array
//!
//! # Design Principles
//!
//! 1. **Zero-copy export**: data pointers are always aligned to `ALIGN`, so
//!    storage can be handed to an Arrow consumer unchanged
//! 2. **Exclusive ownership**: every allocation has exactly one owner; the
//!    only way out is an explicit `into_raw_parts`
//! 3. **Strong guarantee on growth**: a failed reallocation leaves the
//!    container unchanged

mod aligned;
mod vector;

pub use aligned::{align_round, AlignedArray, AlignedBuffer};
pub use vector::{AlignedVector, RawParts};
