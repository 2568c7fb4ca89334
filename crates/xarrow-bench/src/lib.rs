//! xarrow Performance Benchmarks
//!
//! This crate contains benchmarks for the xarrow column layer:
//! - `AlignedVector` growth (push, bulk extend, resize)
//! - Borrowed views and owned export/release of primitive columns
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench -p xarrow-bench
//! ```

pub mod utils;
