//! System-wide constants for xarrow.
//!
//! Alignment, growth and Arrow C Data Interface values shared by the
//! memory and interchange layers.

// =============================================================================
// Memory Constants
// =============================================================================

/// Cache line size on most modern CPUs.
pub const CACHE_LINE_SIZE: usize = 64;

/// Default buffer alignment in bytes.
///
/// Matches the Arrow columnar format recommendation (one cache line, wide
/// enough for AVX-512 loads).
pub const DEFAULT_ALIGNMENT: usize = CACHE_LINE_SIZE;

/// Smallest capacity an `AlignedVector` grows to on its first allocation.
pub const MIN_GROWTH_CAPACITY: usize = 4;

// =============================================================================
// Arrow C Data Interface
// =============================================================================

/// Schema flag: dictionary indices are ordered.
pub const ARROW_FLAG_DICTIONARY_ORDERED: i64 = 1;

/// Schema flag: the field is nullable.
pub const ARROW_FLAG_NULLABLE: i64 = 2;

/// Schema flag: map keys are sorted.
pub const ARROW_FLAG_MAP_KEYS_SORTED: i64 = 4;

/// Number of buffers in a fixed-width primitive array (validity + data).
pub const PRIMITIVE_BUFFER_COUNT: usize = 2;

/// Buffer slot holding the validity bitmap. Always null for exported columns.
pub const VALIDITY_BUFFER_SLOT: usize = 0;

/// Buffer slot holding the values.
pub const DATA_BUFFER_SLOT: usize = 1;
