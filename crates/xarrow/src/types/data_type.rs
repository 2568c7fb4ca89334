//! Element type tags and the Arrow format-string table.
//!
//! The table below is the single source of truth for the mapping between
//! [`DataType`] and the format codes of the Arrow C Data Interface. Both
//! directions of the lookup walk the same array, so the mapping cannot drift.

use std::ffi::CStr;
use std::fmt;

use crate::error::{XArrowError, XArrowResult};

/// Fixed-width primitive element type.
///
/// The discriminants are stable and double as the wire tag accepted by
/// `TryFrom<u8>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum DataType {
    /// Signed 8-bit integer.
    Int8 = 0,
    /// Unsigned 8-bit integer.
    UInt8 = 1,
    /// Signed 16-bit integer.
    Int16 = 2,
    /// Unsigned 16-bit integer.
    UInt16 = 3,
    /// Signed 32-bit integer.
    Int32 = 4,
    /// Unsigned 32-bit integer.
    UInt32 = 5,
    /// Signed 64-bit integer.
    Int64 = 6,
    /// Unsigned 64-bit integer.
    UInt64 = 7,
    /// IEEE-754 single precision.
    Float32 = 8,
    /// IEEE-754 double precision.
    Float64 = 9,
}

/// Type tag ↔ format string. Hand-maintained; `tests::test_table_is_bijective`
/// guards it.
const FORMAT_TABLE: [(DataType, &CStr, &str); 10] = [
    (DataType::Int8, c"c", "c"),
    (DataType::UInt8, c"C", "C"),
    (DataType::Int16, c"s", "s"),
    (DataType::UInt16, c"S", "S"),
    (DataType::Int32, c"i", "i"),
    (DataType::UInt32, c"I", "I"),
    (DataType::Int64, c"l", "l"),
    (DataType::UInt64, c"L", "L"),
    (DataType::Float32, c"f", "f"),
    (DataType::Float64, c"g", "g"),
];

impl DataType {
    /// All supported types, in tag order.
    pub const ALL: [DataType; 10] = [
        DataType::Int8,
        DataType::UInt8,
        DataType::Int16,
        DataType::UInt16,
        DataType::Int32,
        DataType::UInt32,
        DataType::Int64,
        DataType::UInt64,
        DataType::Float32,
        DataType::Float64,
    ];

    /// Returns the Arrow format string as a nul-terminated C string.
    ///
    /// The returned reference is `'static`, so it can be stored directly in
    /// an exported `ArrowSchema`.
    #[must_use]
    pub fn format_cstr(self) -> &'static CStr {
        // Every variant has exactly one row.
        FORMAT_TABLE[self as usize].1
    }

    /// Returns the Arrow format string.
    #[must_use]
    pub fn format(self) -> &'static str {
        FORMAT_TABLE[self as usize].2
    }

    /// Looks up a type from its Arrow format string.
    pub fn from_format(format: &str) -> XArrowResult<Self> {
        FORMAT_TABLE
            .iter()
            .find(|(_, _, f)| *f == format)
            .map(|(t, _, _)| *t)
            .ok_or_else(|| XArrowError::UnsupportedFormat {
                format: format.to_string(),
            })
    }

    /// Looks up a type from a C format string received over the interface.
    pub fn from_format_cstr(format: &CStr) -> XArrowResult<Self> {
        FORMAT_TABLE
            .iter()
            .find(|(_, f, _)| *f == format)
            .map(|(t, _, _)| *t)
            .ok_or_else(|| XArrowError::UnsupportedFormat {
                format: format.to_string_lossy().into_owned(),
            })
    }

    /// Returns the width of one element in bytes.
    #[must_use]
    pub const fn byte_width(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    /// Returns the stable numeric tag.
    #[inline]
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Returns true for the floating point types.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }
}

impl TryFrom<u8> for DataType {
    type Error = XArrowError;

    fn try_from(tag: u8) -> XArrowResult<Self> {
        Self::ALL
            .get(tag as usize)
            .copied()
            .ok_or(XArrowError::UnsupportedType { tag })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int8 => "int8",
            Self::UInt8 => "uint8",
            Self::Int16 => "int16",
            Self::UInt16 => "uint16",
            Self::Int32 => "int32",
            Self::UInt32 => "uint32",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_is_bijective() {
        let types: HashSet<_> = FORMAT_TABLE.iter().map(|(t, _, _)| *t).collect();
        let formats: HashSet<_> = FORMAT_TABLE.iter().map(|(_, f, _)| *f).collect();
        assert_eq!(types.len(), FORMAT_TABLE.len());
        assert_eq!(formats.len(), FORMAT_TABLE.len());

        for (index, (t, f, s)) in FORMAT_TABLE.iter().enumerate() {
            // Rows are indexed by discriminant.
            assert_eq!(*t as usize, index);
            assert_eq!(DataType::from_format_cstr(f).unwrap(), *t);
            assert_eq!(t.format_cstr(), *f);
            // Both columns spell the same code.
            assert_eq!(f.to_bytes(), s.as_bytes());
            assert_eq!(t.format(), *s);
            assert_eq!(DataType::from_format(s).unwrap(), *t);
        }
    }

    #[test]
    fn test_format_roundtrip() {
        for t in DataType::ALL {
            assert_eq!(DataType::from_format(t.format()).unwrap(), t);
        }
        assert_eq!(DataType::Int32.format(), "i");
        assert_eq!(DataType::Float64.format(), "g");
    }

    #[test]
    fn test_unsupported_format() {
        let err = DataType::from_format("u").unwrap_err();
        assert!(matches!(err, XArrowError::UnsupportedFormat { ref format } if format == "u"));
        assert!(DataType::from_format("").is_err());
        assert!(DataType::from_format("ii").is_err());
    }

    #[test]
    fn test_tag_conversion() {
        for t in DataType::ALL {
            assert_eq!(DataType::try_from(t.tag()).unwrap(), t);
        }
        let err = DataType::try_from(10).unwrap_err();
        assert!(matches!(err, XArrowError::UnsupportedType { tag: 10 }));
    }

    #[test]
    fn test_byte_width() {
        assert_eq!(DataType::Int8.byte_width(), 1);
        assert_eq!(DataType::UInt16.byte_width(), 2);
        assert_eq!(DataType::Float32.byte_width(), 4);
        assert_eq!(DataType::Int64.byte_width(), 8);
    }

    #[test]
    fn test_display() {
        assert_eq!(DataType::UInt32.to_string(), "uint32");
        assert!(DataType::Float32.is_float());
        assert!(!DataType::Int64.is_float());
    }
}
