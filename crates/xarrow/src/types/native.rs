//! Rust element types that may live in an aligned column buffer.

use std::fmt::Debug;

use super::DataType;

mod private {
    pub trait Sealed {}
}

/// A fixed-width primitive with no drop glue and no invalid bit patterns.
///
/// Containers rely on this to bit-copy elements during reallocation and to
/// hand zeroed memory out as initialized values. The trait is sealed; the
/// implementors are exactly the rows of the format table.
pub trait NativeType:
    private::Sealed + Copy + Default + PartialEq + PartialOrd + Debug + Send + Sync + 'static
{
    /// Type tag written into exported schemas.
    const DATA_TYPE: DataType;
}

macro_rules! native_type {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl private::Sealed for $ty {}

            impl NativeType for $ty {
                const DATA_TYPE: DataType = DataType::$variant;
            }
        )*
    };
}

native_type! {
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
}
