//! Type-erased column over the closed set of primitive types.

use crate::error::XArrowResult;
use crate::ffi::{ArrowArray, ArrowSchema};
use crate::types::{DataType, NativeType};

use super::primitive::{BorrowedArray, BorrowedSchema, PrimitiveColumn};

/// A column of any supported primitive type.
///
/// The variant is chosen once, at construction, from a [`DataType`]; every
/// operation afterwards is a plain match.
///
/// # Example
///
/// ```rust
/// use xarrow::column::AnyColumn;
/// use xarrow::types::DataType;
///
/// let mut column = AnyColumn::new("ids", DataType::UInt32)?;
/// column.as_typed_mut::<u32>().unwrap().data_mut().push(7)?;
/// assert_eq!(column.len(), 1);
/// assert_eq!(column.format(), "I");
/// # Ok::<(), xarrow::XArrowError>(())
/// ```
#[derive(Debug)]
pub enum AnyColumn {
    /// `int8` values.
    Int8(PrimitiveColumn<i8>),
    /// `uint8` values.
    UInt8(PrimitiveColumn<u8>),
    /// `int16` values.
    Int16(PrimitiveColumn<i16>),
    /// `uint16` values.
    UInt16(PrimitiveColumn<u16>),
    /// `int32` values.
    Int32(PrimitiveColumn<i32>),
    /// `uint32` values.
    UInt32(PrimitiveColumn<u32>),
    /// `int64` values.
    Int64(PrimitiveColumn<i64>),
    /// `uint64` values.
    UInt64(PrimitiveColumn<u64>),
    /// `float32` values.
    Float32(PrimitiveColumn<f32>),
    /// `float64` values.
    Float64(PrimitiveColumn<f64>),
}

macro_rules! dispatch {
    ($self:expr, $column:ident => $body:expr) => {
        match $self {
            AnyColumn::Int8($column) => $body,
            AnyColumn::UInt8($column) => $body,
            AnyColumn::Int16($column) => $body,
            AnyColumn::UInt16($column) => $body,
            AnyColumn::Int32($column) => $body,
            AnyColumn::UInt32($column) => $body,
            AnyColumn::Int64($column) => $body,
            AnyColumn::UInt64($column) => $body,
            AnyColumn::Float32($column) => $body,
            AnyColumn::Float64($column) => $body,
        }
    };
}

/// A [`NativeType`] that has a matching [`AnyColumn`] variant.
pub trait ColumnType: NativeType {
    /// Wraps a typed column.
    fn wrap(column: PrimitiveColumn<Self>) -> AnyColumn;

    /// Returns the typed column if `column` holds this type.
    fn unwrap_ref(column: &AnyColumn) -> Option<&PrimitiveColumn<Self>>;

    /// Returns the typed column mutably if `column` holds this type.
    fn unwrap_mut(column: &mut AnyColumn) -> Option<&mut PrimitiveColumn<Self>>;
}

macro_rules! column_type {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ColumnType for $ty {
                fn wrap(column: PrimitiveColumn<Self>) -> AnyColumn {
                    AnyColumn::$variant(column)
                }

                fn unwrap_ref(column: &AnyColumn) -> Option<&PrimitiveColumn<Self>> {
                    match column {
                        AnyColumn::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn unwrap_mut(column: &mut AnyColumn) -> Option<&mut PrimitiveColumn<Self>> {
                    match column {
                        AnyColumn::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }

            impl From<PrimitiveColumn<$ty>> for AnyColumn {
                fn from(column: PrimitiveColumn<$ty>) -> Self {
                    AnyColumn::$variant(column)
                }
            }
        )*
    };
}

column_type! {
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

impl AnyColumn {
    /// Creates an empty column of `data_type`.
    pub fn new(name: &str, data_type: DataType) -> XArrowResult<Self> {
        Ok(match data_type {
            DataType::Int8 => Self::Int8(PrimitiveColumn::new(name)?),
            DataType::UInt8 => Self::UInt8(PrimitiveColumn::new(name)?),
            DataType::Int16 => Self::Int16(PrimitiveColumn::new(name)?),
            DataType::UInt16 => Self::UInt16(PrimitiveColumn::new(name)?),
            DataType::Int32 => Self::Int32(PrimitiveColumn::new(name)?),
            DataType::UInt32 => Self::UInt32(PrimitiveColumn::new(name)?),
            DataType::Int64 => Self::Int64(PrimitiveColumn::new(name)?),
            DataType::UInt64 => Self::UInt64(PrimitiveColumn::new(name)?),
            DataType::Float32 => Self::Float32(PrimitiveColumn::new(name)?),
            DataType::Float64 => Self::Float64(PrimitiveColumn::new(name)?),
        })
    }

    /// Returns the column name.
    #[must_use]
    pub fn name(&self) -> &str {
        dispatch!(self, c => c.name())
    }

    /// Returns the element type tag.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        dispatch!(self, c => c.data_type())
    }

    /// Returns the Arrow format string.
    #[must_use]
    pub fn format(&self) -> &'static str {
        self.data_type().format()
    }

    /// Returns the number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        dispatch!(self, c => c.len())
    }

    /// Returns true if the column holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the typed column if it holds `T`.
    #[must_use]
    pub fn as_typed<T: ColumnType>(&self) -> Option<&PrimitiveColumn<T>> {
        T::unwrap_ref(self)
    }

    /// Returns the typed column mutably if it holds `T`.
    #[must_use]
    pub fn as_typed_mut<T: ColumnType>(&mut self) -> Option<&mut PrimitiveColumn<T>> {
        T::unwrap_mut(self)
    }

    /// See [`PrimitiveColumn::schema_ref`].
    pub fn schema_ref(&self) -> BorrowedSchema<'_> {
        dispatch!(self, c => c.schema_ref())
    }

    /// See [`PrimitiveColumn::array_ref`].
    pub fn array_ref(&mut self) -> BorrowedArray<'_> {
        dispatch!(self, c => c.array_ref())
    }

    /// See [`PrimitiveColumn::export_schema`].
    #[must_use]
    pub fn export_schema(&self) -> ArrowSchema {
        dispatch!(self, c => c.export_schema())
    }

    /// See [`PrimitiveColumn::export_array`].
    pub fn export_array(&mut self) -> XArrowResult<ArrowArray> {
        dispatch!(self, c => c.export_array())
    }

    /// See [`PrimitiveColumn::export`].
    pub fn export(&mut self) -> XArrowResult<(ArrowSchema, ArrowArray)> {
        dispatch!(self, c => c.export())
    }
}
