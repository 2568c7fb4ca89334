//! Non-nullable primitive column and its Arrow export paths.
//!
//! A [`PrimitiveColumn`] owns a name and one [`AlignedVector`]. It can be
//! exported two ways:
//!
//! - **Borrowed** ([`PrimitiveColumn::schema_ref`], [`PrimitiveColumn::array_ref`]):
//!   the structs point straight at the column's own storage and their release
//!   callbacks only mark them released. The returned views borrow the column,
//!   so it cannot be mutated or dropped while a view is alive.
//! - **Owned** ([`PrimitiveColumn::export_schema`], [`PrimitiveColumn::export_array`]):
//!   the structs own independent heap allocations and their release callbacks
//!   free them. An owned array export takes the data allocation out of the
//!   column, which is left empty and reusable.

use std::ffi::{c_void, CStr, CString};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr;

use tracing::{debug, warn};

use crate::config::ColumnConfig;
use crate::constants::{DATA_BUFFER_SLOT, DEFAULT_ALIGNMENT, PRIMITIVE_BUFFER_COUNT};
use crate::error::{XArrowError, XArrowResult};
use crate::ffi::{ArrowArray, ArrowSchema};
use crate::memory::{AlignedBuffer, AlignedVector};
use crate::types::{DataType, NativeType};

/// Storage type of every column.
pub type ColumnVector<T> = AlignedVector<T, DEFAULT_ALIGNMENT>;

/// Buffer table shape for a primitive array: validity slot, data slot.
type BufferTable = [*const c_void; PRIMITIVE_BUFFER_COUNT];

/// A named, non-nullable column of fixed-width primitives.
///
/// # Example
///
/// ```rust
/// use xarrow::column::PrimitiveColumn;
///
/// let mut column = PrimitiveColumn::<f64>::new("price")?;
/// column.data_mut().extend_from_slice(&[1.0, 2.5])?;
///
/// let array = column.array_ref();
/// assert_eq!(array.length, 2);
/// assert_eq!(array.n_buffers, 2);
/// # Ok::<(), xarrow::XArrowError>(())
/// ```
pub struct PrimitiveColumn<T: NativeType> {
    name: CString,
    display_name: String,
    data: ColumnVector<T>,
    buffers: BufferTable,
    config: ColumnConfig,
}

// SAFETY: `buffers` only ever caches pointers into `data`, which the column
// owns exclusively
unsafe impl<T: NativeType> Send for PrimitiveColumn<T> {}

impl<T: NativeType> PrimitiveColumn<T> {
    /// Creates an empty column with the default configuration.
    pub fn new(name: &str) -> XArrowResult<Self> {
        Self::with_config(name, ColumnConfig::default())
    }

    /// Creates an empty column, reserving `config.initial_capacity` elements.
    pub fn with_config(name: &str, config: ColumnConfig) -> XArrowResult<Self> {
        config.validate()?;
        let data = ColumnVector::with_capacity(config.initial_capacity)?;
        Self::build(name, data, config)
    }

    /// Creates a column that takes ownership of `data`.
    pub fn with_data(name: &str, data: ColumnVector<T>) -> XArrowResult<Self> {
        Self::build(name, data, ColumnConfig::default())
    }

    fn build(name: &str, data: ColumnVector<T>, config: ColumnConfig) -> XArrowResult<Self> {
        let display_name = name.to_owned();
        let name = CString::new(name).map_err(|_| {
            XArrowError::invalid_argument(format!("column name {name:?} contains a nul byte"))
        })?;
        Ok(Self {
            name,
            display_name,
            data,
            buffers: [ptr::null(); PRIMITIVE_BUFFER_COUNT],
            config,
        })
    }

    /// Returns the column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.display_name
    }

    /// Returns the column name as a C string.
    #[inline]
    #[must_use]
    pub fn name_cstr(&self) -> &CStr {
        &self.name
    }

    /// Returns the element type tag.
    #[inline]
    #[must_use]
    pub fn data_type(&self) -> DataType {
        T::DATA_TYPE
    }

    /// Returns the Arrow format string.
    #[inline]
    #[must_use]
    pub fn format(&self) -> &'static str {
        T::DATA_TYPE.format()
    }

    /// Returns the number of values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the column holds no values.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the values.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &ColumnVector<T> {
        &self.data
    }

    /// Returns the values for mutation.
    #[inline]
    #[must_use]
    pub fn data_mut(&mut self) -> &mut ColumnVector<T> {
        &mut self.data
    }

    /// Consumes the column and returns its values.
    #[must_use]
    pub fn into_data(self) -> ColumnVector<T> {
        self.data
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ColumnConfig {
        &self.config
    }

    fn schema_fields(&self) -> ArrowSchema {
        ArrowSchema {
            format: T::DATA_TYPE.format_cstr().as_ptr(),
            name: self.name.as_ptr(),
            ..ArrowSchema::empty()
        }
    }

    // =========================================================================
    // Borrowed export
    // =========================================================================

    /// Describes the column in a schema that borrows the column's name.
    pub fn schema_ref(&self) -> BorrowedSchema<'_> {
        BorrowedSchema {
            raw: ArrowSchema {
                release: Some(release_borrowed_schema),
                ..self.schema_fields()
            },
            _owner: PhantomData,
        }
    }

    /// Exposes the values through an array that points at the column's
    /// storage.
    ///
    /// The cached buffer table is refreshed on every call, so the view always
    /// reflects the current allocation.
    #[allow(clippy::cast_possible_wrap)]
    pub fn array_ref(&mut self) -> BorrowedArray<'_> {
        self.buffers = [ptr::null(), self.data.as_ptr().cast()];
        BorrowedArray {
            raw: ArrowArray {
                length: self.data.len() as i64,
                null_count: 0,
                offset: 0,
                n_buffers: PRIMITIVE_BUFFER_COUNT as i64,
                n_children: 0,
                buffers: self.buffers.as_mut_ptr(),
                children: ptr::null_mut(),
                dictionary: ptr::null_mut(),
                release: Some(release_borrowed_array),
                private_data: ptr::null_mut(),
            },
            _owner: PhantomData,
        }
    }

    // =========================================================================
    // Owned export
    // =========================================================================

    /// Describes the column in a schema that owns a copy of the name.
    #[must_use]
    pub fn export_schema(&self) -> ArrowSchema {
        let name = CString::into_raw(self.name.clone());
        ArrowSchema {
            name: name.cast_const(),
            release: Some(release_owned_schema),
            private_data: name.cast(),
            ..self.schema_fields()
        }
    }

    /// Moves the values into an array that owns them.
    ///
    /// The column is left empty with no storage and can be filled again.
    /// The returned array's release callback frees the values and the
    /// buffer table.
    #[allow(clippy::cast_possible_wrap)]
    pub fn export_array(&mut self) -> XArrowResult<ArrowArray> {
        if self.config.shrink_on_export {
            self.data.shrink_to_fit()?;
        }

        let parts = self.data.take().into_raw_parts();
        let private = Box::into_raw(Box::new(OwnedArrayData {
            buffers: [ptr::null(), parts.ptr.cast_const().cast()],
            byte_capacity: parts.byte_capacity(),
        }));

        debug!(
            column = self.name(),
            len = parts.len,
            capacity = parts.capacity,
            "exported column as owned array"
        );

        Ok(ArrowArray {
            length: parts.len as i64,
            null_count: 0,
            offset: 0,
            n_buffers: PRIMITIVE_BUFFER_COUNT as i64,
            n_children: 0,
            // SAFETY: private was just created by Box::into_raw
            buffers: unsafe { (*private).buffers.as_mut_ptr() },
            children: ptr::null_mut(),
            dictionary: ptr::null_mut(),
            release: Some(release_owned_array),
            private_data: private.cast(),
        })
    }

    /// Exports an owned schema and an owned array.
    ///
    /// The array is exported first: it is the only fallible half, and an
    /// unreleased schema would leak its name copy on the error path.
    pub fn export(&mut self) -> XArrowResult<(ArrowSchema, ArrowArray)> {
        let array = self.export_array()?;
        let schema = self.export_schema();
        Ok((schema, array))
    }
}

impl<T: NativeType> fmt::Debug for PrimitiveColumn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimitiveColumn")
            .field("name", &self.name)
            .field("data_type", &T::DATA_TYPE)
            .field("data", &self.data)
            .finish()
    }
}

/// A schema view borrowing a column.
#[derive(Debug)]
pub struct BorrowedSchema<'a> {
    raw: ArrowSchema,
    _owner: PhantomData<&'a ()>,
}

impl BorrowedSchema<'_> {
    /// Returns a pointer for C consumers that read the schema in place.
    #[must_use]
    pub fn as_mut_ptr(&mut self) -> *mut ArrowSchema {
        &mut self.raw
    }
}

impl Deref for BorrowedSchema<'_> {
    type Target = ArrowSchema;

    fn deref(&self) -> &ArrowSchema {
        &self.raw
    }
}

/// An array view borrowing a column's storage.
#[derive(Debug)]
pub struct BorrowedArray<'a> {
    raw: ArrowArray,
    _owner: PhantomData<&'a mut ()>,
}

impl BorrowedArray<'_> {
    /// Returns a pointer for C consumers that read the array in place.
    #[must_use]
    pub fn as_mut_ptr(&mut self) -> *mut ArrowArray {
        &mut self.raw
    }
}

impl Deref for BorrowedArray<'_> {
    type Target = ArrowArray;

    fn deref(&self) -> &ArrowArray {
        &self.raw
    }
}

/// Heap state behind an owned array export.
struct OwnedArrayData {
    buffers: BufferTable,
    byte_capacity: usize,
}

unsafe extern "C" fn release_borrowed_schema(schema: *mut ArrowSchema) {
    if let Some(schema) = schema.as_mut() {
        schema.release = None;
    }
}

unsafe extern "C" fn release_borrowed_array(array: *mut ArrowArray) {
    if let Some(array) = array.as_mut() {
        array.release = None;
    }
}

unsafe extern "C" fn release_owned_schema(schema: *mut ArrowSchema) {
    let Some(schema) = schema.as_mut() else {
        return;
    };
    if schema.release.is_none() {
        warn!("release called on a released schema");
        return;
    }
    if !schema.private_data.is_null() {
        drop(CString::from_raw(schema.private_data.cast()));
    }
    schema.name = ptr::null();
    schema.private_data = ptr::null_mut();
    schema.release = None;
}

unsafe extern "C" fn release_owned_array(array: *mut ArrowArray) {
    let Some(array) = array.as_mut() else {
        return;
    };
    if array.release.is_none() {
        warn!("release called on a released array");
        return;
    }
    if !array.private_data.is_null() {
        let private = Box::from_raw(array.private_data.cast::<OwnedArrayData>());
        let data = private.buffers[DATA_BUFFER_SLOT].cast_mut().cast::<u8>();
        drop(AlignedBuffer::<DEFAULT_ALIGNMENT>::from_raw_parts(
            data,
            private.byte_capacity,
        ));
        drop(private);
    }
    array.buffers = ptr::null_mut();
    array.private_data = ptr::null_mut();
    array.release = None;
}
