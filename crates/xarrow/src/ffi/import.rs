//! Consumer side: validating and reading structs received from a producer.
//!
//! Both importers keep the received struct inside a [`ReleaseManager`], so
//! the producer's release callback fires exactly once when the importer is
//! dropped, whether or not validation succeeded.

use std::ffi::{c_char, c_void, CStr, CString};
use std::mem;
use std::ptr;
use std::slice;

use tracing::{debug, warn};

use crate::column::{AnyColumn, ColumnType, ColumnVector, PrimitiveColumn};
use crate::constants::{DATA_BUFFER_SLOT, PRIMITIVE_BUFFER_COUNT, VALIDITY_BUFFER_SLOT};
use crate::error::{XArrowError, XArrowResult};
use crate::types::{DataType, NativeType};

use super::abi::{ArrowArray, ArrowSchema};
use super::release::ReleaseManager;

/// A decoded key/value metadata entry.
pub type MetadataEntry = (String, String);

/// A received `ArrowSchema` describing a flat primitive column.
#[derive(Debug)]
pub struct ImportedSchema {
    guard: ReleaseManager<ArrowSchema>,
    data_type: DataType,
    name: String,
    flags: i64,
    metadata: Vec<MetadataEntry>,
    raw_metadata: Option<Box<[u8]>>,
}

impl ImportedSchema {
    /// Validates and decodes a received schema.
    ///
    /// On error the guard is dropped, which releases the schema.
    pub fn try_new(guard: ReleaseManager<ArrowSchema>) -> XArrowResult<Self> {
        let raw = guard.get();
        if raw.is_released() {
            return Err(XArrowError::Released { what: "schema" });
        }
        if raw.format.is_null() {
            return Err(XArrowError::invalid_argument("schema format is null"));
        }
        if raw.n_children != 0 || !raw.children.is_null() {
            return Err(XArrowError::not_supported("nested schemas"));
        }
        if !raw.dictionary.is_null() {
            return Err(XArrowError::not_supported("dictionary encoding"));
        }

        // SAFETY: an unreleased schema carries a nul-terminated format
        let format = unsafe { CStr::from_ptr(raw.format) };
        let data_type = DataType::from_format_cstr(format)?;

        let name = if raw.name.is_null() {
            String::new()
        } else {
            // SAFETY: a non-null name is nul-terminated
            let name = unsafe { CStr::from_ptr(raw.name) };
            name.to_str()
                .map_err(|_| XArrowError::invalid_argument("schema name is not UTF-8"))?
                .to_owned()
        };

        let (metadata, raw_metadata) = if raw.metadata.is_null() {
            (Vec::new(), None)
        } else {
            // SAFETY: a non-null metadata pointer follows the binary layout
            let (entries, bytes) = unsafe { decode_metadata(raw.metadata)? };
            (entries, Some(bytes))
        };

        debug!(%data_type, name = %name, "imported schema");
        let flags = raw.flags;
        Ok(Self {
            guard,
            data_type,
            name,
            flags,
            metadata,
            raw_metadata,
        })
    }

    /// Returns the element type.
    #[inline]
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns the field name, empty when the producer sent none.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the `ARROW_FLAG_*` bitmask.
    #[inline]
    #[must_use]
    pub fn flags(&self) -> i64 {
        self.flags
    }

    /// Returns the decoded metadata in producer order.
    #[must_use]
    pub fn metadata(&self) -> &[MetadataEntry] {
        &self.metadata
    }

    /// Returns the received struct.
    #[must_use]
    pub fn raw(&self) -> &ArrowSchema {
        self.guard.get()
    }

    /// Builds an independent schema with freshly allocated strings.
    ///
    /// The copy carries its own release callback and outlives `self`.
    pub fn deep_copy(&self) -> XArrowResult<ArrowSchema> {
        let name = CString::new(self.name.as_str())
            .map_err(|_| XArrowError::invalid_argument("schema name contains a nul byte"))?;
        let owned = Box::new(SchemaCopy {
            format: self.data_type.format_cstr(),
            name,
            metadata: self.raw_metadata.clone(),
        });

        let metadata = owned
            .metadata
            .as_ref()
            .map_or(ptr::null(), |bytes| bytes.as_ptr().cast::<c_char>());
        let schema = ArrowSchema {
            format: owned.format.as_ptr(),
            name: owned.name.as_ptr(),
            metadata,
            flags: self.flags,
            n_children: 0,
            children: ptr::null_mut(),
            dictionary: ptr::null_mut(),
            release: Some(release_schema_copy),
            private_data: Box::into_raw(owned).cast::<c_void>(),
        };
        Ok(schema)
    }
}

/// A received `ArrowArray` paired with its schema.
///
/// # Example
///
/// ```rust
/// use xarrow::column::PrimitiveColumn;
/// use xarrow::ffi::import;
///
/// let mut column = PrimitiveColumn::<i64>::new("ts")?;
/// column.data_mut().extend_from_slice(&[10, 20, 30])?;
/// let (schema, array) = column.export()?;
///
/// // SAFETY: both structs come straight from the exporter
/// let imported = unsafe { import(schema, array)? };
/// assert_eq!(imported.values::<i64>()?, &[10, 20, 30]);
/// # Ok::<(), xarrow::XArrowError>(())
/// ```
#[derive(Debug)]
pub struct ImportedArray {
    schema: ImportedSchema,
    guard: ReleaseManager<ArrowArray>,
}

impl ImportedArray {
    /// Validates a received array against its schema.
    ///
    /// On error both guards are dropped, which releases both structs.
    #[allow(clippy::cast_possible_wrap)]
    pub fn try_new(
        schema: ImportedSchema,
        guard: ReleaseManager<ArrowArray>,
    ) -> XArrowResult<Self> {
        let raw = guard.get();
        if raw.is_released() {
            return Err(XArrowError::Released { what: "array" });
        }
        if raw.length < 0 || raw.offset < 0 {
            return Err(XArrowError::invalid_argument(format!(
                "negative length {} or offset {}",
                raw.length, raw.offset
            )));
        }
        if raw.n_buffers != PRIMITIVE_BUFFER_COUNT as i64 || raw.buffers.is_null() {
            return Err(XArrowError::invalid_argument(format!(
                "primitive arrays carry {PRIMITIVE_BUFFER_COUNT} buffers, got {}",
                raw.n_buffers
            )));
        }
        if raw.n_children != 0 || !raw.children.is_null() {
            return Err(XArrowError::not_supported("nested arrays"));
        }
        if !raw.dictionary.is_null() {
            return Err(XArrowError::not_supported("dictionary encoding"));
        }

        // SAFETY: buffers was checked non-null with two entries
        let (validity, data) =
            unsafe { (raw.buffer(VALIDITY_BUFFER_SLOT), raw.buffer(DATA_BUFFER_SLOT)) };
        if !validity.is_null() && raw.null_count != 0 {
            return Err(XArrowError::not_supported("validity bitmaps"));
        }
        if data.is_null() && raw.length > 0 {
            return Err(XArrowError::invalid_argument("data buffer is null"));
        }
        let width = schema.data_type().byte_width();
        if !data.is_null() && data as usize % width != 0 {
            return Err(XArrowError::invalid_argument(format!(
                "data buffer is not aligned to {width} bytes"
            )));
        }

        debug!(
            data_type = %schema.data_type(),
            length = raw.length,
            offset = raw.offset,
            "imported array"
        );
        Ok(Self { schema, guard })
    }

    /// Returns the schema this array was imported with.
    #[must_use]
    pub fn schema(&self) -> &ImportedSchema {
        &self.schema
    }

    /// Returns the element type.
    #[inline]
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.schema.data_type()
    }

    /// Returns the logical number of elements.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn len(&self) -> usize {
        self.guard.get().length as usize
    }

    /// Returns true if the array has no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the logical offset in elements.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn offset(&self) -> usize {
        self.guard.get().offset as usize
    }

    /// Borrows the values in place.
    ///
    /// Fails with [`XArrowError::TypeMismatch`] unless `T` matches the schema.
    pub fn values<T: NativeType>(&self) -> XArrowResult<&[T]> {
        if T::DATA_TYPE != self.data_type() {
            return Err(XArrowError::TypeMismatch {
                expected: self.data_type().to_string(),
                actual: T::DATA_TYPE.to_string(),
            });
        }
        if self.is_empty() {
            return Ok(&[]);
        }
        let raw = self.guard.get();
        // SAFETY: validated in try_new; the producer keeps the buffer alive
        // until release, which cannot happen while self is borrowed
        unsafe {
            let data = raw.buffer(DATA_BUFFER_SLOT).cast::<T>();
            Ok(slice::from_raw_parts(data.add(self.offset()), self.len()))
        }
    }

    /// Copies the values into a new column that owns its memory.
    pub fn to_column(&self) -> XArrowResult<AnyColumn> {
        match self.data_type() {
            DataType::Int8 => self.copy_as::<i8>(),
            DataType::UInt8 => self.copy_as::<u8>(),
            DataType::Int16 => self.copy_as::<i16>(),
            DataType::UInt16 => self.copy_as::<u16>(),
            DataType::Int32 => self.copy_as::<i32>(),
            DataType::UInt32 => self.copy_as::<u32>(),
            DataType::Int64 => self.copy_as::<i64>(),
            DataType::UInt64 => self.copy_as::<u64>(),
            DataType::Float32 => self.copy_as::<f32>(),
            DataType::Float64 => self.copy_as::<f64>(),
        }
    }

    fn copy_as<T: ColumnType>(&self) -> XArrowResult<AnyColumn> {
        let data = ColumnVector::<T>::from_slice(self.values::<T>()?)?;
        Ok(T::wrap(PrimitiveColumn::with_data(self.schema.name(), data)?))
    }
}

/// Takes ownership of an exported pair and validates it.
///
/// # Safety
///
/// Both structs must come from a conforming producer and must not be
/// released through any other copy.
pub unsafe fn import(schema: ArrowSchema, array: ArrowArray) -> XArrowResult<ImportedArray> {
    let schema_guard = ReleaseManager::new(schema);
    let array_guard = ReleaseManager::new(array);
    ImportedArray::try_new(ImportedSchema::try_new(schema_guard)?, array_guard)
}

/// Strings owned by a deep-copied schema.
struct SchemaCopy {
    format: &'static CStr,
    name: CString,
    metadata: Option<Box<[u8]>>,
}

unsafe extern "C" fn release_schema_copy(schema: *mut ArrowSchema) {
    let Some(schema) = schema.as_mut() else {
        return;
    };
    if schema.release.is_none() {
        warn!("release called on a released schema copy");
        return;
    }
    if !schema.private_data.is_null() {
        drop(Box::from_raw(schema.private_data.cast::<SchemaCopy>()));
    }
    schema.format = ptr::null();
    schema.name = ptr::null();
    schema.metadata = ptr::null();
    schema.private_data = ptr::null_mut();
    schema.release = None;
}

/// Upper bound on entries reserved up front from a foreign pair count.
const MAX_METADATA_PREALLOC: usize = 64;

/// Decodes the binary metadata layout: an `i32` pair count, then for each
/// pair an `i32` key length, key bytes, `i32` value length, value bytes.
/// Integers are native-endian and unaligned.
///
/// Returns the entries and a copy of the encoded bytes.
unsafe fn decode_metadata(
    metadata: *const c_char,
) -> XArrowResult<(Vec<MetadataEntry>, Box<[u8]>)> {
    let base = metadata.cast::<u8>();
    let mut cursor = 0usize;

    let count = read_length(base, &mut cursor)?;
    // The count is unvalidated until every pair has been read.
    let mut entries = Vec::with_capacity(count.min(MAX_METADATA_PREALLOC));
    for _ in 0..count {
        let key = read_string(base, &mut cursor)?;
        let value = read_string(base, &mut cursor)?;
        entries.push((key, value));
    }

    let bytes = slice::from_raw_parts(base, cursor).into();
    Ok((entries, bytes))
}

unsafe fn read_length(base: *const u8, cursor: &mut usize) -> XArrowResult<usize> {
    let value = ptr::read_unaligned(base.add(*cursor).cast::<i32>());
    *cursor += mem::size_of::<i32>();
    usize::try_from(value)
        .map_err(|_| XArrowError::invalid_argument(format!("negative metadata length {value}")))
}

unsafe fn read_string(base: *const u8, cursor: &mut usize) -> XArrowResult<String> {
    let len = read_length(base, cursor)?;
    let bytes = slice::from_raw_parts(base.add(*cursor), len);
    *cursor += len;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| XArrowError::invalid_argument("metadata is not UTF-8"))
}
