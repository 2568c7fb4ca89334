//! End-to-end tests of the export/import protocol.

use std::cell::Cell;
use std::ffi::CStr;

use xarrow::column::{AnyColumn, PrimitiveColumn};
use xarrow::constants::{DATA_BUFFER_SLOT, VALIDITY_BUFFER_SLOT};
use xarrow::ffi::{import, ArrowArray, ImportedSchema, ReleaseManager};
use xarrow::{DataType, XArrowError};

type ArrayRelease = unsafe extern "C" fn(*mut ArrowArray);

thread_local! {
    static INNER: Cell<Option<ArrayRelease>> = const { Cell::new(None) };
    static FIRED: Cell<usize> = const { Cell::new(0) };
}

/// Forwards to the exporter's callback and counts the call.
unsafe extern "C" fn counted_release(array: *mut ArrowArray) {
    FIRED.with(|f| f.set(f.get() + 1));
    if let Some(inner) = INNER.with(Cell::get) {
        inner(array);
    }
}

fn instrument(array: &mut ArrowArray) {
    FIRED.with(|f| f.set(0));
    INNER.with(|i| i.set(array.release));
    array.release = Some(counted_release);
}

fn fired() -> usize {
    FIRED.with(Cell::get)
}

fn column_1234() -> PrimitiveColumn<i32> {
    let mut column = PrimitiveColumn::new("x").unwrap();
    column.data_mut().extend_from_slice(&[1, 2, 3, 4]).unwrap();
    column
}

#[test]
fn test_borrowed_view_scenario() {
    let mut column = column_1234();
    let schema = column.schema_ref();
    // SAFETY: the view's format and name point into the column
    unsafe {
        assert_eq!(CStr::from_ptr(schema.format), c"i");
        assert_eq!(CStr::from_ptr(schema.name), c"x");
    }
    drop(schema);

    let data_ptr = column.data().as_ptr();
    let array = column.array_ref();
    assert_eq!(array.length, 4);
    assert_eq!(array.null_count, 0);
    assert_eq!(array.offset, 0);
    assert_eq!(array.n_buffers, 2);
    // SAFETY: the view's table has two entries
    unsafe {
        assert!(array.buffer(VALIDITY_BUFFER_SLOT).is_null());
        assert_eq!(array.buffer(DATA_BUFFER_SLOT).cast::<i32>(), data_ptr);
    }
    drop(array);

    // The column is untouched by the view.
    assert_eq!(column.data().as_slice(), &[1, 2, 3, 4]);
}

#[test]
fn test_owned_handoff_scenario() {
    let mut column = column_1234();
    let mut array = column.export_array().unwrap();

    assert_eq!(column.len(), 0);
    assert_eq!(column.data().capacity(), 0);
    assert_eq!(array.length, 4);

    // SAFETY: the array owns its buffer until released
    let values = unsafe {
        std::slice::from_raw_parts(array.buffer(DATA_BUFFER_SLOT).cast::<i32>(), 4)
    };
    assert_eq!(values, &[1, 2, 3, 4]);

    instrument(&mut array);
    // SAFETY: fresh export
    drop(unsafe { ReleaseManager::new(array) });
    assert_eq!(fired(), 1);
}

#[test]
fn test_round_trip_releases_once() {
    let mut column = column_1234();
    let (schema, mut array) = column.export().unwrap();
    instrument(&mut array);

    // SAFETY: fresh export
    let imported = unsafe { import(schema, array) }.unwrap();
    assert_eq!(imported.values::<i32>().unwrap(), &[1, 2, 3, 4]);
    assert_eq!(fired(), 0);

    drop(imported);
    assert_eq!(fired(), 1);
}

#[test]
fn test_take_then_drop_both_releases_once() {
    let mut column = column_1234();
    let mut array = column.export_array().unwrap();
    instrument(&mut array);

    // SAFETY: fresh export
    let mut first = unsafe { ReleaseManager::new(array) };
    let second = first.take();
    drop(first);
    assert_eq!(fired(), 0);
    drop(second);
    assert_eq!(fired(), 1);
}

#[test]
fn test_failed_import_still_releases() {
    let mut column = column_1234();
    let (schema, mut array) = column.export().unwrap();
    array.n_children = 1;
    instrument(&mut array);

    // SAFETY: fresh export; the guards release it on the error path
    let err = unsafe { import(schema, array) }.unwrap_err();
    assert!(matches!(err, XArrowError::NotSupported { .. }));
    assert_eq!(fired(), 1);
}

#[test]
fn test_column_refills_after_export() {
    let mut column = column_1234();
    let (schema, array) = column.export().unwrap();

    column.data_mut().push(9).unwrap();
    assert_eq!(column.data().as_slice(), &[9]);

    // SAFETY: fresh export
    let imported = unsafe { import(schema, array) }.unwrap();
    assert_eq!(imported.values::<i32>().unwrap(), &[1, 2, 3, 4]);
}

#[test]
fn test_schema_deep_copy_is_independent() {
    let column = column_1234();
    // SAFETY: fresh export
    let guard = unsafe { ReleaseManager::new(column.export_schema()) };
    let schema = ImportedSchema::try_new(guard).unwrap();
    let copy = schema.deep_copy().unwrap();
    drop(schema);
    drop(column);

    // SAFETY: the copy carries its own strings
    let copy = unsafe { ReleaseManager::new(copy) };
    let reimported = ImportedSchema::try_new(copy).unwrap();
    assert_eq!(reimported.name(), "x");
    assert_eq!(reimported.data_type(), DataType::Int32);
}

#[test]
fn test_any_column_round_trip() {
    for data_type in DataType::ALL {
        let mut column = AnyColumn::new("v", data_type).unwrap();
        let (schema, array) = column.export().unwrap();

        // SAFETY: fresh export
        let imported = unsafe { import(schema, array) }.unwrap();
        assert_eq!(imported.data_type(), data_type);

        let copy = imported.to_column().unwrap();
        assert_eq!(copy.data_type(), data_type);
        assert_eq!(copy.name(), "v");
        assert!(copy.is_empty());
    }
}

#[test]
fn test_float_values_survive_round_trip() {
    let mut column = PrimitiveColumn::<f32>::new("temp").unwrap();
    column.data_mut().extend_from_slice(&[-1.5, 0.0, 2.25]).unwrap();
    let (schema, array) = column.export().unwrap();

    // SAFETY: fresh export
    let imported = unsafe { import(schema, array) }.unwrap();
    let copy = imported.to_column().unwrap();
    drop(imported);

    let typed = copy.as_typed::<f32>().unwrap();
    assert_eq!(typed.data().as_slice(), &[-1.5, 0.0, 2.25]);
    assert_eq!(typed.data().as_ptr() as usize % 64, 0);
}

#[test]
fn test_import_rejects_unknown_format() {
    let column = column_1234();
    let mut schema = column.export_schema();
    let original_format = schema.format;
    schema.format = c"tdm".as_ptr();

    // SAFETY: the release callback only frees the name copy
    let err = ImportedSchema::try_new(unsafe { ReleaseManager::new(schema) }).unwrap_err();
    assert!(matches!(err, XArrowError::UnsupportedFormat { ref format } if format == "tdm"));
    assert!(!original_format.is_null());
}
