//! Arrow C Data Interface structures.
//!
//! Layouts follow
//! <https://arrow.apache.org/docs/format/CDataInterface.html#structure-definitions>
//! field for field. A struct whose `release` is `None` is released and must
//! not be read.

use std::ffi::{c_char, c_void};
use std::ptr;

/// `struct ArrowSchema`.
#[repr(C)]
#[derive(Debug)]
pub struct ArrowSchema {
    /// Nul-terminated format string.
    pub format: *const c_char,
    /// Nul-terminated field name, may be null.
    pub name: *const c_char,
    /// Binary key/value metadata, may be null.
    pub metadata: *const c_char,
    /// `ARROW_FLAG_*` bitmask.
    pub flags: i64,
    /// Number of children.
    pub n_children: i64,
    /// Child schemas.
    pub children: *mut *mut ArrowSchema,
    /// Dictionary schema, null unless dictionary encoded.
    pub dictionary: *mut ArrowSchema,
    /// Release callback; `None` marks the struct as released.
    pub release: Option<unsafe extern "C" fn(*mut ArrowSchema)>,
    /// Producer-owned data for `release`.
    pub private_data: *mut c_void,
}

/// `struct ArrowArray`.
#[repr(C)]
#[derive(Debug)]
pub struct ArrowArray {
    /// Logical number of elements.
    pub length: i64,
    /// Number of null elements, -1 if not computed.
    pub null_count: i64,
    /// Logical offset into the buffers, in elements.
    pub offset: i64,
    /// Number of entries in `buffers`.
    pub n_buffers: i64,
    /// Number of children.
    pub n_children: i64,
    /// Buffer pointers; for primitives slot 0 is validity, slot 1 is data.
    pub buffers: *mut *const c_void,
    /// Child arrays.
    pub children: *mut *mut ArrowArray,
    /// Dictionary array, null unless dictionary encoded.
    pub dictionary: *mut ArrowArray,
    /// Release callback; `None` marks the struct as released.
    pub release: Option<unsafe extern "C" fn(*mut ArrowArray)>,
    /// Producer-owned data for `release`.
    pub private_data: *mut c_void,
}

impl ArrowSchema {
    /// Returns a released schema with every pointer null.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            format: ptr::null(),
            name: ptr::null(),
            metadata: ptr::null(),
            flags: 0,
            n_children: 0,
            children: ptr::null_mut(),
            dictionary: ptr::null_mut(),
            release: None,
            private_data: ptr::null_mut(),
        }
    }

    /// Returns true if the release callback has been cleared.
    #[inline]
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.release.is_none()
    }
}

impl ArrowArray {
    /// Returns a released array with every pointer null.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            length: 0,
            null_count: 0,
            offset: 0,
            n_buffers: 0,
            n_children: 0,
            buffers: ptr::null_mut(),
            children: ptr::null_mut(),
            dictionary: ptr::null_mut(),
            release: None,
            private_data: ptr::null_mut(),
        }
    }

    /// Returns true if the release callback has been cleared.
    #[inline]
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.release.is_none()
    }

    /// Reads buffer pointer `slot`, or null if the slot does not exist.
    ///
    /// # Safety
    ///
    /// The struct must not be released and `buffers` must point at
    /// `n_buffers` readable entries.
    #[must_use]
    pub unsafe fn buffer(&self, slot: usize) -> *const c_void {
        if self.buffers.is_null() || slot as i64 >= self.n_buffers {
            return ptr::null();
        }
        *self.buffers.add(slot)
    }
}

impl Default for ArrowSchema {
    fn default() -> Self {
        Self::empty()
    }
}

impl Default for ArrowArray {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, offset_of, size_of};

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_schema_layout() {
        assert_eq!(size_of::<ArrowSchema>(), 9 * 8);
        assert_eq!(align_of::<ArrowSchema>(), 8);
        assert_eq!(offset_of!(ArrowSchema, flags), 3 * 8);
        assert_eq!(offset_of!(ArrowSchema, release), 7 * 8);
        assert_eq!(offset_of!(ArrowSchema, private_data), 8 * 8);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_array_layout() {
        assert_eq!(size_of::<ArrowArray>(), 10 * 8);
        assert_eq!(offset_of!(ArrowArray, buffers), 5 * 8);
        assert_eq!(offset_of!(ArrowArray, release), 8 * 8);
        assert_eq!(offset_of!(ArrowArray, private_data), 9 * 8);
    }

    #[test]
    fn test_empty_is_released() {
        assert!(ArrowSchema::empty().is_released());
        assert!(ArrowArray::default().is_released());
    }

    #[test]
    fn test_buffer_out_of_range_is_null() {
        let mut slots: [*const c_void; 2] = [ptr::null(), 8 as *const c_void];
        let mut array = ArrowArray::empty();
        array.n_buffers = 2;
        array.buffers = slots.as_mut_ptr();

        // SAFETY: buffers points at two readable entries
        unsafe {
            assert!(array.buffer(0).is_null());
            assert_eq!(array.buffer(1) as usize, 8);
            assert!(array.buffer(2).is_null());
        }
    }
}
