//! Aligned memory allocation utilities.
//!
//! Provides the two bottom layers of a column buffer:
//! - [`AlignedBuffer`]: one raw, zero-initialized allocation whose byte size
//!   is rounded up to the alignment
//! - [`AlignedArray`]: a fixed-length typed view that owns one buffer
//!
//! Alignment is a const generic so that every buffer of a given type agrees
//! on its layout and a raw `(pointer, size)` pair is enough to free it later.

use std::alloc::{self, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::mem::{self, ManuallyDrop};
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::slice;

use crate::constants::DEFAULT_ALIGNMENT;
use crate::error::{XArrowError, XArrowResult};
use crate::types::NativeType;

/// Rounds `size` up to the next multiple of `align`.
///
/// `align` must be a power of two.
///
/// # Example
///
/// ```rust
/// use xarrow::memory::align_round;
///
/// assert_eq!(align_round(1, 64), 64);
/// assert_eq!(align_round(64, 64), 64);
/// assert_eq!(align_round(65, 64), 128);
/// assert_eq!(align_round(0, 64), 0);
/// ```
#[inline]
#[must_use]
pub const fn align_round(size: usize, align: usize) -> usize {
    (size + align - 1) / align * align
}

/// Overflow-checked [`align_round`].
#[inline]
fn checked_align_round(size: usize, align: usize) -> Option<usize> {
    match size.checked_add(align - 1) {
        Some(padded) => Some(padded / align * align),
        None => None,
    }
}

/// A single aligned heap allocation.
///
/// The buffer is either empty (no allocation) or owns exactly one region of
/// `len()` bytes, where `len()` is the requested size rounded up to `ALIGN`.
/// Memory is zeroed on allocation.
///
/// # Example
///
/// ```rust
/// use xarrow::memory::AlignedBuffer;
///
/// let mut buffer = AlignedBuffer::<64>::allocate(100).unwrap();
/// assert_eq!(buffer.len(), 128);
/// assert!(buffer.is_aligned_to(64));
/// buffer[0] = 42;
/// assert_eq!(buffer[0], 42);
/// ```
pub struct AlignedBuffer<const ALIGN: usize = DEFAULT_ALIGNMENT> {
    ptr: Option<NonNull<u8>>,
    size: usize,
}

// SAFETY: AlignedBuffer owns its memory and doesn't share it
unsafe impl<const ALIGN: usize> Send for AlignedBuffer<ALIGN> {}
unsafe impl<const ALIGN: usize> Sync for AlignedBuffer<ALIGN> {}

impl<const ALIGN: usize> AlignedBuffer<ALIGN> {
    const VALID_ALIGNMENT: () = assert!(
        ALIGN > 0 && ALIGN.is_power_of_two(),
        "alignment must be a power of 2"
    );

    /// Returns a buffer that owns no memory.
    #[must_use]
    pub const fn empty() -> Self {
        let () = Self::VALID_ALIGNMENT;
        Self { ptr: None, size: 0 }
    }

    /// Allocates a zeroed buffer of at least `size` bytes.
    ///
    /// A zero `size` returns the empty buffer without touching the allocator.
    ///
    /// # Errors
    ///
    /// Returns [`XArrowError::Allocation`] if the allocator returns null or
    /// the rounded size cannot form a valid layout.
    pub fn allocate(size: usize) -> XArrowResult<Self> {
        let () = Self::VALID_ALIGNMENT;
        if size == 0 {
            return Ok(Self::empty());
        }

        let rounded = checked_align_round(size, ALIGN)
            .ok_or(XArrowError::CapacityOverflow { requested: size })?;
        let layout = Layout::from_size_align(rounded, ALIGN).map_err(|_| {
            XArrowError::Allocation {
                size: rounded,
                alignment: ALIGN,
            }
        })?;

        // SAFETY: layout has a non-zero size
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).ok_or(XArrowError::Allocation {
            size: rounded,
            alignment: ALIGN,
        })?;

        Ok(Self {
            ptr: Some(ptr),
            size: rounded,
        })
    }

    /// Rebuilds a buffer from parts produced by [`AlignedBuffer::into_raw_parts`].
    ///
    /// # Safety
    ///
    /// `ptr` must be null, or have been returned by `into_raw_parts` on an
    /// `AlignedBuffer<ALIGN>` whose size rounds to the same value as `size`,
    /// and must not have been freed or rebuilt since.
    pub(crate) unsafe fn from_raw_parts(ptr: *mut u8, size: usize) -> Self {
        match NonNull::new(ptr) {
            Some(ptr) => Self {
                ptr: Some(ptr),
                size: align_round(size, ALIGN),
            },
            None => Self::empty(),
        }
    }

    /// Gives up ownership of the allocation without freeing it.
    ///
    /// Returns the base pointer (null for an empty buffer) and the rounded
    /// byte size. The caller is responsible for the memory from here on.
    #[must_use = "the returned allocation leaks unless it is rebuilt and dropped"]
    pub fn into_raw_parts(self) -> (*mut u8, usize) {
        let this = ManuallyDrop::new(self);
        let ptr = this.ptr.map_or(ptr::null_mut(), NonNull::as_ptr);
        (ptr, this.size)
    }

    /// Returns the size of the buffer in bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Returns true if the buffer owns no memory.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the alignment of the buffer.
    #[inline]
    #[must_use]
    pub const fn alignment(&self) -> usize {
        ALIGN
    }

    /// Returns a raw pointer to the buffer, null when empty.
    #[inline]
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.map_or(ptr::null(), |p| p.as_ptr().cast_const())
    }

    /// Returns a mutable raw pointer to the buffer, null when empty.
    #[inline]
    #[must_use]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    /// Returns the buffer as a byte slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        match self.ptr {
            // SAFETY: ptr is valid for `size` initialized bytes
            Some(ptr) => unsafe { slice::from_raw_parts(ptr.as_ptr(), self.size) },
            None => &[],
        }
    }

    /// Returns the buffer as a mutable byte slice.
    #[inline]
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        match self.ptr {
            // SAFETY: ptr is valid, size is correct, and we have exclusive access
            Some(ptr) => unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), self.size) },
            None => &mut [],
        }
    }

    /// Checks if the buffer is aligned to the specified alignment.
    #[inline]
    #[must_use]
    pub fn is_aligned_to(&self, alignment: usize) -> bool {
        (self.as_ptr() as usize) % alignment == 0
    }

    /// Allocates a new buffer of the same size and copies the contents.
    pub fn try_clone(&self) -> XArrowResult<Self> {
        let mut copy = Self::allocate(self.size)?;
        copy.as_mut_slice().copy_from_slice(self.as_slice());
        Ok(copy)
    }
}

impl<const ALIGN: usize> Drop for AlignedBuffer<ALIGN> {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY: ptr was allocated with exactly this layout in `allocate`
            unsafe {
                let layout = Layout::from_size_align_unchecked(self.size, ALIGN);
                alloc::dealloc(ptr.as_ptr(), layout);
            }
        }
    }
}

impl<const ALIGN: usize> Default for AlignedBuffer<ALIGN> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const ALIGN: usize> Deref for AlignedBuffer<ALIGN> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<const ALIGN: usize> DerefMut for AlignedBuffer<ALIGN> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<const ALIGN: usize> fmt::Debug for AlignedBuffer<ALIGN> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("size", &self.size)
            .field("alignment", &ALIGN)
            .field("ptr", &self.as_ptr())
            .finish()
    }
}

/// A fixed-length array of `T` stored in one [`AlignedBuffer`].
///
/// Every slot is initialized (zeroed on allocation), so the whole array is
/// always readable as `&[T]`.
pub struct AlignedArray<T: NativeType, const ALIGN: usize = DEFAULT_ALIGNMENT> {
    len: usize,
    buffer: AlignedBuffer<ALIGN>,
    _marker: PhantomData<T>,
}

impl<T: NativeType, const ALIGN: usize> AlignedArray<T, ALIGN> {
    const VALID_ALIGNMENT: () = assert!(
        ALIGN >= mem::align_of::<T>(),
        "alignment must be at least the alignment of T"
    );

    /// Returns an array of length zero that owns no memory.
    #[must_use]
    pub const fn empty() -> Self {
        let () = Self::VALID_ALIGNMENT;
        Self {
            len: 0,
            buffer: AlignedBuffer::empty(),
            _marker: PhantomData,
        }
    }

    /// Allocates an array of `len` zeroed elements.
    pub fn new(len: usize) -> XArrowResult<Self> {
        let () = Self::VALID_ALIGNMENT;
        let bytes = len
            .checked_mul(mem::size_of::<T>())
            .ok_or(XArrowError::CapacityOverflow { requested: len })?;
        Ok(Self {
            len,
            buffer: AlignedBuffer::allocate(bytes)?,
            _marker: PhantomData,
        })
    }

    /// Allocates an array holding a copy of `values`.
    pub fn from_slice(values: &[T]) -> XArrowResult<Self> {
        let mut array = Self::new(values.len())?;
        array.as_mut_slice().copy_from_slice(values);
        Ok(array)
    }

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the array holds no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns a pointer to the first element, null when empty.
    #[inline]
    #[must_use]
    pub fn as_ptr(&self) -> *const T {
        self.buffer.as_ptr().cast()
    }

    /// Returns a mutable pointer to the first element, null when empty.
    #[inline]
    #[must_use]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.buffer.as_mut_ptr().cast()
    }

    /// Returns the elements as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        if self.len == 0 {
            return &[];
        }
        // SAFETY: buffer holds len * size_of::<T>() initialized bytes aligned
        // to ALIGN >= align_of::<T>(), and T has no invalid bit patterns
        unsafe { slice::from_raw_parts(self.as_ptr(), self.len) }
    }

    /// Returns the elements as a mutable slice.
    #[inline]
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        if self.len == 0 {
            return &mut [];
        }
        // SAFETY: as in `as_slice`, plus exclusive access through &mut self
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr(), self.len) }
    }

    /// Bounds-checked element access.
    pub fn at(&self, index: usize) -> XArrowResult<&T> {
        self.as_slice().get(index).ok_or(XArrowError::IndexOutOfRange {
            index,
            len: self.len,
        })
    }

    /// Bounds-checked mutable element access.
    pub fn at_mut(&mut self, index: usize) -> XArrowResult<&mut T> {
        let len = self.len;
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(XArrowError::IndexOutOfRange { index, len })
    }

    /// Unchecked element access.
    ///
    /// # Safety
    ///
    /// `index` must be less than `len()`.
    #[inline]
    #[must_use]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        &*self.as_ptr().add(index)
    }

    /// Allocates a new array and copies all elements into it.
    pub fn try_clone(&self) -> XArrowResult<Self> {
        Self::from_slice(self.as_slice())
    }

    /// Gives up ownership of the storage without freeing it.
    ///
    /// Returns the element pointer (null when empty) and the element count.
    /// The caller owns `len * size_of::<T>()` bytes, rounded up to `ALIGN`.
    #[must_use = "the returned allocation leaks unless it is rebuilt and dropped"]
    pub fn into_raw_parts(self) -> (*mut T, usize) {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the buffer is moved out exactly once
        let buffer = unsafe { ptr::read(&this.buffer) };
        let (ptr, _) = buffer.into_raw_parts();
        (ptr.cast(), this.len)
    }
}

impl<T: NativeType, const ALIGN: usize> Clone for AlignedArray<T, ALIGN> {
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(copy) => copy,
            Err(_) => alloc::handle_alloc_error(layout_for::<T, ALIGN>(self.len)),
        }
    }
}

impl<T: NativeType, const ALIGN: usize> Default for AlignedArray<T, ALIGN> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: NativeType, const ALIGN: usize> Deref for AlignedArray<T, ALIGN> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T: NativeType, const ALIGN: usize> DerefMut for AlignedArray<T, ALIGN> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T: NativeType, const ALIGN: usize> fmt::Debug for AlignedArray<T, ALIGN> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedArray")
            .field("len", &self.len)
            .field("alignment", &ALIGN)
            .field("values", &self.as_slice())
            .finish()
    }
}

/// Layout of an array of `len` elements, used to report allocation failures
/// from infallible trait impls.
pub(crate) fn layout_for<T: NativeType, const ALIGN: usize>(len: usize) -> Layout {
    let bytes = len.saturating_mul(mem::size_of::<T>());
    let rounded = checked_align_round(bytes, ALIGN).unwrap_or(usize::MAX - (ALIGN - 1));
    Layout::from_size_align(rounded, ALIGN).unwrap_or_else(|_| Layout::new::<T>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_round() {
        assert_eq!(align_round(0, 16), 0);
        assert_eq!(align_round(1, 16), 16);
        assert_eq!(align_round(16, 16), 16);
        assert_eq!(align_round(17, 16), 32);
        assert_eq!(checked_align_round(usize::MAX, 64), None);
    }

    #[test]
    fn test_aligned_buffer_creation() {
        let buffer = AlignedBuffer::<4096>::allocate(4096).unwrap();
        assert_eq!(buffer.len(), 4096);
        assert!(buffer.is_aligned_to(4096));
    }

    #[test]
    fn test_aligned_buffer_rounds_up() {
        let buffer = AlignedBuffer::<64>::allocate(65).unwrap();
        assert_eq!(buffer.len(), 128);
        assert_eq!(buffer.len() % buffer.alignment(), 0);
    }

    #[test]
    fn test_aligned_buffer_zero_size() {
        let buffer = AlignedBuffer::<64>::allocate(0).unwrap();
        assert!(buffer.is_empty());
        assert!(buffer.as_ptr().is_null());
        assert!(buffer.as_slice().is_empty());
    }

    #[test]
    fn test_aligned_buffer_is_zeroed() {
        let buffer = AlignedBuffer::<32>::allocate(1000).unwrap();
        assert!(buffer.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_aligned_buffer_read_write() {
        let mut buffer = AlignedBuffer::<64>::allocate(1024).unwrap();

        buffer[0] = 0xDE;
        buffer[1] = 0xAD;
        buffer[2] = 0xBE;
        buffer[3] = 0xEF;

        assert_eq!(&buffer[..4], &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_aligned_buffer_move() {
        let mut buffer = AlignedBuffer::<64>::allocate(64).unwrap();
        buffer[7] = 7;
        let ptr = buffer.as_ptr();

        let moved = buffer;
        assert_eq!(moved.as_ptr(), ptr);
        assert_eq!(moved[7], 7);
    }

    #[test]
    fn test_aligned_buffer_clone() {
        let mut buffer = AlignedBuffer::<64>::allocate(1024).unwrap();
        buffer[0] = 42;
        buffer[100] = 100;

        let cloned = buffer.try_clone().unwrap();
        assert_eq!(cloned[0], 42);
        assert_eq!(cloned[100], 100);
        assert_eq!(cloned.len(), buffer.len());
        assert_ne!(cloned.as_ptr(), buffer.as_ptr());
    }

    #[test]
    fn test_aligned_buffer_raw_parts_roundtrip() {
        let mut buffer = AlignedBuffer::<64>::allocate(10).unwrap();
        buffer[9] = 9;

        let (ptr, size) = buffer.into_raw_parts();
        assert!(!ptr.is_null());
        assert_eq!(size, 64);

        // SAFETY: parts come straight from into_raw_parts above
        let rebuilt = unsafe { AlignedBuffer::<64>::from_raw_parts(ptr, 10) };
        assert_eq!(rebuilt.len(), 64);
        assert_eq!(rebuilt[9], 9);
    }

    #[test]
    fn test_empty_buffer_raw_parts() {
        let (ptr, size) = AlignedBuffer::<64>::empty().into_raw_parts();
        assert!(ptr.is_null());
        assert_eq!(size, 0);
    }

    #[test]
    fn test_aligned_array_creation() {
        let array = AlignedArray::<i32, 64>::new(10).unwrap();
        assert_eq!(array.len(), 10);
        assert!(array.iter().all(|&v| v == 0));
        assert_eq!(array.as_ptr() as usize % 64, 0);
    }

    #[test]
    fn test_aligned_array_at() {
        let mut array = AlignedArray::<u16, 16>::from_slice(&[1, 2, 3]).unwrap();
        assert_eq!(*array.at(2).unwrap(), 3);
        *array.at_mut(0).unwrap() = 10;
        assert_eq!(array[0], 10);

        let err = array.at(3).unwrap_err();
        assert!(matches!(err, XArrowError::IndexOutOfRange { index: 3, len: 3 }));
    }

    #[test]
    fn test_aligned_array_get_unchecked() {
        let array = AlignedArray::<f64, 64>::from_slice(&[1.5, 2.5]).unwrap();
        // SAFETY: index 1 < len 2
        assert_eq!(unsafe { *array.get_unchecked(1) }, 2.5);
    }

    #[test]
    fn test_aligned_array_deep_copy() {
        let original = AlignedArray::<i64, 64>::from_slice(&[1, 2, 3, 4]).unwrap();
        let mut copy = original.clone();
        copy[0] = 100;

        assert_eq!(original.as_slice(), &[1, 2, 3, 4]);
        assert_eq!(copy.as_slice(), &[100, 2, 3, 4]);
        assert_ne!(original.as_ptr(), copy.as_ptr());
    }

    #[test]
    fn test_aligned_array_overflow() {
        let err = AlignedArray::<u64, 64>::new(usize::MAX).unwrap_err();
        assert!(matches!(err, XArrowError::CapacityOverflow { .. }));
    }

    #[test]
    fn test_aligned_array_into_raw_parts() {
        let array = AlignedArray::<i32, 64>::from_slice(&[5, 6, 7]).unwrap();
        let (ptr, len) = array.into_raw_parts();
        assert_eq!(len, 3);

        // SAFETY: ptr points at 3 initialized i32 values we now own
        let values = unsafe { slice::from_raw_parts(ptr, len) };
        assert_eq!(values, &[5, 6, 7]);

        // SAFETY: reclaim the leaked allocation
        drop(unsafe {
            AlignedBuffer::<64>::from_raw_parts(ptr.cast(), len * mem::size_of::<i32>())
        });
    }
}
