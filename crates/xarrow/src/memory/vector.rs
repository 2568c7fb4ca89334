//! Growable aligned vector.
//!
//! [`AlignedVector`] is the storage behind every column: a `Vec`-like
//! sequence whose data pointer is always aligned to `ALIGN`, so its backing
//! allocation can be handed across the Arrow C Data Interface as-is.
//!
//! # Growth
//!
//! When an insertion needs more room the new capacity is
//! `max(required, capacity + capacity / 2, MIN_GROWTH_CAPACITY)`. The new
//! backing array is allocated and filled before the old one is released, so a
//! failed allocation leaves the vector untouched.

use std::alloc;
use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};

use tracing::trace;

use super::aligned::{layout_for, AlignedArray};
use crate::constants::{DEFAULT_ALIGNMENT, MIN_GROWTH_CAPACITY};
use crate::error::{XArrowError, XArrowResult};
use crate::types::NativeType;

/// Raw ownership of a vector's backing storage.
///
/// Produced by [`AlignedVector::into_raw_parts`]. The allocation spans
/// `capacity * size_of::<T>()` bytes rounded up to the vector's alignment;
/// the first `len` elements hold the vector's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawParts<T> {
    /// Pointer to the first element, null when `capacity == 0`.
    pub ptr: *mut T,
    /// Number of initialized elements.
    pub len: usize,
    /// Number of elements the allocation can hold.
    pub capacity: usize,
}

impl<T> RawParts<T> {
    /// Size of the allocation before alignment rounding.
    #[must_use]
    pub fn byte_capacity(&self) -> usize {
        self.capacity * mem::size_of::<T>()
    }
}

/// A growable vector of fixed-width primitives with an aligned data pointer.
///
/// # Example
///
/// ```rust
/// use xarrow::memory::AlignedVector;
///
/// let mut vec = AlignedVector::<i32, 64>::new();
/// vec.push(1)?;
/// vec.push(2)?;
/// vec.extend_from_slice(&[3, 4])?;
///
/// assert_eq!(vec.as_slice(), &[1, 2, 3, 4]);
/// assert_eq!(vec.as_ptr() as usize % 64, 0);
/// # Ok::<(), xarrow::XArrowError>(())
/// ```
pub struct AlignedVector<T: NativeType, const ALIGN: usize = DEFAULT_ALIGNMENT> {
    len: usize,
    backing: AlignedArray<T, ALIGN>,
}

impl<T: NativeType, const ALIGN: usize> AlignedVector<T, ALIGN> {
    /// Creates an empty vector. Does not allocate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            len: 0,
            backing: AlignedArray::empty(),
        }
    }

    /// Creates an empty vector able to hold `capacity` elements.
    pub fn with_capacity(capacity: usize) -> XArrowResult<Self> {
        Ok(Self {
            len: 0,
            backing: AlignedArray::new(capacity)?,
        })
    }

    /// Creates a vector of `count` copies of `value`.
    pub fn from_elem(count: usize, value: T) -> XArrowResult<Self> {
        let mut vec = Self::new();
        vec.resize(count, value)?;
        Ok(vec)
    }

    /// Creates a vector holding a copy of `values`, with capacity equal to
    /// its length.
    pub fn from_slice(values: &[T]) -> XArrowResult<Self> {
        Ok(Self {
            len: values.len(),
            backing: AlignedArray::from_slice(values)?,
        })
    }

    // =========================================================================
    // Capacity
    // =========================================================================

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the vector holds no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of elements the backing store can hold.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.backing.len()
    }

    /// Returns the alignment of the data pointer.
    #[inline]
    #[must_use]
    pub const fn alignment(&self) -> usize {
        ALIGN
    }

    /// Grows the capacity to at least `capacity`. Never shrinks.
    pub fn reserve(&mut self, capacity: usize) -> XArrowResult<()> {
        if capacity > self.capacity() {
            self.reallocate(capacity)?;
        }
        Ok(())
    }

    /// Reallocates the backing store to exactly `len()` elements.
    pub fn shrink_to_fit(&mut self) -> XArrowResult<()> {
        if self.len < self.capacity() {
            self.reallocate(self.len)?;
        }
        Ok(())
    }

    /// Replaces the backing store with one of exactly `capacity` elements.
    ///
    /// The first `min(len, capacity)` elements are copied over and the length
    /// is truncated to `capacity`. `reallocate(0)` frees the storage and
    /// leaves the vector with zero length and zero capacity.
    pub fn reallocate(&mut self, capacity: usize) -> XArrowResult<()> {
        if capacity == 0 {
            self.len = 0;
            self.backing = AlignedArray::empty();
            return Ok(());
        }

        let keep = self.len.min(capacity);
        let mut backing = AlignedArray::<T, ALIGN>::new(capacity)?;
        backing[..keep].copy_from_slice(&self.backing[..keep]);

        trace!(
            from = self.capacity(),
            to = capacity,
            len = keep,
            "reallocated aligned vector"
        );

        self.backing = backing;
        self.len = keep;
        Ok(())
    }

    fn ensure_capacity(&mut self, required: usize) -> XArrowResult<()> {
        let capacity = self.capacity();
        if required > capacity {
            let grown = capacity.saturating_add(capacity / 2);
            let new_capacity = required.max(grown).max(MIN_GROWTH_CAPACITY);
            self.reallocate(new_capacity)?;
        }
        Ok(())
    }

    fn required(&self, additional: usize) -> XArrowResult<usize> {
        self.len
            .checked_add(additional)
            .ok_or(XArrowError::CapacityOverflow {
                requested: usize::MAX,
            })
    }

    // =========================================================================
    // Modifiers
    // =========================================================================

    /// Appends an element.
    pub fn push(&mut self, value: T) -> XArrowResult<()> {
        self.emplace_with(|| value).map(|_| ())
    }

    /// Appends the element produced by `f` and returns a reference to it.
    ///
    /// `f` is only called once room has been made.
    pub fn emplace_with<F>(&mut self, f: F) -> XArrowResult<&mut T>
    where
        F: FnOnce() -> T,
    {
        let required = self.required(1)?;
        self.ensure_capacity(required)?;
        let slot = &mut self.backing[self.len];
        *slot = f();
        self.len = required;
        Ok(slot)
    }

    /// Appends all elements of `values`.
    pub fn extend_from_slice(&mut self, values: &[T]) -> XArrowResult<()> {
        let required = self.required(values.len())?;
        self.ensure_capacity(required)?;
        self.backing[self.len..required].copy_from_slice(values);
        self.len = required;
        Ok(())
    }

    /// Removes the last element and returns it, or `None` if empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.backing[self.len])
    }

    /// Sets the length to zero. The storage is kept.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Resizes to `len` elements, filling new slots with `value`.
    ///
    /// Shrinking only changes the length: the elements past the new end are
    /// left in place and remain visible through [`spare_capacity`].
    ///
    /// [`spare_capacity`]: AlignedVector::spare_capacity
    pub fn resize(&mut self, len: usize, value: T) -> XArrowResult<()> {
        if len > self.len {
            self.ensure_capacity(len)?;
            self.backing[self.len..len].fill(value);
        }
        self.len = len;
        Ok(())
    }

    /// Resizes to `len` elements, filling new slots with `T::default()`.
    pub fn resize_default(&mut self, len: usize) -> XArrowResult<()> {
        self.resize(len, T::default())
    }

    /// Replaces the contents with `count` copies of `value`.
    pub fn assign(&mut self, count: usize, value: T) -> XArrowResult<()> {
        self.clear();
        self.reserve(count)?;
        self.backing[..count].fill(value);
        self.len = count;
        Ok(())
    }

    /// Swaps contents with `other` without copying elements.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Moves the contents out, leaving an empty vector with no storage.
    #[inline]
    #[must_use]
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Gives up ownership of the backing storage without freeing it.
    ///
    /// This is the hand-off point into the Arrow release protocol: the
    /// returned allocation must eventually be freed through the same
    /// alignment it was allocated with.
    #[must_use = "the returned allocation leaks unless it is released"]
    pub fn into_raw_parts(self) -> RawParts<T> {
        let len = self.len;
        let (ptr, capacity) = self.backing.into_raw_parts();
        RawParts { ptr, len, capacity }
    }

    // =========================================================================
    // Element access
    // =========================================================================

    /// Returns the initialized elements.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.backing[..self.len]
    }

    /// Returns the initialized elements mutably.
    #[inline]
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len;
        &mut self.backing[..len]
    }

    /// Returns the slots between `len()` and `capacity()`.
    ///
    /// They hold zeroes or whatever a previous shrinking `resize`, `pop` or
    /// `clear` left behind.
    #[inline]
    #[must_use]
    pub fn spare_capacity(&self) -> &[T] {
        &self.backing[self.len..]
    }

    /// Returns the data pointer, null when the capacity is zero.
    #[inline]
    #[must_use]
    pub fn as_ptr(&self) -> *const T {
        self.backing.as_ptr()
    }

    /// Returns the mutable data pointer, null when the capacity is zero.
    #[inline]
    #[must_use]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.backing.as_mut_ptr()
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
        self.backing.get_unchecked(index)
    }

    /// Allocates a copy holding exactly `len()` elements.
    ///
    /// Spare capacity is not copied; the copy's capacity equals its length.
    pub fn try_clone(&self) -> XArrowResult<Self> {
        Self::from_slice(self.as_slice())
    }
}

impl<T: NativeType, const ALIGN: usize> Default for AlignedVector<T, ALIGN> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NativeType, const ALIGN: usize> Clone for AlignedVector<T, ALIGN> {
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(copy) => copy,
            Err(_) => alloc::handle_alloc_error(layout_for::<T, ALIGN>(self.len)),
        }
    }
}

impl<T: NativeType, const ALIGN: usize> Deref for AlignedVector<T, ALIGN> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T: NativeType, const ALIGN: usize> DerefMut for AlignedVector<T, ALIGN> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T: NativeType, const ALIGN: usize> PartialEq for AlignedVector<T, ALIGN> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: NativeType, const ALIGN: usize> PartialOrd for AlignedVector<T, ALIGN> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<'a, T: NativeType, const ALIGN: usize> IntoIterator for &'a AlignedVector<T, ALIGN> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<T: NativeType, const ALIGN: usize> fmt::Debug for AlignedVector<T, ALIGN> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedVector")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("alignment", &ALIGN)
            .field("values", &self.as_slice())
            .finish()
    }
}
