//! Exactly-once release of received interchange structs.
//!
//! A consumer that receives an `ArrowSchema` or `ArrowArray` owns its
//! release callback. [`ReleaseManager`] holds the struct and fires that
//! callback exactly once: when the manager is dropped, when it is overwritten,
//! or when [`ReleaseManager::release`] is called, whichever comes first.
//!
//! # State machine
//!
//! ```text
//!   new(raw) ──(release != None)──▶ Armed ──drop / release / take──▶ Disarmed
//!            └─(release == None)──▶ Disarmed
//! ```
//!
//! `take` moves the armed state into the returned manager, so along any
//! chain of moves only one manager is ever armed.

use std::fmt;
use std::mem;

use tracing::debug;

use super::abi::{ArrowArray, ArrowSchema};

/// An interchange struct carrying its own release callback.
pub trait Releasable: Sized {
    /// Name used in logs and errors.
    const KIND: &'static str;

    /// Returns a released, all-null value.
    fn released() -> Self;

    /// Returns true if the struct still carries a release callback.
    fn has_release(&self) -> bool;

    /// Invokes the release callback, if any, and clears it.
    ///
    /// # Safety
    ///
    /// The callback and the pointers it frees must be valid, and no other
    /// copy of this struct may be released afterwards.
    unsafe fn invoke_release(&mut self);

    /// Clears the release callback without invoking it.
    fn clear_release(&mut self);
}

impl Releasable for ArrowSchema {
    const KIND: &'static str = "schema";

    fn released() -> Self {
        Self::empty()
    }

    fn has_release(&self) -> bool {
        self.release.is_some()
    }

    unsafe fn invoke_release(&mut self) {
        if let Some(release) = self.release {
            release(self);
        }
        self.release = None;
    }

    fn clear_release(&mut self) {
        self.release = None;
    }
}

impl Releasable for ArrowArray {
    const KIND: &'static str = "array";

    fn released() -> Self {
        Self::empty()
    }

    fn has_release(&self) -> bool {
        self.release.is_some()
    }

    unsafe fn invoke_release(&mut self) {
        if let Some(release) = self.release {
            release(self);
        }
        self.release = None;
    }

    fn clear_release(&mut self) {
        self.release = None;
    }
}

/// Whether a manager still owes a release call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Holds a struct whose callback has not fired.
    Armed,
    /// Nothing left to release.
    Disarmed,
}

/// Owner of one received interchange struct.
///
/// # Example
///
/// ```rust
/// use xarrow::column::PrimitiveColumn;
/// use xarrow::ffi::{ArrowArray, ReleaseManager};
///
/// let mut column = PrimitiveColumn::<i32>::new("x")?;
/// column.data_mut().extend_from_slice(&[1, 2, 3])?;
///
/// // SAFETY: the array was produced by a conforming exporter
/// let guard = unsafe { ReleaseManager::new(column.export_array()?) };
/// assert!(guard.is_armed());
/// drop(guard); // release fires here, exactly once
/// # Ok::<(), xarrow::XArrowError>(())
/// ```
pub struct ReleaseManager<T: Releasable> {
    raw: T,
    state: GuardState,
}

impl<T: Releasable> ReleaseManager<T> {
    /// Takes ownership of `raw`.
    ///
    /// The manager is armed if `raw` carries a release callback.
    ///
    /// # Safety
    ///
    /// `raw` must have been produced by a conforming exporter and must not be
    /// released through any other copy.
    #[must_use]
    pub unsafe fn new(raw: T) -> Self {
        let state = if raw.has_release() {
            GuardState::Armed
        } else {
            GuardState::Disarmed
        };
        Self { raw, state }
    }

    /// Returns a manager that holds a released struct.
    #[must_use]
    pub fn disarmed() -> Self {
        Self {
            raw: T::released(),
            state: GuardState::Disarmed,
        }
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Returns true if the release callback is still owed.
    #[inline]
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.state == GuardState::Armed
    }

    /// Returns the managed struct.
    #[inline]
    #[must_use]
    pub fn get(&self) -> &T {
        &self.raw
    }

    /// Returns a pointer to the managed struct for handing to C code that
    /// reads it in place.
    #[inline]
    #[must_use]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        &mut self.raw
    }

    /// Moves the struct and its armed state into a new manager, leaving this
    /// one disarmed.
    #[must_use]
    pub fn take(&mut self) -> Self {
        let raw = mem::replace(&mut self.raw, T::released());
        let state = mem::replace(&mut self.state, GuardState::Disarmed);
        Self { raw, state }
    }

    /// Replaces the managed struct, releasing the current one first.
    pub fn replace(&mut self, other: Self) {
        *self = other;
    }

    /// Hands the struct onward without releasing it.
    ///
    /// The receiver becomes responsible for calling its release callback.
    #[must_use = "dropping the returned struct leaks it"]
    pub fn into_raw(mut self) -> T {
        self.state = GuardState::Disarmed;
        mem::replace(&mut self.raw, T::released())
    }

    /// Fires the release callback now. Does nothing when disarmed.
    pub fn release(&mut self) {
        if self.state == GuardState::Armed {
            debug!(kind = T::KIND, "releasing imported struct");
            // SAFETY: armed means this manager is the only owner of the
            // callback and it has not fired yet
            unsafe { self.raw.invoke_release() };
        }
        self.raw.clear_release();
        self.state = GuardState::Disarmed;
    }
}

impl<T: Releasable> Default for ReleaseManager<T> {
    fn default() -> Self {
        Self::disarmed()
    }
}

impl<T: Releasable> Drop for ReleaseManager<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: Releasable + fmt::Debug> fmt::Debug for ReleaseManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseManager")
            .field("state", &self.state)
            .field("raw", &self.raw)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    thread_local! {
        static FIRED: Cell<usize> = const { Cell::new(0) };
    }

    unsafe extern "C" fn counting_release(array: *mut ArrowArray) {
        FIRED.with(|f| f.set(f.get() + 1));
        (*array).release = None;
    }

    fn fired() -> usize {
        FIRED.with(Cell::get)
    }

    fn reset() {
        FIRED.with(|f| f.set(0));
    }

    fn armed_array() -> ReleaseManager<ArrowArray> {
        let mut raw = ArrowArray::empty();
        raw.release = Some(counting_release);
        // SAFETY: counting_release frees nothing
        unsafe { ReleaseManager::new(raw) }
    }

    #[test]
    fn test_drop_fires_once() {
        reset();
        let guard = armed_array();
        assert!(guard.is_armed());
        drop(guard);
        assert_eq!(fired(), 1);
    }

    #[test]
    fn test_new_without_callback_is_disarmed() {
        // SAFETY: empty array has nothing to release
        let guard = unsafe { ReleaseManager::new(ArrowArray::empty()) };
        assert_eq!(guard.state(), GuardState::Disarmed);
        assert!(!ReleaseManager::<ArrowSchema>::default().is_armed());
    }

    #[test]
    fn test_move_fires_once() {
        reset();
        let first = armed_array();
        let second = first;
        assert!(second.is_armed());
        drop(second);
        assert_eq!(fired(), 1);
    }

    #[test]
    fn test_take_disarms_source() {
        reset();
        let mut source = armed_array();
        let destination = source.take();

        assert!(!source.is_armed());
        assert!(source.get().is_released());
        assert!(destination.is_armed());

        drop(source);
        assert_eq!(fired(), 0);
        drop(destination);
        assert_eq!(fired(), 1);
    }

    #[test]
    fn test_take_from_disarmed_stays_disarmed() {
        let mut source = ReleaseManager::<ArrowArray>::disarmed();
        let destination = source.take();
        assert!(!destination.is_armed());
    }

    #[test]
    fn test_overwrite_releases_previous() {
        reset();
        let mut target = armed_array();
        target.replace(armed_array());
        assert_eq!(fired(), 1);
        assert!(target.is_armed());

        target = ReleaseManager::disarmed();
        assert_eq!(fired(), 2);
        assert!(!target.is_armed());
    }

    #[test]
    fn test_explicit_release_is_idempotent() {
        reset();
        let mut guard = armed_array();
        guard.release();
        guard.release();
        drop(guard);
        assert_eq!(fired(), 1);
    }

    #[test]
    fn test_into_raw_hands_off() {
        reset();
        let guard = armed_array();
        let mut raw = guard.into_raw();
        assert_eq!(fired(), 0);
        assert!(!raw.is_released());

        // SAFETY: we are the sole owner of raw now
        unsafe { raw.invoke_release() };
        assert_eq!(fired(), 1);
        assert!(raw.is_released());
    }
}
