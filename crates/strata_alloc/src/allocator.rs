//! # Typed Allocators
//!
//! The [`Allocator`] trait is what containers program against. It is typed
//! (an allocator hands out `T`-sized blocks) and rebindable: a container that
//! is configured with an allocator for its element type can retarget it to
//! its internal node type while keeping the same backing store.

// SAFETY: This module defines an unsafe trait and the heap-backed allocator.
// Every unsafe block states the invariant it relies on.
#![allow(unsafe_code)]

use std::alloc::{alloc, dealloc, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::error::{AllocError, AllocResult};

/// A typed, rebindable allocator handle.
///
/// Handles are cheap to clone. Two handles compare equal when memory
/// allocated through one may be released through the other.
///
/// # Safety
///
/// Implementors must return blocks that are valid for reads and writes of
/// `count * size_of::<Self::Value>()` bytes, aligned for `Self::Value`, and
/// that stay valid until passed to [`Allocator::deallocate`] on an equal
/// handle (or, for allocators that never reclaim, until the backing store is
/// dropped). Clones and rebinds must share the backing store.
pub unsafe trait Allocator: Clone + PartialEq {
    /// The element type this handle allocates.
    type Value;

    /// The same allocator retargeted to element type `U`.
    type Rebind<U>: Allocator<Value = U>;

    /// Allocates uninitialized room for `count` values.
    ///
    /// # Errors
    ///
    /// Returns an [`AllocError`] when the backing store cannot satisfy the
    /// request.
    fn allocate(&self, count: usize) -> AllocResult<NonNull<Self::Value>>;

    /// Releases a block obtained from [`Allocator::allocate`].
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate(count)` on a handle equal
    /// to `self`, and must not have been released already.
    unsafe fn deallocate(&self, ptr: NonNull<Self::Value>, count: usize);

    /// Returns a handle for element type `U` on the same backing store.
    fn rebind<U>(&self) -> Self::Rebind<U>;

    /// Allocator a copy-constructed container should use.
    ///
    /// Defaults to sharing this handle.
    #[must_use]
    fn select_on_copy(&self) -> Self {
        self.clone()
    }

    /// Whether copy-assignment hands this allocator over to the target.
    ///
    /// Defaults to `false`: the target keeps its own allocator.
    fn propagates_on_copy(&self) -> bool {
        false
    }
}

/// The general-purpose heap allocator.
///
/// Zero-sized; every instance is equal to every other.
pub struct Global<T>(PhantomData<fn() -> T>);

impl<T> Global<T> {
    /// Creates a heap allocator handle.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Global<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Global<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Global<T> {}

impl<T, U> PartialEq<Global<U>> for Global<T> {
    #[inline]
    fn eq(&self, _other: &Global<U>) -> bool {
        true
    }
}

impl<T> Eq for Global<T> {}

impl<T> fmt::Debug for Global<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Global")
    }
}

/// Layout for `count` values of `T`, mapped onto this crate's error type.
pub(crate) fn array_layout<T>(count: usize) -> AllocResult<Layout> {
    Layout::array::<T>(count).map_err(|_| AllocError::SizeOverflow {
        count,
        elem_size: std::mem::size_of::<T>(),
    })
}

// SAFETY: blocks come from `std::alloc::alloc` with the exact layout used to
// free them, or are dangling-but-aligned for zero-sized requests.
unsafe impl<T> Allocator for Global<T> {
    type Value = T;
    type Rebind<U> = Global<U>;

    fn allocate(&self, count: usize) -> AllocResult<NonNull<T>> {
        let layout = array_layout::<T>(count)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        // SAFETY: layout has a non-zero size.
        let raw = unsafe { alloc(layout) };
        NonNull::new(raw.cast::<T>()).ok_or(AllocError::OutOfMemory {
            size: layout.size(),
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize) {
        let Ok(layout) = array_layout::<T>(count) else {
            return;
        };
        if layout.size() == 0 {
            return;
        }
        // SAFETY: the caller guarantees `ptr` came from `allocate(count)`,
        // which used this same layout.
        unsafe { dealloc(ptr.as_ptr().cast::<u8>(), layout) };
    }

    #[inline]
    fn rebind<U>(&self) -> Global<U> {
        Global::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_round_trip() {
        let heap: Global<u64> = Global::new();
        let block = heap.allocate(4).unwrap();

        unsafe {
            for i in 0..4 {
                block.as_ptr().add(i).write(i as u64 * 10);
            }
            for i in 0..4 {
                assert_eq!(*block.as_ptr().add(i), i as u64 * 10);
            }
            heap.deallocate(block, 4);
        }
    }

    #[test]
    fn test_global_zero_sized_request_is_dangling() {
        let heap: Global<u32> = Global::new();
        let block = heap.allocate(0).unwrap();
        assert_eq!(block, NonNull::dangling());
        unsafe { heap.deallocate(block, 0) };
    }

    #[test]
    fn test_global_overflow_is_reported() {
        let heap: Global<u64> = Global::new();
        let err = heap.allocate(usize::MAX).unwrap_err();
        assert!(matches!(err, AllocError::SizeOverflow { elem_size: 8, .. }));
    }

    #[test]
    fn test_global_handles_are_interchangeable() {
        let ints: Global<i32> = Global::new();
        let strings = ints.rebind::<String>();
        assert!(ints == strings);
        assert!(!ints.propagates_on_copy());
    }
}
