//! # Arena Allocator
//!
//! A fixed-capacity bump allocator whose bytes live inside the [`Arena`]
//! value itself, plus the typed [`ArenaAllocator`] handle that containers
//! hold on to.

// SAFETY: This module hands out raw pointers into the arena buffer.
// All unsafe blocks are bounds-checked against the cursor invariant.
#![allow(unsafe_code)]

use std::cell::{Cell, UnsafeCell};
use std::fmt;
use std::marker::PhantomData;
use std::mem::{self, MaybeUninit};
use std::ptr::NonNull;

use crate::allocator::Allocator;
use crate::error::{AllocError, AllocResult};

/// Alignment of every block handed out by an [`Arena`].
///
/// Matches the strictest fundamental alignment on mainstream 64-bit targets.
pub const MAX_ALIGN: usize = 16;

/// Raw arena bytes. The `align` literal must stay equal to [`MAX_ALIGN`].
#[repr(C, align(16))]
struct Storage<const N: usize>([MaybeUninit<u8>; N]);

const _: () = assert!(mem::align_of::<Storage<0>>() == MAX_ALIGN);

/// Rounds `bytes` up to the next multiple of [`MAX_ALIGN`].
#[inline]
const fn align_up(bytes: usize) -> Option<usize> {
    match bytes.checked_add(MAX_ALIGN - 1) {
        Some(padded) => Some(padded & !(MAX_ALIGN - 1)),
        None => None,
    }
}

/// A bump-pointer arena over `N` bytes of embedded storage.
///
/// Allocation rounds the request up to [`MAX_ALIGN`] and moves the cursor
/// forward. Nothing is ever given back: [`Arena::deallocate`] does nothing and
/// the memory returns to the caller only when the arena itself is dropped.
///
/// The arena is neither `Clone` nor `Sync`. Allocators borrow it, so the
/// borrow checker keeps it in place (and alive) while any of them exist.
///
/// # Example
///
/// ```rust
/// use strata_alloc::Arena;
///
/// let arena: Arena<64> = Arena::new();
/// let first = arena.allocate(3).unwrap();
/// let second = arena.allocate(20).unwrap();
///
/// assert_eq!(second.as_ptr() as usize - first.as_ptr() as usize, 16);
/// assert_eq!(arena.used(), 48);
/// assert!(arena.allocate(32).is_err());
/// ```
pub struct Arena<const N: usize> {
    /// Backing bytes.
    storage: UnsafeCell<Storage<N>>,
    /// Offset of the next free byte. Only ever grows.
    cursor: Cell<usize>,
}

impl<const N: usize> Arena<N> {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            storage: UnsafeCell::new(Storage([MaybeUninit::uninit(); N])),
            cursor: Cell::new(0),
        }
    }

    /// Returns the total capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns the bytes consumed so far, alignment padding included.
    #[inline]
    #[must_use]
    pub fn used(&self) -> usize {
        self.cursor.get()
    }

    /// Returns the bytes still available.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        N - self.cursor.get()
    }

    /// Whether `ptr` points into this arena's storage.
    #[must_use]
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        let base = self.base() as usize;
        let addr = ptr.as_ptr() as usize;
        addr >= base && addr < base + N
    }

    #[inline]
    fn base(&self) -> *mut u8 {
        self.storage.get().cast::<u8>()
    }

    /// Bumps the cursor by `bytes` rounded up to [`MAX_ALIGN`].
    ///
    /// Returns the start of the block, which is always `MAX_ALIGN`-aligned.
    /// A zero-byte request returns the current cursor without moving it.
    ///
    /// # Errors
    ///
    /// - [`AllocError::SizeOverflow`] if rounding overflows `usize`
    /// - [`AllocError::CapacityExceeded`] if the rounded block does not fit;
    ///   the cursor is left where it was
    pub fn allocate(&self, bytes: usize) -> AllocResult<NonNull<u8>> {
        let rounded = align_up(bytes).ok_or(AllocError::SizeOverflow {
            count: bytes,
            elem_size: 1,
        })?;

        let start = self.cursor.get();
        let remaining = N - start;
        if rounded > remaining {
            tracing::warn!(
                requested = rounded,
                remaining,
                capacity = N,
                "arena exhausted"
            );
            return Err(AllocError::CapacityExceeded {
                requested: rounded,
                remaining,
                capacity: N,
            });
        }

        self.cursor.set(start + rounded);
        tracing::trace!(offset = start, bytes, rounded, "arena bump");

        // SAFETY: `start <= N`, so the offset stays within the storage
        // allocation (or one past its end for a zero-byte request at the
        // very end). The base pointer is derived from a live `UnsafeCell`
        // and is therefore non-null.
        Ok(unsafe { NonNull::new_unchecked(self.base().add(start)) })
    }

    /// Releases a block. Always a no-op; memory is reclaimed only when the
    /// arena is dropped.
    #[inline]
    pub fn deallocate(&self, ptr: NonNull<u8>, bytes: usize) {
        debug_assert!(
            bytes == 0 || self.contains(ptr),
            "pointer does not belong to this arena"
        );
    }
}

impl<const N: usize> Default for Arena<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for Arena<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &N)
            .field("used", &self.used())
            .finish()
    }
}

/// Typed allocator handle that draws from a borrowed [`Arena`].
///
/// Copying the handle copies the arena reference, never the arena. Handles
/// compare equal iff they point at the same arena, whatever their element
/// types. [`Allocator::rebind`] keeps the arena and the propagation flag.
///
/// # Example
///
/// ```rust
/// use strata_alloc::{Allocator, Arena, ArenaAllocator};
///
/// let a: Arena<256> = Arena::new();
/// let b: Arena<256> = Arena::new();
///
/// let on_a: ArenaAllocator<'_, u64, 256> = ArenaAllocator::new(&a);
/// let also_on_a = on_a.rebind::<[u8; 3]>();
/// let on_b: ArenaAllocator<'_, u64, 256> = ArenaAllocator::new(&b);
///
/// assert!(on_a == also_on_a);
/// assert!(on_a != on_b);
/// ```
pub struct ArenaAllocator<'a, T, const N: usize> {
    /// The arena blocks come from.
    arena: &'a Arena<N>,
    /// Whether copy-assignment hands this allocator to the target container.
    propagate: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T, const N: usize> ArenaAllocator<'a, T, N> {
    /// Creates a handle on `arena`. Copy-assignment does not propagate it.
    #[inline]
    #[must_use]
    pub const fn new(arena: &'a Arena<N>) -> Self {
        Self {
            arena,
            propagate: false,
            _marker: PhantomData,
        }
    }

    /// Makes copy-assignment hand this allocator over to the target.
    #[inline]
    #[must_use]
    pub const fn propagating(mut self) -> Self {
        self.propagate = true;
        self
    }

    /// Returns the arena this handle draws from.
    #[inline]
    #[must_use]
    pub const fn arena(&self) -> &'a Arena<N> {
        self.arena
    }
}

impl<'a, T, const N: usize> From<&'a Arena<N>> for ArenaAllocator<'a, T, N> {
    fn from(arena: &'a Arena<N>) -> Self {
        Self::new(arena)
    }
}

impl<T, const N: usize> Clone for ArenaAllocator<'_, T, N> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, const N: usize> Copy for ArenaAllocator<'_, T, N> {}

impl<'a, T, U, const N: usize> PartialEq<ArenaAllocator<'a, U, N>> for ArenaAllocator<'a, T, N> {
    #[inline]
    fn eq(&self, other: &ArenaAllocator<'a, U, N>) -> bool {
        std::ptr::eq(self.arena, other.arena)
    }
}

impl<T, const N: usize> Eq for ArenaAllocator<'_, T, N> {}

impl<T, const N: usize> fmt::Debug for ArenaAllocator<'_, T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaAllocator")
            .field("arena", &(self.arena as *const Arena<N>))
            .field("propagate", &self.propagate)
            .finish()
    }
}

// SAFETY: blocks are carved out of the arena, are MAX_ALIGN-aligned (and the
// element alignment is checked against that), and stay valid for as long as
// the `'a` borrow of the arena, which outlives every handle.
unsafe impl<'a, T, const N: usize> Allocator for ArenaAllocator<'a, T, N> {
    type Value = T;
    type Rebind<U> = ArenaAllocator<'a, U, N>;

    fn allocate(&self, count: usize) -> AllocResult<NonNull<T>> {
        let align = mem::align_of::<T>();
        if align > MAX_ALIGN {
            return Err(AllocError::UnsupportedAlignment {
                align,
                max_align: MAX_ALIGN,
            });
        }
        let elem_size = mem::size_of::<T>();
        let bytes = count
            .checked_mul(elem_size)
            .ok_or(AllocError::SizeOverflow { count, elem_size })?;
        self.arena.allocate(bytes).map(NonNull::cast)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize) {
        self.arena
            .deallocate(ptr.cast(), count.saturating_mul(mem::size_of::<T>()));
    }

    #[inline]
    fn rebind<U>(&self) -> ArenaAllocator<'a, U, N> {
        ArenaAllocator {
            arena: self.arena,
            propagate: self.propagate,
            _marker: PhantomData,
        }
    }

    #[inline]
    fn propagates_on_copy(&self) -> bool {
        self.propagate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0), Some(0));
        for bytes in 1..=16 {
            assert_eq!(align_up(bytes), Some(16));
        }
        assert_eq!(align_up(17), Some(32));
        assert_eq!(align_up(usize::MAX), None);
    }

    #[test]
    fn test_arena_blocks_are_aligned_and_disjoint() {
        let arena: Arena<256> = Arena::new();

        let a = arena.allocate(1).unwrap();
        let b = arena.allocate(17).unwrap();
        let c = arena.allocate(16).unwrap();

        for block in [a, b, c] {
            assert_eq!(block.as_ptr() as usize % MAX_ALIGN, 0);
            assert!(arena.contains(block));
        }
        assert_eq!(b.as_ptr() as usize - a.as_ptr() as usize, 16);
        assert_eq!(c.as_ptr() as usize - b.as_ptr() as usize, 32);
        assert_eq!(arena.used(), 64);
        assert_eq!(arena.remaining(), 192);
    }

    #[test]
    fn test_arena_exhaustion_leaves_cursor_alone() {
        let arena: Arena<64> = Arena::new();
        arena.allocate(40).unwrap();

        let err = arena.allocate(32).unwrap_err();
        assert_eq!(
            err,
            AllocError::CapacityExceeded {
                requested: 32,
                remaining: 16,
                capacity: 64,
            }
        );
        assert_eq!(arena.used(), 48);

        // The tail still fits an exact request.
        arena.allocate(16).unwrap();
        assert_eq!(arena.remaining(), 0);
    }

    #[test]
    fn test_deallocate_never_reclaims() {
        let arena: Arena<64> = Arena::new();
        let block = arena.allocate(8).unwrap();
        arena.deallocate(block, 8);
        assert_eq!(arena.used(), 16);

        let next = arena.allocate(8).unwrap();
        assert_ne!(block, next);
    }

    #[test]
    fn test_zero_byte_request_does_not_move_cursor() {
        let arena: Arena<32> = Arena::new();
        let first = arena.allocate(0).unwrap();
        let second = arena.allocate(4).unwrap();
        assert_eq!(first, second);
        assert_eq!(arena.used(), 16);
    }

    #[test]
    fn test_allocator_equality_is_arena_identity() {
        let a: Arena<128> = Arena::new();
        let b: Arena<128> = Arena::new();

        let ints: ArenaAllocator<'_, i32, 128> = ArenaAllocator::new(&a);
        let bytes: ArenaAllocator<'_, u8, 128> = ints.rebind();
        let other: ArenaAllocator<'_, i32, 128> = ArenaAllocator::new(&b);

        assert!(ints == bytes);
        assert!(bytes == ints);
        assert!(ints != other);
        assert!(ints == ints.propagating());
    }

    #[test]
    fn test_allocator_sizes_requests_by_element() {
        let arena: Arena<256> = Arena::new();
        let words: ArenaAllocator<'_, u64, 256> = ArenaAllocator::new(&arena);

        let block = words.allocate(3).unwrap();
        assert_eq!(arena.used(), 32);

        unsafe {
            block.as_ptr().write(7);
            block.as_ptr().add(2).write(9);
            assert_eq!(*block.as_ptr(), 7);
            assert_eq!(*block.as_ptr().add(2), 9);
            words.deallocate(block, 3);
        }
        assert_eq!(arena.used(), 32);
    }

    #[test]
    fn test_rebind_keeps_propagation_flag() {
        let arena: Arena<64> = Arena::new();
        let plain: ArenaAllocator<'_, u8, 64> = ArenaAllocator::new(&arena);
        assert!(!plain.propagates_on_copy());
        assert!(!plain.select_on_copy().propagates_on_copy());

        let sticky = plain.propagating().rebind::<u16>();
        assert!(sticky.propagates_on_copy());
    }

    #[test]
    fn test_overaligned_types_are_rejected() {
        #[allow(dead_code)]
        #[repr(align(32))]
        struct Wide;

        let arena: Arena<128> = Arena::new();
        let wide: ArenaAllocator<'_, Wide, 128> = ArenaAllocator::new(&arena);
        assert_eq!(
            wide.allocate(1).unwrap_err(),
            AllocError::UnsupportedAlignment {
                align: 32,
                max_align: MAX_ALIGN,
            }
        );
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn test_element_count_overflow_is_reported() {
        let arena: Arena<64> = Arena::new();
        let words: ArenaAllocator<'_, u64, 64> = ArenaAllocator::new(&arena);
        assert!(matches!(
            words.allocate(usize::MAX / 4),
            Err(AllocError::SizeOverflow { .. })
        ));
    }
}
