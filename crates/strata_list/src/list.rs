//! # Doubly-Linked List
//!
//! A circular list anchored on a sentinel that lives inside the [`List`]
//! value. Nodes come from the list's allocator, rebound to the node type.
//!
//! ```text
//!            ┌──────────────────────────────────────────────┐
//!            ▼                                              │
//!   ┌──────────────┐   ┌──────┐   ┌──────┐   ┌──────┐       │
//!   │   sentinel   │──▶│  v0  │──▶│  v1  │──▶│  v2  │───────┘
//!   │ (end, inline)│◀──│      │◀──│      │◀──│      │
//!   └──────────────┘   └──────┘   └──────┘   └──────┘
//!          ▲   begin = sentinel.next          │
//!          └──────────────────────────────────┘ sentinel.prev
//! ```
//!
//! ## Failure Guarantees
//!
//! - Single insertions: if allocation or construction fails, the list is
//!   unchanged and no memory is held.
//! - Bulk construction: on failure every element built so far is dropped
//!   and its node released before the error (or panic) reaches the caller.
//! - Copy-assignment: copies are appended first; if that fails partway the
//!   appended suffix is removed and the previous allocator restored.

// SAFETY: This module owns the node graph and dereferences node pointers.
// Every `Link::Node` reachable from the sentinel points at a live node this
// list allocated; that is the invariant each unsafe block relies on.
#![allow(unsafe_code)]

use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use strata_alloc::{AllocError, AllocResult, Allocator, Global};

use crate::cursor::{Cursor, CursorMut};
use crate::error::{Failure, TryBuildError};
use crate::iter::{IntoIter, Iter, IterMut};
use crate::node::{Link, Links, Node};

/// An allocator-aware doubly-linked list.
///
/// `A` is configured for the element type; the list rebinds it to its node
/// type for every allocation. With the default [`Global`] allocator nodes
/// come from the heap; with an `ArenaAllocator` they come from the arena.
///
/// # Example
///
/// ```rust
/// use strata_alloc::{Arena, ArenaAllocator};
/// use strata_list::List;
///
/// let arena: Arena<4096> = Arena::new();
/// let mut list = List::new_in(ArenaAllocator::<'_, i32, 4096>::new(&arena));
///
/// list.push_back(1).unwrap();
/// list.push_back(2).unwrap();
/// list.push_front(0).unwrap();
/// assert_eq!(list.iter().copied().collect::<Vec<_>>(), [0, 1, 2]);
///
/// assert_eq!(list.pop_back(), Some(2));
/// assert_eq!(list.len(), 2);
/// ```
pub struct List<T, A: Allocator<Value = T> = Global<T>> {
    /// Number of value-bearing nodes.
    len: usize,
    /// Element allocator; rebound to `Node<T>` on use.
    alloc: A,
    /// Inline sentinel. Never allocated, never holds a value.
    sentinel: Links<T>,
    _owns: PhantomData<Box<Node<T>>>,
}

/// Deallocates a node whose value was never placed.
struct UnplacedNode<'n, N: Allocator> {
    alloc: &'n N,
    ptr: NonNull<N::Value>,
}

impl<N: Allocator> Drop for UnplacedNode<'_, N> {
    fn drop(&mut self) {
        // SAFETY: `ptr` came from `alloc.allocate(1)` and nothing was written
        // into it, so there is no value to drop.
        unsafe { self.alloc.deallocate(self.ptr, 1) };
    }
}

/// Undoes a partial copy-assignment unless committed.
struct AssignRollback<'l, T, A: Allocator<Value = T>> {
    list: &'l mut List<T, A>,
    /// Length before the assignment started.
    original: usize,
    /// The allocator that was replaced by propagation, if any.
    displaced: Option<A>,
    armed: bool,
}

impl<T, A: Allocator<Value = T>> AssignRollback<'_, T, A> {
    fn commit(mut self) -> Option<A> {
        self.armed = false;
        self.displaced.take()
    }
}

impl<T, A: Allocator<Value = T>> Drop for AssignRollback<'_, T, A> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::debug!(
            appended = self.list.len - self.original,
            restores_allocator = self.displaced.is_some(),
            "copy-assignment failed; rolling back"
        );
        while self.list.len > self.original {
            self.list.pop_back();
        }
        if let Some(previous) = self.displaced.take() {
            self.list.alloc = previous;
        }
    }
}

/// Releases the first `remaining` nodes through `alloc`.
///
/// If an element's `Drop` panics, unwinding drops the guard, which keeps
/// releasing the rest of the prefix through the same allocator. The list's
/// own allocator may already be a different handle at that point.
struct PrefixTrim<'l, T, A: Allocator<Value = T>> {
    list: &'l mut List<T, A>,
    alloc: A::Rebind<Node<T>>,
    remaining: usize,
}

impl<T, A: Allocator<Value = T>> PrefixTrim<'_, T, A> {
    fn run(&mut self) {
        while self.remaining > 0 {
            let Link::Node(first) = self.list.sentinel.next else {
                break;
            };
            self.remaining -= 1;
            // SAFETY: `first` is one of the original nodes, all of which were
            // allocated through `alloc`'s backing store.
            drop(unsafe { self.list.unlink_with(first, &self.alloc) });
        }
    }
}

impl<T, A: Allocator<Value = T>> Drop for PrefixTrim<'_, T, A> {
    fn drop(&mut self) {
        if self.remaining > 0 {
            tracing::debug!(
                remaining = self.remaining,
                "element drop panicked; releasing the rest of the prefix"
            );
            self.run();
        }
    }
}

#[cold]
#[track_caller]
pub(crate) fn alloc_failed(err: AllocError) -> ! {
    panic!("list allocation failed: {err}")
}

impl<T> List<T> {
    /// Creates an empty heap-backed list.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::new_in(Global::new())
    }
}

impl<T, A: Allocator<Value = T>> List<T, A> {
    /// Creates an empty list that will allocate through `alloc`.
    ///
    /// Touches no memory; dropping it touches none either.
    #[inline]
    #[must_use]
    pub const fn new_in(alloc: A) -> Self {
        Self {
            len: 0,
            alloc,
            sentinel: Links::empty(),
            _owns: PhantomData,
        }
    }

    /// Creates a list of `len` default values.
    ///
    /// # Errors
    ///
    /// Returns the allocator's error if a node cannot be allocated; every
    /// node built so far is released first.
    pub fn with_len(len: usize) -> AllocResult<Self>
    where
        T: Default,
        A: Default,
    {
        Self::with_len_in(len, A::default())
    }

    /// Creates a list of `len` default values allocated through `alloc`.
    ///
    /// # Errors
    ///
    /// See [`List::with_len`].
    pub fn with_len_in(len: usize, alloc: A) -> AllocResult<Self>
    where
        T: Default,
    {
        let mut list = Self::new_in(alloc);
        for _ in 0..len {
            list.push_back(T::default())?;
        }
        Ok(list)
    }

    /// Creates a list of `len` clones of `value`.
    ///
    /// # Errors
    ///
    /// Returns the allocator's error if a node cannot be allocated; every
    /// node built so far is released first. A panicking `Clone` releases
    /// them the same way while unwinding.
    pub fn from_elem(len: usize, value: &T) -> AllocResult<Self>
    where
        T: Clone,
        A: Default,
    {
        Self::from_elem_in(len, value, A::default())
    }

    /// Creates a list of `len` clones of `value` allocated through `alloc`.
    ///
    /// # Errors
    ///
    /// See [`List::from_elem`].
    pub fn from_elem_in(len: usize, value: &T, alloc: A) -> AllocResult<Self>
    where
        T: Clone,
    {
        let mut list = Self::new_in(alloc);
        for _ in 0..len {
            list.push_back(value.clone())?;
        }
        Ok(list)
    }

    /// Creates a list of `len` elements built by `f(index)`.
    ///
    /// # Errors
    ///
    /// Stops at the first element that cannot be allocated or built and
    /// reports its index. Everything built before it is released.
    pub fn try_from_fn<E, F>(len: usize, f: F) -> Result<Self, TryBuildError<E>>
    where
        A: Default,
        F: FnMut(usize) -> Result<T, E>,
    {
        Self::try_from_fn_in(len, A::default(), f)
    }

    /// Creates a list of `len` elements built by `f(index)`, allocated
    /// through `alloc`.
    ///
    /// Each node is allocated before its element is built; if building fails
    /// the node goes straight back to the allocator.
    ///
    /// # Errors
    ///
    /// See [`List::try_from_fn`].
    pub fn try_from_fn_in<E, F>(len: usize, alloc: A, mut f: F) -> Result<Self, TryBuildError<E>>
    where
        F: FnMut(usize) -> Result<T, E>,
    {
        let mut list = Self::new_in(alloc);
        for index in 0..len {
            if let Err(failure) = list.link_before_with(Link::Sentinel, || f(index)) {
                tracing::debug!(index, built = list.len, "bulk construction failed; releasing");
                return Err(failure.at(index));
            }
        }
        Ok(list)
    }

    /// Copies this list, using the allocator's copy policy
    /// ([`Allocator::select_on_copy`]).
    ///
    /// # Errors
    ///
    /// Returns the allocator's error if a node cannot be allocated.
    pub fn try_clone(&self) -> AllocResult<Self>
    where
        T: Clone,
    {
        let mut copy = Self::new_in(self.alloc.select_on_copy());
        for value in self {
            copy.push_back(value.clone())?;
        }
        Ok(copy)
    }

    /// Replaces the contents with copies of `source`.
    ///
    /// When this list's allocator propagates on copy
    /// ([`Allocator::propagates_on_copy`]) and differs from the source's, the
    /// source's allocator is adopted for the new nodes.
    ///
    /// # Errors
    ///
    /// On allocation failure the list keeps its original elements and its
    /// original allocator. A panicking `Clone` is rolled back the same way.
    pub fn try_clone_from(&mut self, source: &Self) -> AllocResult<()>
    where
        T: Clone,
    {
        let displaced = if self.alloc.propagates_on_copy() && self.alloc != source.alloc {
            tracing::debug!("copy-assignment adopts the source allocator");
            Some(mem::replace(&mut self.alloc, source.alloc.clone()))
        } else {
            None
        };
        self.append_then_trim(source.iter(), displaced)
    }

    /// Replaces the contents with copies of a list that uses another
    /// allocator type. This list keeps its own allocator.
    ///
    /// # Errors
    ///
    /// On allocation failure the list keeps its original elements.
    pub fn try_assign_from<B>(&mut self, source: &List<T, B>) -> AllocResult<()>
    where
        T: Clone,
        B: Allocator<Value = T>,
    {
        self.append_then_trim(source.iter(), None)
    }

    /// Appends copies of `values`, then drops the original prefix.
    ///
    /// The prefix is released through `displaced` when propagation replaced
    /// the allocator that built it.
    fn append_then_trim(&mut self, values: Iter<'_, T>, displaced: Option<A>) -> AllocResult<()>
    where
        T: Clone,
    {
        let original = self.len;
        let rollback = AssignRollback {
            list: &mut *self,
            original,
            displaced,
            armed: true,
        };
        for value in values {
            rollback.list.push_back(value.clone())?;
        }
        let displaced = rollback.commit();

        let prefix_alloc = displaced.as_ref().unwrap_or(&self.alloc).rebind::<Node<T>>();
        let mut trim = PrefixTrim {
            list: &mut *self,
            alloc: prefix_alloc,
            remaining: original,
        };
        trim.run();
        Ok(())
    }

    /// Number of elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the list has no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The element allocator.
    #[inline]
    #[must_use]
    pub const fn allocator(&self) -> &A {
        &self.alloc
    }

    /// First element.
    #[inline]
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.value_at(self.sentinel.next)
    }

    /// First element, mutably.
    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.value_at_mut(self.sentinel.next)
    }

    /// Last element.
    #[inline]
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.value_at(self.sentinel.prev)
    }

    /// Last element, mutably.
    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.value_at_mut(self.sentinel.prev)
    }

    /// Inserts `value` before the first element.
    ///
    /// # Errors
    ///
    /// Returns the allocator's error; the list is unchanged.
    pub fn push_front(&mut self, value: T) -> AllocResult<()> {
        self.link_before(self.sentinel.next, value).map(drop)
    }

    /// Inserts `value` after the last element.
    ///
    /// # Errors
    ///
    /// Returns the allocator's error; the list is unchanged.
    pub fn push_back(&mut self, value: T) -> AllocResult<()> {
        self.link_before(Link::Sentinel, value).map(drop)
    }

    /// Removes and returns the first element, or `None` if empty.
    pub fn pop_front(&mut self) -> Option<T> {
        match self.sentinel.next {
            Link::Sentinel => None,
            Link::Node(node) => Some(self.unlink(node)),
        }
    }

    /// Removes and returns the last element, or `None` if empty.
    pub fn pop_back(&mut self) -> Option<T> {
        match self.sentinel.prev {
            Link::Sentinel => None,
            Link::Node(node) => Some(self.unlink(node)),
        }
    }

    /// Drops every element and releases every node.
    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    /// Read-only cursor at the first element (`end` if empty).
    #[must_use]
    pub fn cursor_front(&self) -> Cursor<'_, T, A> {
        Cursor::new(self, self.sentinel.next)
    }

    /// Read-only cursor at the last element (`end` if empty).
    #[must_use]
    pub fn cursor_back(&self) -> Cursor<'_, T, A> {
        Cursor::new(self, self.sentinel.prev)
    }

    /// Read-only cursor at `end`, the position after the last element.
    #[must_use]
    pub fn cursor_end(&self) -> Cursor<'_, T, A> {
        Cursor::new(self, Link::Sentinel)
    }

    /// Mutable cursor at the first element (`end` if empty).
    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, T, A> {
        let at = self.sentinel.next;
        CursorMut::new(self, at)
    }

    /// Mutable cursor at the last element (`end` if empty).
    pub fn cursor_back_mut(&mut self) -> CursorMut<'_, T, A> {
        let at = self.sentinel.prev;
        CursorMut::new(self, at)
    }

    /// Mutable cursor at `end`. Inserting here appends.
    pub fn cursor_end_mut(&mut self) -> CursorMut<'_, T, A> {
        CursorMut::new(self, Link::Sentinel)
    }

    /// Iterates front to back; `.rev()` goes back to front.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.sentinel.next, self.sentinel.prev, self.len)
    }

    /// Iterates front to back with mutable access.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self.sentinel.next, self.sentinel.prev, self.len)
    }

    // ------------------------------------------------------------------------
    // Node graph
    // ------------------------------------------------------------------------

    #[inline]
    pub(crate) fn links(&self, link: Link<T>) -> &Links<T> {
        match link {
            Link::Sentinel => &self.sentinel,
            // SAFETY: node links reachable from this list point at live nodes.
            Link::Node(node) => unsafe { &(*node.as_ptr()).links },
        }
    }

    #[inline]
    fn links_mut(&mut self, link: Link<T>) -> &mut Links<T> {
        match link {
            Link::Sentinel => &mut self.sentinel,
            // SAFETY: as above; `&mut self` gives exclusive access to nodes.
            Link::Node(node) => unsafe { &mut (*node.as_ptr()).links },
        }
    }

    #[inline]
    pub(crate) fn value_at(&self, link: Link<T>) -> Option<&T> {
        match link {
            Link::Sentinel => None,
            // SAFETY: live node owned by this list.
            Link::Node(node) => Some(unsafe { &(*node.as_ptr()).value }),
        }
    }

    #[inline]
    pub(crate) fn value_at_mut(&mut self, link: Link<T>) -> Option<&mut T> {
        match link {
            Link::Sentinel => None,
            // SAFETY: live node owned by this list, exclusively borrowed.
            Link::Node(node) => Some(unsafe { &mut (*node.as_ptr()).value }),
        }
    }

    #[inline]
    fn node_alloc(&self) -> A::Rebind<Node<T>> {
        self.alloc.rebind::<Node<T>>()
    }

    /// Splices `value` in before `at`.
    pub(crate) fn link_before(&mut self, at: Link<T>, value: T) -> AllocResult<NonNull<Node<T>>> {
        self.link_before_with(at, || Ok::<T, Infallible>(value))
            .map_err(|failure| match failure {
                Failure::Alloc(err) => err,
                Failure::Element(never) => match never {},
            })
    }

    /// Allocates a node, builds its value with `make`, then splices it in
    /// before `at`.
    ///
    /// The list is only touched once the value exists: an allocation error,
    /// an `Err` from `make` or a panic in `make` leaves it unchanged and
    /// returns the node to the allocator.
    pub(crate) fn link_before_with<E>(
        &mut self,
        at: Link<T>,
        make: impl FnOnce() -> Result<T, E>,
    ) -> Result<NonNull<Node<T>>, Failure<E>> {
        let node_alloc = self.node_alloc();
        let ptr = node_alloc.allocate(1).map_err(Failure::Alloc)?;
        let unplaced = UnplacedNode {
            alloc: &node_alloc,
            ptr,
        };
        let value = make().map_err(Failure::Element)?;
        mem::forget(unplaced);

        let prev = self.links(at).prev;
        // SAFETY: `ptr` is freshly allocated, aligned room for one node.
        unsafe {
            ptr.as_ptr().write(Node {
                links: Links { prev, next: at },
                value,
            });
        }
        self.links_mut(prev).next = Link::Node(ptr);
        self.links_mut(at).prev = Link::Node(ptr);
        self.len += 1;
        Ok(ptr)
    }

    /// Unlinks `node` and returns its value; the node goes back to this
    /// list's allocator.
    pub(crate) fn unlink(&mut self, node: NonNull<Node<T>>) -> T {
        let node_alloc = self.node_alloc();
        // SAFETY: callers pass nodes reached from this list, which were all
        // allocated through the current allocator.
        unsafe { self.unlink_with(node, &node_alloc) }
    }

    /// Unlinks `node`, moves its value out and releases its memory through
    /// `node_alloc`.
    ///
    /// # Safety
    ///
    /// `node` must be a live node of this list allocated through an
    /// allocator equal to `node_alloc`.
    unsafe fn unlink_with(&mut self, node: NonNull<Node<T>>, node_alloc: &A::Rebind<Node<T>>) -> T {
        let Links { prev, next } = *self.links(Link::Node(node));
        self.links_mut(prev).next = next;
        self.links_mut(next).prev = prev;
        self.len -= 1;

        // SAFETY: the node is initialized and now unreachable; reading it out
        // transfers ownership of the value before the memory is released.
        let Node { value, .. } = unsafe { node.as_ptr().read() };
        // SAFETY: guaranteed by the caller.
        unsafe { node_alloc.deallocate(node, 1) };
        value
    }
}

impl<T, A: Allocator<Value = T>> Drop for List<T, A> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, A: Allocator<Value = T> + Default> Default for List<T, A> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T: Clone, A: Allocator<Value = T>> Clone for List<T, A> {
    /// # Panics
    ///
    /// Panics if the allocator cannot provide a node; use
    /// [`List::try_clone`] to handle that.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(copy) => copy,
            Err(err) => alloc_failed(err),
        }
    }

    /// # Panics
    ///
    /// Panics if the allocator cannot provide a node, after restoring the
    /// original contents; use [`List::try_clone_from`] to handle that.
    fn clone_from(&mut self, source: &Self) {
        if let Err(err) = self.try_clone_from(source) {
            alloc_failed(err);
        }
    }
}

impl<T: fmt::Debug, A: Allocator<Value = T>> fmt::Debug for List<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self).finish()
    }
}

impl<T, A, B> PartialEq<List<T, B>> for List<T, A>
where
    T: PartialEq,
    A: Allocator<Value = T>,
    B: Allocator<Value = T>,
{
    fn eq(&self, other: &List<T, B>) -> bool {
        self.len == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq, A: Allocator<Value = T>> Eq for List<T, A> {}

impl<T, A: Allocator<Value = T>> Extend<T> for List<T, A> {
    /// # Panics
    ///
    /// Panics if the allocator cannot provide a node.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            if let Err(err) = self.push_back(value) {
                alloc_failed(err);
            }
        }
    }
}

impl<'a, T: Copy + 'a, A: Allocator<Value = T>> Extend<&'a T> for List<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, A: Allocator<Value = T> + Default> FromIterator<T> for List<T, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::default();
        list.extend(iter);
        list
    }
}

impl<T, A: Allocator<Value = T>> IntoIterator for List<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        IntoIter::new(self)
    }
}

impl<'a, T, A: Allocator<Value = T>> IntoIterator for &'a List<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, A: Allocator<Value = T>> IntoIterator for &'a mut List<T, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}
