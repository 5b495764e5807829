//! # Cursors
//!
//! A cursor names one position in a [`List`]: an element, or `end` (the
//! sentinel). Moving forward from the last element lands on `end`; moving
//! forward again wraps to the first element. Backward movement mirrors this.
//!
//! [`Cursor`] only reads. [`CursorMut`] can also insert and remove, and
//! converts into a [`Cursor`] but never the other way round.

use std::fmt;
use std::ptr;

use strata_alloc::{AllocResult, Allocator};

use crate::error::TryBuildError;
use crate::list::List;
use crate::node::Link;

/// Movement shared by [`Cursor`] and [`CursorMut`].
pub trait Bidirectional {
    /// Element type under the cursor.
    type Item;

    /// Steps toward the back. From the last element this reaches `end`;
    /// from `end` it wraps to the first element.
    fn move_next(&mut self);

    /// Steps toward the front. From the first element this reaches `end`;
    /// from `end` it wraps to the last element.
    fn move_prev(&mut self);

    /// Element under the cursor, or `None` at `end`.
    fn current(&self) -> Option<&Self::Item>;

    /// Whether the cursor is at `end`.
    fn is_end(&self) -> bool;
}

/// Read-only position in a list.
pub struct Cursor<'a, T, A: Allocator<Value = T>> {
    list: &'a List<T, A>,
    at: Link<T>,
}

impl<'a, T, A: Allocator<Value = T>> Cursor<'a, T, A> {
    pub(crate) fn new(list: &'a List<T, A>, at: Link<T>) -> Self {
        Self { list, at }
    }

    /// Element under the cursor, borrowed for the list's lifetime.
    #[must_use]
    pub fn current(&self) -> Option<&'a T> {
        self.list.value_at(self.at)
    }

    /// Element after the cursor (the first element when at `end`).
    #[must_use]
    pub fn peek_next(&self) -> Option<&'a T> {
        self.list.value_at(self.list.links(self.at).next)
    }

    /// Element before the cursor (the last element when at `end`).
    #[must_use]
    pub fn peek_prev(&self) -> Option<&'a T> {
        self.list.value_at(self.list.links(self.at).prev)
    }

    /// The list this cursor walks.
    #[must_use]
    pub fn list(&self) -> &'a List<T, A> {
        self.list
    }
}

impl<T, A: Allocator<Value = T>> Bidirectional for Cursor<'_, T, A> {
    type Item = T;

    fn move_next(&mut self) {
        self.at = self.list.links(self.at).next;
    }

    fn move_prev(&mut self) {
        self.at = self.list.links(self.at).prev;
    }

    fn current(&self) -> Option<&T> {
        self.list.value_at(self.at)
    }

    fn is_end(&self) -> bool {
        self.at == Link::Sentinel
    }
}

impl<T, A: Allocator<Value = T>> Clone for Cursor<'_, T, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, A: Allocator<Value = T>> Copy for Cursor<'_, T, A> {}

impl<T, A: Allocator<Value = T>> PartialEq for Cursor<'_, T, A> {
    /// Same list, same position. Values are never compared.
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.list, other.list) && self.at == other.at
    }
}

impl<T, A: Allocator<Value = T>> Eq for Cursor<'_, T, A> {}

impl<T: fmt::Debug, A: Allocator<Value = T>> fmt::Debug for Cursor<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&Cursor::current(self)).finish()
    }
}

/// Mutable position in a list.
pub struct CursorMut<'a, T, A: Allocator<Value = T>> {
    list: &'a mut List<T, A>,
    at: Link<T>,
}

impl<'a, T, A: Allocator<Value = T>> CursorMut<'a, T, A> {
    pub(crate) fn new(list: &'a mut List<T, A>, at: Link<T>) -> Self {
        Self { list, at }
    }

    /// Element under the cursor, mutably.
    pub fn current_mut(&mut self) -> Option<&mut T> {
        self.list.value_at_mut(self.at)
    }

    /// Read-only view of this position, borrowing the cursor.
    #[must_use]
    pub fn as_cursor(&self) -> Cursor<'_, T, A> {
        Cursor::new(&*self.list, self.at)
    }

    /// Inserts `value` before the cursor. The cursor stays where it was, so
    /// at `end` this appends.
    ///
    /// # Errors
    ///
    /// Returns the allocator's error; the list is unchanged.
    pub fn insert_before(&mut self, value: T) -> AllocResult<()> {
        self.list.link_before(self.at, value).map(drop)
    }

    /// Allocates a node, builds its element with `make`, and inserts it
    /// before the cursor.
    ///
    /// # Errors
    ///
    /// An allocation failure or an `Err` from `make` is reported with index
    /// 0 and the list is unchanged. A panic in `make` leaves it unchanged
    /// too.
    pub fn insert_before_with<E>(
        &mut self,
        make: impl FnOnce() -> Result<T, E>,
    ) -> Result<(), TryBuildError<E>> {
        self.list
            .link_before_with(self.at, make)
            .map(drop)
            .map_err(|failure| failure.at(0))
    }

    /// Removes the element under the cursor and moves to its successor.
    /// Returns `None` at `end`.
    pub fn remove_current(&mut self) -> Option<T> {
        let at = self.at;
        match at {
            Link::Sentinel => None,
            Link::Node(node) => {
                self.at = self.list.links(at).next;
                Some(self.list.unlink(node))
            }
        }
    }
}

impl<T, A: Allocator<Value = T>> Bidirectional for CursorMut<'_, T, A> {
    type Item = T;

    fn move_next(&mut self) {
        self.at = self.list.links(self.at).next;
    }

    fn move_prev(&mut self) {
        self.at = self.list.links(self.at).prev;
    }

    fn current(&self) -> Option<&T> {
        self.list.value_at(self.at)
    }

    fn is_end(&self) -> bool {
        self.at == Link::Sentinel
    }
}

impl<'a, T, A: Allocator<Value = T>> From<CursorMut<'a, T, A>> for Cursor<'a, T, A> {
    fn from(cursor: CursorMut<'a, T, A>) -> Self {
        Cursor::new(cursor.list, cursor.at)
    }
}

impl<T: fmt::Debug, A: Allocator<Value = T>> fmt::Debug for CursorMut<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.current()).finish()
    }
}
