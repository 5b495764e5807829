//! Node records and the links between them.

use std::ptr::NonNull;

/// Handle to a position in a list.
///
/// The sentinel is named by a variant rather than by its address, so the
/// list that embeds it can move without invalidating any link.
pub(crate) enum Link<T> {
    /// The list's own sentinel: `end`, and the anchor of the ring.
    Sentinel,
    /// A value-bearing node in allocator-provided memory.
    Node(NonNull<Node<T>>),
}

impl<T> Clone for Link<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Link<T> {}

impl<T> PartialEq for Link<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Sentinel, Self::Sentinel) => true,
            (Self::Node(a), Self::Node(b)) => a == b,
            _ => false,
        }
    }
}

impl<T> Eq for Link<T> {}

/// The link-only part of a node. The sentinel is exactly this.
pub(crate) struct Links<T> {
    pub(crate) prev: Link<T>,
    pub(crate) next: Link<T>,
}

impl<T> Links<T> {
    /// Links of an empty ring: both point back at the sentinel.
    pub(crate) const fn empty() -> Self {
        Self {
            prev: Link::Sentinel,
            next: Link::Sentinel,
        }
    }
}

impl<T> Clone for Links<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Links<T> {}

/// A value-bearing node.
pub(crate) struct Node<T> {
    pub(crate) links: Links<T>,
    pub(crate) value: T,
}
