//! Borrowing and owning iterators over a [`List`].

// SAFETY: the borrowing iterators walk node pointers taken from a list that
// is borrowed for `'a`. The remaining count keeps them off the sentinel.
#![allow(unsafe_code)]

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use strata_alloc::Allocator;

use crate::list::List;
use crate::node::{Link, Node};

/// Raw pointer behind `link`. Callers only ask while `len > 0`, when both
/// ends are value-bearing nodes.
#[inline]
fn node_ptr<T>(link: Link<T>) -> Option<*mut Node<T>> {
    match link {
        Link::Sentinel => None,
        Link::Node(node) => Some(node.as_ptr()),
    }
}

/// Shared iterator over a list, front to back.
pub struct Iter<'a, T> {
    head: Link<T>,
    tail: Link<T>,
    len: usize,
    _borrow: PhantomData<&'a Node<T>>,
}

impl<T> Iter<'_, T> {
    pub(crate) fn new(head: Link<T>, tail: Link<T>, len: usize) -> Self {
        Self {
            head,
            tail,
            len,
            _borrow: PhantomData,
        }
    }
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self::new(self.head, self.tail, self.len)
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.len == 0 {
            return None;
        }
        let node = node_ptr(self.head)?;
        self.len -= 1;
        // SAFETY: live node of a list borrowed for `'a`.
        let node = unsafe { &*node };
        self.head = node.links.next;
        Some(&node.value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        if self.len == 0 {
            return None;
        }
        let node = node_ptr(self.tail)?;
        self.len -= 1;
        // SAFETY: live node of a list borrowed for `'a`.
        let node = unsafe { &*node };
        self.tail = node.links.prev;
        Some(&node.value)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// Mutable iterator over a list, front to back.
pub struct IterMut<'a, T> {
    head: Link<T>,
    tail: Link<T>,
    len: usize,
    _borrow: PhantomData<&'a mut Node<T>>,
}

impl<T> IterMut<'_, T> {
    pub(crate) fn new(head: Link<T>, tail: Link<T>, len: usize) -> Self {
        Self {
            head,
            tail,
            len,
            _borrow: PhantomData,
        }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        if self.len == 0 {
            return None;
        }
        let node = node_ptr(self.head)?;
        self.len -= 1;
        // SAFETY: the list is exclusively borrowed for `'a` and each node is
        // yielded once, so the returned references never alias.
        let node = unsafe { &mut *node };
        self.head = node.links.next;
        Some(&mut node.value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.len == 0 {
            return None;
        }
        let node = node_ptr(self.tail)?;
        self.len -= 1;
        // SAFETY: as in `next`.
        let node = unsafe { &mut *node };
        self.tail = node.links.prev;
        Some(&mut node.value)
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<T> FusedIterator for IterMut<'_, T> {}

impl<T> fmt::Debug for IterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut").field("remaining", &self.len).finish()
    }
}

/// Owning iterator. Unyielded elements are dropped with the iterator.
pub struct IntoIter<T, A: Allocator<Value = T>> {
    list: List<T, A>,
}

impl<T, A: Allocator<Value = T>> IntoIter<T, A> {
    pub(crate) fn new(list: List<T, A>) -> Self {
        Self { list }
    }
}

impl<T, A: Allocator<Value = T>> Iterator for IntoIter<T, A> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.list.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len(), Some(self.list.len()))
    }
}

impl<T, A: Allocator<Value = T>> DoubleEndedIterator for IntoIter<T, A> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        self.list.pop_back()
    }
}

impl<T, A: Allocator<Value = T>> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: Allocator<Value = T>> FusedIterator for IntoIter<T, A> {}

impl<T: fmt::Debug, A: Allocator<Value = T>> fmt::Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.list).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::List;
    use strata_alloc::{CountingAllocator, Global};

    #[test]
    fn test_iter_both_ends_meet_in_the_middle() {
        let list: List<i32> = (1..=5).collect();
        let mut iter = list.iter();
        assert_eq!(iter.len(), 5);
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&5));
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.next_back(), Some(&4));
        assert_eq!(iter.next(), Some(&3));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn test_reverse_iteration() {
        let list: List<char> = "abc".chars().collect();
        assert_eq!(list.iter().rev().collect::<String>(), "cba");
    }

    #[test]
    fn test_iter_mut_updates_in_place() {
        let mut list: List<i32> = (1..=3).collect();
        for value in &mut list {
            *value *= 10;
        }
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), [10, 20, 30]);
    }

    #[test]
    fn test_into_iter_releases_unyielded_nodes() {
        let counted = CountingAllocator::new(Global::<String>::new());
        let mut list = List::new_in(counted.clone());
        for word in ["x", "y", "z"] {
            list.push_back(word.to_string()).unwrap();
        }
        let mut owned = list.into_iter();
        assert_eq!(owned.next_back().as_deref(), Some("z"));
        assert_eq!(counted.stats().live_blocks(), 2);
        drop(owned);
        assert_eq!(counted.stats().live_blocks(), 0);
    }
}
