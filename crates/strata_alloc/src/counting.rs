//! # Counting Allocator
//!
//! Instrumentation wrapper used to prove that containers release every block
//! they take, including on the failure paths, and to inject allocation
//! failures at a chosen point.

// SAFETY: Forwarding `Allocator` implementation; the wrapper adds bookkeeping
// only and hands the inner allocator's blocks through untouched.
#![allow(unsafe_code)]

use std::cell::Cell;
use std::fmt;
use std::ptr::NonNull;
use std::rc::Rc;

use crate::allocator::Allocator;
use crate::error::{AllocError, AllocResult};

/// Shared allocation counters.
///
/// One record is shared by a [`CountingAllocator`], all its clones and all
/// its rebinds.
#[derive(Default)]
pub struct AllocStats {
    /// Successful `allocate` calls.
    allocations: Cell<usize>,
    /// `deallocate` calls.
    deallocations: Cell<usize>,
    /// Successful allocations allowed before failing, if limited.
    budget: Cell<Option<usize>>,
}

impl AllocStats {
    /// Number of successful allocations so far.
    #[inline]
    #[must_use]
    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }

    /// Number of deallocations so far.
    #[inline]
    #[must_use]
    pub fn deallocations(&self) -> usize {
        self.deallocations.get()
    }

    /// Blocks allocated and not yet released.
    #[inline]
    #[must_use]
    pub fn live_blocks(&self) -> usize {
        self.allocations.get() - self.deallocations.get()
    }

    /// Limits the total number of successful allocations. `None` lifts the
    /// limit.
    pub fn set_budget(&self, limit: Option<usize>) {
        self.budget.set(limit);
    }
}

impl fmt::Debug for AllocStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllocStats")
            .field("allocations", &self.allocations())
            .field("deallocations", &self.deallocations())
            .field("budget", &self.budget.get())
            .finish()
    }
}

/// Wraps an allocator and counts what goes through it.
///
/// # Example
///
/// ```rust
/// use strata_alloc::{Allocator, CountingAllocator, Global};
///
/// let counted = CountingAllocator::new(Global::<u32>::new());
/// let block = counted.allocate(2).unwrap();
/// assert_eq!(counted.stats().live_blocks(), 1);
///
/// unsafe { counted.deallocate(block, 2) };
/// assert_eq!(counted.stats().live_blocks(), 0);
/// ```
pub struct CountingAllocator<A> {
    inner: A,
    stats: Rc<AllocStats>,
    propagate: bool,
}

impl<A> CountingAllocator<A> {
    /// Wraps `inner` with fresh counters and no budget.
    #[must_use]
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            stats: Rc::new(AllocStats::default()),
            propagate: false,
        }
    }

    /// Wraps `inner`, allowing only `limit` successful allocations.
    #[must_use]
    pub fn with_budget(inner: A, limit: usize) -> Self {
        let counted = Self::new(inner);
        counted.stats.set_budget(Some(limit));
        counted
    }

    /// Makes copy-assignment hand this allocator over to the target.
    #[must_use]
    pub fn propagating(mut self) -> Self {
        self.propagate = true;
        self
    }

    /// Shared counters.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> &AllocStats {
        &self.stats
    }

    /// The wrapped allocator.
    #[inline]
    #[must_use]
    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: Clone> Clone for CountingAllocator<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            stats: Rc::clone(&self.stats),
            propagate: self.propagate,
        }
    }
}

impl<A: PartialEq> PartialEq for CountingAllocator<A> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.stats, &other.stats) && self.inner == other.inner
    }
}

impl<A: fmt::Debug> fmt::Debug for CountingAllocator<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountingAllocator")
            .field("inner", &self.inner)
            .field("stats", &*self.stats)
            .finish()
    }
}

// SAFETY: every block comes straight from `inner`, which upholds the
// `Allocator` contract, and is released through `inner` again.
unsafe impl<A: Allocator> Allocator for CountingAllocator<A> {
    type Value = A::Value;
    type Rebind<U> = CountingAllocator<A::Rebind<U>>;

    fn allocate(&self, count: usize) -> AllocResult<NonNull<A::Value>> {
        if let Some(limit) = self.stats.budget.get() {
            if self.stats.allocations.get() >= limit {
                tracing::trace!(limit, "counting allocator budget exhausted");
                return Err(AllocError::BudgetExhausted { limit });
            }
        }
        let block = self.inner.allocate(count)?;
        self.stats.allocations.set(self.stats.allocations.get() + 1);
        tracing::trace!(count, live = self.stats.live_blocks(), "counted allocation");
        Ok(block)
    }

    unsafe fn deallocate(&self, ptr: NonNull<A::Value>, count: usize) {
        self.stats.deallocations.set(self.stats.deallocations.get() + 1);
        // SAFETY: forwarded caller guarantee; `inner` produced `ptr`.
        unsafe { self.inner.deallocate(ptr, count) };
    }

    fn rebind<U>(&self) -> CountingAllocator<A::Rebind<U>> {
        CountingAllocator {
            inner: self.inner.rebind::<U>(),
            stats: Rc::clone(&self.stats),
            propagate: self.propagate,
        }
    }

    fn select_on_copy(&self) -> Self {
        Self {
            inner: self.inner.select_on_copy(),
            stats: Rc::clone(&self.stats),
            propagate: self.propagate,
        }
    }

    fn propagates_on_copy(&self) -> bool {
        self.propagate
    }
}
