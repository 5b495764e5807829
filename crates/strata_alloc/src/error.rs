//! # Allocation Error Types
//!
//! All errors an allocator in this crate can report.

use thiserror::Error;

/// Errors that can occur while allocating.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The arena does not have enough room left for the request.
    #[error("arena capacity exceeded: requested {requested} bytes, {remaining} of {capacity} bytes remaining")]
    CapacityExceeded {
        /// Bytes requested after alignment rounding.
        requested: usize,
        /// Bytes still free in the arena.
        remaining: usize,
        /// Total arena capacity.
        capacity: usize,
    },

    /// `count * size_of::<T>()` (or its alignment rounding) overflowed.
    #[error("allocation size overflow: {count} elements of {elem_size} bytes")]
    SizeOverflow {
        /// Number of elements requested.
        count: usize,
        /// Size of one element in bytes.
        elem_size: usize,
    },

    /// The element type needs a stricter alignment than the arena provides.
    #[error("unsupported alignment: {align} exceeds arena alignment {max_align}")]
    UnsupportedAlignment {
        /// Alignment required by the element type.
        align: usize,
        /// Alignment the arena guarantees.
        max_align: usize,
    },

    /// The global heap returned null.
    #[error("out of memory: global allocator failed to provide {size} bytes")]
    OutOfMemory {
        /// Bytes requested from the heap.
        size: usize,
    },

    /// An instrumented allocator reached its configured allocation budget.
    #[error("allocation budget exhausted after {limit} allocations")]
    BudgetExhausted {
        /// The configured number of allowed allocations.
        limit: usize,
    },
}

/// Result type for allocation operations.
pub type AllocResult<T> = Result<T, AllocError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message_names_all_figures() {
        let err = AllocError::CapacityExceeded {
            requested: 32,
            remaining: 16,
            capacity: 64,
        };
        let message = err.to_string();
        assert!(message.contains("32"));
        assert!(message.contains("16 of 64"));
    }
}
