//! # STRATA Allocation Layer
//!
//! Memory sources for node-based containers:
//! - [`Arena`]: fixed-capacity bump storage embedded in a caller-owned value
//! - [`ArenaAllocator`]: typed, rebindable handle that draws from an [`Arena`]
//! - [`Global`]: the general-purpose heap allocator
//! - [`CountingAllocator`]: instrumentation wrapper for leak and rollback checks
//!
//! ## Arena Layout
//!
//! ```text
//!   Arena<N>
//!   ┌─────┬─────┬─────────┬─────┬───────────────────────────────┐
//!   │ A1  │ A2  │   A3    │ A4  │          Free Space           │
//!   └─────┴─────┴─────────┴─────┴───────────────────────────────┘
//!                                ▲                               ▲
//!                              cursor                            N
//!
//!   Every block starts on a MAX_ALIGN boundary.
//!   The cursor never moves backwards; deallocate is a no-op.
//! ```
//!
//! ## Example
//!
//! ```rust
//! use strata_alloc::{Allocator, Arena, ArenaAllocator};
//!
//! let arena: Arena<1024> = Arena::new();
//! let ints: ArenaAllocator<'_, u32, 1024> = ArenaAllocator::new(&arena);
//! let bytes = ints.rebind::<u8>();
//!
//! assert!(ints == bytes);
//! let block = ints.allocate(4).unwrap();
//! assert!(arena.contains(block.cast()));
//! assert_eq!(arena.used(), 16);
//! ```
//!
//! ## Thread Safety
//!
//! None of these types are `Sync`. One arena, one thread.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod allocator;
pub mod arena;
pub mod counting;
pub mod error;

pub use allocator::{Allocator, Global};
pub use arena::{Arena, ArenaAllocator, MAX_ALIGN};
pub use counting::{AllocStats, CountingAllocator};
pub use error::{AllocError, AllocResult};
