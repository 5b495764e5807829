//! # STRATA
//!
//! Arena-backed, allocator-aware containers.
//!
//! This crate re-exports the two building blocks and adds the probe runner:
//!
//! - [`alloc`]: [`Arena`], [`ArenaAllocator`], [`Global`], [`CountingAllocator`]
//! - [`list`]: [`List`] and its cursors
//! - [`config`]: [`ProbeConfig`], loaded from TOML
//! - [`probe`]: [`ProbeRunner`], end-to-end scenarios for the `strata_probe` binary
//!
//! ## Example
//!
//! ```rust
//! use strata::{Arena, ArenaAllocator, List};
//!
//! let arena: Arena<1024> = Arena::new();
//! let mut list = List::new_in(ArenaAllocator::<'_, u8, 1024>::new(&arena));
//! list.extend(*b"abc");
//!
//! assert_eq!(list.len(), 3);
//! assert!(arena.used() > 0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub use strata_alloc as alloc;
pub use strata_list as list;

pub mod config;
pub mod probe;

pub use config::{ProbeConfig, ProbeError, ProbeResult};
pub use probe::{ProbeOutcome, ProbeRunner};
pub use strata_alloc::{
    AllocError, AllocResult, Allocator, Arena, ArenaAllocator, CountingAllocator, Global,
};
pub use strata_list::{Bidirectional, Cursor, CursorMut, List, TryBuildError};
