//! # STRATA List
//!
//! An allocator-aware doubly-linked list.
//!
//! [`List<T, A>`] takes any [`Allocator`](strata_alloc::Allocator) configured
//! for `T` and rebinds it to its node type. Nodes can therefore live on the
//! heap ([`Global`](strata_alloc::Global)) or in a caller-owned
//! [`Arena`](strata_alloc::Arena).
//!
//! ## Failure Model
//!
//! | Operation                    | On allocation / construction failure        |
//! |------------------------------|---------------------------------------------|
//! | `push_*`, `insert_before*`   | list unchanged, node returned               |
//! | `with_len`, `from_elem`, ... | everything built so far released            |
//! | `try_clone_from`, `clone_from` | original elements and allocator restored  |
//! | `Clone`, `Extend`, `collect` | panic, after the guarantees above           |
//!
//! Panics in `T::clone` or `T::default` unwind through the same rollback.
//!
//! ## Example
//!
//! ```rust
//! use strata_alloc::{Arena, ArenaAllocator};
//! use strata_list::{Bidirectional, List};
//!
//! let arena: Arena<2048> = Arena::new();
//! let alloc = ArenaAllocator::<'_, &str, 2048>::new(&arena);
//! let mut words = List::from_elem_in(2, &"hi", alloc).unwrap();
//!
//! let mut cursor = words.cursor_back_mut();
//! cursor.insert_before("there").unwrap();
//! cursor.move_next();
//! assert!(cursor.is_end());
//!
//! assert_eq!(words.iter().copied().collect::<Vec<_>>(), ["hi", "there", "hi"]);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod cursor;
pub mod error;
pub mod iter;
pub mod list;
mod node;

pub use cursor::{Bidirectional, Cursor, CursorMut};
pub use error::TryBuildError;
pub use iter::{IntoIter, Iter, IterMut};
pub use list::List;
