//! # List Error Types

use strata_alloc::AllocError;
use thiserror::Error;

/// Failure while building elements with a fallible constructor.
///
/// For single insertions `index` is always 0.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TryBuildError<E> {
    /// No memory for the node that would have held element `index`.
    #[error("node allocation failed at element {index}: {source}")]
    Alloc {
        /// Position of the element being built.
        index: usize,
        /// What the allocator reported.
        #[source]
        source: AllocError,
    },

    /// The constructor for element `index` returned an error.
    #[error("element {index} failed to construct: {error}")]
    Element {
        /// Position of the element being built.
        index: usize,
        /// The constructor's error.
        error: E,
    },
}

/// Why placing a single node failed, before the caller knows its index.
pub(crate) enum Failure<E> {
    Alloc(AllocError),
    Element(E),
}

impl<E> Failure<E> {
    pub(crate) fn at(self, index: usize) -> TryBuildError<E> {
        match self {
            Self::Alloc(source) => TryBuildError::Alloc { index, source },
            Self::Element(error) => TryBuildError::Element { index, error },
        }
    }
}
