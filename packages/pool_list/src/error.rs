use first_fit_pool::AllocError;
use thiserror::Error;

use crate::NodeRef;

/// Errors returned by list operations.
///
/// A failing operation leaves the list exactly as it was.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum ListError {
    /// The pool could not provide or access node storage. Running out of pool space surfaces
    /// here as [`AllocError::NoSpace`], using the list after cleanup as
    /// [`AllocError::NotInitialized`] and using a deleted node as
    /// [`AllocError::InvalidAddress`].
    #[error("node storage failure: {0}")]
    Alloc(#[from] AllocError),

    /// A value was to be deleted from a list that has no nodes.
    #[error("cannot delete from an empty list")]
    EmptyList,

    /// The node that a new node was to be inserted before is not reachable from the head of
    /// the list.
    #[error("{node} is not part of the list")]
    NodeNotInList {
        /// The node that the caller provided.
        node: NodeRef,
    },
}

/// A specialized `Result` type for list operations, returning the crate's [`ListError`] type
/// as the error value.
pub(crate) type Result<T> = std::result::Result<T, ListError>;
