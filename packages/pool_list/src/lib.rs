#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A singly-linked list of `u16` values stored entirely inside a
//! [`first_fit_pool`] byte pool.
//!
//! The list owns its [`PoolAllocator`][first_fit_pool::PoolAllocator]. Every node is one
//! [`NODE_SIZE`]-byte block of that pool holding the value and the address of the next node,
//! so inserting allocates a block and deleting frees one:
//!
//! ```text
//!   head ──► ┌──────┬──────┐   ┌──────┬──────┐   ┌──────┬──────┐
//!            │  1   │ next ├──►│  2   │ next ├──►│  3   │ null │
//!            └──────┴──────┘   └──────┴──────┘   └──────┴──────┘
//!             offset 0          offset 18         offset 36
//! ```
//!
//! Use [`NodeList`] from a single thread, or [`SharedNodeList`] to share one list between
//! threads.
//!
//! # Example
//!
//! ```
//! use std::num::NonZero;
//!
//! use first_fit_pool::AllocError;
//! use pool_list::{ListError, NODE_SIZE, NodeList};
//!
//! // Room for exactly two nodes.
//! let mut list = NodeList::new(NonZero::new(NODE_SIZE * 2).unwrap()).unwrap();
//!
//! list.insert(1).unwrap();
//! list.insert(2).unwrap();
//!
//! assert_eq!(
//!     list.insert(3),
//!     Err(ListError::Alloc(AllocError::NoSpace { requested: NODE_SIZE }))
//! );
//!
//! // Deleting a node makes room again.
//! assert!(list.delete(1).unwrap());
//! list.insert(3).unwrap();
//! assert_eq!(list.values(), vec![2, 3]);
//!
//! list.cleanup();
//! ```

mod builder;
mod error;
mod list;
mod node;
mod shared;

pub use builder::*;
pub use error::*;
pub use list::*;
pub use node::*;
pub use shared::*;
