use parking_lot::RwLock;

use crate::{NodeList, NodeListBuilder, NodeRef, Result};

/// A [`NodeList`] that can be shared between threads.
///
/// Inserting, deleting and cleaning up take the exclusive side of a read/write lock for the
/// whole operation, including the pool calls it makes. Searching, counting and reading values
/// take the shared side and may run concurrently with each other.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use new_zealand::nz;
/// use pool_list::NodeList;
///
/// let list = Arc::new(NodeList::builder().capacity(nz!(1024)).build_shared().unwrap());
///
/// let writers: Vec<_> = (0..4_u16)
///     .map(|value| {
///         let list = Arc::clone(&list);
///         thread::spawn(move || list.insert(value).unwrap())
///     })
///     .collect();
///
/// for writer in writers {
///     writer.join().unwrap();
/// }
///
/// assert_eq!(list.count_nodes(), 4);
/// ```
#[derive(Debug)]
pub struct SharedNodeList {
    inner: RwLock<NodeList>,
}

impl SharedNodeList {
    /// Creates a builder for configuring a list. Finish it with
    /// [`build_shared()`](NodeListBuilder::build_shared).
    #[cfg_attr(test, mutants::skip)] // Gets mutated to alternate version of itself.
    pub fn builder() -> NodeListBuilder {
        NodeList::builder()
    }

    /// See [`NodeList::insert()`].
    ///
    /// # Errors
    ///
    /// See [`NodeList::insert()`].
    pub fn insert(&self, data: u16) -> Result<NodeRef> {
        self.inner.write().insert(data)
    }

    /// See [`NodeList::insert_after()`].
    ///
    /// # Errors
    ///
    /// See [`NodeList::insert_after()`].
    pub fn insert_after(&self, node: NodeRef, data: u16) -> Result<NodeRef> {
        self.inner.write().insert_after(node, data)
    }

    /// See [`NodeList::insert_before()`].
    ///
    /// # Errors
    ///
    /// See [`NodeList::insert_before()`].
    pub fn insert_before(&self, node: NodeRef, data: u16) -> Result<NodeRef> {
        self.inner.write().insert_before(node, data)
    }

    /// See [`NodeList::delete()`].
    ///
    /// # Errors
    ///
    /// See [`NodeList::delete()`].
    pub fn delete(&self, data: u16) -> Result<bool> {
        self.inner.write().delete(data)
    }

    /// See [`NodeList::cleanup()`].
    pub fn cleanup(&self) {
        self.inner.write().cleanup();
    }

    /// See [`NodeList::search()`].
    #[must_use]
    pub fn search(&self, data: u16) -> Option<NodeRef> {
        self.inner.read().search(data)
    }

    /// See [`NodeList::data()`].
    ///
    /// # Errors
    ///
    /// See [`NodeList::data()`].
    pub fn data(&self, node: NodeRef) -> Result<u16> {
        self.inner.read().data(node)
    }

    /// See [`NodeList::count_nodes()`].
    #[must_use]
    pub fn count_nodes(&self) -> usize {
        self.inner.read().count_nodes()
    }

    /// See [`NodeList::is_empty()`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// See [`NodeList::values()`].
    #[must_use]
    pub fn values(&self) -> Vec<u16> {
        self.inner.read().values()
    }

    /// Unwraps the single-threaded list.
    #[must_use]
    pub fn into_inner(self) -> NodeList {
        self.inner.into_inner()
    }
}

impl From<NodeList> for SharedNodeList {
    fn from(value: NodeList) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;
    use std::num::NonZero;
    use std::sync::{Arc, Barrier};
    use std::thread;

    use new_zealand::nz;
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::{ListError, NODE_SIZE};

    assert_impl_all!(SharedNodeList: Send, Sync, Debug);

    #[test]
    fn operations_through_shared_reference() {
        let list = SharedNodeList::builder()
            .capacity(nz!(256))
            .build_shared()
            .unwrap();

        assert_eq!(list.delete(1), Err(ListError::EmptyList));

        let two = list.insert(2).unwrap();
        list.insert_before(two, 1).unwrap();
        list.insert_after(two, 3).unwrap();

        assert_eq!(list.values(), vec![1, 2, 3]);
        assert_eq!(list.search(3).map(|node| list.data(node)), Some(Ok(3)));
        assert!(list.delete(2).unwrap());
        assert_eq!(list.count_nodes(), 2);

        list.cleanup();
        assert!(list.is_empty());
    }

    #[test]
    fn concurrent_writers_and_readers() {
        const WRITERS: u16 = 4;
        const PER_WRITER: u16 = 50;

        let capacity = NODE_SIZE * usize::from(WRITERS * PER_WRITER);
        let list = Arc::new(
            SharedNodeList::builder()
                .capacity(NonZero::new(capacity).unwrap())
                .build_shared()
                .unwrap(),
        );
        let barrier = Arc::new(Barrier::new(usize::from(WRITERS) + 1));

        let writers = (0..WRITERS)
            .map(|writer| {
                let list = Arc::clone(&list);
                let barrier = Arc::clone(&barrier);

                thread::spawn(move || {
                    barrier.wait();
                    for index in 0..PER_WRITER {
                        list.insert(writer * PER_WRITER + index).unwrap();
                    }
                })
            })
            .collect::<Vec<_>>();

        let reader = {
            let list = Arc::clone(&list);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();
                let mut last_count = 0;
                while last_count < usize::from(WRITERS * PER_WRITER) {
                    let count = list.count_nodes();
                    assert!(count >= last_count, "the list never shrinks here");
                    last_count = count;
                }
            })
        };

        for writer in writers {
            writer.join().unwrap();
        }
        reader.join().unwrap();

        let mut values = list.values();
        values.sort_unstable();
        assert_eq!(values, (0..WRITERS * PER_WRITER).collect::<Vec<_>>());
        assert_eq!(list.search(WRITERS * PER_WRITER), None);
    }

    #[test]
    fn into_inner_returns_same_list() {
        let list = SharedNodeList::builder()
            .capacity(nz!(64))
            .build_shared()
            .unwrap();
        list.insert(9).unwrap();

        let inner = list.into_inner();

        assert_eq!(inner.values(), vec![9]);
    }
}
