use std::iter;
use std::num::NonZero;

use first_fit_pool::PoolAllocator;
use tracing::{debug, trace};

use crate::{ListError, NODE_SIZE, NodeListBuilder, NodeRecord, NodeRef, Result};

/// A singly-linked list of `u16` values whose nodes are stored in a [`PoolAllocator`] owned by
/// the list.
///
/// Every node occupies one [`NODE_SIZE`]-byte block of the pool, obtained with
/// [`alloc()`](PoolAllocator::alloc) when a value is inserted and returned with
/// [`free()`](PoolAllocator::free) when it is deleted. The list never inspects or modifies the
/// pool's block bookkeeping directly.
///
/// # Examples
///
/// ```
/// use new_zealand::nz;
/// use pool_list::NodeList;
///
/// let mut list = NodeList::new(nz!(1024)).unwrap();
///
/// list.insert(1).unwrap();
/// let three = list.insert(3).unwrap();
/// list.insert_before(three, 2).unwrap();
///
/// assert_eq!(list.values(), vec![1, 2, 3]);
///
/// assert!(list.delete(2).unwrap());
/// assert_eq!(list.count_nodes(), 2);
///
/// list.cleanup();
/// ```
#[derive(Debug)]
pub struct NodeList {
    pool: PoolAllocator,
    head: Option<NodeRef>,
}

impl NodeList {
    /// Creates an empty list backed by a new pool of `capacity` bytes.
    ///
    /// # Errors
    ///
    /// [`ListError::Alloc`] with [`OutOfMemory`][first_fit_pool::AllocError::OutOfMemory] if the
    /// pool cannot be reserved.
    pub fn new(capacity: NonZero<usize>) -> Result<Self> {
        Self::builder().capacity(capacity).build()
    }

    /// Creates a builder for configuring a list and the pool behind it.
    #[cfg_attr(test, mutants::skip)] // Gets mutated to alternate version of itself.
    pub fn builder() -> NodeListBuilder {
        NodeListBuilder::new()
    }

    pub(crate) fn from_pool(pool: PoolAllocator) -> Self {
        debug!(capacity = pool.capacity(), "node list created");

        Self { pool, head: None }
    }

    /// The first node of the list, if any.
    #[must_use]
    pub fn head(&self) -> Option<NodeRef> {
        self.head
    }

    /// Appends a node holding `data` to the end of the list.
    ///
    /// # Errors
    ///
    /// [`ListError::Alloc`] if the pool has no room for another node or the list has been
    /// cleaned up.
    pub fn insert(&mut self, data: u16) -> Result<NodeRef> {
        let tail = self.nodes().last();

        let node = self.allocate_node(NodeRecord { data, next: None })?;

        match tail {
            Some((tail, record)) => self.store(
                tail,
                NodeRecord {
                    next: Some(node),
                    ..record
                },
            )?,
            None => self.head = Some(node),
        }

        trace!(%node, data, "appended");
        Ok(node)
    }

    /// Inserts a node holding `data` directly after `node`.
    ///
    /// # Errors
    ///
    /// [`ListError::Alloc`] if the pool has no room for another node or `node` no longer
    /// exists.
    pub fn insert_after(&mut self, node: NodeRef, data: u16) -> Result<NodeRef> {
        let record = self.load(node)?;

        let new_node = self.allocate_node(NodeRecord {
            data,
            next: record.next,
        })?;
        self.store(
            node,
            NodeRecord {
                next: Some(new_node),
                ..record
            },
        )?;

        trace!(%new_node, after = %node, data, "inserted");
        Ok(new_node)
    }

    /// Inserts a node holding `data` directly before `node`. If `node` is the head, the new
    /// node becomes the head.
    ///
    /// # Errors
    ///
    /// [`ListError::NodeNotInList`] if `node` cannot be reached from the head.
    /// [`ListError::Alloc`] if the pool has no room for another node.
    pub fn insert_before(&mut self, node: NodeRef, data: u16) -> Result<NodeRef> {
        if self.head == Some(node) {
            let new_node = self.allocate_node(NodeRecord {
                data,
                next: Some(node),
            })?;
            self.head = Some(new_node);

            trace!(%new_node, before = %node, data, "inserted at head");
            return Ok(new_node);
        }

        let (predecessor, predecessor_record) = self
            .nodes()
            .find(|(_, record)| record.next == Some(node))
            .ok_or(ListError::NodeNotInList { node })?;

        let new_node = self.allocate_node(NodeRecord {
            data,
            next: Some(node),
        })?;
        self.store(
            predecessor,
            NodeRecord {
                next: Some(new_node),
                ..predecessor_record
            },
        )?;

        trace!(%new_node, before = %node, data, "inserted");
        Ok(new_node)
    }

    /// Removes the first node holding `data`.
    ///
    /// Returns `false` if no node holds `data`.
    ///
    /// # Errors
    ///
    /// [`ListError::EmptyList`] if the list has no nodes.
    pub fn delete(&mut self, data: u16) -> Result<bool> {
        if self.head.is_none() {
            return Err(ListError::EmptyList);
        }

        let mut predecessor = None;
        let mut found = None;

        for (node, record) in self.nodes() {
            if record.data == data {
                found = Some((node, record));
                break;
            }

            predecessor = Some((node, record));
        }

        let Some((node, record)) = found else {
            trace!(data, "no node to delete");
            return Ok(false);
        };

        match predecessor {
            Some((predecessor, predecessor_record)) => self.store(
                predecessor,
                NodeRecord {
                    next: record.next,
                    ..predecessor_record
                },
            )?,
            None => self.head = record.next,
        }

        self.pool.free(node.address())?;

        trace!(%node, data, "deleted");
        Ok(true)
    }

    /// The first node holding `data`, if any.
    #[must_use]
    pub fn search(&self, data: u16) -> Option<NodeRef> {
        self.nodes()
            .find(|(_, record)| record.data == data)
            .map(|(node, _)| node)
    }

    /// The value held by `node`.
    ///
    /// # Errors
    ///
    /// [`ListError::Alloc`] if `node` no longer exists.
    pub fn data(&self, node: NodeRef) -> Result<u16> {
        Ok(self.load(node)?.data)
    }

    /// The node following `node`, if any.
    ///
    /// # Errors
    ///
    /// [`ListError::Alloc`] if `node` no longer exists.
    pub fn next(&self, node: NodeRef) -> Result<Option<NodeRef>> {
        Ok(self.load(node)?.next)
    }

    /// Number of nodes in the list.
    #[must_use]
    pub fn count_nodes(&self) -> usize {
        self.nodes().count()
    }

    /// Whether the list has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// The values of all nodes from head to tail.
    #[must_use]
    pub fn values(&self) -> Vec<u16> {
        self.nodes().map(|(_, record)| record.data).collect()
    }

    /// The pool that stores the nodes.
    #[must_use]
    pub fn pool(&self) -> &PoolAllocator {
        &self.pool
    }

    /// Frees every node and tears down the pool.
    ///
    /// Afterwards the list is empty and every operation that needs node storage fails with
    /// [`AllocError::NotInitialized`][first_fit_pool::AllocError::NotInitialized].
    pub fn cleanup(&mut self) {
        let nodes = self.nodes().map(|(node, _)| node).collect::<Vec<_>>();
        let freed = nodes.len();

        for node in nodes {
            self.pool
                .free(node.address())
                .expect("guarded by walking only nodes that are reachable from the head");
        }

        self.head = None;
        self.pool.teardown();

        debug!(freed, "node list cleaned up");
    }

    fn nodes(&self) -> impl Iterator<Item = (NodeRef, NodeRecord)> + '_ {
        let mut cursor = self.head;

        iter::from_fn(move || {
            let node = cursor?;
            let record = self
                .load(node)
                .expect("guarded by the list only linking nodes that it has allocated");
            cursor = record.next;
            Some((node, record))
        })
    }

    fn load(&self, node: NodeRef) -> Result<NodeRecord> {
        let bytes = self.pool.read(node.address())?;

        Ok(NodeRecord::from_bytes(bytes)
            .expect("every block of the pool holds a node of at least NODE_SIZE bytes"))
    }

    fn store(&mut self, node: NodeRef, record: NodeRecord) -> Result<()> {
        let bytes = self.pool.write(node.address())?;

        bytes
            .get_mut(..NODE_SIZE)
            .expect("every block of the pool holds a node of at least NODE_SIZE bytes")
            .copy_from_slice(&record.to_bytes());
        Ok(())
    }

    fn allocate_node(&mut self, record: NodeRecord) -> Result<NodeRef> {
        let node = NodeRef::new(self.pool.alloc(NODE_SIZE)?);

        self.store(node, record)?;
        Ok(node)
    }
}
