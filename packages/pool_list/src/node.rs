use std::fmt;

use first_fit_pool::Address;

/// Number of pool bytes occupied by one list node.
///
/// A node is stored as its 16-bit value in little-endian order followed by the encoded
/// [`Address`] of the next node, with [`Address::NULL`] marking the end of the list.
pub const NODE_SIZE: usize = DATA_LEN + Address::ENCODED_LEN;

const DATA_LEN: usize = size_of::<u16>();

/// Refers to one node of a [`NodeList`][crate::NodeList].
///
/// A reference stays valid until the node it points to is deleted or the list is cleaned up.
/// Using it afterwards is reported as an error, never as access to another node's storage
/// (unless that storage has since been reused for a new node of the same list).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodeRef {
    address: Address,
}

impl NodeRef {
    #[must_use]
    pub(crate) const fn new(address: Address) -> Self {
        Self { address }
    }

    /// The pool address where the node is stored.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node@{}", self.address)
    }
}

/// The decoded content of one node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct NodeRecord {
    pub(crate) data: u16,
    pub(crate) next: Option<NodeRef>,
}

impl NodeRecord {
    pub(crate) fn to_bytes(self) -> [u8; NODE_SIZE] {
        let next = self.next.map_or(Address::NULL, |node| node.address());

        let mut bytes = [0; NODE_SIZE];
        let (data_bytes, next_bytes) = bytes.split_at_mut(DATA_LEN);
        data_bytes.copy_from_slice(&self.data.to_le_bytes());
        next_bytes.copy_from_slice(&next.to_le_bytes());
        bytes
    }

    /// Decodes the record at the start of `bytes`. Returns `None` if fewer than
    /// [`NODE_SIZE`] bytes are available.
    pub(crate) fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let record = bytes.first_chunk::<NODE_SIZE>()?;
        let (data, next) = record.split_first_chunk::<DATA_LEN>()?;
        let next = Address::from_le_bytes(next.try_into().ok()?);

        Some(Self {
            data: u16::from_le_bytes(*data),
            next: (!next.is_null()).then_some(NodeRef::new(next)),
        })
    }
}
