//! Property tests comparing `NodeList` against a `Vec<u16>` model.
//!
//! Every operation is applied to both, after which the list must hold the same values in the
//! same order and the pool must hold exactly one live block per node.

use std::num::NonZero;

use first_fit_pool::AllocError;
use pool_list::{ListError, NODE_SIZE, NodeList};
use proptest::prelude::*;

const MAX_NODES: usize = 12;

#[derive(Clone, Debug)]
enum Op {
    Insert(u16),
    InsertAfter(usize, u16),
    InsertBefore(usize, u16),
    Delete(u16),
}

fn arb_value() -> impl Strategy<Value = u16> {
    // A small range makes duplicates and successful deletes common.
    0_u16..8
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => arb_value().prop_map(Op::Insert),
        2 => (any::<usize>(), arb_value()).prop_map(|(slot, value)| Op::InsertAfter(slot, value)),
        2 => (any::<usize>(), arb_value()).prop_map(|(slot, value)| Op::InsertBefore(slot, value)),
        3 => arb_value().prop_map(Op::Delete),
    ]
}

/// The node at `position`, found by walking from the head.
fn node_at(list: &NodeList, position: usize) -> pool_list::NodeRef {
    let mut node = list.head().unwrap();
    for _ in 0..position {
        node = list.next(node).unwrap().unwrap();
    }
    node
}

fn insert_model(model: &mut Vec<u16>, index: usize, value: u16) -> Result<(), ListError> {
    if model.len() == MAX_NODES {
        return Err(ListError::Alloc(AllocError::NoSpace {
            requested: NODE_SIZE,
        }));
    }
    model.insert(index, value);
    Ok(())
}

proptest! {
    #[test]
    fn list_matches_vec_model(ops in prop::collection::vec(arb_op(), 1..80)) {
        let mut list = NodeList::new(NonZero::new(NODE_SIZE * MAX_NODES).unwrap()).unwrap();
        let mut model: Vec<u16> = Vec::new();

        for op in ops {
            match op {
                Op::Insert(value) => {
                    let tail = model.len();
                    let expected = insert_model(&mut model, tail, value);
                    prop_assert_eq!(list.insert(value).map(|_| ()), expected);
                }
                Op::InsertAfter(slot, value) => {
                    if model.is_empty() {
                        continue;
                    }
                    let position = slot % model.len();
                    let node = node_at(&list, position);

                    let expected = insert_model(&mut model, position + 1, value);
                    prop_assert_eq!(list.insert_after(node, value).map(|_| ()), expected);
                }
                Op::InsertBefore(slot, value) => {
                    if model.is_empty() {
                        continue;
                    }
                    let position = slot % model.len();
                    let node = node_at(&list, position);

                    let expected = insert_model(&mut model, position, value);
                    prop_assert_eq!(list.insert_before(node, value).map(|_| ()), expected);
                }
                Op::Delete(value) => {
                    let expected = if model.is_empty() {
                        Err(ListError::EmptyList)
                    } else if let Some(index) = model.iter().position(|item| *item == value) {
                        model.remove(index);
                        Ok(true)
                    } else {
                        Ok(false)
                    };

                    prop_assert_eq!(list.delete(value), expected);
                }
            }

            prop_assert_eq!(list.values(), model.clone());
            prop_assert_eq!(list.count_nodes(), model.len());
            prop_assert_eq!(list.pool().live_block_count(), model.len());
            prop_assert_eq!(
                list.search(3).map(|node| list.data(node).unwrap()),
                model.contains(&3).then_some(3)
            );
        }

        list.cleanup();
        prop_assert!(list.is_empty());
        prop_assert!(!list.pool().is_initialized());
    }
}
