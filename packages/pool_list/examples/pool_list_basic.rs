//! Builds a small list, shows where its nodes land in the pool and cleans up.
//!
//! Run with `cargo run --example pool_list_basic`. Raise the max level below to `TRACE` to also
//! see the pool's placement decisions.

use pool_list::{ListError, NodeList};

fn main() -> Result<(), ListError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut list = NodeList::new(new_zealand::nz!(256))?;

    for value in [10, 20, 40] {
        list.insert(value)?;
    }

    if let Some(forty) = list.search(40) {
        list.insert_before(forty, 30)?;
    }
    println!("values: {:?}", list.values());

    let mut cursor = list.head();
    while let Some(node) = cursor {
        println!("  {} holds {}", node, list.data(node)?);
        cursor = list.next(node)?;
    }

    list.delete(20)?;
    println!(
        "after deleting 20: {:?}, {} of {} pool bytes free",
        list.values(),
        list.pool().free_bytes(),
        list.pool().capacity()
    );

    list.cleanup();
    Ok(())
}
