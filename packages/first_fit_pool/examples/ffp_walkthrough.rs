//! Walks through the allocator's placement, coalescing and resize behavior, logging every
//! decision the pool makes.
//!
//! Run with `cargo run --example ffp_walkthrough` to see the trace output.

use first_fit_pool::{AllocError, PoolAllocator};
use new_zealand::nz;

fn print_layout(label: &str, pool: &PoolAllocator) {
    println!("{label}:");
    for block in pool.blocks() {
        let state = if block.is_free() { "free" } else { "live" };
        println!("  [{:>3}..{:>3}) {state}", block.offset(), block.end());
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    let mut pool = PoolAllocator::builder().capacity(nz!(100)).build().unwrap();

    let a = pool.alloc(30).unwrap();
    let b = pool.alloc(20).unwrap();
    print_layout("after allocating 30 and 20 bytes", &pool);

    pool.free(a).unwrap();
    let c = pool.alloc(10).unwrap();
    print_layout("after freeing the first block and allocating 10 bytes", &pool);

    pool.write(b).unwrap().copy_from_slice(&[7; 20]);
    let b = pool.resize(b, 60).unwrap();
    print_layout("after growing the second block to 60 bytes", &pool);
    assert!(pool.read(b).unwrap().iter().take(20).all(|byte| *byte == 7));

    match pool.alloc(50) {
        Err(AllocError::NoSpace { requested }) => {
            println!("a request for {requested} bytes does not fit, as expected");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    pool.free(b).unwrap();
    pool.free(c).unwrap();
    print_layout("after freeing everything", &pool);

    pool.teardown();
}
