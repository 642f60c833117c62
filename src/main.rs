use std::process;

use log::error;

use pinbase::common::DEFAULT_BTREE_ORDER;
use pinbase::{
    BufferPoolConfig, DataType, IndexConfig, IndexManager, PageId, RecordId, ReplacementStrategy,
    Result, SlotId, Value,
};

const INDEX_ID: &str = "demo_index";
const WIDE_INDEX_ID: &str = "demo_wide";

fn run() -> Result<()> {
    println!("Pinbase - paged buffer pool and B+Tree index");
    println!("============================================\n");

    let config = IndexConfig::new(std::env::temp_dir().join("pinbase-demo")).with_buffer_pool(
        BufferPoolConfig {
            pool_size: 4,
            strategy: ReplacementStrategy::LruK(2),
        },
    );
    let manager = IndexManager::new(config)?;
    if manager.exists(INDEX_ID) {
        manager.delete_btree(INDEX_ID)?;
    }

    // A small fan-out makes the tree grow a few levels quickly
    manager.create_btree(INDEX_ID, DataType::Int, 3)?;
    let mut tree = manager.open_btree(INDEX_ID)?;
    println!(
        "Created index {} (fan-out {}, {} frames, {})\n",
        tree.index_id(),
        tree.fan_out(),
        tree.pool().pool_size(),
        tree.pool().strategy()
    );

    for key in [10, 20, 30, 40, 5, 25, 35, 15, 45, 1] {
        let rid = RecordId::new(PageId::new(key / 10), SlotId::new((key % 10) as u16));
        tree.insert(Value::Int(key), rid)?;
    }
    println!("After inserting 10 keys ({} nodes):", tree.num_nodes());
    print!("{}", tree.print_tree()?);

    for key in [40, 30, 5] {
        tree.delete(&Value::Int(key))?;
    }
    println!("\nAfter deleting 40, 30 and 5 ({} nodes):", tree.num_nodes());
    print!("{}", tree.print_tree()?);
    tree.check_integrity()?;

    println!("\nFull scan:");
    for entry in tree.open_scan()? {
        let (key, rid) = entry?;
        println!("  {} -> {}", key, rid);
    }

    let hits = tree.range_scan(&Value::Int(12), &Value::Int(30))?;
    println!("\nRange [12, 30]: {} entries", hits.len());

    let stats = tree.pool().stats();
    println!("\nBuffer pool:");
    println!("  - Frames: {:?}", stats.frame_contents);
    println!("  - Dirty:  {:?}", stats.dirty_flags);
    println!("  - Pins:   {:?}", stats.fix_counts);
    println!("  - Reads:  {}", stats.num_read_io);
    println!("  - Writes: {}", stats.num_write_io);

    tree.close()?;
    manager.delete_btree(INDEX_ID)?;

    // The default fan-out keeps ten thousand keys within two levels
    if manager.exists(WIDE_INDEX_ID) {
        manager.delete_btree(WIDE_INDEX_ID)?;
    }
    manager.create_btree(WIDE_INDEX_ID, DataType::Int, DEFAULT_BTREE_ORDER)?;
    let mut wide = manager.open_btree(WIDE_INDEX_ID)?;
    for key in 0..10_000 {
        wide.insert(Value::Int(key), RecordId::new(PageId::new(key), SlotId::new(0)))?;
    }
    wide.check_integrity()?;
    println!(
        "\nWide index: {} entries in {} nodes, {} reads / {} writes",
        wide.num_entries(),
        wide.num_nodes(),
        wide.pool().num_read_io(),
        wide.pool().num_write_io()
    );
    wide.close()?;
    manager.delete_btree(WIDE_INDEX_ID)?;
    println!("\nDemo completed successfully!");
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        error!("demo failed: {}", e);
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
