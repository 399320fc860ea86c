//! Integration tests for the B-tree index.
//!
//! These verify behavior across open/close cycles, cache sizes and damaged
//! files that the unit tests don't cover.

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Once;

use pagetree::common::config::HEADER_SIZE;
use pagetree::{BTree, Error, KeyHash, TreeConfig};
use tempfile::tempdir;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pagetree=warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .try_init();
    });
}

fn config(order: usize, cache_capacity: usize) -> TreeConfig {
    TreeConfig::builder()
        .order(order)
        .cache_capacity(cache_capacity)
        .build()
}

fn open_int(path: &Path, order: usize, cache_capacity: usize) -> BTree<i64, u64> {
    BTree::open_with_config(path, config(order, cache_capacity)).unwrap()
}

/// Overwrite bytes of a closed index file.
fn damage(path: &Path, offset: u64, bytes: &[u8]) {
    let mut file = OpenOptions::new().write(true).open(path).unwrap();
    file.seek(SeekFrom::Start(offset)).unwrap();
    file.write_all(bytes).unwrap();
    file.sync_all().unwrap();
}

// ============================================================================
// Persistence
// ============================================================================

/// Entries, values and structure survive close and reopen.
#[test]
fn test_round_trip_across_reopen() {
    init_tracing();
    let dir = tempdir().unwrap();
    let path = dir.path().join("round_trip.idx");

    {
        let mut tree = open_int(&path, 5, 16);
        for key in 0..500 {
            assert!(tree.insert(&key, (key * key) as u64).unwrap());
        }
        for key in (0..500).step_by(5) {
            assert!(tree.delete(&key).unwrap());
        }
        tree.close().unwrap();
    }

    {
        let mut tree = open_int(&path, 5, 16);
        assert_eq!(tree.len(), 400);
        for key in 0..500 {
            let expected = (key % 5 != 0).then_some((key * key) as u64);
            assert_eq!(tree.find(&key).unwrap(), expected, "key {}", key);
        }
        tree.verify().unwrap();

        // Allocation resumes where it stopped.
        for key in 500..600 {
            assert!(tree.insert(&key, 0).unwrap());
        }
        tree.verify().unwrap();
    }
}

/// A reopened empty index is still usable.
#[test]
fn test_reopen_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.idx");

    open_int(&path, 4, 8).close().unwrap();

    let mut tree = open_int(&path, 4, 8);
    assert!(tree.is_empty());
    assert!(tree.insert(&1, 1).unwrap());
}

// ============================================================================
// Operations
// ============================================================================

/// Second insert of a key is refused and leaves the value alone.
#[test]
fn test_no_duplicates() {
    let dir = tempdir().unwrap();
    let mut tree = open_int(&dir.path().join("dup.idx"), 4, 8);

    for key in 0..50 {
        tree.insert(&key, 1).unwrap();
    }
    for key in 0..50 {
        assert!(!tree.insert(&key, 2).unwrap());
    }
    assert_eq!(tree.len(), 50);
    assert!((0..50).all(|key| tree.find(&key).unwrap() == Some(1)));
}

/// Deleted keys are gone and the count drops by one each time.
#[test]
fn test_delete_then_find() {
    let dir = tempdir().unwrap();
    let mut tree = open_int(&dir.path().join("delete.idx"), 4, 8);

    for key in 0..100 {
        tree.insert(&key, key as u64).unwrap();
    }
    for key in (0..100).rev() {
        let before = tree.len();
        assert!(tree.delete(&key).unwrap());
        assert_eq!(tree.len(), before - 1);
        assert_eq!(tree.find(&key).unwrap(), None);
        assert!(!tree.delete(&key).unwrap());
    }
    assert!(tree.is_empty());
    assert_eq!(tree.height().unwrap(), 1);
}

/// Order 4, keys 1..=13 ascending, then delete them all ascending.
#[test]
fn test_scenario_order_4() {
    init_tracing();
    let dir = tempdir().unwrap();
    let mut tree = open_int(&dir.path().join("scenario4.idx"), 4, 3000);

    for key in 1..=13 {
        assert!(tree.insert(&key, key as u64 * 100).unwrap());
    }
    assert_eq!(tree.height().unwrap(), 3);
    let report = tree.verify().unwrap();
    assert_eq!(report.root_keys, vec![KeyHash(9)]);
    assert_eq!(report.entry_count, 13);

    for key in 1..=13 {
        assert!(tree.delete(&key).unwrap());
        assert_eq!(tree.len(), 13 - key as u64);
        for remaining in key + 1..=13 {
            assert_eq!(tree.find(&remaining).unwrap(), Some(remaining as u64 * 100));
        }
        tree.verify().unwrap();
    }
    assert!(tree.is_empty());
}

/// Order 6, keys 1..=13: two levels with [4, 8] in the root.
#[test]
fn test_scenario_order_6() {
    let dir = tempdir().unwrap();
    let mut tree = open_int(&dir.path().join("scenario6.idx"), 6, 3000);

    for key in 1..=13 {
        assert!(tree.insert(&key, key as u64).unwrap());
    }
    assert_eq!(tree.height().unwrap(), 2);
    assert_eq!(
        tree.verify().unwrap().root_keys,
        vec![KeyHash(4), KeyHash(8)]
    );

    for key in 1..=13 {
        assert!(tree.delete(&key).unwrap());
        for remaining in key + 1..=13 {
            assert_eq!(tree.find(&remaining).unwrap(), Some(remaining as u64));
        }
        tree.verify().unwrap();
    }
}

/// String keys are addressed through their hash.
#[test]
fn test_string_keys() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("strings.idx");

    {
        let mut tree: BTree<str, [u8; 8]> =
            BTree::open_with_config(&path, config(8, 32)).unwrap();
        for i in 0..300u64 {
            let key = format!("user-{:04}", i);
            assert!(tree.insert(key.as_str(), i.to_le_bytes()).unwrap());
        }
        assert!(!tree.insert("user-0042", [0; 8]).unwrap());
        assert!(tree.modify("user-0042", *b"changed!").unwrap());
        assert!(tree.delete("user-0007").unwrap());
        tree.close().unwrap();
    }

    let tree: BTree<str, [u8; 8]> = BTree::open_with_config(&path, config(8, 32)).unwrap();
    assert_eq!(tree.len(), 299);
    assert_eq!(tree.find("user-0042").unwrap(), Some(*b"changed!"));
    assert_eq!(tree.find("user-0100").unwrap(), Some(100u64.to_le_bytes()));
    assert_eq!(tree.find("user-0007").unwrap(), None);
    assert_eq!(tree.find("nobody").unwrap(), None);
    tree.verify().unwrap();
}

// ============================================================================
// Cache behavior
// ============================================================================

fn run_workload(path: &Path, cache_capacity: usize) -> Vec<Option<u64>> {
    let mut tree = open_int(path, 4, cache_capacity);
    for i in 0..400i64 {
        let key = (i * 7919) % 400;
        tree.insert(&key, i as u64).unwrap();
    }
    for key in (0..400).step_by(3) {
        tree.delete(&key).unwrap();
    }
    for key in (0..400).step_by(7) {
        tree.modify(&key, 7).unwrap();
    }
    for key in 400..450 {
        tree.insert(&key, 1).unwrap();
    }
    let results = (0..450).map(|key| tree.find(&key).unwrap()).collect();
    tree.close().unwrap();
    results
}

/// A one-record cache and a large cache produce the same answers and the
/// same file.
#[test]
fn test_cache_size_independence() {
    init_tracing();
    let dir = tempdir().unwrap();
    let small_path = dir.path().join("small.idx");
    let large_path = dir.path().join("large.idx");

    let small = run_workload(&small_path, 1);
    let large = run_workload(&large_path, 3000);

    assert_eq!(small, large);
    assert_eq!(
        std::fs::read(&small_path).unwrap(),
        std::fs::read(&large_path).unwrap()
    );
}

/// A cache far smaller than the tree still evicts and reloads correctly.
#[test]
fn test_small_cache_statistics() {
    let dir = tempdir().unwrap();
    let mut tree = open_int(&dir.path().join("stats.idx"), 4, 2);

    for key in 0..200 {
        tree.insert(&key, 0).unwrap();
    }
    let stats = tree.cache_stats();
    assert!(stats.evictions > 0);
    assert!(stats.cache_misses > 0);
    assert!(stats.records_written >= stats.evictions);
}

// ============================================================================
// Damaged files
// ============================================================================

#[test]
fn test_bad_magic_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("magic.idx");
    open_int(&path, 4, 8).close().unwrap();

    damage(&path, 0, b"NOTATREE");
    let result: pagetree::Result<BTree<i64, u64>> = BTree::open(&path);
    assert!(matches!(result, Err(Error::Corrupted(_))));
}

#[test]
fn test_header_checksum_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("checksum.idx");
    {
        let mut tree = open_int(&path, 4, 8);
        tree.insert(&1, 1).unwrap();
        tree.close().unwrap();
    }

    // Flip a byte of the stored key count.
    damage(&path, 32, &[0x7F]);
    let result: pagetree::Result<BTree<i64, u64>> = BTree::open(&path);
    assert!(matches!(result, Err(Error::Corrupted(_))));
}

#[test]
fn test_truncated_file_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("short.idx");
    std::fs::write(&path, b"PGTREE").unwrap();

    let result: pagetree::Result<BTree<i64, u64>> = BTree::open(&path);
    assert!(matches!(result, Err(Error::Corrupted(_))));
}

/// Garbage in node records yields errors or answers, never a panic.
#[test]
fn test_damaged_records_do_not_panic() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("records.idx");
    {
        let mut tree = open_int(&path, 4, 8);
        for key in 0..200 {
            tree.insert(&key, key as u64).unwrap();
        }
        tree.close().unwrap();
    }

    let len = std::fs::metadata(&path).unwrap().len();
    let noise: Vec<u8> = (0..(len - HEADER_SIZE as u64))
        .map(|i| (i.wrapping_mul(2_654_435_761) >> 7) as u8)
        .collect();
    damage(&path, HEADER_SIZE as u64, &noise);

    let tree: BTree<i64, u64> = BTree::open_with_config(&path, config(4, 8)).unwrap();
    for key in 0..200 {
        let _ = tree.find(&key);
    }
    assert!(tree.verify().is_err());
    let _ = tree.dump();
}

/// A child pointer aimed back at the root is caught instead of looping.
#[test]
fn test_cyclic_child_pointer_detected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cycle.idx");
    let root;
    {
        let mut tree = open_int(&path, 4, 8);
        for key in 1..=4 {
            tree.insert(&key, 0).unwrap();
        }
        root = tree.root();
        tree.close().unwrap();
    }

    // Root is [3] over two leaves; point its first child back at itself.
    let record_size = (12 + 8 * 4 + 8 * 4 + 8 * 5) as u64;
    let children_start = root.get() + record_size - 8 * 5;
    damage(&path, children_start, &root.to_le_bytes());

    let tree: BTree<i64, u64> = BTree::open_with_config(&path, config(4, 8)).unwrap();
    assert!(matches!(tree.find(&1), Err(Error::Corrupted(_))));
    assert!(tree.verify().is_err());
}
