//! Contract tests for FsStorage over both the in-memory and the on-disk tree.

use std::sync::Arc;

use stowage_artifact::vfs::MemFs;
use stowage_artifact::{Error, ErrorKind, FsStorage, Storage};
use tokio::io::{AsyncBufReadExt, AsyncReadExt};

async fn save(storage: &dyn Storage, name: &str, data: &str) {
  let mut reader = data.as_bytes();
  storage
    .save(name, &mut reader)
    .await
    .expect("save should succeed");
}

async fn open_string(storage: &dyn Storage, name: &str) -> Result<String, Error> {
  let mut out = String::new();
  storage.open_file(name).await?.read_to_string(&mut out).await?;
  Ok(out)
}

async fn get_string(storage: &dyn Storage, name: &str) -> Result<String, Error> {
  let mut out = String::new();
  storage.get_file(name).await?.read_to_string(&mut out).await?;
  Ok(out)
}

/// Run the same scenario against an in-memory storage and an on-disk one.
/// The callback receives the storage and a probe telling whether a directory
/// exists relative to the storage root.
async fn on_both<F, Fut>(scenario: F)
where
  F: Fn(Arc<dyn Storage>, Box<dyn Fn(&str) -> bool>) -> Fut,
  Fut: std::future::Future<Output = ()>,
{
  let mem = MemFs::new();
  let probe = mem.clone();
  scenario(
    Arc::new(FsStorage::new(mem)),
    Box::new(move |dir| probe.is_dir(dir)),
  )
  .await;

  let temp = tempfile::tempdir().expect("failed to create temp dir");
  let root = temp.path().to_path_buf();
  scenario(
    Arc::new(FsStorage::os(&root)),
    Box::new(move |dir| root.join(dir).is_dir()),
  )
  .await;
}

#[tokio::test]
async fn test_round_trip() {
  on_both(|storage, _| async move {
    save(storage.as_ref(), "reports/2024/q1.csv", "a,b\n1,2\n").await;

    assert_eq!(
      open_string(storage.as_ref(), "reports/2024/q1.csv")
        .await
        .unwrap(),
      "a,b\n1,2\n"
    );
    assert_eq!(
      get_string(storage.as_ref(), "reports/2024/q1.csv")
        .await
        .unwrap(),
      "a,b\n1,2\n"
    );
  })
  .await;
}

#[tokio::test]
async fn test_save_replaces_existing() {
  on_both(|storage, _| async move {
    save(storage.as_ref(), "a.txt", "a much longer first version").await;
    save(storage.as_ref(), "a.txt", "short").await;
    assert_eq!(open_string(storage.as_ref(), "a.txt").await.unwrap(), "short");
  })
  .await;
}

#[tokio::test]
async fn test_save_empty_object() {
  on_both(|storage, _| async move {
    save(storage.as_ref(), "empty", "").await;
    assert_eq!(get_string(storage.as_ref(), "empty").await.unwrap(), "");
  })
  .await;
}

#[tokio::test]
async fn test_save_materializes_directories() {
  on_both(|storage, dir_exists| async move {
    save(storage.as_ref(), "x/y/z/file.bin", "data").await;
    assert!(dir_exists("x"));
    assert!(dir_exists("x/y"));
    assert!(dir_exists("x/y/z"));
  })
  .await;
}

#[tokio::test]
async fn test_missing_object_is_not_found() {
  on_both(|storage, _| async move {
    let err = storage.open_file("nope.txt").await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = storage.get_file("nope/deeper.txt").await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::NotFound);
  })
  .await;
}

#[tokio::test]
async fn test_delete_then_read_is_not_found() {
  on_both(|storage, _| async move {
    save(storage.as_ref(), "a/b.txt", "bye").await;
    storage.delete("a/b.txt").await.unwrap();

    assert!(open_string(storage.as_ref(), "a/b.txt")
      .await
      .unwrap_err()
      .is_not_found());
    assert!(get_string(storage.as_ref(), "a/b.txt")
      .await
      .unwrap_err()
      .is_not_found());
  })
  .await;
}

#[tokio::test]
async fn test_delete_missing_fails() {
  on_both(|storage, _| async move {
    let err = storage.delete("ghost.txt").await.unwrap_err();
    assert!(err.is_not_found());
  })
  .await;
}

#[tokio::test]
async fn test_delete_prunes_empty_ancestors() {
  on_both(|storage, dir_exists| async move {
    save(storage.as_ref(), "a/b/c/only.txt", "1").await;
    storage.delete("a/b/c/only.txt").await.unwrap();

    assert!(!dir_exists("a/b/c"));
    assert!(!dir_exists("a/b"));
    assert!(!dir_exists("a"));
  })
  .await;
}

#[tokio::test]
async fn test_delete_keeps_shared_ancestor() {
  on_both(|storage, dir_exists| async move {
    save(storage.as_ref(), "a/sibling.txt", "keep").await;
    save(storage.as_ref(), "a/b/gone.txt", "drop").await;
    storage.delete("a/b/gone.txt").await.unwrap();

    assert!(!dir_exists("a/b"));
    assert!(dir_exists("a"));
    assert_eq!(
      open_string(storage.as_ref(), "a/sibling.txt").await.unwrap(),
      "keep"
    );
  })
  .await;
}

#[tokio::test]
async fn test_move_relocates_object() {
  on_both(|storage, dir_exists| async move {
    save(storage.as_ref(), "a/b/c.txt", "hello").await;
    storage.move_object("a/b/c.txt", "a/d.txt").await.unwrap();

    assert_eq!(get_string(storage.as_ref(), "a/d.txt").await.unwrap(), "hello");
    let err = open_string(storage.as_ref(), "a/b/c.txt").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!dir_exists("a/b"));
    assert!(dir_exists("a"));
  })
  .await;
}

#[tokio::test]
async fn test_move_creates_destination_directories() {
  on_both(|storage, dir_exists| async move {
    save(storage.as_ref(), "in.txt", "payload").await;
    storage
      .move_object("in.txt", "archive/2024/out.txt")
      .await
      .unwrap();

    assert!(dir_exists("archive/2024"));
    assert_eq!(
      open_string(storage.as_ref(), "archive/2024/out.txt")
        .await
        .unwrap(),
      "payload"
    );
  })
  .await;
}

#[tokio::test]
async fn test_move_replaces_destination() {
  on_both(|storage, _| async move {
    save(storage.as_ref(), "new.txt", "new").await;
    save(storage.as_ref(), "old.txt", "old").await;
    storage.move_object("new.txt", "old.txt").await.unwrap();
    assert_eq!(open_string(storage.as_ref(), "old.txt").await.unwrap(), "new");
  })
  .await;
}

#[tokio::test]
async fn test_move_missing_source_leaves_nothing() {
  on_both(|storage, dir_exists| async move {
    let err = storage
      .move_object("missing/src.txt", "target/dir/dest.txt")
      .await
      .unwrap_err();
    assert!(err.is_not_found());

    assert!(open_string(storage.as_ref(), "target/dir/dest.txt")
      .await
      .unwrap_err()
      .is_not_found());
    assert!(!dir_exists("target/dir"));
    assert!(!dir_exists("target"));
  })
  .await;
}

#[tokio::test]
async fn test_get_file_is_buffered() {
  on_both(|storage, _| async move {
    save(storage.as_ref(), "lines.txt", "first\nsecond\n").await;

    let mut reader = storage.get_file("lines.txt").await.unwrap();
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    assert_eq!(line, "first\n");
  })
  .await;
}

#[tokio::test]
async fn test_names_are_normalized() {
  on_both(|storage, _| async move {
    save(storage.as_ref(), "/a//b/./c.txt", "norm").await;
    assert_eq!(open_string(storage.as_ref(), "a/b/c.txt").await.unwrap(), "norm");
  })
  .await;
}

#[tokio::test]
async fn test_escaping_names_are_rejected() {
  on_both(|storage, _| async move {
    let mut reader: &[u8] = b"evil";
    let err = storage
      .save("../outside.txt", &mut reader)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::InvalidName { .. }));
    assert_eq!(err.kind(), ErrorKind::Other);
  })
  .await;
}

#[tokio::test]
async fn test_os_storage_writes_under_base() {
  let temp = tempfile::tempdir().unwrap();
  let storage = FsStorage::os(temp.path().join("base"));
  save(&storage, "nested/file.txt", "on disk").await;

  let on_disk = std::fs::read_to_string(temp.path().join("base/nested/file.txt")).unwrap();
  assert_eq!(on_disk, "on disk");
  assert!(!temp.path().join("nested").exists());
}

#[tokio::test]
async fn test_top_level_save_creates_missing_base() {
  let temp = tempfile::tempdir().unwrap();
  let base = temp.path().join("fresh");
  let storage = FsStorage::os(&base);

  save(&storage, "top.txt", "hi").await;

  assert!(base.is_dir());
  assert_eq!(std::fs::read_to_string(base.join("top.txt")).unwrap(), "hi");
  assert_eq!(open_string(&storage, "top.txt").await.unwrap(), "hi");
}

#[tokio::test]
async fn test_opening_a_directory_fails_up_front() {
  on_both(|storage, _| async move {
    save(storage.as_ref(), "dir/inner.txt", "x").await;

    let err = storage.open_file("dir").await.err().unwrap();
    match err {
      Error::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::IsADirectory),
      other => panic!("expected an io error, got {other:?}"),
    }
    assert!(storage.get_file("dir").await.is_err());
  })
  .await;
}

#[tokio::test]
async fn test_save_does_not_close_caller_reader() {
  let storage = FsStorage::from_base(None);
  let mut cursor = std::io::Cursor::new(b"one".to_vec());
  storage.save("r.txt", &mut cursor).await.unwrap();

  // The caller still owns the reader and can keep using it.
  cursor.set_position(0);
  let mut again = String::new();
  cursor.read_to_string(&mut again).await.unwrap();
  assert_eq!(again, "one");
}
