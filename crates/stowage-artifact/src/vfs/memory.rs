use std::collections::BTreeMap;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::io::AsyncWrite;

use super::{FileReader, FileWriter, Filesystem};

#[derive(Debug, Clone)]
enum Node {
  Dir,
  File(Bytes),
}

type Tree = BTreeMap<PathBuf, Node>;

/// In-memory filesystem.
///
/// Nothing is persisted. Clones share the same tree, so a test can keep a
/// handle to inspect what a storage wrote. The root is the empty path and
/// always exists.
#[derive(Debug, Clone, Default)]
pub struct MemFs {
  tree: Arc<Mutex<Tree>>,
}

impl MemFs {
  pub fn new() -> Self {
    Self::default()
  }

  /// Whether a directory exists at `path`.
  pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
    is_dir(&self.tree.lock(), path.as_ref())
  }

  /// Whether a file exists at `path`.
  pub fn is_file(&self, path: impl AsRef<Path>) -> bool {
    matches!(self.tree.lock().get(path.as_ref()), Some(Node::File(_)))
  }
}

fn is_dir(tree: &Tree, path: &Path) -> bool {
  path.as_os_str().is_empty() || matches!(tree.get(path), Some(Node::Dir))
}

fn has_children(tree: &Tree, path: &Path) -> bool {
  tree
    .keys()
    .any(|key| key.as_path() != path && key.starts_with(path))
}

fn parent_is_dir(tree: &Tree, path: &Path) -> bool {
  path.parent().is_some_and(|parent| is_dir(tree, parent))
}

fn not_found(path: &Path) -> io::Error {
  io::Error::new(io::ErrorKind::NotFound, format!("{}: no such file or directory", path.display()))
}

fn is_a_directory(path: &Path) -> io::Error {
  io::Error::new(io::ErrorKind::IsADirectory, format!("{}: is a directory", path.display()))
}

fn not_a_directory(path: &Path) -> io::Error {
  io::Error::new(io::ErrorKind::NotADirectory, format!("{}: not a directory", path.display()))
}

#[async_trait]
impl Filesystem for MemFs {
  async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
    let mut tree = self.tree.lock();
    let mut ancestors: Vec<&Path> = path
      .ancestors()
      .filter(|dir| !dir.as_os_str().is_empty())
      .collect();
    ancestors.reverse();

    for dir in ancestors {
      match tree.get(dir) {
        Some(Node::Dir) => {}
        Some(Node::File(_)) => return Err(not_a_directory(dir)),
        None => {
          tree.insert(dir.to_path_buf(), Node::Dir);
        }
      }
    }
    Ok(())
  }

  async fn create(&self, path: &Path) -> io::Result<FileWriter> {
    let mut tree = self.tree.lock();
    if is_dir(&tree, path) {
      return Err(is_a_directory(path));
    }
    if !parent_is_dir(&tree, path) {
      return Err(not_found(path));
    }
    tree.insert(path.to_path_buf(), Node::File(Bytes::new()));

    Ok(Box::new(MemFile {
      tree: self.tree.clone(),
      path: path.to_path_buf(),
      buf: Vec::new(),
    }))
  }

  async fn open(&self, path: &Path) -> io::Result<FileReader> {
    match self.tree.lock().get(path) {
      Some(Node::File(content)) => Ok(Box::new(Cursor::new(content.clone()))),
      Some(Node::Dir) => Err(is_a_directory(path)),
      None => Err(not_found(path)),
    }
  }

  async fn remove_file(&self, path: &Path) -> io::Result<()> {
    let mut tree = self.tree.lock();
    match tree.get(path) {
      Some(Node::File(_)) => {
        tree.remove(path);
        Ok(())
      }
      Some(Node::Dir) => Err(is_a_directory(path)),
      None => Err(not_found(path)),
    }
  }

  async fn remove_dir(&self, path: &Path) -> io::Result<()> {
    if path.as_os_str().is_empty() {
      return Err(io::Error::new(
        io::ErrorKind::PermissionDenied,
        "cannot remove the filesystem root",
      ));
    }

    let mut tree = self.tree.lock();
    match tree.get(path) {
      Some(Node::Dir) if has_children(&tree, path) => Err(io::Error::new(
        io::ErrorKind::DirectoryNotEmpty,
        format!("{}: directory not empty", path.display()),
      )),
      Some(Node::Dir) => {
        tree.remove(path);
        Ok(())
      }
      Some(Node::File(_)) => Err(not_a_directory(path)),
      None => Err(not_found(path)),
    }
  }

  async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
    let mut tree = self.tree.lock();
    let content = match tree.get(from) {
      Some(Node::File(content)) => content.clone(),
      Some(Node::Dir) => return Err(is_a_directory(from)),
      None => return Err(not_found(from)),
    };
    if from == to {
      return Ok(());
    }
    if is_dir(&tree, to) {
      return Err(is_a_directory(to));
    }
    if !parent_is_dir(&tree, to) {
      return Err(not_found(to));
    }

    tree.remove(from);
    tree.insert(to.to_path_buf(), Node::File(content));
    Ok(())
  }
}

/// Write handle into a [`MemFs`] file.
///
/// Written bytes are buffered in the handle and published to the tree on
/// flush and shutdown.
struct MemFile {
  tree: Arc<Mutex<Tree>>,
  path: PathBuf,
  buf: Vec<u8>,
}

impl MemFile {
  fn publish(&self) -> io::Result<()> {
    let mut tree = self.tree.lock();
    match tree.get_mut(&self.path) {
      Some(Node::File(content)) => {
        *content = Bytes::copy_from_slice(&self.buf);
        Ok(())
      }
      _ => Err(not_found(&self.path)),
    }
  }
}

impl AsyncWrite for MemFile {
  fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, data: &[u8]) -> Poll<io::Result<usize>> {
    self.get_mut().buf.extend_from_slice(data);
    Poll::Ready(Ok(data.len()))
  }

  fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
    Poll::Ready(self.publish())
  }

  fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
    Poll::Ready(self.publish())
  }
}
