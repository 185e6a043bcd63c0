//! Virtual filesystem layer under [`FsStorage`](crate::FsStorage).
//!
//! A [`Filesystem`] is a tree rooted somewhere the caller cannot see past.
//! Paths handed to it are relative to that root:
//!
//! - [`OsFs`]: a real directory, with every path confined to the base
//! - [`MemFs`]: an ephemeral in-memory tree, useful for tests
//!
//! Both report failures as [`std::io::Error`] with the same kinds the
//! operating system would use.

mod memory;
mod os;

pub use memory::MemFs;
pub use os::OsFs;

use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// A writable file handle. Data is durable once the handle has been flushed.
pub type FileWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// A readable file handle.
pub type FileReader = Box<dyn AsyncRead + Send + Unpin>;

/// Minimal rooted filesystem operations.
#[async_trait]
pub trait Filesystem: Send + Sync {
  /// Create a directory and all of its missing ancestors.
  async fn create_dir_all(&self, path: &Path) -> io::Result<()>;

  /// Create or truncate a file. The parent directory must exist.
  async fn create(&self, path: &Path) -> io::Result<FileWriter>;

  /// Open a file for reading.
  async fn open(&self, path: &Path) -> io::Result<FileReader>;

  async fn remove_file(&self, path: &Path) -> io::Result<()>;

  /// Remove a directory. Fails unless the directory is empty.
  async fn remove_dir(&self, path: &Path) -> io::Result<()>;

  /// Rename a file, replacing any file already at `to`.
  async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}
