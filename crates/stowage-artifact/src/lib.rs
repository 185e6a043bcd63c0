//! Stowage Artifact
//!
//! This crate provides the artifact storage trait and the filesystem
//! implementation for Stowage. Artifacts are named byte streams that callers
//! save, read, move and delete without knowing which medium holds them.
//!
//! The [`Storage`] trait is the whole contract. Implementations translate a
//! normalized [`Name`] into backend addressing: a relative file path for
//! [`FsStorage`], an object key for the object-storage adapter in
//! `stowage-artifact-s3`.
//!
//! Callers are expected to hold an `Arc<dyn Storage>` and never a concrete
//! backend type.

mod error;
mod fs;
mod name;
pub mod vfs;

pub use error::{BoxError, Error, ErrorKind};
pub use fs::{DIR_MODE, FsStorage, WRITE_BUFFER_SIZE};
pub use name::Name;

use std::pin::Pin;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncRead};

/// A reader over an object's raw bytes. Dropping it releases the backend resource.
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send>>;

/// A buffered reader over an object's bytes.
pub type BufferedReader = Pin<Box<dyn AsyncBufRead + Send>>;

/// Artifact storage trait.
///
/// Every backend implements the same five operations with the same external
/// semantics. Names are normalized with [`Name::parse`] before they reach the
/// backend, so `a//b/./c.txt` and `a/b/c.txt` address the same object
/// everywhere.
///
/// No operation retries, and no operation arbitrates between concurrent
/// callers using the same name.
#[async_trait]
pub trait Storage: Send + Sync {
  /// Store the full contents of `reader` under `name`, replacing any
  /// existing object.
  ///
  /// Missing intermediate structure implied by the name is created first.
  /// The reader is drained but never closed; it stays owned by the caller.
  async fn save(&self, name: &str, reader: &mut (dyn AsyncRead + Send + Unpin))
  -> Result<(), Error>;

  /// Open an object for reading.
  ///
  /// Fails with [`ErrorKind::NotFound`] if nothing is stored under `name`.
  async fn open_file(&self, name: &str) -> Result<ObjectReader, Error>;

  /// Delete an object.
  ///
  /// Hierarchical backends also prune ancestor directories left empty by the
  /// deletion. Pruning is best-effort and never affects the result.
  async fn delete(&self, name: &str) -> Result<(), Error>;

  /// Relocate an object from `src` to `dest`.
  ///
  /// On success the object exists at `dest` and not at `src`. A failure
  /// before the object reaches `dest` leaves `src` untouched. Backends that
  /// emulate the move as copy+delete report a failed delete as
  /// [`Error::MoveIncomplete`]; in that case the object exists under both
  /// names.
  async fn move_object(&self, src: &str, dest: &str) -> Result<(), Error>;

  /// Open an object through a buffered read path.
  ///
  /// Same addressing and failure semantics as [`Storage::open_file`]. The
  /// returned reader still owns a backend resource that is released on drop.
  async fn get_file(&self, name: &str) -> Result<BufferedReader, Error>;
}
