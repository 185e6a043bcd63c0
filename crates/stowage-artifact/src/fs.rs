use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, instrument};

use crate::vfs::{Filesystem, MemFs, OsFs};
use crate::{BufferedReader, Error, Name, ObjectReader, Storage};

/// Permission bits for directories created on Unix.
pub const DIR_MODE: u32 = 0o755;

/// Size of the write buffer placed in front of every saved file.
pub const WRITE_BUFFER_SIZE: usize = 2 * 1024 * 1024;

/// Filesystem-based artifact storage.
///
/// Each object is stored at `{root}/{name}`. Parent directories are created
/// automatically on save and pruned again once a delete or move leaves them
/// empty.
pub struct FsStorage {
  fs: Box<dyn Filesystem>,
}

impl FsStorage {
  /// Create a storage over any [`Filesystem`].
  pub fn new(fs: impl Filesystem + 'static) -> Self {
    Self { fs: Box::new(fs) }
  }

  /// Create a storage rooted at a directory on disk.
  pub fn os(base_path: impl Into<PathBuf>) -> Self {
    Self::new(OsFs::new(base_path))
  }

  /// Create a storage over a fresh in-memory tree.
  pub fn memory() -> Self {
    Self::new(MemFs::new())
  }

  /// Create a storage rooted at `base_path`, or in memory when none is given.
  pub fn from_base(base_path: Option<PathBuf>) -> Self {
    match base_path {
      Some(path) => Self::os(path),
      None => Self::memory(),
    }
  }

  /// Best-effort removal of the empty directories above `name`.
  ///
  /// Walks the ancestors innermost first and stops at the storage root or at
  /// the first directory that cannot be removed, usually because it is not
  /// empty. Failures end the walk and are otherwise ignored. Returns how many
  /// directories were removed.
  pub(crate) async fn prune_empty_parents(&self, name: &Name) -> usize {
    let mut pruned = 0;
    for dir in name.as_path().ancestors().skip(1) {
      if dir.as_os_str().is_empty() {
        break;
      }
      if let Err(e) = self.fs.remove_dir(dir).await {
        debug!(dir = %dir.display(), error = %e, "stopped pruning");
        break;
      }
      pruned += 1;
    }
    pruned
  }

  /// Create the directory holding `name`. Top-level names create the root
  /// itself, which may not exist yet on disk.
  async fn create_parent(&self, name: &Name) -> Result<(), Error> {
    let parent = name.parent().unwrap_or(Path::new(""));
    self
      .fs
      .create_dir_all(parent)
      .await
      .map_err(|e| Error::from_io(name.as_str(), e))
  }
}

#[async_trait]
impl Storage for FsStorage {
  #[instrument(name = "fs_save", skip(self, reader))]
  async fn save(
    &self,
    name: &str,
    reader: &mut (dyn AsyncRead + Send + Unpin),
  ) -> Result<(), Error> {
    let name = Name::parse(name)?;
    self.create_parent(&name).await?;

    let file = self
      .fs
      .create(name.as_path())
      .await
      .map_err(|e| Error::from_io(name.as_str(), e))?;

    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
    let written = tokio::io::copy(reader, &mut writer).await?;
    writer.flush().await?;

    debug!(bytes = written, "saved");
    Ok(())
  }

  async fn open_file(&self, name: &str) -> Result<ObjectReader, Error> {
    let name = Name::parse(name)?;
    let file = self
      .fs
      .open(name.as_path())
      .await
      .map_err(|e| Error::from_io(name.as_str(), e))?;
    Ok(Box::pin(file))
  }

  #[instrument(name = "fs_delete", skip(self))]
  async fn delete(&self, name: &str) -> Result<(), Error> {
    let name = Name::parse(name)?;
    self
      .fs
      .remove_file(name.as_path())
      .await
      .map_err(|e| Error::from_io(name.as_str(), e))?;

    let pruned = self.prune_empty_parents(&name).await;
    debug!(pruned, "deleted");
    Ok(())
  }

  #[instrument(name = "fs_move", skip(self))]
  async fn move_object(&self, src: &str, dest: &str) -> Result<(), Error> {
    let src = Name::parse(src)?;
    let dest = Name::parse(dest)?;

    if src == dest {
      self
        .fs
        .open(src.as_path())
        .await
        .map_err(|e| Error::from_io(src.as_str(), e))?;
      return Ok(());
    }

    self.create_parent(&dest).await?;

    if let Err(e) = self.fs.rename(src.as_path(), dest.as_path()).await {
      // Leave nothing behind for a move that did not happen.
      self.prune_empty_parents(&dest).await;
      return Err(Error::from_io(src.as_str(), e));
    }

    self.prune_empty_parents(&src).await;
    Ok(())
  }

  async fn get_file(&self, name: &str) -> Result<BufferedReader, Error> {
    let name = Name::parse(name)?;
    let file = self
      .fs
      .open(name.as_path())
      .await
      .map_err(|e| Error::from_io(name.as_str(), e))?;
    Ok(Box::pin(BufReader::new(file)))
  }
}
