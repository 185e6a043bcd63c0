use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, DirBuilder, File};

use super::{FileReader, FileWriter, Filesystem};

/// Filesystem rooted at a directory on disk.
///
/// Every path is joined onto `root` only if all of its components are plain
/// names, so `..`, absolute paths and prefixes cannot reach outside the base.
pub struct OsFs {
  root: PathBuf,
}

impl OsFs {
  /// Create a filesystem rooted at the given base path.
  ///
  /// The base does not need to exist yet; it is created by the first
  /// `create_dir_all`.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Get the base directory.
  pub fn root(&self) -> &Path {
    &self.root
  }

  fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
    if path
      .components()
      .all(|component| matches!(component, Component::Normal(_)))
    {
      Ok(self.root.join(path))
    } else {
      Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("path escapes the base directory: {}", path.display()),
      ))
    }
  }
}

#[async_trait]
impl Filesystem for OsFs {
  async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
    let path = self.resolve(path)?;
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(crate::DIR_MODE);
    builder.create(path).await
  }

  async fn create(&self, path: &Path) -> io::Result<FileWriter> {
    let file = File::create(self.resolve(path)?).await?;
    Ok(Box::new(file))
  }

  /// Directories are rejected here rather than on the first read.
  async fn open(&self, path: &Path) -> io::Result<FileReader> {
    let path = self.resolve(path)?;
    let file = File::open(&path).await?;
    if file.metadata().await?.is_dir() {
      return Err(io::Error::new(
        io::ErrorKind::IsADirectory,
        format!("{}: is a directory", path.display()),
      ));
    }
    Ok(Box::new(file))
  }

  async fn remove_file(&self, path: &Path) -> io::Result<()> {
    fs::remove_file(self.resolve(path)?).await
  }

  async fn remove_dir(&self, path: &Path) -> io::Result<()> {
    fs::remove_dir(self.resolve(path)?).await
  }

  async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(self.resolve(from)?, self.resolve(to)?).await
  }
}
