use std::sync::Arc;

use stowage_artifact::{Error, FsStorage, Storage};
use stowage_artifact_s3::ObjectStorage;
use stowage_config::StorageConfig;
use tracing::{info, warn};

/// Build the one storage backend described by `config`.
pub async fn open_storage(config: &StorageConfig) -> Result<Arc<dyn Storage>, Error> {
  match config {
    StorageConfig::Filesystem { base_dir } => {
      match base_dir {
        Some(dir) => info!(base_dir = %dir.display(), "using filesystem storage"),
        None => warn!("no base_dir configured, using an in-memory tree that is discarded on exit"),
      }
      Ok(Arc::new(FsStorage::from_base(base_dir.clone())))
    }
    StorageConfig::ObjectStorage { connection, domain } => {
      let storage = ObjectStorage::connect(connection, domain.clone()).await?;
      Ok(Arc::new(storage))
    }
  }
}
