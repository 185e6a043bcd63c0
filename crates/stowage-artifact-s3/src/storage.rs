use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use stowage_artifact::{BufferedReader, Error, Name, ObjectReader, Storage};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument, warn};

use crate::client::ObjectClient;
use crate::connection::ConnectionString;
use crate::s3::S3ObjectClient;

/// Size of the chunks read from a caller's stream during an upload.
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Chunks allowed in flight between the reader and the upload.
const UPLOAD_QUEUE_DEPTH: usize = 4;

/// Object-storage artifact storage.
///
/// Each object is stored under its normalized name as the key. There are no
/// directories on the server, so nothing is created or pruned around the key.
pub struct ObjectStorage<C = S3ObjectClient> {
  client: C,
  domain: String,
}

impl ObjectStorage<S3ObjectClient> {
  /// Parse `connection` and build an S3-backed storage.
  ///
  /// A malformed connection string fails here with
  /// [`Error::Configuration`] before any client is built.
  /// `domain` is kept for callers building public URLs; the storage never
  /// uses it.
  pub async fn connect(connection: &str, domain: impl Into<String>) -> Result<Self, Error> {
    let connection = ConnectionString::parse(connection)?;
    let client = S3ObjectClient::connect(&connection).await;
    Ok(Self::with_client(client, domain))
  }
}

impl<C: ObjectClient> ObjectStorage<C> {
  pub fn with_client(client: C, domain: impl Into<String>) -> Self {
    Self {
      client,
      domain: domain.into(),
    }
  }

  /// The public domain objects are served from.
  pub fn domain(&self) -> &str {
    &self.domain
  }

  pub fn client(&self) -> &C {
    &self.client
  }
}

/// Forward the reader's chunks into the upload channel until EOF.
///
/// Stops early, without error, if the upload stops listening. A read error is
/// forwarded so the upload fails too, and then returned.
async fn pump(
  reader: &mut (dyn AsyncRead + Send + Unpin),
  mut tx: mpsc::Sender<io::Result<Bytes>>,
) -> io::Result<u64> {
  let mut chunks = ReaderStream::with_capacity(reader, UPLOAD_CHUNK_SIZE);
  let mut total = 0u64;

  while let Some(chunk) = chunks.next().await {
    match chunk {
      Ok(bytes) => {
        total += bytes.len() as u64;
        if tx.send(Ok(bytes)).await.is_err() {
          break;
        }
      }
      Err(e) => {
        let _ = tx.send(Err(io::Error::new(e.kind(), e.to_string()))).await;
        return Err(e);
      }
    }
  }
  Ok(total)
}

#[async_trait]
impl<C: ObjectClient + 'static> Storage for ObjectStorage<C> {
  #[instrument(name = "object_save", skip(self, reader))]
  async fn save(
    &self,
    name: &str,
    reader: &mut (dyn AsyncRead + Send + Unpin),
  ) -> Result<(), Error> {
    let name = Name::parse(name)?;
    let (tx, rx) = mpsc::channel(UPLOAD_QUEUE_DEPTH);

    let (read, upload) = tokio::join!(
      pump(reader, tx),
      self.client.put_object(name.as_str(), Box::pin(rx))
    );

    // A read failure is the root cause of any upload failure it triggered.
    let bytes = read?;
    upload?;
    debug!(bytes, "saved");
    Ok(())
  }

  async fn open_file(&self, name: &str) -> Result<ObjectReader, Error> {
    let name = Name::parse(name)?;
    let body = self.client.get_object(name.as_str()).await?;
    Ok(Box::pin(body))
  }

  async fn delete(&self, name: &str) -> Result<(), Error> {
    let name = Name::parse(name)?;
    self.client.delete_object(name.as_str()).await
  }

  #[instrument(name = "object_move", skip(self))]
  async fn move_object(&self, src: &str, dest: &str) -> Result<(), Error> {
    let src = Name::parse(src)?;
    let dest = Name::parse(dest)?;

    if src == dest {
      return self.client.head_object(src.as_str()).await;
    }

    self
      .client
      .copy_object(src.as_str(), dest.as_str())
      .await?;

    if let Err(e) = self.client.delete_object(src.as_str()).await {
      warn!(error = %e, "copied object but could not remove the source");
      return Err(Error::MoveIncomplete {
        src: src.to_string(),
        dest: dest.to_string(),
        source: Box::new(e),
      });
    }
    Ok(())
  }

  async fn get_file(&self, name: &str) -> Result<BufferedReader, Error> {
    let name = Name::parse(name)?;
    self.client.get_object(name.as_str()).await
  }
}
