use std::io;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use stowage_artifact::{BufferedReader, Error};

/// A stream of body chunks handed to [`ObjectClient::put_object`].
pub type BodyStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + Sync>>;

/// Low-level object operations against one bucket.
///
/// [`S3ObjectClient`](crate::S3ObjectClient) talks to an S3-compatible
/// service. Errors must already be classified into
/// [`stowage_artifact::ErrorKind`] by the implementation.
#[async_trait]
pub trait ObjectClient: Send + Sync {
  /// Upload a whole object in a single request.
  async fn put_object(&self, key: &str, body: BodyStream) -> Result<(), Error>;

  /// Download an object. The response body is returned as-is.
  async fn get_object(&self, key: &str) -> Result<BufferedReader, Error>;

  /// Check that an object exists.
  async fn head_object(&self, key: &str) -> Result<(), Error>;

  /// Server-side copy within the bucket.
  async fn copy_object(&self, src: &str, dest: &str) -> Result<(), Error>;

  async fn delete_object(&self, key: &str) -> Result<(), Error>;
}

#[async_trait]
impl<T: ObjectClient + ?Sized> ObjectClient for Arc<T> {
  async fn put_object(&self, key: &str, body: BodyStream) -> Result<(), Error> {
    (**self).put_object(key, body).await
  }

  async fn get_object(&self, key: &str) -> Result<BufferedReader, Error> {
    (**self).get_object(key).await
  }

  async fn head_object(&self, key: &str) -> Result<(), Error> {
    (**self).head_object(key).await
  }

  async fn copy_object(&self, src: &str, dest: &str) -> Result<(), Error> {
    (**self).copy_object(src, dest).await
  }

  async fn delete_object(&self, key: &str) -> Result<(), Error> {
    (**self).delete_object(key).await
  }
}
