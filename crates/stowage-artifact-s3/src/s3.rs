//! [`ObjectClient`] implementation on top of `aws-sdk-s3`.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Builder as S3ConfigBuilder, RequestChecksumCalculation};
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_smithy_types::body::SdkBody;
use futures::TryStreamExt;
use http_body::Frame;
use http_body_util::StreamBody;
use stowage_artifact::{BufferedReader, Error, ErrorKind};
use tracing::{debug, info};
use url::form_urlencoded::byte_serialize;

use crate::client::{BodyStream, ObjectClient};
use crate::connection::ConnectionString;

/// Region used when the ambient configuration does not name one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// S3 client bound to one bucket.
pub struct S3ObjectClient {
  client: Client,
  bucket: String,
}

impl S3ObjectClient {
  /// Build a client for the endpoint and bucket of a parsed connection string.
  ///
  /// Credentials and region come from the ambient AWS configuration chain
  /// (environment, profile files, instance metadata). Request checksums are
  /// only computed when an operation requires them, so uploads can stream a
  /// body of unknown length.
  pub async fn connect(connection: &ConnectionString) -> Self {
    let region = RegionProviderChain::default_provider().or_else(DEFAULT_REGION);
    let shared = aws_config::defaults(BehaviorVersion::latest())
      .region(region)
      .load()
      .await;

    let endpoint = connection.endpoint().as_str().trim_end_matches('/');
    let config = S3ConfigBuilder::from(&shared)
      .endpoint_url(endpoint)
      .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
      .build();

    info!(endpoint, bucket = connection.bucket(), "object storage client configured");
    Self::new(Client::from_conf(config), connection.bucket())
  }

  /// Wrap an already configured SDK client.
  pub fn new(client: Client, bucket: impl Into<String>) -> Self {
    Self {
      client,
      bucket: bucket.into(),
    }
  }

  pub fn bucket(&self) -> &str {
    &self.bucket
  }
}

#[async_trait]
impl ObjectClient for S3ObjectClient {
  async fn put_object(&self, key: &str, body: BodyStream) -> Result<(), Error> {
    let body = StreamBody::new(body.map_ok(Frame::data));
    let body = ByteStream::new(SdkBody::from_body_1_x(body));

    // Unsigned payload: the body is streamed and never hashed up front.
    self
      .client
      .put_object()
      .bucket(&self.bucket)
      .key(key)
      .body(body)
      .customize()
      .disable_payload_signing()
      .send()
      .await
      .map_err(|e| classify(key, e))?;
    Ok(())
  }

  async fn get_object(&self, key: &str) -> Result<BufferedReader, Error> {
    let output = self
      .client
      .get_object()
      .bucket(&self.bucket)
      .key(key)
      .send()
      .await
      .map_err(|e| classify(key, e))?;
    Ok(Box::pin(output.body.into_async_read()))
  }

  async fn head_object(&self, key: &str) -> Result<(), Error> {
    self
      .client
      .head_object()
      .bucket(&self.bucket)
      .key(key)
      .send()
      .await
      .map_err(|e| classify(key, e))?;
    Ok(())
  }

  async fn copy_object(&self, src: &str, dest: &str) -> Result<(), Error> {
    self
      .client
      .copy_object()
      .bucket(&self.bucket)
      .copy_source(copy_source(&self.bucket, src))
      .key(dest)
      .send()
      .await
      .map_err(|e| classify(src, e))?;
    Ok(())
  }

  /// S3 reports success when the key does not exist.
  async fn delete_object(&self, key: &str) -> Result<(), Error> {
    self
      .client
      .delete_object()
      .bucket(&self.bucket)
      .key(key)
      .send()
      .await
      .map_err(|e| classify(key, e))?;
    Ok(())
  }
}

/// Build the `x-amz-copy-source` value. S3 decodes it, so each key segment is
/// percent-encoded while the `/` separators are kept.
fn copy_source(bucket: &str, key: &str) -> String {
  let key = key
    .split('/')
    .map(|segment| {
      // byte_serialize writes a space as `+` and a literal `+` as `%2B`.
      byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
    })
    .collect::<Vec<_>>()
    .join("/");
  format!("{bucket}/{key}")
}

/// Map an SDK failure onto the storage error kinds, keeping the SDK error as source.
fn classify<E>(key: &str, err: SdkError<E>) -> Error
where
  E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
  let kind = match &err {
    SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => ErrorKind::Unavailable,
    SdkError::ServiceError(service) => {
      let status = service.raw().status().as_u16();
      let code = service.err().code();
      debug!(key, status, code, "object request failed");
      kind_for(code, status)
    }
    _ => ErrorKind::Other,
  };
  Error::from_backend(kind, key, err)
}

fn kind_for(code: Option<&str>, status: u16) -> ErrorKind {
  match (code, status) {
    (Some("NoSuchKey" | "NotFound"), _) | (_, 404) => ErrorKind::NotFound,
    (Some("AccessDenied"), _) | (_, 401 | 403) => ErrorKind::PermissionDenied,
    (_, 500..=599) => ErrorKind::Unavailable,
    _ => ErrorKind::Other,
  }
}
