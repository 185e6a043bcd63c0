use std::fmt;

use stowage_artifact::Error;
use url::Url;

/// Parsed object-storage connection string.
///
/// The accepted form is `scheme://endpoint:accessKey:secretKey:bucket`, with
/// exactly four colon-separated fields after the scheme. Because `:` splits
/// the fields, the endpoint is a bare host (optionally with a path) and
/// cannot carry a port.
///
/// The scheme picks the endpoint protocol when it is `http` or `https`. Any
/// other scheme, such as `s3`, resolves to `https`.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString {
  endpoint: Url,
  access_key: String,
  secret_key: String,
  bucket: String,
}

impl ConnectionString {
  /// Parse a connection string without touching the network.
  pub fn parse(raw: &str) -> Result<Self, Error> {
    let (scheme, rest) = raw
      .split_once("://")
      .ok_or_else(|| Error::Configuration("connection string has no scheme separator".to_string()))?;
    if rest.contains("://") {
      return Err(Error::Configuration(
        "connection string has more than one scheme separator".to_string(),
      ));
    }

    let fields: Vec<&str> = rest.split(':').collect();
    let [endpoint, access_key, secret_key, bucket] = fields.as_slice() else {
      return Err(Error::Configuration(format!(
        "expected 4 colon-separated fields after the scheme, found {}",
        fields.len()
      )));
    };

    if endpoint.is_empty() {
      return Err(Error::Configuration("connection string has an empty endpoint".to_string()));
    }
    if bucket.is_empty() {
      return Err(Error::Configuration("connection string has an empty bucket".to_string()));
    }

    Ok(Self {
      endpoint: resolve_endpoint(scheme, endpoint)?,
      access_key: access_key.to_string(),
      secret_key: secret_key.to_string(),
      bucket: bucket.to_string(),
    })
  }

  /// The fully qualified endpoint URL.
  pub fn endpoint(&self) -> &Url {
    &self.endpoint
  }

  pub fn access_key(&self) -> &str {
    &self.access_key
  }

  pub fn secret_key(&self) -> &str {
    &self.secret_key
  }

  pub fn bucket(&self) -> &str {
    &self.bucket
  }
}

impl fmt::Debug for ConnectionString {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ConnectionString")
      .field("endpoint", &self.endpoint.as_str())
      .field("access_key", &self.access_key)
      .field("secret_key", &"<redacted>")
      .field("bucket", &self.bucket)
      .finish()
  }
}

/// Turn the endpoint field into a full URL, defaulting to `https`.
fn resolve_endpoint(scheme: &str, endpoint: &str) -> Result<Url, Error> {
  let scheme = if scheme.eq_ignore_ascii_case("http") {
    "http"
  } else {
    "https"
  };

  let url = Url::parse(&format!("{scheme}://{endpoint}"))
    .map_err(|e| Error::Configuration(format!("invalid endpoint {endpoint:?}: {e}")))?;
  if url.host_str().is_none_or(str::is_empty) {
    return Err(Error::Configuration(format!("endpoint {endpoint:?} has no host")));
  }
  Ok(url)
}
