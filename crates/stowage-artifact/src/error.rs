//! Storage errors.

use std::io;

/// A boxed backend-native error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The closed set of failure kinds every backend reports through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  /// The addressed object does not exist.
  NotFound,
  /// The backend refused access.
  PermissionDenied,
  /// The backend could not be reached or failed transiently.
  Unavailable,
  /// Anything else, including configuration and name errors.
  Other,
}

/// Error type for artifact storage operations.
///
/// The backend-native error is kept as the source of each variant.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The requested object was not found.
  #[error("object not found: {name}")]
  NotFound {
    name: String,
    #[source]
    source: BoxError,
  },

  /// The backend denied access to the object.
  #[error("permission denied: {name}")]
  PermissionDenied {
    name: String,
    #[source]
    source: BoxError,
  },

  /// The backend could not be reached.
  #[error("storage backend unavailable: {source}")]
  Unavailable {
    #[source]
    source: BoxError,
  },

  /// The caller supplied a name that cannot address an object.
  #[error("invalid object name {name:?}: {reason}")]
  InvalidName { name: String, reason: &'static str },

  /// The backend could not be constructed from its configuration.
  #[error("invalid storage configuration: {0}")]
  Configuration(String),

  /// The copy half of a copy+delete move succeeded but the delete failed.
  #[error("copied {src} to {dest} but could not remove the source: {source}")]
  MoveIncomplete {
    src: String,
    dest: String,
    #[source]
    source: Box<Error>,
  },

  /// An I/O error outside of object addressing.
  #[error("io error: {0}")]
  Io(#[from] io::Error),

  /// Any other backend failure.
  #[error("backend error for {name}: {source}")]
  Backend {
    name: String,
    #[source]
    source: BoxError,
  },
}

impl Error {
  /// Build an error of the given kind around a backend-native error.
  pub fn from_backend(kind: ErrorKind, name: &str, source: impl Into<BoxError>) -> Self {
    let source = source.into();
    match kind {
      ErrorKind::NotFound => Error::NotFound {
        name: name.to_string(),
        source,
      },
      ErrorKind::PermissionDenied => Error::PermissionDenied {
        name: name.to_string(),
        source,
      },
      ErrorKind::Unavailable => Error::Unavailable { source },
      ErrorKind::Other => Error::Backend {
        name: name.to_string(),
        source,
      },
    }
  }

  /// Classify an I/O error raised while addressing `name`.
  pub fn from_io(name: &str, err: io::Error) -> Self {
    match err.kind() {
      io::ErrorKind::NotFound => Self::from_backend(ErrorKind::NotFound, name, err),
      io::ErrorKind::PermissionDenied => Self::from_backend(ErrorKind::PermissionDenied, name, err),
      _ => Error::Io(err),
    }
  }

  /// The kind of failure, independent of backend.
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::NotFound { .. } => ErrorKind::NotFound,
      Error::PermissionDenied { .. } => ErrorKind::PermissionDenied,
      Error::Unavailable { .. } => ErrorKind::Unavailable,
      Error::MoveIncomplete { source, .. } => source.kind(),
      Error::InvalidName { .. } | Error::Configuration(_) | Error::Io(_) | Error::Backend { .. } => {
        ErrorKind::Other
      }
    }
  }

  pub fn is_not_found(&self) -> bool {
    self.kind() == ErrorKind::NotFound
  }
}
