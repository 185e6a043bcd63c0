use std::fmt;
use std::path::Path;

use crate::Error;

/// A normalized object name.
///
/// Names are slash-separated and always relative to the backend root. The same
/// normalized string is used as a relative file path and as an object key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(String);

impl Name {
  /// Normalize a caller-supplied name.
  ///
  /// Empty and `.` segments are dropped and `..` removes the previous
  /// segment. A name that would climb above the root, that is empty after
  /// normalization, or that contains `\` or NUL is rejected.
  pub fn parse(raw: &str) -> Result<Self, Error> {
    let invalid = |reason| Error::InvalidName {
      name: raw.to_string(),
      reason,
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
      match segment {
        "" | "." => {}
        ".." => {
          if segments.pop().is_none() {
            return Err(invalid("escapes the storage root"));
          }
        }
        s if s.contains(['\\', '\0']) => {
          return Err(invalid("contains a backslash or NUL"));
        }
        s => segments.push(s),
      }
    }

    if segments.is_empty() {
      return Err(invalid("empty after normalization"));
    }

    Ok(Self(segments.join("/")))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// The name as a path relative to the backend root.
  pub fn as_path(&self) -> &Path {
    Path::new(&self.0)
  }

  /// The directory holding this name, or `None` for a top-level name.
  pub fn parent(&self) -> Option<&Path> {
    self
      .as_path()
      .parent()
      .filter(|parent| !parent.as_os_str().is_empty())
  }
}

impl fmt::Display for Name {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for Name {
  fn as_ref(&self) -> &str {
    &self.0
  }
}
