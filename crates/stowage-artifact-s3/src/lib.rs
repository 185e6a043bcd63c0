//! Stowage Artifact S3
//!
//! Object-storage backend for [`stowage_artifact::Storage`]. Objects live in a
//! single bucket of an S3-compatible service; the normalized object name is
//! used directly as the key.
//!
//! The backend is configured from one connection string of the form
//! `scheme://endpoint:accessKey:secretKey:bucket` (see [`ConnectionString`]).
//! Credentials and region are resolved from the ambient AWS configuration
//! chain.
//!
//! There is no server-side rename, so [`Storage::move_object`] is a copy
//! followed by a delete. A failed delete after a successful copy is reported
//! as [`Error::MoveIncomplete`](stowage_artifact::Error::MoveIncomplete).
//!
//! [`Storage::move_object`]: stowage_artifact::Storage::move_object

mod client;
mod connection;
mod s3;
mod storage;

pub use client::{BodyStream, ObjectClient};
pub use connection::ConnectionString;
pub use s3::{DEFAULT_REGION, S3ObjectClient};
pub use storage::{ObjectStorage, UPLOAD_CHUNK_SIZE};
