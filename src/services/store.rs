//! Object-store capability used by the sync engine.

use async_trait::async_trait;
use bytes::Bytes;
use std::{collections::HashMap, io};
use thiserror::Error;

/// Metadata returned by a HEAD request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadObject {
    pub e_tag: String,
    pub cache_control: String,
    pub metadata: HashMap<String, String>,
}

/// A single object write.
#[derive(Debug, Clone)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
    pub cache_control: String,
    pub acl: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object `{key}` not found in bucket `{bucket}`")]
    NotFound { bucket: String, key: String },
    #[error("bucket `{0}` cannot be used as a directory name")]
    InvalidBucketName(String),
    #[error("invalid object key `{0}`")]
    InvalidObjectKey(String),
    #[error("{message}")]
    Service {
        code: Option<String>,
        status: Option<u16>,
        message: String,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl StoreError {
    /// Remote error code, when the store reported one.
    pub fn code(&self) -> Option<&str> {
        match self {
            StoreError::Service { code, .. } => code.as_deref(),
            StoreError::NotFound { .. } => Some("NotFound"),
            StoreError::InvalidBucketName(_) => Some("InvalidBucketName"),
            StoreError::InvalidObjectKey(_) => Some("InvalidObjectKey"),
            StoreError::Sqlx(_) | StoreError::Io(_) => None,
        }
    }

    /// HTTP status, when the store reported one.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Service { status, .. } => *status,
            StoreError::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The two object-store calls the sync engine needs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Metadata-only lookup. Absence is reported as [`StoreError::NotFound`].
    async fn head_object(&self, bucket: &str, key: &str) -> StoreResult<HeadObject>;

    /// Create or overwrite an object.
    async fn put_object(&self, request: PutObjectRequest) -> StoreResult<()>;
}
