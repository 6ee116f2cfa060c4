//! Represents an object written by the local object store.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Metadata row for one mirrored object. The payload lives on disk at
/// `{root}/{bucket}/{key}`.
#[derive(Clone, FromRow, Debug)]
pub struct StoredObject {
    pub id: Uuid,

    pub bucket: String,

    /// Bucket key, `/`-separated.
    pub key: String,

    pub content_type: String,

    pub cache_control: String,

    /// Canned ACL the object was written with (e.g. `public-read`).
    pub acl: String,

    pub size_bytes: i64,

    /// Unquoted hex MD5 of the payload.
    pub etag: String,

    pub last_modified: DateTime<Utc>,
}
