//! Represents one local file mapped to a bucket key.

use bytes::Bytes;
use std::{
    io,
    path::{Path, PathBuf},
};

/// Why an asset will not be deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreReason {
    /// Glob pattern of the rule that matched.
    pub pattern: String,
    /// Whether that rule is one of the built-in defaults.
    pub is_default: bool,
}

/// A file from the build directory, classified and ready to sync.
///
/// Built once by the classifier and never mutated afterwards. The file's
/// bytes are not held here; [`Asset::contents`] reads them on demand so a
/// large tree is never buffered all at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Remote key, relative to the bucket root, without a leading `/`.
    pub bucket_key: String,

    pub content_type: String,

    pub cache_control: String,

    /// Canned ACL applied on upload.
    pub acl: String,

    /// Set when an ignore rule matched.
    pub ignore_reason: Option<IgnoreReason>,

    source: PathBuf,
}

impl Asset {
    pub fn new(
        bucket_key: impl Into<String>,
        source: impl Into<PathBuf>,
        content_type: impl Into<String>,
        cache_control: impl Into<String>,
        acl: impl Into<String>,
        ignore_reason: Option<IgnoreReason>,
    ) -> Self {
        Self {
            bucket_key: bucket_key.into(),
            content_type: content_type.into(),
            cache_control: cache_control.into(),
            acl: acl.into(),
            ignore_reason,
            source: source.into(),
        }
    }

    /// Absolute path of the local file backing this asset.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore_reason.is_some()
    }

    /// Read the file's bytes.
    pub async fn contents(&self) -> io::Result<Bytes> {
        tokio::fs::read(&self.source).await.map(Bytes::from)
    }
}
