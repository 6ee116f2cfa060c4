//! What is currently live in the bucket for a given key.

use std::collections::HashMap;

/// Deployed state of one key, as reported by a metadata-only probe.
///
/// Produced fresh for every asset; never cached across assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployedAssetStatus {
    /// Nothing is stored under the key yet.
    NotExists,
    Exists {
        /// ETag of the stored object, quotes included.
        content_hash: String,
        /// Stored Cache-Control, empty when the object has none.
        cache_control: String,
        /// User metadata (`x-amz-meta-*`) without the prefix.
        custom_metadata: HashMap<String, String>,
    },
}
