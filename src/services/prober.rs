//! Reads the deployed state of a key.

use crate::{
    models::deployed::DeployedAssetStatus,
    services::store::{ObjectStore, StoreError, StoreResult},
};
use tracing::debug;

/// Probe `bucket/key` with a metadata-only request.
///
/// "Not found" is a normal answer and maps to
/// [`DeployedAssetStatus::NotExists`]; every other failure is returned to
/// the caller.
pub async fn probe(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> StoreResult<DeployedAssetStatus> {
    match store.head_object(bucket, key).await {
        Ok(head) => {
            debug!("probe {}/{} => etag {}", bucket, key, head.e_tag);
            Ok(DeployedAssetStatus::Exists {
                content_hash: head.e_tag,
                cache_control: head.cache_control,
                custom_metadata: head.metadata,
            })
        }
        Err(StoreError::NotFound { .. }) => {
            debug!("probe {}/{} => not found", bucket, key);
            Ok(DeployedAssetStatus::NotExists)
        }
        Err(err) => Err(err),
    }
}
