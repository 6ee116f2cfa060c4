//! Carries out an upload ruling against the store.

use crate::{
    models::{
        asset::Asset,
        outcome::{PutParams, UploadFailure, UploadOutcome, UploadRuling},
    },
    services::store::{ObjectStore, PutObjectRequest},
};
use bytes::Bytes;
use tracing::{info, warn};

/// Apply `ruling` to `asset`.
///
/// Issues at most one write and never retries. A failed write becomes
/// [`UploadOutcome::Failed`] carrying the attempted parameters; it is never
/// returned as an error so the caller can carry on with the next asset.
pub async fn execute(
    store: &dyn ObjectStore,
    bucket: &str,
    asset: &Asset,
    ruling: &UploadRuling,
    contents: Bytes,
    dry_run: bool,
) -> UploadOutcome {
    if asset.is_ignored() {
        return UploadOutcome::Ignored;
    }
    if !ruling.should_upload {
        return UploadOutcome::Skipped;
    }
    if dry_run {
        info!("dry run: would upload {}", asset.bucket_key);
        return UploadOutcome::DryRunWouldUpload;
    }

    let params = PutParams {
        bucket: bucket.to_string(),
        key: asset.bucket_key.clone(),
        content_type: asset.content_type.clone(),
        cache_control: asset.cache_control.clone(),
        acl: asset.acl.clone(),
        size_bytes: contents.len(),
    };
    let request = PutObjectRequest {
        bucket: params.bucket.clone(),
        key: params.key.clone(),
        body: contents,
        content_type: params.content_type.clone(),
        cache_control: params.cache_control.clone(),
        acl: params.acl.clone(),
    };

    match store.put_object(request).await {
        Ok(()) => {
            info!("uploaded {} ({} bytes)", params.key, params.size_bytes);
            UploadOutcome::Uploaded
        }
        Err(err) => {
            warn!("upload of {} failed: {}", params.key, err);
            UploadOutcome::Failed(UploadFailure::Put {
                code: err.code().map(str::to_string),
                status: err.status(),
                message: err.to_string(),
                params,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::asset::IgnoreReason, services::mock::MockStore};

    fn asset(key: &str) -> Asset {
        Asset::new(
            key,
            format!("/build/{key}"),
            "text/css; charset=utf-8",
            "no-cache",
            "public-read",
            None,
        )
    }

    #[tokio::test]
    async fn ignored_short_circuits_any_ruling() {
        let store = MockStore::default();
        let mut ignored = asset(".DS_Store");
        ignored.ignore_reason = Some(IgnoreReason {
            pattern: "**/.DS_Store".into(),
            is_default: true,
        });
        let outcome = execute(
            &store,
            "site",
            &ignored,
            &UploadRuling::upload(Vec::new()),
            Bytes::new(),
            false,
        )
        .await;
        assert_eq!(outcome, UploadOutcome::Ignored);
        assert!(store.put_keys().is_empty());
    }

    #[tokio::test]
    async fn skip_ruling_writes_nothing() {
        let store = MockStore::default();
        let outcome = execute(
            &store,
            "site",
            &asset("a.css"),
            &UploadRuling::skip(Vec::new()),
            Bytes::from_static(b"a"),
            false,
        )
        .await;
        assert_eq!(outcome, UploadOutcome::Skipped);
        assert!(store.put_keys().is_empty());
    }

    #[tokio::test]
    async fn dry_run_never_writes() {
        let store = MockStore::default();
        let outcome = execute(
            &store,
            "site",
            &asset("a.css"),
            &UploadRuling::upload(Vec::new()),
            Bytes::from_static(b"a"),
            true,
        )
        .await;
        assert_eq!(outcome, UploadOutcome::DryRunWouldUpload);
        assert!(store.put_keys().is_empty());
    }

    #[tokio::test]
    async fn upload_sends_asset_parameters() {
        let store = MockStore::default();
        let outcome = execute(
            &store,
            "site",
            &asset("css/a.css"),
            &UploadRuling::upload(Vec::new()),
            Bytes::from_static(b"body{}"),
            false,
        )
        .await;
        assert_eq!(outcome, UploadOutcome::Uploaded);
        let puts = store.puts();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].bucket, "site");
        assert_eq!(puts[0].key, "css/a.css");
        assert_eq!(puts[0].content_type, "text/css; charset=utf-8");
        assert_eq!(puts[0].cache_control, "no-cache");
        assert_eq!(puts[0].acl, "public-read");
        assert_eq!(&puts[0].body[..], b"body{}");
    }

    #[tokio::test]
    async fn failed_write_is_captured_with_parameters() {
        let store = MockStore::default();
        store.fail_put("a.css");
        let outcome = execute(
            &store,
            "site",
            &asset("a.css"),
            &UploadRuling::upload(Vec::new()),
            Bytes::from_static(b"abc"),
            false,
        )
        .await;
        match outcome {
            UploadOutcome::Failed(UploadFailure::Put {
                params,
                code,
                status,
                ..
            }) => {
                assert_eq!(params.key, "a.css");
                assert_eq!(params.size_bytes, 3);
                assert_eq!(code.as_deref(), Some("InternalError"));
                assert_eq!(status, Some(500));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
