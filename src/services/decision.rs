//! Decides whether an asset needs to be written.
//!
//! Pure: no network or disk access. Rules, in order:
//! 1. nothing deployed under the key -> upload
//! 2. content hash differs -> upload
//! 3. cache control differs -> upload (stores have no cheap metadata-only
//!    update, so the object is rewritten)
//! 4. otherwise skip

use crate::models::{asset::Asset, deployed::DeployedAssetStatus, outcome::UploadRuling};

/// ETag S3 assigns to a single-part upload: the quoted hex MD5 of the body.
pub fn content_hash(contents: &[u8]) -> String {
    format!("\"{:x}\"", md5::compute(contents))
}

pub fn decide(asset: &Asset, contents: &[u8], remote: &DeployedAssetStatus) -> UploadRuling {
    let (remote_hash, remote_cache_control) = match remote {
        DeployedAssetStatus::NotExists => return UploadRuling::upload(Vec::new()),
        DeployedAssetStatus::Exists {
            content_hash,
            cache_control,
            ..
        } => (content_hash, cache_control),
    };

    let local_hash = content_hash(contents);
    if &local_hash != remote_hash {
        return UploadRuling::upload(vec![
            "Contents changed.".to_string(),
            format!("Local ETag:    {local_hash}"),
            format!("Deployed ETag: {remote_hash}"),
        ]);
    }

    if &asset.cache_control != remote_cache_control {
        return UploadRuling::upload(vec![
            "Cache-Control changed.".to_string(),
            format!("Local:    {}", asset.cache_control),
            format!("Deployed: {}", display_or_none(remote_cache_control)),
        ]);
    }

    UploadRuling::skip(vec![
        "ETag and Cache-Control match the deployed object; no change detected.".to_string(),
    ])
}

fn display_or_none(value: &str) -> &str {
    if value.is_empty() { "(none)" } else { value }
}
