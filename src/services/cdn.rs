//! CDN invalidation capability and the gate that decides whether to call it.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CdnError {
    #[error("{message}{}", .code.as_ref().map(|c| format!(" ({c})")).unwrap_or_default())]
    Service {
        code: Option<String>,
        message: String,
    },
    #[error("invalidation response did not include an invalidation")]
    MissingInvalidation,
    #[error("invalid invalidation request: {0}")]
    InvalidRequest(String),
}

pub type CdnResult<T> = Result<T, CdnError>;

#[async_trait]
pub trait CdnInvalidator: Send + Sync {
    /// Purge `paths` from `distribution_id`, returning the invalidation id.
    async fn create_invalidation(&self, distribution_id: &str, paths: &[String]) -> CdnResult<String>;
}

/// A distribution and the client that can invalidate it.
#[derive(Clone, Copy)]
pub struct CdnTarget<'a> {
    pub invalidator: &'a dyn CdnInvalidator,
    pub distribution_id: &'a str,
}

/// What the invalidation gate did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationOutcome {
    NothingChanged,
    NoDistribution,
    DryRun { paths: Vec<String> },
    Created { id: String, paths: Vec<String> },
    Failed { message: String },
}

/// CDN paths for bucket keys: the key with a leading `/`.
pub fn invalidation_paths(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|key| format!("/{key}")).collect()
}

/// Issue one batched invalidation for `changed_keys`, unless there is
/// nothing to do.
///
/// The CDN is called at most once, and only when keys changed, a
/// distribution is configured and this is not a dry run. A CDN failure is
/// reported in the outcome rather than returned.
pub async fn invalidate_changed(
    cdn: Option<CdnTarget<'_>>,
    changed_keys: &[&str],
    dry_run: bool,
) -> InvalidationOutcome {
    if changed_keys.is_empty() {
        return InvalidationOutcome::NothingChanged;
    }
    let Some(CdnTarget {
        invalidator,
        distribution_id,
    }) = cdn
    else {
        return InvalidationOutcome::NoDistribution;
    };

    let paths = invalidation_paths(changed_keys);
    if dry_run {
        return InvalidationOutcome::DryRun { paths };
    }

    info!(
        "creating invalidation for {} paths on {}",
        paths.len(),
        distribution_id
    );
    match invalidator.create_invalidation(distribution_id, &paths).await {
        Ok(id) => InvalidationOutcome::Created { id, paths },
        Err(err) => {
            warn!("invalidation on {} failed: {}", distribution_id, err);
            InvalidationOutcome::Failed {
                message: err.to_string(),
            }
        }
    }
}
