//! The run driver: probe, decide, execute and report each asset in turn.
//!
//! Assets are processed one at a time in discovery order. Each asset gets
//! its own [`AssetReporter`], so only that asset's block is ever redrawn,
//! and no two assets' redraws can interleave on the terminal.

use crate::{
    models::{
        asset::{Asset, IgnoreReason},
        deployed::DeployedAssetStatus,
        outcome::{AssetResult, SyncReport, UploadFailure, UploadOutcome},
    },
    services::{decision::decide, executor::execute, prober::probe, store::ObjectStore},
    ui::reporter::{AssetReporter, Columns, StatusBadge},
};
use std::io::{self, Write};
use tracing::warn;

/// Where and how a run writes.
#[derive(Clone, Copy)]
pub struct SyncTarget<'a> {
    pub store: &'a dyn ObjectStore,
    pub bucket: &'a str,
    pub dry_run: bool,
}

/// Sync every asset, rendering progress to `out`.
///
/// Per-asset failures become [`UploadOutcome::Failed`] and never stop the
/// run. Only a failure to write to `out` is returned as an error.
pub async fn sync_assets<W: Write>(
    target: SyncTarget<'_>,
    assets: &[Asset],
    out: &mut W,
    columns: Columns,
) -> io::Result<SyncReport> {
    let mut report = SyncReport::default();
    for asset in assets {
        let mut reporter = AssetReporter::new(&mut *out, columns);
        let outcome = sync_asset(target, asset, &mut reporter).await?;
        report.results.push(AssetResult {
            bucket_key: asset.bucket_key.clone(),
            outcome,
        });
    }
    Ok(report)
}

async fn sync_asset<W: Write>(
    target: SyncTarget<'_>,
    asset: &Asset,
    reporter: &mut AssetReporter<W>,
) -> io::Result<UploadOutcome> {
    let key = asset.bucket_key.as_str();

    // Ignored assets are never read or probed.
    if let Some(reason) = &asset.ignore_reason {
        reporter.report(key, StatusBadge::Ignored, &[ignore_detail(reason)])?;
        return Ok(UploadOutcome::Ignored);
    }

    reporter.report(key, StatusBadge::Working, &[])?;

    let contents = match asset.contents().await {
        Ok(contents) => contents,
        Err(err) => {
            warn!("reading {} failed: {}", asset.source().display(), err);
            let failure = UploadFailure::Read {
                message: err.to_string(),
            };
            reporter.report(key, StatusBadge::Error, &failure.detail_lines())?;
            return Ok(UploadOutcome::Failed(failure));
        }
    };

    let mut details = Vec::new();
    let remote = match probe(target.store, target.bucket, key).await {
        Ok(status) => status,
        Err(err) => {
            warn!("probing {} failed, treating as new: {}", key, err);
            details.push(format!("Could not read deployed state ({err}); uploading."));
            DeployedAssetStatus::NotExists
        }
    };

    let ruling = decide(asset, &contents, &remote);
    details.extend(ruling.rationale.iter().cloned());

    let outcome = execute(
        target.store,
        target.bucket,
        asset,
        &ruling,
        contents,
        target.dry_run,
    )
    .await;

    match &outcome {
        UploadOutcome::Ignored => reporter.report(key, StatusBadge::Ignored, &[])?,
        UploadOutcome::Skipped => reporter.report(key, StatusBadge::Skipped, &details)?,
        UploadOutcome::Uploaded => reporter.report(key, StatusBadge::Uploaded, &details)?,
        UploadOutcome::DryRunWouldUpload => reporter.report(key, StatusBadge::DryRun, &details)?,
        UploadOutcome::Failed(failure) => {
            reporter.report(key, StatusBadge::Error, &failure.detail_lines())?
        }
    }
    Ok(outcome)
}

fn ignore_detail(reason: &IgnoreReason) -> String {
    if reason.is_default {
        format!("Matched default rule `{}`", reason.pattern)
    } else {
        format!("Matched rule `{}`", reason.pattern)
    }
}
