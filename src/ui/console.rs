//! Banner, summary and invalidation lines written around the asset blocks.

use crate::{models::outcome::SyncReport, services::cdn::InvalidationOutcome};
use chrono::{DateTime, Local, TimeDelta};
use colored::Colorize;
use std::{
    io::{self, Write},
    path::Path,
};

const ONE_SECOND_MS: i64 = 1_000;
const ONE_MINUTE_MS: i64 = 60 * ONE_SECOND_MS;
const ONE_HOUR_MS: i64 = 60 * ONE_MINUTE_MS;
const ONE_DAY_MS: i64 = 24 * ONE_HOUR_MS;

/// A humanized age, and whether it is fresh enough not to warn about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeTime {
    pub label: String,
    pub is_recent: bool,
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

fn rounded(ms: i64, unit_ms: i64) -> i64 {
    (ms as f64 / unit_ms as f64).round() as i64
}

pub fn relative_time(elapsed: TimeDelta) -> RelativeTime {
    let ms = elapsed.num_milliseconds();
    if ms < ONE_SECOND_MS {
        return RelativeTime {
            label: "just now".to_string(),
            is_recent: true,
        };
    }
    if ms < ONE_MINUTE_MS {
        return RelativeTime {
            label: plural(rounded(ms, ONE_SECOND_MS), "second"),
            is_recent: true,
        };
    }
    if ms < ONE_HOUR_MS {
        let minutes = rounded(ms, ONE_MINUTE_MS);
        return RelativeTime {
            label: plural(minutes, "minute"),
            is_recent: minutes < 3,
        };
    }
    if ms < ONE_DAY_MS {
        return RelativeTime {
            label: plural(rounded(ms, ONE_HOUR_MS), "hour"),
            is_recent: false,
        };
    }
    RelativeTime {
        label: plural(rounded(ms, ONE_DAY_MS), "day"),
        is_recent: false,
    }
}

pub fn write_intro<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", "Asset Deploy".bold())?;
    writeln!(out, "Syncs a build directory to S3 and invalidates CloudFront")?;
    writeln!(out)
}

pub fn write_build_dir<W: Write>(out: &mut W, build_dir: &Path) -> io::Result<()> {
    writeln!(out, "{} {}", "Build directory:".bold(), build_dir.display())
}

pub fn write_build_dir_missing<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "{} Build the project before deploying.",
        "Directory does not exist.".red()
    )
}

pub fn write_last_modified<W: Write>(
    out: &mut W,
    modified: DateTime<Local>,
    now: DateTime<Local>,
) -> io::Result<()> {
    let age = relative_time(now - modified);
    let line = format!(
        "{} {} ({})",
        "Last modified:".bold(),
        modified.format("%a %b %e %Y %H:%M:%S %z"),
        age.label
    );
    if age.is_recent {
        writeln!(out, "{}", line.white())?;
    } else {
        writeln!(out, "{}", line.red())?;
    }
    writeln!(out)
}

pub fn write_upload_start<W: Write>(out: &mut W, bucket: &str, dry_run: bool) -> io::Result<()> {
    if dry_run {
        writeln!(
            out,
            "{} {}",
            format!("Beginning upload to {bucket}.").bold(),
            "(dry run)".yellow()
        )
    } else {
        writeln!(out, "{}", format!("Beginning upload to {bucket}.").bold())
    }
}

fn assets_word(count: usize) -> &'static str {
    if count == 1 { "asset" } else { "assets" }
}

pub fn write_summary<W: Write>(out: &mut W, report: &SyncReport, dry_run: bool) -> io::Result<()> {
    let keys = if dry_run {
        report.pending_keys()
    } else {
        report.changed_keys()
    };

    writeln!(out)?;
    if dry_run {
        writeln!(
            out,
            "{} {} {} would be uploaded.",
            "Dry run complete.".bold(),
            keys.len(),
            assets_word(keys.len())
        )?;
    } else {
        writeln!(
            out,
            "{} {} {} uploaded.",
            "Upload complete.".bold(),
            keys.len(),
            assets_word(keys.len())
        )?;
    }
    for key in &keys {
        writeln!(out, " • {key}")?;
    }

    let failures = report.failure_count();
    if failures > 0 {
        writeln!(
            out,
            "{}",
            format!("{} {} failed to upload.", failures, assets_word(failures)).red()
        )?;
    }
    writeln!(out)
}

pub fn write_invalidation<W: Write>(out: &mut W, outcome: &InvalidationOutcome) -> io::Result<()> {
    match outcome {
        InvalidationOutcome::NothingChanged => writeln!(
            out,
            "{} No files were uploaded.",
            "Skipping CloudFront invalidation.".bold()
        ),
        InvalidationOutcome::NoDistribution => writeln!(
            out,
            "{} No distribution configured for this target.",
            "Skipping CloudFront invalidation.".bold()
        ),
        InvalidationOutcome::DryRun { paths } => {
            writeln!(out, "{}", "Beginning CloudFront invalidation.".bold())?;
            writeln!(
                out,
                "{}",
                format!(
                    "Dry run, so no invalidation is being performed ({} paths).",
                    paths.len()
                )
                .yellow()
            )
        }
        InvalidationOutcome::Created { id, .. } => {
            writeln!(out, "{}", "Beginning CloudFront invalidation.".bold())?;
            writeln!(out, "{} {}", "Invalidation success.".bold(), id)
        }
        InvalidationOutcome::Failed { message } => {
            writeln!(out, "{}", "Beginning CloudFront invalidation.".bold())?;
            writeln!(out, "{} {}", "Invalidation failed.".red(), message)
        }
    }
}
