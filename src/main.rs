use chrono::{DateTime, Local};
use clap::Parser;
use colored::Colorize;
use std::{
    env, fs,
    io::{self, Write},
    process::ExitCode,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod models;
mod services;
mod ui;

use config::{Args, SyncOptions};
use errors::AppError;
use models::asset::Asset;
use services::{
    aws::{self, CloudFrontInvalidator, S3ObjectStore},
    cdn::{CdnTarget, invalidate_changed},
    classifier::classify_tree,
    local_store::LocalObjectStore,
    store::ObjectStore,
    sync::{SyncTarget, sync_assets},
};
use ui::{console, prompt, reporter::terminal_columns};

#[tokio::main]
async fn main() -> ExitCode {
    // --- Logging setup (stderr, so it never disturbs the live display) ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            err.into()
        }
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let cwd = env::current_dir()?;

    // --- Config ---
    let config_path = config::locate_config(&args, &cwd).ok_or(AppError::ConfigNotFound)?;
    info!("Using config file {}", config_path.display());
    let file_config = config::load_config_file(&config_path).map_err(AppError::ConfigInvalid)?;
    let options =
        SyncOptions::resolve(file_config, args.dry_run, &cwd).map_err(AppError::ConfigInvalid)?;
    debug!("Resolved options: {:?}", options);

    // --- Pre-flight ---
    let mut stdout = io::stdout();
    console::write_intro(&mut stdout)?;
    console::write_build_dir(&mut stdout, &options.build_dir)?;
    let metadata = match fs::metadata(&options.build_dir) {
        Ok(metadata) if metadata.is_dir() => metadata,
        _ => {
            console::write_build_dir_missing(&mut stdout)?;
            return Err(AppError::BuildDirMissing(options.build_dir.clone()));
        }
    };
    match metadata.modified() {
        Ok(modified) => {
            console::write_last_modified(&mut stdout, DateTime::<Local>::from(modified), Local::now())?
        }
        Err(err) => debug!("build directory has no modification time: {}", err),
    }

    if !args.yes && !prompt::confirm_all(&options.confirmation_prompts)? {
        info!("Deploy cancelled at confirmation");
        return Ok(());
    }

    // --- Discover ---
    let assets = classify_tree(&options.build_dir, &options.rules, &options.defaults)?;
    info!("Discovered {} assets", assets.len());

    // --- Sync ---
    match &args.local_store {
        Some(root) => {
            let store = LocalObjectStore::open(root).await?;
            info!("Syncing into local store at {}", root.display());
            deploy(&options, &assets, &store, None, &mut stdout).await
        }
        None => {
            let s3 = S3ObjectStore::new(&aws::sdk_config(&options.bucket.region).await);
            match &options.cloudfront {
                Some(cloudfront) => {
                    let invalidator =
                        CloudFrontInvalidator::new(&aws::sdk_config(&cloudfront.region).await);
                    let cdn = CdnTarget {
                        invalidator: &invalidator,
                        distribution_id: &cloudfront.id,
                    };
                    deploy(&options, &assets, &s3, Some(cdn), &mut stdout).await
                }
                None => deploy(&options, &assets, &s3, None, &mut stdout).await,
            }
        }
    }
}

async fn deploy<W: Write>(
    options: &SyncOptions,
    assets: &[Asset],
    store: &dyn ObjectStore,
    cdn: Option<CdnTarget<'_>>,
    out: &mut W,
) -> Result<(), AppError> {
    console::write_upload_start(out, &options.bucket.name, options.dry_run)?;

    let target = SyncTarget {
        store,
        bucket: &options.bucket.name,
        dry_run: options.dry_run,
    };
    let report = sync_assets(target, assets, out, terminal_columns).await?;
    console::write_summary(out, &report, options.dry_run)?;

    let keys = if options.dry_run {
        report.pending_keys()
    } else {
        report.changed_keys()
    };
    let invalidation = invalidate_changed(cdn, &keys, options.dry_run).await;
    console::write_invalidation(out, &invalidation)?;
    info!(
        "Run finished: {} changed, {} failed",
        keys.len(),
        report.failure_count()
    );
    Ok(())
}
