use crate::models::rule::{AssetRule, RuleTable, resolve_rules};
use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// File names searched for, in order, in the working directory and each of
/// its ancestors.
pub const CONFIG_FILE_NAMES: [&str; 3] = [
    "asset-deploy.json",
    ".asset-deployrc.json",
    ".asset-deployrc",
];

/// Always asked before anything else.
pub const BASE_CONFIRMATION_PROMPT: &str =
    "Would you like to deploy the latest build in the build directory?";

pub const DEFAULT_CACHE_CONTROL: &str = "max-age=315360000, no-transform, public";
pub const DEFAULT_ACL: &str = "public-read";

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Sync a build directory to an S3 bucket and invalidate CloudFront"
)]
pub struct Args {
    /// Config file to use (overrides ASSET_DEPLOY_CONFIG and discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Decide and report everything, but write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Answer yes to every confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Sync into an on-disk object store rooted here instead of S3
    #[arg(long)]
    pub local_store: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketDefinition {
    pub name: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CloudfrontDefinition {
    pub id: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Confirmation {
    One(String),
    Many(Vec<String>),
}

/// The config file as written by the user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileConfig {
    pub bucket: BucketDefinition,
    pub build_dir: String,
    #[serde(default)]
    pub cloudfront: Option<CloudfrontDefinition>,
    #[serde(default)]
    pub assets: RuleTable,
    #[serde(default)]
    pub confirmation: Option<Confirmation>,
    #[serde(default)]
    pub default_cache_control: Option<String>,
    #[serde(default)]
    pub default_acl: Option<String>,
}

impl FileConfig {
    fn validate(&self) -> Result<()> {
        let required = [
            ("bucket.name", Some(&self.bucket.name)),
            ("bucket.region", Some(&self.bucket.region)),
            ("buildDir", Some(&self.build_dir)),
            ("cloudfront.id", self.cloudfront.as_ref().map(|c| &c.id)),
            ("cloudfront.region", self.cloudfront.as_ref().map(|c| &c.region)),
        ];
        for (field, value) in required {
            if let Some(value) = value {
                if value.trim().is_empty() {
                    bail!("`{}` must not be empty", field);
                }
            }
        }
        Ok(())
    }
}

/// Cache control and ACL used when no rule overrides them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDefaults {
    pub cache_control: String,
    pub acl: String,
}

impl Default for AssetDefaults {
    fn default() -> Self {
        Self {
            cache_control: DEFAULT_CACHE_CONTROL.to_string(),
            acl: DEFAULT_ACL.to_string(),
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub bucket: BucketDefinition,
    /// Absolute, without a trailing separator.
    pub build_dir: PathBuf,
    pub cloudfront: Option<CloudfrontDefinition>,
    pub rules: Vec<AssetRule>,
    pub confirmation_prompts: Vec<String>,
    pub defaults: AssetDefaults,
    pub dry_run: bool,
}

impl SyncOptions {
    /// Resolve a parsed config against the working directory.
    pub fn resolve(config: FileConfig, dry_run: bool, cwd: &Path) -> Result<Self> {
        let build_dir = {
            let raw = Path::new(&config.build_dir);
            if raw.is_absolute() {
                raw.to_path_buf()
            } else {
                cwd.join(raw)
            }
        };
        let build_dir = normalize(&build_dir);

        let mut confirmation_prompts = vec![BASE_CONFIRMATION_PROMPT.to_string()];
        match config.confirmation {
            Some(Confirmation::One(prompt)) => confirmation_prompts.push(prompt),
            Some(Confirmation::Many(prompts)) => confirmation_prompts.extend(prompts),
            None => {}
        }

        let rules = resolve_rules(&config.assets).context("compiling asset rules")?;

        let fallback = AssetDefaults::default();
        let defaults = AssetDefaults {
            cache_control: config
                .default_cache_control
                .unwrap_or(fallback.cache_control),
            acl: config.default_acl.unwrap_or(fallback.acl),
        };

        Ok(Self {
            bucket: config.bucket,
            build_dir,
            cloudfront: config.cloudfront,
            rules,
            confirmation_prompts,
            defaults,
            dry_run,
        })
    }
}

/// Collapse `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Pick the config file: `--config`, then `ASSET_DEPLOY_CONFIG`, then the
/// first known file name found walking up from `cwd`.
///
/// An explicit path that is not an existing file counts as not found.
pub fn locate_config(args: &Args, cwd: &Path) -> Option<PathBuf> {
    let explicit = args.config.clone().or_else(|| {
        env::var_os("ASSET_DEPLOY_CONFIG")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
    });
    match explicit {
        Some(path) => {
            let path = cwd.join(path);
            if path.is_file() {
                Some(path)
            } else {
                tracing::warn!("config file {} does not exist", path.display());
                None
            }
        }
        None => discover_config(cwd),
    }
}

/// Search `start` and its ancestors for a config file.
pub fn discover_config(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

/// Read, parse and validate a config file.
pub fn load_config_file(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config file `{}`", path.display()))?;
    let config: FileConfig = serde_json::from_str(&raw)
        .with_context(|| format!("parsing config file `{}`", path.display()))?;
    config
        .validate()
        .with_context(|| format!("validating config file `{}`", path.display()))?;
    Ok(config)
}
