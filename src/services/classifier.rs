//! Walks the build directory and classifies every file into an [`Asset`].

use crate::{
    config::AssetDefaults,
    models::{
        asset::{Asset, IgnoreReason},
        rule::{AssetRule, RuleDefinition, first_match},
    },
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

const OCTET_STREAM: &str = "application/octet-stream";

/// Non-text types that still carry a UTF-8 charset.
const UTF8_APPLICATION_SUBTYPES: [&str; 3] = ["json", "javascript", "ecmascript"];

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("failed to read build directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("`{path}` is outside the build directory")]
    OutsideRoot { path: PathBuf },
    #[error("`{path}` is not valid UTF-8 and has no bucket key")]
    NonUtf8Name { path: PathBuf },
}

pub type ClassifyResult<T> = Result<T, ClassifyError>;

/// Classify every regular file under `root`.
///
/// Files are returned in a stable, name-sorted depth-first order. Contents
/// are not read. Any traversal failure aborts the whole classification.
pub fn classify_tree(
    root: &Path,
    rules: &[AssetRule],
    defaults: &AssetDefaults,
) -> ClassifyResult<Vec<Asset>> {
    let mut assets = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .min_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let asset = classify_file(root, entry.path(), rules, defaults)?;
        debug!(
            "classified {} as {} (ignored: {})",
            asset.bucket_key,
            asset.content_type,
            asset.is_ignored()
        );
        assets.push(asset);
    }
    Ok(assets)
}

/// Classify a single file located under `root`.
pub fn classify_file(
    root: &Path,
    path: &Path,
    rules: &[AssetRule],
    defaults: &AssetDefaults,
) -> ClassifyResult<Asset> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| ClassifyError::OutsideRoot {
            path: path.to_path_buf(),
        })?;
    let bucket_key = relative
        .components()
        .map(|c| {
            c.as_os_str().to_str().ok_or_else(|| ClassifyError::NonUtf8Name {
                path: path.to_path_buf(),
            })
        })
        .collect::<ClassifyResult<Vec<_>>>()?
        .join("/");
    // Rules see the path with its leading separator; the key drops it.
    let match_path = format!("/{bucket_key}");

    let mut content_type = None;
    let mut cache_control = None;
    let mut acl = None;
    let mut ignore_reason = None;

    if let Some(rule) = first_match(rules, &match_path) {
        match &rule.definition {
            RuleDefinition::Ignore => {
                ignore_reason = Some(IgnoreReason {
                    pattern: rule.pattern.clone(),
                    is_default: rule.is_default,
                });
            }
            RuleDefinition::Deploy(definition) => {
                content_type = definition.content_type.clone();
                cache_control = definition.cache_control.clone();
                acl = definition.acl.clone();
            }
        }
    }

    Ok(Asset::new(
        bucket_key,
        path,
        content_type.unwrap_or_else(|| default_content_type(path)),
        cache_control.unwrap_or_else(|| defaults.cache_control.clone()),
        acl.unwrap_or_else(|| defaults.acl.clone()),
        ignore_reason,
    ))
}

/// MIME type from the file extension, with `; charset=utf-8` appended for
/// types that have a known character set.
pub fn default_content_type(path: &Path) -> String {
    let Some(mime) = mime_guess::from_path(path).first() else {
        return OCTET_STREAM.to_string();
    };
    let has_charset = mime.type_() == mime_guess::mime::TEXT
        || (mime.type_() == mime_guess::mime::APPLICATION
            && UTF8_APPLICATION_SUBTYPES.contains(&mime.subtype().as_str()));
    if has_charset {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.essence_str().to_string()
    }
}
