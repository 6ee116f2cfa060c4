//! Upload rulings and per-asset outcomes.

/// Decision on whether an asset must be written.
///
/// `rationale` is the explanation shown to the user; it never drives
/// control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRuling {
    pub should_upload: bool,
    pub rationale: Vec<String>,
}

impl UploadRuling {
    pub fn upload(rationale: Vec<String>) -> Self {
        Self {
            should_upload: true,
            rationale,
        }
    }

    pub fn skip(rationale: Vec<String>) -> Self {
        Self {
            should_upload: false,
            rationale,
        }
    }
}

/// The parameters of an attempted write, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutParams {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub cache_control: String,
    pub acl: String,
    pub size_bytes: usize,
}

/// Why an asset could not be synced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadFailure {
    /// The local file could not be read.
    Read { message: String },
    /// The store rejected the write.
    Put {
        params: PutParams,
        code: Option<String>,
        status: Option<u16>,
        message: String,
    },
}

impl UploadFailure {
    /// Lines rendered beneath the asset's status badge.
    pub fn detail_lines(&self) -> Vec<String> {
        match self {
            UploadFailure::Read { message } => vec![format!("Could not read file: {message}")],
            UploadFailure::Put {
                params,
                code,
                status,
                message,
            } => {
                let mut error = format!("Error: {message}");
                match (code, status) {
                    (Some(code), Some(status)) => {
                        error.push_str(&format!(" ({code}, HTTP {status})"))
                    }
                    (Some(code), None) => error.push_str(&format!(" ({code})")),
                    (None, Some(status)) => error.push_str(&format!(" (HTTP {status})")),
                    (None, None) => {}
                }
                vec![
                    error,
                    format!("Bucket: {}", params.bucket),
                    format!("Key: {}", params.key),
                    format!("Content-Type: {}", params.content_type),
                    format!("Cache-Control: {}", params.cache_control),
                    format!("ACL: {}", params.acl),
                    format!("Size: {} bytes", params.size_bytes),
                ]
            }
        }
    }
}

/// Final state of one asset after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Ignored,
    Skipped,
    Uploaded,
    DryRunWouldUpload,
    Failed(UploadFailure),
}

impl UploadOutcome {
    /// Whether the asset's remote object was rewritten.
    pub fn is_changed(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded)
    }

    /// Whether the asset would have been rewritten, counting dry runs.
    pub fn is_pending_change(&self) -> bool {
        matches!(
            self,
            UploadOutcome::Uploaded | UploadOutcome::DryRunWouldUpload
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, UploadOutcome::Failed(_))
    }
}

/// Outcome for one asset, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResult {
    pub bucket_key: String,
    pub outcome: UploadOutcome,
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub results: Vec<AssetResult>,
}

impl SyncReport {
    /// Keys actually rewritten, in discovery order. These feed the CDN
    /// invalidation.
    pub fn changed_keys(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| r.outcome.is_changed())
            .map(|r| r.bucket_key.as_str())
            .collect()
    }

    /// Keys a dry run would have rewritten, in discovery order.
    pub fn pending_keys(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| r.outcome.is_pending_change())
            .map(|r| r.bucket_key.as_str())
            .collect()
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_failed()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(key: &str, outcome: UploadOutcome) -> AssetResult {
        AssetResult {
            bucket_key: key.into(),
            outcome,
        }
    }

    #[test]
    fn only_uploads_count_as_changed() {
        let report = SyncReport {
            results: vec![
                result("a", UploadOutcome::Uploaded),
                result("b", UploadOutcome::Skipped),
                result("c", UploadOutcome::DryRunWouldUpload),
                result("d", UploadOutcome::Ignored),
                result(
                    "e",
                    UploadOutcome::Failed(UploadFailure::Read {
                        message: "denied".into(),
                    }),
                ),
                result("f", UploadOutcome::Uploaded),
            ],
        };
        assert_eq!(report.changed_keys(), ["a", "f"]);
        assert_eq!(report.pending_keys(), ["a", "c", "f"]);
        assert_eq!(report.failure_count(), 1);
    }

    #[test]
    fn put_failure_details_include_parameters() {
        let failure = UploadFailure::Put {
            params: PutParams {
                bucket: "site".into(),
                key: "index.html".into(),
                content_type: "text/html; charset=utf-8".into(),
                cache_control: "no-cache".into(),
                acl: "public-read".into(),
                size_bytes: 42,
            },
            code: Some("AccessDenied".into()),
            status: Some(403),
            message: "Access Denied".into(),
        };
        let lines = failure.detail_lines();
        assert_eq!(lines[0], "Error: Access Denied (AccessDenied, HTTP 403)");
        assert!(lines.contains(&"Key: index.html".to_string()));
        assert!(lines.contains(&"Size: 42 bytes".to_string()));
    }
}
