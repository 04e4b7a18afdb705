//! Target resolution - locating the calculator artifact under test

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{VerifyError, VerifyResult};

/// The resolved document under test. Immutable once resolved.
#[derive(Debug, Clone)]
pub struct TargetArtifact {
    /// File name of the selected artifact (e.g. `ala-ghg-calculator-v3.html`)
    pub name: String,

    /// Absolute path to the artifact
    pub path: PathBuf,
}

impl TargetArtifact {
    /// The `file://` URL the driver navigates to.
    pub fn file_url(&self) -> String {
        format!("file://{}", self.path.display())
    }
}

/// Find the canonical calculator artifact in `dir`.
///
/// Candidates are filenames matching `prefix*suffix`. They are sorted
/// lexicographically and the last one is selected as the latest version.
/// Callers are responsible for naming versions so that lexicographic order
/// tracks version order ("v9" sorts after "v10"); this is a documented
/// limitation, not corrected here.
pub fn resolve_target(dir: &Path, prefix: &str, suffix: &str) -> VerifyResult<TargetArtifact> {
    let mut candidates: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name.starts_with(prefix) && name.ends_with(suffix))
        .collect();

    if candidates.is_empty() {
        return Err(VerifyError::ArtifactNotFound {
            dir: dir.display().to_string(),
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        });
    }

    candidates.sort();

    for name in &candidates {
        info!("Found calculator version: {}", name);
    }

    // Last in sorted order is the latest version
    let name = candidates.pop().expect("non-empty after check");
    let path = dir.join(&name);
    let path = path.canonicalize().unwrap_or(path);

    info!("Testing with: {}", name);

    Ok(TargetArtifact { name, path })
}
