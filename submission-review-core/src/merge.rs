//! Merging of the compiled document with pre-rendered attachments.
//!
//! The output is staged next to the destination and renamed into place only
//! once complete, so a failed merge leaves no file and never clobbers an
//! existing artifact.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::contract::DocumentMerger;
use crate::error::MergeError;

/// Produces `destination`: the compiled pages first, then each attachment's
/// pages in the given order. Without attachments the compiled artifact is
/// copied unchanged and the merge tool is not called.
pub async fn merge(
    merger: &dyn DocumentMerger,
    compiled: &Path,
    attachments: &[PathBuf],
    destination: &Path,
) -> Result<PathBuf, MergeError> {
    let persist_err = |e: std::io::Error| {
        error!(error = ?e, path = %destination.display(), "Failed to write merged artifact");
        MergeError::Persist {
            output: destination.to_path_buf(),
            source: e,
        }
    };

    let dir = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(persist_err)?;

    let suffix = destination
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let staged = tempfile::Builder::new()
        .prefix(".review-")
        .suffix(&suffix)
        .tempfile_in(&dir)
        .map_err(persist_err)?;

    if attachments.is_empty() {
        info!(path = %compiled.display(), "No attachments; passing compiled document through");
        fs::copy(compiled, staged.path()).map_err(persist_err)?;
    } else {
        let inputs: Vec<PathBuf> = std::iter::once(compiled.to_path_buf())
            .chain(attachments.iter().cloned())
            .collect();
        info!(attachments = attachments.len(), "Merging attachments after compiled document");
        merger.merge(&inputs, staged.path()).await.map_err(|e| {
            error!(error = %e, path = %destination.display(), "Merge tool failed");
            MergeError::Tool {
                output: destination.to_path_buf(),
                source: e,
            }
        })?;
    }

    staged
        .persist(destination)
        .map_err(|e| persist_err(e.error))?;
    info!(path = %destination.display(), "Wrote review artifact");
    Ok(destination.to_path_buf())
}
