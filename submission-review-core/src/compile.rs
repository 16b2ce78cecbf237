//! Typesetting of the generated source inside the scratch workspace.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::contract::Typesetter;
use crate::error::{CompileError, CompileFailure};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypesettingConfig {
    /// Engine runs per document. One pass suffices when nothing refers back
    /// (no table of contents, no internal links).
    pub passes: u32,
    pub source_extension: String,
    pub artifact_extension: String,
}

impl Default for TypesettingConfig {
    fn default() -> Self {
        Self {
            passes: 1,
            source_extension: "tex".to_string(),
            artifact_extension: "pdf".to_string(),
        }
    }
}

/// The engine's output inside the workspace.
#[derive(Debug, Clone)]
pub struct CompiledDocument {
    pub path: PathBuf,
    pub source_name: String,
}

/// Writes `<stem>.<source_extension>` into `workspace` and runs the engine on
/// it. Any failure carries the full document source for diagnosis.
pub async fn compile(
    typesetter: &dyn Typesetter,
    workspace: &Path,
    stem: &str,
    document: &str,
    settings: &TypesettingConfig,
) -> Result<CompiledDocument, CompileError> {
    let source_name = format!("{stem}.{}", settings.source_extension);
    let artifact = workspace.join(format!("{stem}.{}", settings.artifact_extension));
    let fail = |failure: CompileFailure| CompileError {
        source_file: source_name.clone(),
        document: document.to_string(),
        failure,
    };

    fs::write(workspace.join(&source_name), document).map_err(|e| {
        error!(error = ?e, source = %source_name, "Failed to write document source");
        fail(e.into())
    })?;

    let passes = settings.passes.max(1);
    for pass in 1..=passes {
        info!(source = %source_name, pass, passes, "Running typesetting engine");
        if let Err(e) = typesetter.typeset(&source_name, workspace).await {
            error!(error = %e, source = %source_name, pass, "Typesetting engine failed");
            return Err(fail(e.into()));
        }
    }

    if !artifact.is_file() {
        error!(path = %artifact.display(), "Engine reported success but wrote no artifact");
        return Err(fail(CompileFailure::MissingArtifact(artifact)));
    }

    info!(path = %artifact.display(), "Compiled review document");
    Ok(CompiledDocument {
        path: artifact,
        source_name,
    })
}
