//! Error taxonomy for a single submission run.
//!
//! Every error is scoped to one submission and is fatal for it: nothing here
//! is retried or downgraded to a warning. Failures carry the diagnostic
//! payload (generated document source, captured tool output) as data so
//! callers can inspect or print it themselves.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::contract::ToolError;

/// The submission identity could not be derived from the folder path.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("path {path:?} has too few segments to identify a submission")]
    MissingSegments { path: PathBuf },

    #[error("week segment `{segment}` of {path:?} is not a base-10 integer")]
    InvalidWeek { path: PathBuf, segment: String },
}

/// A renderable file could not be normalized into the scratch workspace.
#[derive(Debug, Error)]
pub enum NormalizationError {
    #[error("failed to read {file}: {source}")]
    Read {
        file: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write normalized copy of {file}: {source}")]
    Write {
        file: String,
        #[source]
        source: io::Error,
    },

    #[error("formatter rejected {file}: {source}")]
    Formatter {
        file: String,
        #[source]
        source: ToolError,
    },

    #[error("{file} and {other} would both be written to {workspace_path:?}")]
    PathCollision {
        file: String,
        other: String,
        workspace_path: PathBuf,
    },
}

impl NormalizationError {
    /// Relative path of the offending file, as supplied by the caller.
    pub fn file(&self) -> &str {
        match self {
            NormalizationError::Read { file, .. }
            | NormalizationError::Write { file, .. }
            | NormalizationError::Formatter { file, .. }
            | NormalizationError::PathCollision { file, .. } => file,
        }
    }
}

/// Classification selected nothing to render.
#[derive(Debug, Error)]
#[error("no renderable files selected for submission `{submission}`; check the classification extensions")]
pub struct EmptySubmissionError {
    pub submission: String,
}

/// The document template could not be registered or rendered.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read template {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid document template: {0}")]
    Register(String),

    #[error("failed to render document template: {0}")]
    Render(String),
}

/// Why the typesetting step failed.
#[derive(Debug, Error)]
pub enum CompileFailure {
    #[error(transparent)]
    Engine(#[from] ToolError),

    #[error("engine succeeded but produced no artifact at {0:?}")]
    MissingArtifact(PathBuf),

    #[error("failed to write document source: {0}")]
    Io(#[from] io::Error),
}

/// The typesetting engine failed. Carries the full generated source.
#[derive(Debug, Error)]
#[error("typesetting {source_file} failed: {failure}")]
pub struct CompileError {
    pub source_file: String,
    pub document: String,
    #[source]
    pub failure: CompileFailure,
}

impl CompileError {
    pub fn document_source(&self) -> &str {
        &self.document
    }

    /// Captured engine output (stdout followed by stderr), when the engine ran.
    pub fn diagnostics(&self) -> Option<String> {
        match &self.failure {
            CompileFailure::Engine(ToolError::Failed { stdout, stderr, .. }) => {
                Some(format!("{stdout}{stderr}"))
            }
            _ => None,
        }
    }
}

/// The final artifact could not be produced at its destination.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("merge tool failed for {output:?}: {source}")]
    Tool {
        output: PathBuf,
        #[source]
        source: ToolError,
    },

    #[error("failed to write merged artifact {output:?}: {source}")]
    Persist {
        output: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Pipeline stage, used to report where a submission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Discover,
    Workspace,
    Normalize,
    Render,
    Compile,
    Merge,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extract => "extract",
            Stage::Discover => "discover",
            Stage::Workspace => "workspace",
            Stage::Normalize => "normalize",
            Stage::Render => "render",
            Stage::Compile => "compile",
            Stage::Merge => "merge",
        };
        f.write_str(name)
    }
}

/// Any failure of one submission run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("failed to list submission folder {path:?}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create scratch workspace: {0}")]
    Workspace(#[source] io::Error),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error(transparent)]
    EmptySubmission(#[from] EmptySubmissionError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Merge(#[from] MergeError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Metadata(_) => Stage::Extract,
            PipelineError::Discovery { .. } => Stage::Discover,
            PipelineError::Workspace(_) => Stage::Workspace,
            PipelineError::Normalization(_) => Stage::Normalize,
            PipelineError::EmptySubmission(_) | PipelineError::Template(_) => Stage::Render,
            PipelineError::Compile(_) => Stage::Compile,
            PipelineError::Merge(_) => Stage::Merge,
        }
    }
}
