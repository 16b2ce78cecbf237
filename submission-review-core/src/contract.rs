//! # contract: interfaces of the external collaborators
//!
//! The pipeline never formats, typesets or merges anything itself. It talks
//! to three external tools through the traits below:
//!
//! - [`Formatter`]: canonical formatting (or reflow) of one staged file
//! - [`Typesetter`]: turns generated document source into a rendered artifact
//! - [`DocumentMerger`]: concatenates rendered documents in page order
//!
//! Production implementations spawn commands (see [`crate::tools`]); tests use
//! the `mockall` mocks exported under the `test-export-mocks` feature.
//!
//! All methods are async and every call is awaited before the pipeline moves
//! on. No timeout is applied: a hung tool hangs its submission.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Failure of one external tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The program could not be started (not installed, not executable, ...).
    #[error("could not launch `{program}`: {source}")]
    Unavailable {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("`{program}` exited with {status}")]
    Failed {
        program: String,
        status: String,
        stdout: String,
        stderr: String,
    },

    #[error("I/O error while driving tool: {0}")]
    Io(#[from] io::Error),
}

/// Produces a canonically formatted version of a file.
///
/// Implementors read the file at `path` and return the formatted bytes; the
/// file itself is left untouched.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Formatter: Send + Sync {
    async fn format(&self, path: &Path) -> Result<Vec<u8>, ToolError>;
}

/// Runs the typesetting engine on `source_name` inside `workdir`.
///
/// On success the artifact is expected next to the source in `workdir`.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Typesetter: Send + Sync {
    async fn typeset(&self, source_name: &str, workdir: &Path) -> Result<(), ToolError>;
}

/// Concatenates `inputs` (in order) into a single document at `output`.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocumentMerger: Send + Sync {
    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<(), ToolError>;
}
