//! Normalization of renderable files into the scratch workspace.
//!
//! Source code always goes through the formatter, plain text only when a
//! reflow tool is installed; everything else is copied byte-for-byte. The
//! result is mirrored under the workspace at the file's relative path.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::classify::{Category, ClassifiedFile};
use crate::contract::Formatter;
use crate::error::NormalizationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    Utf8,
    Latin1,
    Ascii,
}

impl TextEncoding {
    pub const DEFAULT_PRIORITY: [TextEncoding; 3] =
        [TextEncoding::Utf8, TextEncoding::Latin1, TextEncoding::Ascii];

    fn decode_strict(self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
            TextEncoding::Ascii => bytes
                .is_ascii()
                .then(|| bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

/// Decoded text plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decoded {
    pub text: String,
    pub encoding: TextEncoding,
    /// Set when no encoding fit and undecodable bytes were dropped.
    pub lossy: bool,
}

/// Tries each encoding in order; the first strict success wins. If all fail,
/// falls back to ASCII with every non-ASCII byte dropped and flags it.
pub fn decode(bytes: &[u8], encodings: &[TextEncoding]) -> Decoded {
    for &encoding in encodings {
        if let Some(text) = encoding.decode_strict(bytes) {
            return Decoded {
                text,
                encoding,
                lossy: false,
            };
        }
    }
    Decoded {
        text: bytes
            .iter()
            .filter(|b| b.is_ascii())
            .map(|&b| char::from(b))
            .collect(),
        encoding: TextEncoding::Ascii,
        lossy: true,
    }
}

/// Segment standing in for `..`, so `../x.c` stays distinct from `x.c`.
pub const PARENT_SEGMENT: &str = "_parent";

/// Relative path inside the workspace. `..` becomes [`PARENT_SEGMENT`], root
/// and `.` components are dropped, so `../x.c` or `/abs/x.c` cannot escape it.
pub fn mirrored_path(relative: &str) -> PathBuf {
    Path::new(relative)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            Component::ParentDir => Some(OsStr::new(PARENT_SEGMENT)),
            _ => None,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NormalizeMode {
    Formatted,
    Reflowed,
    Copied,
}

/// A renderable file as it now exists in the workspace.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedFile {
    pub file: ClassifiedFile,
    /// Relative to the workspace root, `/`-separated.
    pub workspace_path: String,
    pub mode: NormalizeMode,
    /// How the source bytes were decoded; `None` for byte copies.
    pub decoding: Option<Decoded>,
}

pub struct Normalizer<'a> {
    formatter: &'a dyn Formatter,
    reflow: Option<&'a dyn Formatter>,
    encodings: &'a [TextEncoding],
}

impl<'a> Normalizer<'a> {
    pub fn new(
        formatter: &'a dyn Formatter,
        reflow: Option<&'a dyn Formatter>,
        encodings: &'a [TextEncoding],
    ) -> Self {
        Self {
            formatter,
            reflow,
            encodings,
        }
    }

    /// Normalizes every file in order, stopping at the first failure.
    /// Two files that would land on the same workspace path are rejected.
    pub async fn normalize_all(
        &self,
        folder: &Path,
        files: &[ClassifiedFile],
        workspace: &Path,
    ) -> Result<Vec<NormalizedFile>, NormalizationError> {
        let mut claimed: HashMap<PathBuf, &str> = HashMap::with_capacity(files.len());
        for file in files {
            let relative = mirrored_path(&file.relative_path);
            if let Some(first) = claimed.insert(relative.clone(), &file.relative_path) {
                error!(file = %file.relative_path, other = first, "Files share a workspace path");
                return Err(NormalizationError::PathCollision {
                    file: file.relative_path.clone(),
                    other: first.to_string(),
                    workspace_path: relative,
                });
            }
        }

        let mut out = Vec::with_capacity(files.len());
        for file in files {
            out.push(self.normalize(folder, file, workspace).await?);
        }
        info!(count = out.len(), "Normalized submission files");
        Ok(out)
    }

    pub async fn normalize(
        &self,
        folder: &Path,
        file: &ClassifiedFile,
        workspace: &Path,
    ) -> Result<NormalizedFile, NormalizationError> {
        let source = folder.join(&file.relative_path);
        let relative = mirrored_path(&file.relative_path);
        let target = workspace.join(&relative);
        let workspace_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| self.write_error(file, e))?;
        }

        let tool = match file.category {
            Category::SourceCode => Some((self.formatter, NormalizeMode::Formatted)),
            Category::PlainText => self.reflow.map(|r| (r, NormalizeMode::Reflowed)),
            _ => None,
        };

        let Some((tool, mode)) = tool else {
            fs::copy(&source, &target).map_err(|e| {
                error!(error = ?e, path = %source.display(), "Failed to copy file into workspace");
                NormalizationError::Read {
                    file: file.relative_path.clone(),
                    source: e,
                }
            })?;
            debug!(file = %file.relative_path, "Copied file unchanged");
            return Ok(NormalizedFile {
                file: file.clone(),
                workspace_path,
                mode: NormalizeMode::Copied,
                decoding: None,
            });
        };

        let bytes = fs::read(&source).map_err(|e| {
            error!(error = ?e, path = %source.display(), "Failed to read submission file");
            NormalizationError::Read {
                file: file.relative_path.clone(),
                source: e,
            }
        })?;
        let decoded = decode(&bytes, self.encodings);
        if decoded.lossy {
            warn!(file = %file.relative_path, "No encoding fit; dropped undecodable bytes");
        } else {
            debug!(file = %file.relative_path, encoding = ?decoded.encoding, "Decoded source");
        }

        // Stage a UTF-8 copy for the tool to read.
        fs::write(&target, decoded.text.as_bytes()).map_err(|e| self.write_error(file, e))?;

        let formatted = tool.format(&target).await.map_err(|e| {
            error!(error = %e, file = %file.relative_path, "Formatter failed");
            NormalizationError::Formatter {
                file: file.relative_path.clone(),
                source: e,
            }
        })?;
        let formatted = decode(&formatted, self.encodings);
        fs::write(&target, formatted.text.as_bytes()).map_err(|e| self.write_error(file, e))?;

        debug!(file = %file.relative_path, ?mode, "Normalized file");
        Ok(NormalizedFile {
            file: file.clone(),
            workspace_path,
            mode,
            decoding: Some(decoded),
        })
    }

    fn write_error(&self, file: &ClassifiedFile, e: std::io::Error) -> NormalizationError {
        error!(error = ?e, file = %file.relative_path, "Failed to write into workspace");
        NormalizationError::Write {
            file: file.relative_path.clone(),
            source: e,
        }
    }
}
