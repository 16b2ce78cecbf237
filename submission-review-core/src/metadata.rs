//! Submission identity derived from the folder under review.

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::MetadataError;
use crate::render::escape_latex;

pub const DEFAULT_CONJUNCTION: &str = r" \and ";

/// Who submitted, and for which week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionIdentity {
    /// Folder segment as found on disk.
    pub raw_name: String,
    /// `raw_name` made readable and LaTeX-safe: `_` becomes a space, `--`
    /// joins co-authors.
    pub display_name: String,
    pub week_id: u32,
    /// Week segment as written (`01`), kept for artifact naming.
    pub week_label: String,
}

impl SubmissionIdentity {
    /// File stem shared by the generated source, the compiled and the merged artifact.
    pub fn artifact_stem(&self) -> String {
        format!("Review-{}-{}", self.raw_name, self.week_label)
    }
}

/// Derives a [`SubmissionIdentity`] from an absolute folder path.
///
/// Any `Fn(&Path) -> Result<SubmissionIdentity, MetadataError>` is a resolver,
/// so callers with a different folder convention can plug in their own.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, folder: &Path) -> Result<SubmissionIdentity, MetadataError>;
}

impl<F> IdentityResolver for F
where
    F: Fn(&Path) -> Result<SubmissionIdentity, MetadataError> + Send + Sync,
{
    fn resolve(&self, folder: &Path) -> Result<SubmissionIdentity, MetadataError> {
        self(folder)
    }
}

/// Which of the two trailing path segments holds the name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentOrder {
    /// `.../<name>/<week>`
    #[default]
    NameThenWeek,
    /// `.../<week>/<name>`
    WeekThenName,
}

/// Reads identity from the last two segments of the path, in a fixed order.
#[derive(Debug, Clone)]
pub struct PositionalResolver {
    pub order: SegmentOrder,
    pub conjunction: String,
}

impl Default for PositionalResolver {
    fn default() -> Self {
        Self {
            order: SegmentOrder::default(),
            conjunction: DEFAULT_CONJUNCTION.to_string(),
        }
    }
}

impl PositionalResolver {
    pub fn new(order: SegmentOrder, conjunction: impl Into<String>) -> Self {
        Self {
            order,
            conjunction: conjunction.into(),
        }
    }
}

impl IdentityResolver for PositionalResolver {
    fn resolve(&self, folder: &Path) -> Result<SubmissionIdentity, MetadataError> {
        let segments: Vec<String> = folder
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        let [.., first, last] = segments.as_slice() else {
            error!(path = %folder.display(), "Submission path has fewer than two segments");
            return Err(MetadataError::MissingSegments {
                path: folder.to_path_buf(),
            });
        };

        let (name, week) = match self.order {
            SegmentOrder::NameThenWeek => (first, last),
            SegmentOrder::WeekThenName => (last, first),
        };

        let week_id = parse_week(week).ok_or_else(|| {
            error!(path = %folder.display(), segment = %week, "Week segment is not numeric");
            MetadataError::InvalidWeek {
                path: folder.to_path_buf(),
                segment: week.clone(),
            }
        })?;

        let identity = SubmissionIdentity {
            raw_name: name.clone(),
            display_name: display_name(name, &self.conjunction),
            week_id,
            week_label: week.clone(),
        };
        debug!(?identity, "Resolved submission identity");
        Ok(identity)
    }
}

/// Replaces `_` with a space and `--` with `conjunction`. Each author is
/// LaTeX-escaped; the conjunction is inserted as is.
pub fn display_name(raw: &str, conjunction: &str) -> String {
    raw.split("--")
        .map(|author| escape_latex(&author.replace('_', " ")))
        .collect::<Vec<_>>()
        .join(conjunction)
}

fn parse_week(segment: &str) -> Option<u32> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}
