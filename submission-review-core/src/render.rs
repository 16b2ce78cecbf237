//! Generation of the review document source.
//!
//! The template gets the submitter, the week and one entry per normalized
//! file; the per-entry block is expanded in entry order. Labels are escaped
//! here, not by the classifier, since only the renderer knows the output
//! format.

use handlebars::{no_escape, Handlebars};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{EmptySubmissionError, TemplateError};
use crate::metadata::SubmissionIdentity;
use crate::normalize::NormalizedFile;

pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/review.tex.hbs");

const TEMPLATE_NAME: &str = "review";

pub const DEFAULT_INTRO: &str = "This is the source code you submitted. It was reformatted \
with a standard style to make annotating easier; its content has not changed.";

/// Optional document decorations, taken from config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentInfo {
    pub subject: Option<String>,
    pub reviewer: Option<String>,
    pub intro: Option<String>,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            subject: None,
            reviewer: None,
            intro: Some(DEFAULT_INTRO.to_string()),
        }
    }
}

/// One embedding block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderEntry {
    /// Escaped for the document format.
    pub label: String,
    /// Relative to the workspace the document is compiled in.
    pub path: String,
    pub language: String,
}

/// Everything the template sees. Built fresh for each submission.
#[derive(Debug, Clone, Serialize)]
pub struct RenderContext {
    pub submitter: String,
    pub week: u32,
    pub subject: Option<String>,
    pub reviewer: Option<String>,
    pub intro: Option<String>,
    pub entries: Vec<RenderEntry>,
    #[serde(skip)]
    submission: String,
}

impl RenderContext {
    pub fn new(identity: &SubmissionIdentity, info: &DocumentInfo, files: &[NormalizedFile]) -> Self {
        let entries = files
            .iter()
            .map(|f| RenderEntry {
                label: escape_latex(&f.file.label),
                path: f.workspace_path.clone(),
                language: f.file.language_tag.unwrap_or("text").to_string(),
            })
            .collect();
        Self {
            submitter: identity.display_name.clone(),
            week: identity.week_id,
            subject: info.subject.clone(),
            reviewer: info.reviewer.clone(),
            intro: info.intro.clone(),
            entries,
            submission: identity.artifact_stem(),
        }
    }
}

/// Escapes characters with structural meaning in LaTeX.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '{' | '}' | '$' | '&' | '#' | '_' | '%' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

pub struct DocumentRenderer {
    handlebars: Handlebars<'static>,
}

impl DocumentRenderer {
    pub fn new(template: &str) -> Result<Self, TemplateError> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(no_escape);
        handlebars
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|e| {
                error!(error = %e, "Failed to register document template");
                TemplateError::Register(e.to_string())
            })?;
        Ok(Self { handlebars })
    }

    pub fn render(&self, context: &RenderContext) -> Result<String, RenderError> {
        if context.entries.is_empty() {
            error!(submission = %context.submission, "Nothing selected for rendering");
            return Err(EmptySubmissionError {
                submission: context.submission.clone(),
            }
            .into());
        }
        if let Ok(json) = serde_json::to_string_pretty(context) {
            debug!(json = %json, "Render context");
        }
        let document = self
            .handlebars
            .render(TEMPLATE_NAME, context)
            .map_err(|e| TemplateError::Render(e.to_string()))?;
        info!(
            entries = context.entries.len(),
            bytes = document.len(),
            "Rendered document source"
        );
        Ok(document)
    }
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE).expect("bundled template is valid")
    }
}

/// Failure of [`DocumentRenderer::render`].
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Empty(#[from] EmptySubmissionError),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl From<RenderError> for crate::error::PipelineError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::Empty(e) => e.into(),
            RenderError::Template(e) => e.into(),
        }
    }
}
