//! High-level pipeline: turns one submission folder into one review artifact.
//!
//! Each run is strictly linear:
//!   - Extract: identity (name, week) from the folder path via an [`IdentityResolver`]
//!   - Classify: split the file list into renderables, attachments and ignored files
//!   - Normalize: format or copy renderables into a private scratch workspace
//!   - Render: fill the document template, one embedding block per file
//!   - Compile: run the typesetting engine inside the workspace
//!   - Merge: append attachments and write the artifact to its destination
//!
//! # Responsibilities
//! - Fail fast: the first error ends the submission, nothing is retried
//! - Own the scratch workspace; it is removed before [`ReviewPipeline::review`]
//!   returns, whatever the outcome
//! - Keep runs independent: one call is one submission and no state is
//!   shared between calls
//!
//! # Navigation
//! - Main entrypoint: [`ReviewPipeline::review`]
//! - Supporting types: [`SubmissionRequest`], [`ReviewReport`]

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::classify::{classify, OrderingStrategy};
use crate::compile::compile;
use crate::config::ReviewConfig;
use crate::contract::{DocumentMerger, Formatter, Typesetter};
use crate::error::{PipelineError, TemplateError};
use crate::merge::merge;
use crate::metadata::{IdentityResolver, PositionalResolver, SubmissionIdentity};
use crate::normalize::{Decoded, Normalizer};
use crate::render::{DocumentRenderer, RenderContext};
use crate::tools::{CommandFormatter, CommandMerger, CommandTypesetter};

/// One submission to review.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    /// Absolute path of the submission folder; identity is read from it.
    pub folder: PathBuf,
    /// Files relative to `folder`, in the order they should appear.
    pub files: Vec<String>,
    /// Where the merged artifact is written.
    pub output_dir: PathBuf,
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct ReviewReport {
    pub identity: SubmissionIdentity,
    pub output: PathBuf,
    /// Generated document source, exactly as compiled.
    pub document_source: String,
    pub rendered_files: Vec<String>,
    pub attachments: Vec<String>,
    pub ignored: Vec<String>,
    /// Decoding outcome per normalized (non-copied) file.
    pub decodings: Vec<(String, Decoded)>,
}

pub struct ReviewPipeline {
    config: ReviewConfig,
    resolver: Box<dyn IdentityResolver>,
    formatter: Box<dyn Formatter>,
    reflow: Option<Box<dyn Formatter>>,
    typesetter: Box<dyn Typesetter>,
    merger: Box<dyn DocumentMerger>,
    renderer: DocumentRenderer,
}

impl ReviewPipeline {
    /// Pipeline with explicit collaborators and the bundled template. The
    /// reflow tool is off until [`ReviewPipeline::with_reflow`] installs one.
    pub fn new(
        config: ReviewConfig,
        formatter: Box<dyn Formatter>,
        typesetter: Box<dyn Typesetter>,
        merger: Box<dyn DocumentMerger>,
    ) -> Self {
        let resolver = PositionalResolver::new(config.identity.order, config.identity.conjunction.clone());
        Self {
            config,
            resolver: Box::new(resolver),
            formatter,
            reflow: None,
            typesetter,
            merger,
            renderer: DocumentRenderer::default(),
        }
    }

    /// Pipeline wired to the commands named in `config`.
    pub fn from_config(config: ReviewConfig) -> Result<Self, PipelineError> {
        let tools = config.tools.clone();
        let template = match &config.document.template {
            Some(path) => Some(fs::read_to_string(path).map_err(|e| {
                error!(error = ?e, path = %path.display(), "Failed to read document template");
                TemplateError::Read {
                    path: path.clone(),
                    source: e,
                }
            })?),
            None => None,
        };
        let reflow_text = config.normalize.reflow_text;

        let mut pipeline = Self::new(
            config,
            Box::new(CommandFormatter::new(tools.formatter)),
            Box::new(CommandTypesetter::new(tools.typesetter)),
            Box::new(CommandMerger::new(tools.merger)),
        );
        if reflow_text {
            pipeline = pipeline.with_reflow(Box::new(CommandFormatter::new(tools.reflow)));
        }
        if let Some(template) = template {
            pipeline = pipeline.with_template(&template)?;
        }
        Ok(pipeline)
    }

    pub fn with_reflow(mut self, reflow: Box<dyn Formatter>) -> Self {
        self.reflow = Some(reflow);
        self
    }

    pub fn with_resolver(mut self, resolver: Box<dyn IdentityResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_template(mut self, template: &str) -> Result<Self, PipelineError> {
        self.renderer = DocumentRenderer::new(template)?;
        Ok(self)
    }

    pub fn with_ordering(mut self, ordering: OrderingStrategy) -> Self {
        self.config.ordering = ordering;
        self
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    /// Runs one submission end to end.
    pub async fn review(&self, request: &SubmissionRequest) -> Result<ReviewReport, PipelineError> {
        let identity = self.resolver.resolve(&request.folder)?;
        let span = info_span!(
            "submission",
            name = %identity.raw_name,
            week = identity.week_id
        );
        self.run(identity, request).instrument(span).await
    }

    async fn run(
        &self,
        identity: SubmissionIdentity,
        request: &SubmissionRequest,
    ) -> Result<ReviewReport, PipelineError> {
        info!(folder = %request.folder.display(), files = request.files.len(), "Starting review");

        let classification = classify(
            &request.files,
            &self.config.classification,
            self.config.ordering,
        );

        let workspace = tempfile::Builder::new()
            .prefix("review-")
            .tempdir()
            .map_err(|e| {
                error!(error = ?e, "Failed to create scratch workspace");
                PipelineError::Workspace(e)
            })?;
        debug!(path = %workspace.path().display(), "Created scratch workspace");

        let normalizer = Normalizer::new(
            self.formatter.as_ref(),
            self.reflow.as_deref(),
            &self.config.normalize.encodings,
        );
        let normalized = normalizer
            .normalize_all(&request.folder, &classification.renderables, workspace.path())
            .await?;

        let context = RenderContext::new(&identity, &self.config.document.info, &normalized);
        let document = self.renderer.render(&context)?;

        let stem = identity.artifact_stem();
        let compiled = compile(
            self.typesetter.as_ref(),
            workspace.path(),
            &stem,
            &document,
            &self.config.typesetting,
        )
        .await?;

        let attachments: Vec<PathBuf> = classification
            .attachments
            .iter()
            .map(|f| request.folder.join(&f.relative_path))
            .collect();
        let destination = request
            .output_dir
            .join(format!("{stem}.{}", self.config.typesetting.artifact_extension));
        let output = merge(self.merger.as_ref(), &compiled.path, &attachments, &destination).await?;

        if let Err(e) = workspace.close() {
            warn!(error = ?e, "Failed to remove scratch workspace");
        }

        let names = |files: &[crate::classify::ClassifiedFile]| {
            files.iter().map(|f| f.relative_path.clone()).collect::<Vec<_>>()
        };
        let report = ReviewReport {
            output,
            document_source: document,
            rendered_files: names(&classification.renderables),
            attachments: names(&classification.attachments),
            ignored: names(&classification.ignored),
            decodings: normalized
                .into_iter()
                .filter_map(|n| n.decoding.map(|d| (n.file.relative_path, d)))
                .collect(),
            identity,
        };
        info!(output = %report.output.display(), "Review complete");
        Ok(report)
    }

    /// Reviews every file found under `folder`; the artifact goes to its parent.
    /// A review artifact of this same submission left inside the folder by an
    /// earlier run is not picked up as an attachment.
    pub async fn review_folder(&self, folder: &Path) -> Result<ReviewReport, PipelineError> {
        let identity = self.resolver.resolve(folder)?;
        let own_artifact = format!(
            "{}.{}",
            identity.artifact_stem(),
            self.config.typesetting.artifact_extension
        );
        let mut files = discover_files(folder).map_err(|e| {
            error!(error = ?e, path = %folder.display(), "Failed to list submission folder");
            PipelineError::Discovery {
                path: folder.to_path_buf(),
                source: e,
            }
        })?;
        files.retain(|f| {
            let stale = *f == own_artifact;
            if stale {
                debug!(file = %f, "Skipping previous review artifact");
            }
            !stale
        });

        let output_dir = folder
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| folder.to_path_buf());
        let request = SubmissionRequest {
            folder: folder.to_path_buf(),
            files,
            output_dir,
        };
        self.review(&request).await
    }
}

/// Lists files under `folder` recursively, relative to it and `/`-separated.
/// Hidden entries are skipped; names are sorted so the order is stable
/// across file systems.
pub fn discover_files(folder: &Path) -> std::io::Result<Vec<String>> {
    fn visit(dir: &Path, prefix: &str, out: &mut Vec<String>) -> std::io::Result<()> {
        let mut entries = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                debug!(path = %entry.path().display(), "Skipping hidden entry");
                continue;
            }
            let relative = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                visit(&entry.path(), &relative, out)?;
            } else if entry.path().is_file() {
                out.push(relative);
            }
        }
        Ok(())
    }

    let mut out = Vec::new();
    visit(folder, "", &mut out)?;
    debug!(path = %folder.display(), count = out.len(), "Discovered submission files");
    Ok(out)
}
