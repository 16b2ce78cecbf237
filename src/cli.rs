///
/// This module implements the CLI interface for submission-review: command
/// parsing, argument validation, the async entrypoint and the user-visible
/// failure output.
///
/// All pipeline logic lives in the [`submission-review-core`] crate. This
/// module only maps arguments to [`SubmissionRequest`]s and reports results.
///
/// ## How To Use
/// - Command line: `submission-review --help`.
/// - Programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`submission-review-core`]: ../../submission-review-core/
use crate::load_config::load_config;
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use submission_review_core::classify::OrderingStrategy;
use submission_review_core::error::PipelineError;
use submission_review_core::pipeline::{ReviewPipeline, ReviewReport, SubmissionRequest};

/// CLI for submission-review: one annotatable review PDF per submission.
#[derive(Parser)]
#[clap(
    name = "submission-review",
    version,
    about = "Creates big review PDF files for annotating coursework submissions"
)]
pub struct Cli {
    /// Path to a YAML config file (defaults apply when omitted)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override how files are ordered in the document
    #[clap(long, global = true, value_enum)]
    pub ordering: Option<Ordering>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Review the listed files as one submission
    Files {
        /// Submission folder the files are relative to (default: current directory)
        #[clap(long)]
        folder: Option<PathBuf>,

        /// Where to write the review PDF (default: current directory)
        #[clap(long)]
        output_dir: Option<PathBuf>,

        /// Files to review
        #[clap(required = true)]
        files: Vec<String>,
    },
    /// Review every file in each folder; each folder is one submission
    Folders {
        /// Submissions processed at the same time
        #[clap(long, default_value_t = 1)]
        jobs: usize,

        /// Submission folders
        #[clap(required = true)]
        folders: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Ordering {
    /// Keep the given order
    Input,
    /// Group by base name, headers before implementations
    Grouped,
}

impl From<Ordering> for OrderingStrategy {
    fn from(o: Ordering) -> Self {
        match o {
            Ordering::Input => OrderingStrategy::InputOrder,
            Ordering::Grouped => OrderingStrategy::GroupByBaseName,
        }
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(ordering) = cli.ordering {
        config.ordering = ordering.into();
    }
    let pipeline = ReviewPipeline::from_config(config).map_err(|e| {
        tracing::error!(error = %e, "Failed to set up pipeline");
        anyhow!(e)
    })?;

    match cli.command {
        Commands::Files {
            folder,
            output_dir,
            files,
        } => {
            let cwd = std::env::current_dir().context("Cannot determine current directory")?;
            let folder = absolute(folder.as_deref().unwrap_or(&cwd))?;
            let output_dir = output_dir.unwrap_or(cwd);
            let request = SubmissionRequest {
                folder,
                files,
                output_dir,
            };
            tracing::info!(command = "files", folder = %request.folder.display(), "Starting review");
            match pipeline.review(&request).await {
                Ok(report) => {
                    print_success(&report);
                    Ok(())
                }
                Err(e) => {
                    report_failure(&request.folder, &e);
                    Err(anyhow!("{} stage failed: {}", e.stage(), e))
                }
            }
        }
        Commands::Folders { jobs, folders } => {
            let folders = folders
                .iter()
                .map(|f| absolute(f))
                .collect::<Result<Vec<_>>>()?;
            tracing::info!(command = "folders", count = folders.len(), jobs, "Starting review");
            let results = review_folders(&pipeline, folders, jobs).await;

            let total = results.len();
            let mut failed = 0;
            for (folder, result) in &results {
                match result {
                    Ok(report) => print_success(report),
                    Err(e) => {
                        failed += 1;
                        report_failure(folder, e);
                    }
                }
            }
            if failed > 0 {
                tracing::error!(failed, total, "Some submissions failed");
                bail!("{failed} of {total} submissions failed");
            }
            Ok(())
        }
    }
}

/// Reviews each folder as its own submission, at most `jobs` at a time.
/// Results come back in input order; one failure does not stop the rest.
pub async fn review_folders(
    pipeline: &ReviewPipeline,
    folders: Vec<PathBuf>,
    jobs: usize,
) -> Vec<(PathBuf, Result<ReviewReport, PipelineError>)> {
    stream::iter(folders)
        .map(|folder| async move {
            let result = pipeline.review_folder(&folder).await;
            (folder, result)
        })
        .buffered(jobs.max(1))
        .collect()
        .await
}

fn absolute(path: &Path) -> Result<PathBuf> {
    path.canonicalize()
        .with_context(|| format!("Cannot resolve submission folder {}", path.display()))
}

fn print_success(report: &ReviewReport) {
    println!("Wrote {}", report.output.display());
    for (file, decoded) in &report.decodings {
        if decoded.lossy {
            println!("  warning: {file} was not valid text; undecodable bytes were dropped");
        }
    }
    if !report.ignored.is_empty() {
        println!("  ignored: {}", report.ignored.join(", "));
    }
}

/// Prints which stage failed and, for compile failures, everything needed to
/// fix the document by hand.
fn report_failure(folder: &Path, e: &PipelineError) {
    tracing::error!(folder = %folder.display(), stage = %e.stage(), error = %e, "Review failed");
    eprintln!("[ERROR] {}: {} stage failed: {}", folder.display(), e.stage(), e);
    if let PipelineError::Compile(compile) = e {
        eprintln!("----- generated document source ({}) -----", compile.source_file);
        eprintln!("{}", compile.document_source());
        if let Some(diagnostics) = compile.diagnostics() {
            eprintln!("----- typesetting engine output -----");
            eprintln!("{diagnostics}");
        }
    }
}
