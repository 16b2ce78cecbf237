use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::classify::{ClassificationRules, OrderingStrategy};
use crate::compile::TypesettingConfig;
use crate::metadata::{SegmentOrder, DEFAULT_CONJUNCTION};
use crate::normalize::TextEncoding;
use crate::render::DocumentInfo;
use crate::tools::ToolCommand;

/// Full pipeline configuration. Every section has defaults matching the
/// C-course setup: clang-format, pdflatex with minted, pdfunite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub classification: ClassificationRules,
    pub ordering: OrderingStrategy,
    pub normalize: NormalizeConfig,
    pub identity: IdentityConfig,
    pub document: DocumentConfig,
    pub tools: ToolsConfig,
    pub typesetting: TypesettingConfig,
}

impl ReviewConfig {
    pub fn trace_loaded(&self) {
        info!(
            ordering = ?self.ordering,
            reflow_text = self.normalize.reflow_text,
            formatter = %self.tools.formatter.program,
            typesetter = %self.tools.typesetter.program,
            merger = %self.tools.merger.program,
            passes = self.typesetting.passes,
            "Loaded ReviewConfig"
        );
        debug!(?self, "ReviewConfig loaded (full debug)");
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Run plain-text files through the reflow tool.
    pub reflow_text: bool,
    /// Decoding priority for submitted files.
    pub encodings: Vec<TextEncoding>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            reflow_text: false,
            encodings: TextEncoding::DEFAULT_PRIORITY.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub order: SegmentOrder,
    /// Inserted between co-authors written as `A--B`.
    pub conjunction: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            order: SegmentOrder::default(),
            conjunction: DEFAULT_CONJUNCTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    #[serde(flatten)]
    pub info: DocumentInfo,
    /// Custom handlebars template replacing the bundled one.
    pub template: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub formatter: ToolCommand,
    pub reflow: ToolCommand,
    pub typesetter: ToolCommand,
    pub merger: ToolCommand,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            formatter: ToolCommand::clang_format(),
            reflow: ToolCommand::par(),
            typesetter: ToolCommand::pdflatex(),
            merger: ToolCommand::pdfunite(),
        }
    }
}
