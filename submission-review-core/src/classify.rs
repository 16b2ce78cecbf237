//! File classification and ordering.
//!
//! Category is a pure function of the file's extension and base name. The
//! rules are an explicit value so differently configured pipelines can run
//! side by side.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    SourceCode,
    PlainText,
    Patch,
    BuildRecipe,
    ImageAttachment,
    Ignored,
}

impl Category {
    /// Language hint for the embedding directive.
    pub fn language_tag(self) -> Option<&'static str> {
        match self {
            Category::SourceCode => Some("c"),
            Category::PlainText => Some("text"),
            Category::Patch => Some("diff"),
            Category::BuildRecipe => Some("make"),
            Category::ImageAttachment | Category::Ignored => None,
        }
    }
}

/// Extension and file-name tables. Matching is case-insensitive and leading
/// dots are ignored, so `".H"` and `"h"` are the same entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationRules {
    /// Header extensions first: the order is the grouping priority.
    pub source_extensions: Vec<String>,
    pub text_extensions: Vec<String>,
    pub patch_extensions: Vec<String>,
    pub build_recipe_names: Vec<String>,
    pub attachment_extensions: Vec<String>,
}

impl Default for ClassificationRules {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        Self {
            source_extensions: owned(&["h", "hpp", "c", "cpp"]),
            text_extensions: owned(&["txt"]),
            patch_extensions: owned(&["patch", "diff"]),
            build_recipe_names: owned(&["makefile"]),
            attachment_extensions: owned(&["pdf"]),
        }
    }
}

fn matches(table: &[String], needle: &str) -> bool {
    table
        .iter()
        .any(|entry| entry.trim_start_matches('.').eq_ignore_ascii_case(needle))
}

fn position(table: &[String], needle: &str) -> Option<usize> {
    table
        .iter()
        .position(|entry| entry.trim_start_matches('.').eq_ignore_ascii_case(needle))
}

impl ClassificationRules {
    pub fn category_of(&self, path: &str) -> Category {
        let path = Path::new(path);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if matches(&self.build_recipe_names, &file_name) {
            return Category::BuildRecipe;
        }

        let Some(ext) = path.extension().map(|e| e.to_string_lossy()) else {
            return Category::Ignored;
        };

        if matches(&self.source_extensions, &ext) {
            Category::SourceCode
        } else if matches(&self.text_extensions, &ext) {
            Category::PlainText
        } else if matches(&self.patch_extensions, &ext) {
            Category::Patch
        } else if matches(&self.attachment_extensions, &ext) {
            Category::ImageAttachment
        } else {
            Category::Ignored
        }
    }

    /// Rank of a file inside its base-name group; lower sorts first.
    fn priority(&self, file: &ClassifiedFile) -> usize {
        if file.category == Category::BuildRecipe {
            return usize::MAX;
        }
        let ext = Path::new(&file.relative_path)
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        let tables = [
            &self.source_extensions,
            &self.text_extensions,
            &self.patch_extensions,
            &self.attachment_extensions,
        ];
        let mut offset = 0;
        for table in tables {
            if let Some(idx) = position(table, &ext) {
                return offset + idx;
            }
            offset += table.len();
        }
        usize::MAX
    }
}

/// One input file after classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedFile {
    /// As supplied by the caller.
    pub relative_path: String,
    pub category: Category,
    /// Unescaped display form of the path (always `/`-separated).
    pub label: String,
    pub language_tag: Option<&'static str>,
}

impl ClassifiedFile {
    pub fn new(relative_path: &str, rules: &ClassificationRules) -> Self {
        let category = rules.category_of(relative_path);
        Self {
            relative_path: relative_path.to_string(),
            category,
            label: relative_path.replace('\\', "/"),
            language_tag: category.language_tag(),
        }
    }

    /// Path without its extension; the grouping key.
    fn base_name(&self) -> &str {
        let path = self.relative_path.as_str();
        match Path::new(path).extension() {
            Some(ext) => &path[..path.len() - ext.len() - 1],
            None => path,
        }
    }
}

/// How classified files are arranged before rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingStrategy {
    /// Keep the order files were supplied or discovered in.
    #[default]
    InputOrder,
    /// Group files sharing a base name, groups sorted by base name, members
    /// by extension priority (header before implementation).
    GroupByBaseName,
}

impl OrderingStrategy {
    pub fn apply(self, mut files: Vec<ClassifiedFile>, rules: &ClassificationRules) -> Vec<ClassifiedFile> {
        match self {
            OrderingStrategy::InputOrder => files,
            OrderingStrategy::GroupByBaseName => {
                // Stable sort: files with equal keys keep their input order.
                files.sort_by(|a, b| {
                    a.base_name()
                        .cmp(b.base_name())
                        .then_with(|| rules.priority(a).cmp(&rules.priority(b)))
                });
                files
            }
        }
    }
}

/// Result of classifying one submission. The three sequences partition the
/// input: every path lands in exactly one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Embedded into the generated document.
    pub renderables: Vec<ClassifiedFile>,
    /// Appended to the compiled document by the merger.
    pub attachments: Vec<ClassifiedFile>,
    pub ignored: Vec<ClassifiedFile>,
}

pub fn classify<S: AsRef<str>>(
    paths: &[S],
    rules: &ClassificationRules,
    strategy: OrderingStrategy,
) -> Classification {
    let mut out = Classification::default();
    for path in paths {
        let file = ClassifiedFile::new(path.as_ref(), rules);
        debug!(path = %file.relative_path, category = ?file.category, "Classified file");
        match file.category {
            Category::ImageAttachment => out.attachments.push(file),
            Category::Ignored => out.ignored.push(file),
            _ => out.renderables.push(file),
        }
    }
    out.renderables = strategy.apply(out.renderables, rules);
    out.attachments = strategy.apply(out.attachments, rules);

    info!(
        renderables = out.renderables.len(),
        attachments = out.attachments.len(),
        ignored = out.ignored.len(),
        ?strategy,
        "Classified submission files"
    );
    out
}
