use crate::config::PackMode;
use crate::constants::LARGE_FILE_THRESHOLD;
use crate::oci::{self, ModelLayerMediaTypes};
use anyhow::Result;
use glob::Pattern;
use std::collections::HashMap;
use std::path::Path;
use walkdir::WalkDir;

/// Semantic category assigned to every packaged file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Weights,
    Config,
    Docs,
    Code,
    Dataset,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Weights,
        Category::Config,
        Category::Docs,
        Category::Code,
        Category::Dataset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Weights => "weights",
            Category::Config => "config",
            Category::Docs => "docs",
            Category::Code => "code",
            Category::Dataset => "dataset",
        }
    }

    /// ModelPack layer media types for this category.
    pub fn media_types(&self) -> ModelLayerMediaTypes {
        match self {
            Category::Weights => oci::WEIGHT_LAYER_TYPES,
            Category::Config => oci::WEIGHT_CONFIG_LAYER_TYPES,
            Category::Docs => oci::DOC_LAYER_TYPES,
            Category::Code => oci::CODE_LAYER_TYPES,
            Category::Dataset => oci::DATASET_LAYER_TYPES,
        }
    }
}

// Basename match rules, first hit wins. Docs precede config so LICENSE and
// readme files never fall through to the bare-extension rules.
const WEIGHT_GLOBS: &[&str] = &["*.safetensors", "*.bin", "*.gguf", "*.pt", "*.ckpt"];
const DOC_GLOBS: &[&str] = &["readme*", "license*", "license", "*.md"];
const CONFIG_GLOBS: &[&str] = &[
    "config.json",
    "tokenizer.json",
    "*tokenizer*.json",
    "generation_config.json",
    "*.json",
    "*.txt",
];
const CODE_GLOBS: &[&str] = &["*.py", "*.sh", "*.ipynb", "*.go", "*.js", "*.ts"];
const DATASET_GLOBS: &[&str] = &["*.csv", "*.tsv", "*.jsonl", "*.parquet", "*.arrow", "*.h5", "*.npz"];

/// Deterministic file classifier mirroring the assembler script's case table.
pub struct Classifier {
    rules: Vec<(Category, Vec<Pattern>)>,
}

impl Classifier {
    pub fn new() -> Self {
        let compile = |globs: &[&str]| -> Vec<Pattern> {
            globs
                .iter()
                .map(|g| Pattern::new(g).expect("invalid classifier glob"))
                .collect()
        };
        Self {
            rules: vec![
                (Category::Weights, compile(WEIGHT_GLOBS)),
                (Category::Docs, compile(DOC_GLOBS)),
                (Category::Config, compile(CONFIG_GLOBS)),
                (Category::Code, compile(CODE_GLOBS)),
                (Category::Dataset, compile(DATASET_GLOBS)),
            ],
        }
    }

    /// Assign a category from the lowercased basename; unknown files larger
    /// than the threshold count as weights, the rest as config.
    pub fn classify(&self, path: &str, size: u64) -> Category {
        let path = path.strip_prefix("./").unwrap_or(path);
        let base = path.rsplit('/').next().unwrap_or(path).to_lowercase();
        for (category, patterns) in &self.rules {
            if patterns.iter().any(|p| p.matches(&base)) {
                return *category;
            }
        }
        if size > LARGE_FILE_THRESHOLD {
            Category::Weights
        } else {
            Category::Config
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// One enumerated source file: path relative to the source root, plus size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub size: u64,
}

impl FileRecord {
    /// The `path|size` line the enumeration sorts by.
    fn sort_key(&self) -> String {
        format!("{}|{}", self.path, self.size)
    }
}

/// Enumerate files the way the assembler script does: skip `*.lock` basenames
/// and everything under `.cache/`, then sort by the byte order of the
/// `path|size` line (the script's `LC_ALL=C sort`).
pub fn enumerate_files(root: &Path) -> Result<Vec<FileRecord>> {
    let mut records = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let path = rel.to_string_lossy().to_string();
        if path.starts_with(".cache/") {
            continue;
        }
        let base = path.rsplit('/').next().unwrap_or(&path);
        if base.ends_with(".lock") {
            continue;
        }
        let size = entry.metadata()?.len();
        records.push(FileRecord { path, size });
    }
    records.sort_by(|a, b| a.sort_key().as_bytes().cmp(b.sort_key().as_bytes()));
    Ok(records)
}

/// Per-category file lists plus the size cache the assembler keeps to avoid
/// repeated stat calls.
#[derive(Debug, Default)]
pub struct Classification {
    pub weights: Vec<String>,
    pub config: Vec<String>,
    pub docs: Vec<String>,
    pub code: Vec<String>,
    pub dataset: Vec<String>,
    pub sizes: HashMap<String, u64>,
}

impl Classification {
    pub fn category(&self, category: Category) -> &[String] {
        match category {
            Category::Weights => &self.weights,
            Category::Config => &self.config,
            Category::Docs => &self.docs,
            Category::Code => &self.code,
            Category::Dataset => &self.dataset,
        }
    }

    pub fn total_files(&self) -> usize {
        Category::ALL.iter().map(|c| self.category(*c).len()).sum()
    }

    /// Number of layers the assembler will emit. Raw mode is one layer per
    /// file; archive modes keep weights one-per-file and aggregate every
    /// other non-empty category.
    pub fn expected_layer_count(&self, mode: PackMode) -> usize {
        match mode {
            PackMode::Raw => self.total_files(),
            _ => {
                self.weights.len()
                    + [&self.config, &self.docs, &self.code, &self.dataset]
                        .iter()
                        .filter(|list| !list.is_empty())
                        .count()
            }
        }
    }
}

/// Classify sorted records into category lists, preserving enumeration order.
pub fn classify_files(records: &[FileRecord]) -> Classification {
    let classifier = Classifier::new();
    let mut out = Classification::default();
    for record in records {
        let path = record.path.strip_prefix("./").unwrap_or(&record.path).to_string();
        match classifier.classify(&path, record.size) {
            Category::Weights => out.weights.push(path.clone()),
            Category::Config => out.config.push(path.clone()),
            Category::Docs => out.docs.push(path.clone()),
            Category::Code => out.code.push(path.clone()),
            Category::Dataset => out.dataset.push(path.clone()),
        }
        out.sizes.insert(path, record.size);
    }
    out
}
