use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationIssue;

#[derive(Error, Debug)]
pub enum DataCommonsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Document error: {0}")]
    Store(#[from] StoreError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read directory '{path}': {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid MCF syntax on line {line}: {content:?}")]
    InvalidMcf { line: usize, content: String },

    #[error("MCF block starting with {first:?} has no 'Node' line")]
    MissingNodeLine { first: String },

    #[error("Failed to read CSV '{path}': {source}")]
    ReadCsv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Malformed table: {0}")]
    MalformedTable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Source '{name}' already exists")]
    DuplicateSource { name: String },

    #[error("Provenance '{name}' already exists for source '{source_name}'. Use overwrite to replace it")]
    DuplicateProvenance { name: String, source_name: String },

    #[error("Variable '{id}' already exists. Use overwrite to replace it")]
    DuplicateVariable { id: String },

    #[error("Node '{id}' already exists in '{scope}'. Use overwrite to replace it")]
    DuplicateNode { id: String, scope: String },

    #[error("File '{file}' is already registered. Use a different name or overwrite")]
    DuplicateFile { file: String },

    #[error("Source '{source_name}' not found. Provide a source URL so the source can be added")]
    MissingSourceUrl { source_name: String },

    #[error("{kind} '{name}' not found")]
    NotFound { kind: EntityKind, name: String },

    #[error("Cannot rename to '{name}': a {kind} with that name already exists")]
    NameCollision { kind: EntityKind, name: String },

    #[error("Invalid data file path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error(
        "Columns of '{file}' do not match its declaration (missing: [{}], unexpected: [{}])",
        .missing.join(", "),
        .unexpected.join(", ")
    )]
    SchemaMismatch {
        file: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("Invalid node '{id}': {reason}")]
    InvalidNode { id: String, reason: String },
}

impl StoreError {
    /// Returns true for the duplicate-key family. These are always recoverable
    /// by retrying with overwrite or a different key.
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            StoreError::DuplicateSource { .. }
                | StoreError::DuplicateProvenance { .. }
                | StoreError::DuplicateVariable { .. }
                | StoreError::DuplicateNode { .. }
                | StoreError::DuplicateFile { .. }
        )
    }
}

/// The kind of document entry an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Source,
    Provenance,
    Variable,
    Node,
    DataFile,
    MetadataScope,
    Flag,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Source => write!(f, "Source"),
            EntityKind::Provenance => write!(f, "Provenance"),
            EntityKind::Variable => write!(f, "Variable"),
            EntityKind::Node => write!(f, "Node"),
            EntityKind::DataFile => write!(f, "Data file"),
            EntityKind::MetadataScope => write!(f, "Metadata file"),
            EntityKind::Flag => write!(f, "Flag"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Config validation failed with {} issue(s): {}", .issues.len(), summarize(.issues))]
    ConfigValidation { issues: Vec<ValidationIssue> },

    #[error("No data to export")]
    NoData,

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write CSV '{path}': {source}")]
    WriteCsv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Cannot lay out '{file}': {source}")]
    Layout {
        file: String,
        #[source]
        source: StoreError,
    },
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A name collision with differing content found while merging fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConflict {
    pub kind: EntityKind,
    pub key: String,
    /// Value already present in the accumulated document.
    pub existing: String,
    /// Value carried by the fragment being merged.
    pub incoming: String,
}

impl std::fmt::Display for MergeConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} '{}' has conflicting definitions: {} vs {}",
            self.kind, self.key, self.existing, self.incoming
        )
    }
}

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Merge conflict: {0}")]
    Conflict(MergeConflict),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, DataCommonsError>;
