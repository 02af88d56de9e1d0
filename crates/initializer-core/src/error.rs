//! Error types for catalog loading, selection changes and scaffold generation

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for catalog and preset loading
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Result alias for selection changes
pub type SelectionResult<T> = std::result::Result<T, SelectionError>;

/// Result alias for generation
pub type ScaffoldResult<T> = std::result::Result<T, ScaffoldError>;

/// Data-authoring problems found while loading a catalog or preset.
///
/// These are raised once at load time and never during generation.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("library '{0}' is declared more than once")]
    DuplicateLibrary(String),

    #[error("library '{library}' lists unknown library '{target}' in {relation}")]
    UnknownRelation {
        library: String,
        relation: &'static str,
        target: String,
    },

    #[error("library '{library}' lists itself in {relation}")]
    SelfReference {
        library: String,
        relation: &'static str,
    },

    #[error("library '{library}' parameter '{parameter}': {message}")]
    InvalidParameter {
        library: String,
        parameter: String,
        message: String,
    },

    #[error("{kind} version list is empty")]
    EmptyVersions { kind: &'static str },

    #[error("default {kind} version '{version}' is not a declared version")]
    UnknownDefaultVersion { kind: &'static str, version: String },

    #[error("{context} references unknown library '{library}'")]
    UnknownLibrary { context: String, library: String },

    #[error("{context}: library '{library}' has no version '{version}'")]
    UnknownVersion {
        context: String,
        library: String,
        version: String,
    },

    #[error("{context}: library '{library}' has no parameter '{parameter}'")]
    UnknownParameter {
        context: String,
        library: String,
        parameter: String,
    },

    #[error("{context}: '{first}' and '{second}' are incompatible")]
    IncompatiblePair {
        context: String,
        first: String,
        second: String,
    },

    #[error("{context}: {message}")]
    Invalid { context: String, message: String },
}

/// Rejected changes to the library selection
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// Hard incompatibility; the addition is never committed
    #[error("'{candidate}' cannot be combined with {}", .with.join(", "))]
    Rejected { candidate: String, with: Vec<String> },

    /// Soft conflict; the addition needs explicit confirmation
    #[error("'{candidate}' conflicts with {} and needs confirmation", .with.join(", "))]
    NeedsConfirmation { candidate: String, with: Vec<String> },

    #[error("unknown library '{0}'")]
    UnknownLibrary(String),

    #[error("library '{library}' has no version '{version}'")]
    UnknownVersion { library: String, version: String },

    #[error("library '{library}' has no parameter '{parameter}'")]
    UnknownParameter { library: String, parameter: String },

    #[error("'{value}' is not an allowed value for {library}.{parameter} (allowed: {})", .allowed.join(", "))]
    InvalidParameterValue {
        library: String,
        parameter: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("{kind} version '{version}' is not offered by the catalog")]
    UnsupportedVersion { kind: &'static str, version: String },

    #[error("invalid project name '{0}'")]
    InvalidProjectName(String),
}

/// Failures while building, serializing or delivering a scaffold.
///
/// Any of these aborts the whole generation; no partial archive is offered.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("a generation is already in progress")]
    GenerationInProgress,

    #[error("failed to create folder '{path}': {reason}")]
    Folder { path: String, reason: String },

    #[error("failed to add file '{path}': {reason}")]
    File { path: String, reason: String },

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("archive entry '{0}' escapes the target directory")]
    UnsafeEntry(String),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
