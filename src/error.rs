//! Error types for rust_morph

use thiserror::Error;

/// Main error type for ranking runs
#[derive(Error, Debug)]
pub enum MorphError {
    #[error("Invalid expression matrix: {reason}")]
    InvalidExpressionMatrix { reason: String },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: String, got: String },

    #[error("Duplicate gene: {gene}")]
    DuplicateGene { gene: String },

    #[error("Clustering adds same gene to cluster twice: gene={gene}, cluster={cluster}")]
    DuplicateMembership { gene: String, cluster: String },

    #[error("Gene {gene} assigned to both cluster {first} and cluster {second}")]
    OverlappingClusters {
        gene: String,
        first: String,
        second: String,
    },

    #[error("Gene index {index} out of range for a universe of {size} genes")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("Too few genes of interest in {goi}: {found} < {required}")]
    InsufficientSupport {
        goi: String,
        found: usize,
        required: usize,
    },

    #[error("Invalid gene name in {goi}: {gene}")]
    InvalidGeneName { goi: String, gene: String },

    #[error("Internal invariant violated: {context}")]
    InvariantViolation { context: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Parse error in {path}, line {line}: {reason}")]
    Parse {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Run cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl MorphError {
    /// Shorthand for an internal invariant violation
    pub fn invariant(context: impl Into<String>) -> Self {
        MorphError::InvariantViolation {
            context: context.into(),
        }
    }
}

/// Result type alias for rust_morph operations
pub type Result<T> = std::result::Result<T, MorphError>;
