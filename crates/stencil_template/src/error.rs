//! Error types for the template document layer.

use thiserror::Error;

/// Template parsing/validation result type.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Template document errors.
///
/// Everything here means the template itself is malformed. Errors that
/// depend on the caller's request parameters live in the compiler crate.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Malformed JSON or a missing/mistyped required structure
    #[error("Failed to parse query template: {0}")]
    Json(#[from] serde_json::Error),

    /// INSERT template without a usable columns array
    #[error("INSERT requires a non-empty 'columns' array")]
    InsertRequiresColumns,

    /// UPDATE template without a usable set array
    #[error("UPDATE requires a non-empty 'set' array")]
    UpdateRequiresSet,

    /// Non-CROSS join declared without ON conditions
    #[error("{0} JOIN requires an 'on' clause")]
    JoinRequiresOn(String),

    /// Every ON condition of a join dropped out, leaving `ON` with no text
    #[error("Join ON clause for '{0}' cannot be empty")]
    EmptyJoinOn(String),
}

impl TemplateError {
    /// Create a join-requires-on error.
    pub fn join_requires_on(join_type: impl Into<String>) -> Self {
        Self::JoinRequiresOn(join_type.into())
    }

    /// Create an empty-join-on error.
    pub fn empty_join_on(table: impl Into<String>) -> Self {
        Self::EmptyJoinOn(table.into())
    }
}
