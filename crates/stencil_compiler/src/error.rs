//! Error types for template compilation.

use thiserror::Error;

/// Compilation result type.
pub type Result<T> = std::result::Result<T, CompileError>;

/// Compilation errors.
///
/// `Template` wraps structural problems with the document itself; the
/// others depend on the caller's request parameters and can differ between
/// two compilations of the same template.
#[derive(Error, Debug)]
pub enum CompileError {
    /// The template document is malformed
    #[error(transparent)]
    Template(#[from] stencil_template::TemplateError),

    /// A required parameter was absent or blank
    #[error("Missing or empty required parameters: {}", names.join(", "))]
    MissingParameter { names: Vec<String> },

    /// A statement was blocked by a safety guard
    #[error("Unsafe operation: {0}")]
    UnsafeOperation(String),

    /// The same parameter name was bound to two different values
    #[error("Ambiguous parameter '{name}': bound to conflicting values")]
    AmbiguousParameter { name: String },
}

impl CompileError {
    /// Create a missing-parameter error for a single name.
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter {
            names: vec![name.into()],
        }
    }

    /// Create an unsafe-operation error.
    pub fn unsafe_operation(msg: impl Into<String>) -> Self {
        Self::UnsafeOperation(msg.into())
    }

    /// Create an ambiguous-parameter error.
    pub fn ambiguous_parameter(name: impl Into<String>) -> Self {
        Self::AmbiguousParameter { name: name.into() }
    }
}
