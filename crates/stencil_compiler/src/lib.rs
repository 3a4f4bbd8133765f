//! Query Template Compiler
//!
//! Turns a declarative JSON query template plus a map of request
//! parameters into a parameterized SQL string and the ordered named
//! parameters it references.
//!
//! # Pipeline
//!
//! 1. **Parse**: the template JSON becomes a [`QueryTemplate`] document
//! 2. **Assemble**: the operation picks a statement assembler, which walks
//!    the document clause by clause (CTEs first, then the statement body)
//! 3. **Bind**: every condition, expression and assignment that consumes a
//!    request parameter coerces it to a typed [`ParamValue`] and records it
//!    in first-occurrence order
//!
//! The compiler never touches a database. Output is a SQL string with
//! `:name` placeholders and the parameter map to hand to a driver. The
//! same template and request always produce the same output.
//!
//! Safety guards refuse statements that would silently do too much or too
//! little: DELETE without a WHERE clause, UPDATE that would set nothing,
//! INSERT with every column omitted.
//!
//! # Example
//!
//! ```
//! use stencil_compiler::compile;
//!
//! let template = r#"{
//!     "source": {"table": "users", "alias": "u"},
//!     "projection": [{"field": "u.id"}, {"field": "u.name"}],
//!     "filters": {"field": "u.id", "op": "=", "param": "userId"}
//! }"#;
//!
//! let mut request = stencil_compiler::Params::new();
//! request.insert("userId".to_string(), serde_json::json!(123));
//!
//! let query = compile(template, &request)?;
//! assert_eq!(query.sql, "SELECT u.id, u.name FROM users u WHERE u.id = :userId");
//! assert_eq!(query.parameters.len(), 1);
//! # Ok::<(), stencil_compiler::CompileError>(())
//! ```

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

mod clause;
mod condition;
mod cte;
mod paginate;
mod params;
mod sort;
mod statement;

pub mod error;
pub mod value;

pub use error::{CompileError, Result};
pub use value::{ParamValue, TemporalValue};

// Re-export the document model so callers need only one crate
pub use stencil_template::{Operation, QueryTemplate, TemplateError};

/// Request parameters, as a JSON object.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// A compiled statement: SQL text with `:name` placeholders plus the
/// parameters it references, in first-occurrence order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub parameters: IndexMap<String, ParamValue>,
}

impl CompiledQuery {
    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }
}

/// Compile a template from JSON text.
pub fn compile(template_json: &str, request: &Params) -> Result<CompiledQuery> {
    let template = QueryTemplate::from_json(template_json)?;
    compile_template(&template, request)
}

/// Compile a template from an already-parsed JSON value.
pub fn compile_value(template: serde_json::Value, request: &Params) -> Result<CompiledQuery> {
    let template = QueryTemplate::from_value(template)?;
    compile_template(&template, request)
}

/// Compile a template document.
pub fn compile_template(template: &QueryTemplate, request: &Params) -> Result<CompiledQuery> {
    debug!(
        "Compiling {} template for '{}'",
        template.operation.as_str(),
        template.source.table
    );
    let (sql, params) = statement::assemble(template, request)?;
    Ok(CompiledQuery {
        sql,
        parameters: params.into_inner(),
    })
}
