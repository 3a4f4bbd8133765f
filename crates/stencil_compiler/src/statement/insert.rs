//! INSERT assembly.
//!
//! A column only appears in the column list when its assignment resolved
//! to a value; optional columns with absent parameters vanish from both
//! sides, keeping names and placeholders aligned.

use crate::clause::{list_clause, render_source};
use crate::cte::cte_clause;
use crate::error::{CompileError, Result};
use crate::params::ParamMap;
use crate::statement::resolve_assignment;
use crate::Params;
use stencil_template::{QueryTemplate, TemplateError};

pub(crate) fn assemble(template: &QueryTemplate, request: &Params) -> Result<(String, ParamMap)> {
    let mut params = ParamMap::new();
    let mut sql = cte_clause(&template.ctes, request, &mut params)?;

    sql.push_str("INSERT INTO ");
    sql.push_str(&render_source(&template.source));

    if template.columns.is_empty() {
        return Err(TemplateError::InsertRequiresColumns.into());
    }

    let mut names: Vec<&str> = Vec::new();
    let mut values: Vec<String> = Vec::new();
    for column in &template.columns {
        if let Some(value_sql) = resolve_assignment(column, request, &mut params)? {
            names.push(&column.field);
            values.push(value_sql);
        }
    }

    if names.is_empty() {
        return Err(CompileError::unsafe_operation(
            "INSERT with every column omitted; provide at least one value",
        ));
    }

    sql.push_str(&format!(" ({})", names.join(", ")));
    sql.push_str(&format!(" VALUES ({})", values.join(", ")));

    if let Some(returning) = list_clause(&template.returning) {
        sql.push_str(" RETURNING ");
        sql.push_str(&returning);
    }

    Ok((sql, params))
}
