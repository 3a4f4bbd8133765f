//! Statement assembly, one module per statement kind.
//!
//! Each assembler owns the clause order for its kind and starts with the
//! CTE prefix so CTE parameters land at the front of the ordered map.

mod delete;
mod insert;
mod select;
mod update;

use crate::condition::{bind_expression, BoundExpression};
use crate::error::{CompileError, Result};
use crate::params::ParamMap;
use crate::value::{sql_literal, ParamValue};
use crate::Params;
use stencil_template::{AssignmentValue, ColumnAssignment, Operation, QueryTemplate};

/// Compile a template into SQL text plus its ordered parameter scope.
pub(crate) fn assemble(template: &QueryTemplate, request: &Params) -> Result<(String, ParamMap)> {
    match template.operation {
        Operation::Select => select::assemble(template, request),
        Operation::Insert => insert::assemble(template, request),
        Operation::Update => update::assemble(template, request),
        Operation::Delete => delete::assemble(template, request),
    }
}

/// Resolve one column assignment to its value SQL.
///
/// `None` means the column drops out entirely (optional, parameter
/// absent). Sources are tried in order: `param`, `value`, `function`,
/// `expression`.
pub(super) fn resolve_assignment(
    assignment: &ColumnAssignment,
    request: &Params,
    params: &mut ParamMap,
) -> Result<Option<String>> {
    if let Some(param) = &assignment.param {
        // Absence and JSON null both count as "not provided"; a blank
        // string is still a value here, unlike in conditions
        let provided = request
            .get(param)
            .filter(|v| !matches!(v, serde_json::Value::Null));
        let Some(raw) = provided else {
            if assignment.optional {
                return Ok(None);
            }
            if assignment.nullable {
                return Ok(Some("NULL".to_string()));
            }
            return Err(CompileError::missing_parameter(param));
        };
        params.bind(param, ParamValue::coerce(raw))?;
        return Ok(Some(format!(":{}", param)));
    }

    if let Some(value) = &assignment.value {
        return match value {
            AssignmentValue::Expression { expression } => {
                bound_or_skipped(expression, assignment.optional, request, params)
            }
            AssignmentValue::Literal(literal) => Ok(Some(sql_literal(literal))),
        };
    }

    if let Some(function) = &assignment.function {
        return Ok(Some(function.clone()));
    }

    if let Some(expression) = &assignment.expression {
        return bound_or_skipped(expression, assignment.optional, request, params);
    }

    Ok(None)
}

fn bound_or_skipped(
    expression: &str,
    optional: bool,
    request: &Params,
    params: &mut ParamMap,
) -> Result<Option<String>> {
    match bind_expression(expression, optional, request, params)? {
        BoundExpression::Bound(sql) => Ok(Some(sql)),
        BoundExpression::Skipped => Ok(None),
    }
}
