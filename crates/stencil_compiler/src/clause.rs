//! Clause builders shared across statement kinds: select list, FROM
//! source, joins, and the simple comma lists (GROUP BY, RETURNING).

use crate::condition::{bind_expression, BoundExpression};
use crate::error::Result;
use crate::params::ParamMap;
use crate::value::plain_text;
use crate::Params;
use std::collections::HashSet;
use stencil_template::{JoinDef, QueryTemplate, TableRef, TemplateError};

/// Render a table reference: `table` or `table alias`.
pub(crate) fn render_source(source: &TableRef) -> String {
    match &source.alias {
        Some(alias) => format!("{} {}", source.table, alias),
        None => source.table.clone(),
    }
}

/// Parse the caller's `fields` request parameter into a match set.
///
/// Accepts a comma string (brackets tolerated, `"[id, name]"`) or a JSON
/// array. Anything else means no filtering.
pub(crate) fn parse_fields(request: &Params) -> HashSet<String> {
    match request.get("fields") {
        Some(serde_json::Value::String(s)) => s
            .replace(['[', ']'], "")
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .map(|v| plain_text(v).trim().to_string())
            .filter(|f| !f.is_empty())
            .collect(),
        _ => HashSet::new(),
    }
}

/// Render the select list: aggregates, then projection, then window
/// functions. Falls back to `*` when nothing survives.
///
/// A non-empty `requested` set filters the projection by alias-or-field;
/// aggregates and window functions always stay.
pub(crate) fn render_projection(template: &QueryTemplate, requested: &HashSet<String>) -> String {
    let mut items: Vec<String> = Vec::new();

    for agg in &template.aggregates {
        let mut expr = format!("{}({})", agg.func, agg.field);
        if let Some(alias) = &agg.alias {
            expr.push_str(" AS ");
            expr.push_str(alias);
        }
        items.push(expr);
    }

    for proj in &template.projection {
        if !requested.is_empty() && !requested.contains(proj.exposed_name()) {
            continue;
        }
        let mut expr = proj.field.clone();
        if let Some(alias) = &proj.alias {
            if alias != &proj.field {
                expr.push_str(" AS ");
                expr.push_str(alias);
            }
        }
        items.push(expr);
    }

    for wf in &template.window_functions {
        let mut expr = wf.expression.clone();
        if let Some(alias) = &wf.alias {
            expr.push_str(" AS ");
            expr.push_str(alias);
        }
        items.push(expr);
    }

    if items.is_empty() {
        return "*".to_string();
    }
    items.join(", ")
}

/// Render the join clauses, leading space included.
///
/// ON sides may embed `:name` placeholders; they bind like condition
/// expressions, and an optional ON entry with absent parameters drops out.
/// A non-CROSS join must end up with at least one ON condition.
pub(crate) fn render_joins(
    joins: &[JoinDef],
    request: &Params,
    params: &mut ParamMap,
) -> Result<String> {
    let mut sql = String::new();

    for join in joins {
        if join.on.is_none() && !join.is_cross() {
            return Err(TemplateError::join_requires_on(&join.join_type).into());
        }

        sql.push(' ');
        sql.push_str(&join.join_type);
        sql.push_str(" JOIN ");
        sql.push_str(&join.table);
        if let Some(alias) = &join.alias {
            sql.push(' ');
            sql.push_str(alias);
        }

        if let Some(on) = &join.on {
            let mut conditions: Vec<String> = Vec::new();
            for entry in on {
                let text = format!("{} {} {}", entry.left, entry.op, entry.right);
                match bind_expression(&text, entry.optional, request, params)? {
                    BoundExpression::Bound(bound) => conditions.push(bound),
                    BoundExpression::Skipped => {}
                }
            }
            if conditions.is_empty() {
                return Err(TemplateError::empty_join_on(&join.table).into());
            }
            sql.push_str(" ON ");
            sql.push_str(&conditions.join(" AND "));
        }
    }

    Ok(sql)
}

/// Join non-blank items with `, `. Feeds GROUP BY and RETURNING.
pub(crate) fn list_clause(items: &[String]) -> Option<String> {
    let kept: Vec<&str> = items
        .iter()
        .map(|s| s.as_str())
        .filter(|s| !s.trim().is_empty())
        .collect();
    if kept.is_empty() {
        return None;
    }
    Some(kept.join(", "))
}
