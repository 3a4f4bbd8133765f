//! LIMIT/OFFSET resolution.
//!
//! Bounds resolve to plain integers inlined into the SQL text; they are
//! never bound as named parameters. OFFSET only renders alongside a LIMIT
//! and only when positive. The `calculated: "offset"` form derives the
//! offset from a 1-based `page` request parameter and the resolved limit.

use crate::Params;
use stencil_template::{Calculated, PageBound, PageSpec, QueryTemplate};

/// Render ` LIMIT n[ OFFSET m]`, or nothing.
pub(crate) fn pagination_clause(template: &QueryTemplate, request: &Params) -> String {
    let limit = template
        .limit
        .as_ref()
        .and_then(|bound| resolve_bound(bound, request));

    let offset = template
        .offset
        .as_ref()
        .and_then(|bound| resolve_offset(bound, request, limit));

    let mut sql = String::new();
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {}", limit));
        if let Some(offset) = offset {
            if offset > 0 {
                sql.push_str(&format!(" OFFSET {}", offset));
            }
        }
    }
    sql
}

fn resolve_bound(bound: &PageBound, request: &Params) -> Option<i64> {
    match bound {
        PageBound::Literal(n) => Some(*n),
        PageBound::Text(s) => s.trim().parse().ok(),
        PageBound::Spec(spec) => resolve_spec(spec, request),
    }
}

fn resolve_spec(spec: &PageSpec, request: &Params) -> Option<i64> {
    if let Some(param) = &spec.param {
        return request
            .get(param)
            .and_then(parse_integer)
            .or(spec.default);
    }
    spec.default
}

fn resolve_offset(bound: &PageBound, request: &Params, limit: Option<i64>) -> Option<i64> {
    if let PageBound::Spec(spec) = bound {
        if spec.calculated == Some(Calculated::Offset) {
            if let Some(limit) = limit {
                if let Some(page) = request.get("page").and_then(parse_integer) {
                    if page > 0 {
                        // A page large enough to overflow the multiply yields no offset
                        return page.checked_sub(1).and_then(|p| p.checked_mul(limit));
                    }
                }
            }
            return Some(spec.default.unwrap_or(0));
        }
    }
    resolve_bound(bound, request)
}

/// Lenient integer reading: numbers (floats truncate) and numeric strings.
fn parse_integer(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) if !s.trim().is_empty() => s.trim().parse().ok(),
        _ => None,
    }
}
