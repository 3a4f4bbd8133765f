//! Condition tree compilation.
//!
//! A filter tree compiles bottom-up. Each node lands in one of three
//! states:
//!
//! - `Absent`: an optional node whose parameter was missing; it vanishes
//!   and the parent never sees it
//! - `Empty`: a non-optional group whose children all dropped out; present
//!   but contributes no text
//! - `Clause`: actual SQL
//!
//! Parenthesization follows the survivors, not the authored tree: a group
//! reduced to one leaf predicate renders bare, anything joined gets exactly
//! one wrapping pair.

use crate::error::{CompileError, Result};
use crate::params::ParamMap;
use crate::value::{is_blank, plain_text, sql_literal, ParamValue};
use crate::Params;
use regex::Regex;
use std::sync::LazyLock;
use stencil_template::{ConditionGroup, ConditionLeaf, ConditionNode, ValueTransform};

/// Named placeholder pattern, `:name` with an identifier tail.
pub(crate) static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([a-zA-Z_][a-zA-Z0-9_]*)").expect("valid placeholder pattern"));

/// Outcome of compiling one condition node.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConditionSql {
    /// Optional node that vanished
    Absent,
    /// Present node with nothing left to say
    Empty,
    /// Rendered predicate; `leaf` drives the parent's parenthesization
    Clause { sql: String, leaf: bool },
}

impl ConditionSql {
    /// Collapse to the text a statement appends, if any.
    pub(crate) fn into_clause(self) -> Option<String> {
        match self {
            ConditionSql::Clause { sql, .. } => Some(sql),
            ConditionSql::Absent | ConditionSql::Empty => None,
        }
    }
}

/// Compile a condition tree, binding parameters into `params`.
pub(crate) fn compile_condition(
    node: &ConditionNode,
    request: &Params,
    params: &mut ParamMap,
) -> Result<ConditionSql> {
    match node {
        ConditionNode::Group(group) => compile_group(group, request, params),
        ConditionNode::Leaf(leaf) => compile_leaf(leaf, request, params),
    }
}

fn compile_group(
    group: &ConditionGroup,
    request: &Params,
    params: &mut ParamMap,
) -> Result<ConditionSql> {
    let mut survivors: Vec<(String, bool)> = Vec::new();
    for child in &group.conditions {
        if let ConditionSql::Clause { sql, leaf } = compile_condition(child, request, params)? {
            survivors.push((sql, leaf));
        }
    }

    if survivors.is_empty() {
        return Ok(if group.optional {
            ConditionSql::Absent
        } else {
            ConditionSql::Empty
        });
    }

    // A lone leaf needs no parentheses; everything else gets one pair
    if survivors.len() == 1 && survivors[0].1 {
        let (sql, _) = survivors.remove(0);
        return Ok(ConditionSql::Clause { sql, leaf: true });
    }

    let clauses: Vec<&str> = survivors.iter().map(|(sql, _)| sql.as_str()).collect();
    let joined = clauses.join(&format!(" {} ", group.op.as_str()));
    Ok(ConditionSql::Clause {
        sql: format!("({})", joined),
        leaf: false,
    })
}

fn compile_leaf(
    leaf: &ConditionLeaf,
    request: &Params,
    params: &mut ParamMap,
) -> Result<ConditionSql> {
    if let Some(expression) = &leaf.expression {
        return match bind_expression(expression, leaf.optional, request, params)? {
            BoundExpression::Bound(sql) => Ok(ConditionSql::Clause { sql, leaf: true }),
            BoundExpression::Skipped => Ok(ConditionSql::Absent),
        };
    }

    let (Some(field), Some(op)) = (&leaf.field, &leaf.op) else {
        return Ok(ConditionSql::Absent);
    };

    if let Some(param) = &leaf.param {
        let raw = request.get(param);
        let Some(raw) = raw.filter(|v| !is_blank(v)) else {
            if leaf.optional {
                return Ok(ConditionSql::Absent);
            }
            return Err(CompileError::missing_parameter(param));
        };

        let value = match &leaf.transform {
            Some(transform) => apply_transform(transform, raw),
            None => raw.clone(),
        };
        params.bind(param, ParamValue::coerce(&value))?;
        return Ok(ConditionSql::Clause {
            sql: format!("{} {} :{}", field, op, param),
            leaf: true,
        });
    }

    if let Some(value) = &leaf.value {
        return Ok(ConditionSql::Clause {
            sql: format!("{} {} {}", field, op, sql_literal(value)),
            leaf: true,
        });
    }

    Ok(ConditionSql::Absent)
}

fn apply_transform(transform: &ValueTransform, raw: &serde_json::Value) -> serde_json::Value {
    let text = plain_text(raw);
    let rewritten = match transform {
        ValueTransform::Concat { prefix, suffix } => format!("{}{}{}", prefix, text, suffix),
        ValueTransform::Wrap { pattern } => pattern.replace("{value}", &text),
        ValueTransform::PlaintoTsquery => {
            format!("plainto_tsquery('{}')", text.replace('\'', "''"))
        }
    };
    serde_json::Value::String(rewritten)
}

/// Compile the HAVING list: surviving conditions joined with AND.
pub(crate) fn having_clause(
    nodes: &[ConditionNode],
    request: &Params,
    params: &mut ParamMap,
) -> Result<Option<String>> {
    let mut clauses: Vec<String> = Vec::new();
    for node in nodes {
        if let Some(clause) = compile_condition(node, request, params)?.into_clause() {
            clauses.push(clause);
        }
    }
    if clauses.is_empty() {
        return Ok(None);
    }
    Ok(Some(clauses.join(" AND ")))
}

/// Outcome of binding a raw SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BoundExpression {
    /// All placeholders bound; the expression text passes through verbatim
    Bound(String),
    /// Optional expression with missing parameters; drop it
    Skipped,
}

/// Scan an expression for `:name` placeholders and bind each one.
///
/// Placeholders bind in first-occurrence order, repeats collapse to one
/// binding. With no placeholders the text passes straight through. A
/// missing or blank parameter skips an optional expression and fails a
/// required one, naming every offender.
pub(crate) fn bind_expression(
    expression: &str,
    optional: bool,
    request: &Params,
    params: &mut ParamMap,
) -> Result<BoundExpression> {
    let mut names: Vec<&str> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(expression) {
        let name = caps.get(1).expect("placeholder capture group").as_str();
        if !names.contains(&name) {
            names.push(name);
        }
    }

    if names.is_empty() {
        return Ok(BoundExpression::Bound(expression.to_string()));
    }

    let missing: Vec<String> = names
        .iter()
        .filter(|name| request.get(**name).map_or(true, is_blank))
        .map(|name| name.to_string())
        .collect();

    if !missing.is_empty() {
        if optional {
            return Ok(BoundExpression::Skipped);
        }
        return Err(CompileError::MissingParameter { names: missing });
    }

    for name in names {
        let raw = request.get(name).expect("checked above");
        params.bind(name, ParamValue::coerce(raw))?;
    }
    Ok(BoundExpression::Bound(expression.to_string()))
}
