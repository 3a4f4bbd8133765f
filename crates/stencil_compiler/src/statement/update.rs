//! UPDATE assembly.
//!
//! The no-op guard counts surviving SET clauses after optional filtering;
//! an UPDATE that would set nothing is refused before any SQL escapes.

use crate::clause::{list_clause, render_source};
use crate::condition::compile_condition;
use crate::cte::cte_clause;
use crate::error::{CompileError, Result};
use crate::params::ParamMap;
use crate::statement::resolve_assignment;
use crate::Params;
use stencil_template::{QueryTemplate, TemplateError};

pub(crate) fn assemble(template: &QueryTemplate, request: &Params) -> Result<(String, ParamMap)> {
    let mut params = ParamMap::new();
    let mut sql = cte_clause(&template.ctes, request, &mut params)?;

    sql.push_str("UPDATE ");
    sql.push_str(&render_source(&template.source));

    if template.set.is_empty() {
        return Err(TemplateError::UpdateRequiresSet.into());
    }

    let mut clauses: Vec<String> = Vec::new();
    for assignment in &template.set {
        if let Some(value_sql) = resolve_assignment(assignment, request, &mut params)? {
            clauses.push(format!("{} = {}", assignment.field, value_sql));
        }
    }

    if clauses.is_empty() {
        return Err(CompileError::unsafe_operation(
            "UPDATE that would set nothing; provide at least one field",
        ));
    }

    sql.push_str(" SET ");
    sql.push_str(&clauses.join(", "));

    if let Some(filters) = &template.filters {
        if let Some(clause) = compile_condition(filters, request, &mut params)?.into_clause() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
    }

    if let Some(returning) = list_clause(&template.returning) {
        sql.push_str(" RETURNING ");
        sql.push_str(&returning);
    }

    Ok((sql, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template(json: serde_json::Value) -> QueryTemplate {
        serde_json::from_value(json).unwrap()
    }

    fn request(pairs: &[(&str, serde_json::Value)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn patch_template() -> QueryTemplate {
        template(json!({
            "operation": "UPDATE",
            "source": {"table": "customers"},
            "set": [
                {"field": "name", "param": "name", "optional": true},
                {"field": "email", "param": "email", "optional": true},
                {"field": "updated_at", "function": "NOW()"}
            ],
            "filters": {"field": "id", "op": "=", "param": "id"},
            "returning": ["id", "name"]
        }))
    }

    #[test]
    fn test_partial_update_skips_absent_fields() {
        let (sql, params) = assemble(
            &patch_template(),
            &request(&[("id", json!(3)), ("email", json!("a@b.co"))]),
        )
        .unwrap();
        assert_eq!(
            sql,
            "UPDATE customers SET email = :email, updated_at = NOW() \
             WHERE id = :id RETURNING id, name"
        );
        let names: Vec<_> = params.into_inner().into_keys().collect();
        assert_eq!(names, vec!["email", "id"]);
    }

    #[test]
    fn test_function_only_update_is_allowed() {
        let t = template(json!({
            "operation": "UPDATE",
            "source": {"table": "jobs"},
            "set": [{"field": "touched_at", "function": "NOW()"}],
            "filters": {"field": "id", "op": "=", "param": "id"}
        }));
        let (sql, params) = assemble(&t, &request(&[("id", json!(1))])).unwrap();
        assert_eq!(sql, "UPDATE jobs SET touched_at = NOW() WHERE id = :id");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_update_that_sets_nothing_is_blocked() {
        let t = template(json!({
            "operation": "UPDATE",
            "source": {"table": "customers"},
            "set": [
                {"field": "name", "param": "name", "optional": true},
                {"field": "email", "param": "email", "optional": true}
            ],
            "filters": {"field": "id", "op": "=", "param": "id"}
        }));
        let err = assemble(&t, &request(&[("id", json!(3))])).unwrap_err();
        assert!(matches!(err, CompileError::UnsafeOperation(_)));
    }

    #[test]
    fn test_update_without_set_is_a_template_error() {
        let t = template(json!({"operation": "UPDATE", "source": {"table": "customers"}}));
        let err = assemble(&t, &request(&[])).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Template(TemplateError::UpdateRequiresSet)
        ));
    }

    #[test]
    fn test_update_where_params_follow_set_params() {
        let t = template(json!({
            "operation": "UPDATE",
            "source": {"table": "tracks"},
            "set": [{"field": "price", "param": "price"}],
            "filters": {
                "op": "AND",
                "conditions": [
                    {"field": "album_id", "op": "=", "param": "albumId"},
                    {"field": "price", "op": "<", "param": "cap"}
                ]
            }
        }));
        let (sql, params) = assemble(
            &t,
            &request(&[
                ("cap", json!("9.99")),
                ("price", json!("7.50")),
                ("albumId", json!(12)),
            ]),
        )
        .unwrap();
        assert_eq!(
            sql,
            "UPDATE tracks SET price = :price WHERE (album_id = :albumId AND price < :cap)"
        );
        let names: Vec<_> = params.into_inner().into_keys().collect();
        assert_eq!(names, vec!["price", "albumId", "cap"]);
    }
}
