//! CTE and subquery resolution.
//!
//! CTE bodies come in three shapes: a full nested template (compiled
//! recursively through the statement assembler), a lightweight
//! select/from/where object, and a raw SQL string with `:name`
//! placeholders. Whatever the shape, every parameter the body binds merges
//! into the parent scope under the usual conflict rule, and because CTEs
//! compile before the main statement their parameters sit at the front of
//! the ordered map.

use crate::clause::render_source;
use crate::condition::{bind_expression, compile_condition, BoundExpression};
use crate::error::Result;
use crate::params::ParamMap;
use crate::statement;
use crate::Params;
use stencil_template::{CteDef, CteQuery, SelectList, SubqueryFrom, SubquerySpec};

/// Render the `WITH a AS (...), b AS (...) ` prefix, or nothing.
pub(crate) fn cte_clause(
    ctes: &[CteDef],
    request: &Params,
    params: &mut ParamMap,
) -> Result<String> {
    if ctes.is_empty() {
        return Ok(String::new());
    }

    let mut clauses: Vec<String> = Vec::new();
    for cte in ctes {
        let body = match &cte.query {
            CteQuery::Subquery { subquery } => subquery_sql(subquery, request, params)?,
            CteQuery::Template(template) => {
                let (sql, nested) = statement::assemble(template, request)?;
                params.merge(nested)?;
                sql
            }
        };

        let mut clause = cte.name.clone();
        if !cte.columns.is_empty() {
            clause.push_str(&format!("({})", cte.columns.join(", ")));
        }
        clause.push_str(&format!(" AS ({})", body));
        clauses.push(clause);
    }

    Ok(format!("WITH {} ", clauses.join(", ")))
}

/// Render one subquery, binding its parameters into the parent scope.
pub(crate) fn subquery_sql(
    spec: &SubquerySpec,
    request: &Params,
    params: &mut ParamMap,
) -> Result<String> {
    match spec {
        SubquerySpec::Template(template) => {
            let (sql, nested) = statement::assemble(template, request)?;
            params.merge(nested)?;
            Ok(sql)
        }
        SubquerySpec::Lite(lite) => {
            let mut sql = String::from("SELECT ");
            match &lite.select {
                SelectList::Many(items) => sql.push_str(&items.join(", ")),
                SelectList::One(item) => sql.push_str(item),
            }

            if let Some(from) = &lite.from {
                sql.push_str(" FROM ");
                match from {
                    SubqueryFrom::Table(table) => sql.push_str(&render_source(table)),
                    SubqueryFrom::Raw(text) => sql.push_str(text),
                }
            }

            if let Some(where_clause) = &lite.where_clause {
                if let Some(clause) =
                    compile_condition(where_clause, request, params)?.into_clause()
                {
                    sql.push_str(" WHERE ");
                    sql.push_str(&clause);
                }
            }

            Ok(sql)
        }
        // Raw fragments must bind every placeholder they mention
        SubquerySpec::Raw(text) => match bind_expression(text, false, request, params)? {
            BoundExpression::Bound(sql) => Ok(sql),
            BoundExpression::Skipped => unreachable!("non-optional expressions never skip"),
        },
    }
}
