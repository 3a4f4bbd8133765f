//! SELECT assembly.
//!
//! Clause order: CTEs, select list, FROM, joins, WHERE, GROUP BY, HAVING,
//! ORDER BY, LIMIT/OFFSET.

use crate::clause::{list_clause, parse_fields, render_joins, render_projection, render_source};
use crate::condition::{compile_condition, having_clause};
use crate::cte::cte_clause;
use crate::error::Result;
use crate::paginate::pagination_clause;
use crate::params::ParamMap;
use crate::sort::order_by_clause;
use crate::Params;
use stencil_template::QueryTemplate;

pub(crate) fn assemble(template: &QueryTemplate, request: &Params) -> Result<(String, ParamMap)> {
    let mut params = ParamMap::new();
    let mut sql = cte_clause(&template.ctes, request, &mut params)?;

    let requested = parse_fields(request);
    sql.push_str("SELECT ");
    sql.push_str(&render_projection(template, &requested));
    sql.push_str(" FROM ");
    sql.push_str(&render_source(&template.source));
    sql.push_str(&render_joins(&template.joins, request, &mut params)?);

    if let Some(filters) = &template.filters {
        if let Some(clause) = compile_condition(filters, request, &mut params)?.into_clause() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
    }

    if let Some(group_by) = list_clause(&template.group_by) {
        sql.push_str(" GROUP BY ");
        sql.push_str(&group_by);
    }

    if let Some(having) = having_clause(&template.having, request, &mut params)? {
        sql.push_str(" HAVING ");
        sql.push_str(&having);
    }

    if let Some(sort) = &template.sort {
        if let Some(order_by) = order_by_clause(sort, request) {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_by);
        }
    }

    sql.push_str(&pagination_clause(template, request));

    Ok((sql, params))
}
