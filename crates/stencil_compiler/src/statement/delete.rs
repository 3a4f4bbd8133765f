//! DELETE assembly.
//!
//! A DELETE whose WHERE clause is absent, or vanished because every
//! optional condition was omitted, is refused unless the template opts
//! in with `allowDeleteAll`.

use crate::clause::{list_clause, render_source};
use crate::condition::compile_condition;
use crate::cte::cte_clause;
use crate::error::{CompileError, Result};
use crate::params::ParamMap;
use crate::Params;
use stencil_template::QueryTemplate;

pub(crate) fn assemble(template: &QueryTemplate, request: &Params) -> Result<(String, ParamMap)> {
    let mut params = ParamMap::new();
    let mut sql = cte_clause(&template.ctes, request, &mut params)?;

    sql.push_str("DELETE FROM ");
    sql.push_str(&render_source(&template.source));

    let mut has_where = false;
    if let Some(filters) = &template.filters {
        if let Some(clause) = compile_condition(filters, request, &mut params)?.into_clause() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
            has_where = true;
        }
    }

    if !has_where && !template.allow_delete_all {
        return Err(CompileError::unsafe_operation(
            "DELETE without a WHERE clause; set 'allowDeleteAll' to true to permit it",
        ));
    }

    if let Some(returning) = list_clause(&template.returning) {
        sql.push_str(" RETURNING ");
        sql.push_str(&returning);
    }

    Ok((sql, params))
}
