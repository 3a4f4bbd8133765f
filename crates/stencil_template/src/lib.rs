//! Query template documents: the declarative JSON shapes behind SQL compilation.
//!
//! A template describes WHAT a statement looks like (table, columns,
//! filter tree, sort, paging) without saying anything about the caller's
//! runtime values. The `stencil_compiler` crate pairs one of these with a
//! request-parameter map to produce executable SQL.
//!
//! # Document anatomy
//!
//! ```json
//! {
//!   "operation": "SELECT",
//!   "source": {"table": "users", "alias": "u"},
//!   "projection": [{"field": "u.id"}, {"field": "u.name"}],
//!   "filters": {"field": "u.id", "op": "=", "param": "userId"}
//! }
//! ```
//!
//! Structure errors (malformed JSON, missing `source`, unknown operation)
//! surface as [`TemplateError`]; anything that depends on request
//! parameters is the compiler's business.

pub mod error;
pub mod model;

pub use error::{Result, TemplateError};
pub use model::{
    AggregateItem,
    AssignmentValue,
    BoolOp,
    Calculated,
    ColumnAssignment,
    ConditionGroup,
    ConditionLeaf,
    ConditionNode,
    CteDef,
    CteQuery,
    JoinDef,
    JoinOn,
    Operation,
    PageBound,
    PageSpec,
    ProjectionItem,
    QueryTemplate,
    SelectList,
    SortItem,
    SortSpec,
    SubqueryFrom,
    SubqueryLite,
    SubquerySpec,
    TableRef,
    ValueTransform,
    WindowItem,
};
