//! Typed template document model.
//!
//! A template is a JSON document describing the *shape* of a SQL statement:
//! which table, which columns, which filters, how to sort and page. The
//! compiler crate turns one of these plus a request-parameter map into
//! executable SQL. Deserialization is the only validation layer for
//! structure; anything serde accepts here is a well-formed document.
//!
//! Document keys are camelCase (`windowFunctions`, `groupBy`,
//! `allowDeleteAll`); shape-discriminated unions (`filters` nodes, CTE
//! bodies, sort specs, page bounds) are untagged and resolve on the keys
//! present.

use indexmap::IndexMap;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Top-level template
// ============================================================================

/// A declarative query template.
///
/// `source` is the only universally required field; everything else
/// defaults to empty/absent. Which sections are consulted depends on the
/// operation: `columns` for INSERT, `set` for UPDATE, `filters` for the
/// three statement kinds that take a WHERE.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryTemplate {
    /// Statement kind. Absent means SELECT.
    #[serde(default)]
    pub operation: Operation,

    /// Target table plus optional alias.
    pub source: TableRef,

    /// Common table expressions, rendered in declaration order.
    #[serde(default)]
    pub ctes: Vec<CteDef>,

    /// Plain select-list items.
    #[serde(default)]
    pub projection: Vec<ProjectionItem>,

    /// Aggregate select-list items, rendered before the projection.
    #[serde(default)]
    pub aggregates: Vec<AggregateItem>,

    /// Window-function select-list items, rendered after the projection.
    #[serde(default)]
    pub window_functions: Vec<WindowItem>,

    #[serde(default)]
    pub joins: Vec<JoinDef>,

    /// WHERE tree. A single leaf or a nested AND/OR group.
    #[serde(default)]
    pub filters: Option<ConditionNode>,

    #[serde(default)]
    pub group_by: Vec<String>,

    /// HAVING conditions, joined with AND.
    #[serde(default)]
    pub having: Vec<ConditionNode>,

    #[serde(default)]
    pub sort: Option<SortSpec>,

    #[serde(default)]
    pub limit: Option<PageBound>,

    #[serde(default)]
    pub offset: Option<PageBound>,

    /// INSERT column assignments.
    #[serde(default)]
    pub columns: Vec<ColumnAssignment>,

    /// UPDATE SET assignments.
    #[serde(default)]
    pub set: Vec<ColumnAssignment>,

    /// RETURNING column list (INSERT/UPDATE/DELETE).
    #[serde(default)]
    pub returning: Vec<String>,

    /// Opt-in escape hatch for DELETE statements without a WHERE clause.
    #[serde(default)]
    pub allow_delete_all: bool,
}

impl QueryTemplate {
    /// Parse a template from raw JSON text.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a template from an already-decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Statement kind. Parsed case-insensitively; unknown kinds are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operation {
    #[default]
    Select,
    Insert,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Select => "SELECT",
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        }
    }

    /// SELECT statements are the only kind that produce result rows by
    /// default (the others need RETURNING).
    pub fn is_read(&self) -> bool {
        matches!(self, Operation::Select)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SELECT" => Ok(Operation::Select),
            "INSERT" => Ok(Operation::Insert),
            "UPDATE" => Ok(Operation::Update),
            "DELETE" => Ok(Operation::Delete),
            _ => Err(format!(
                "Invalid operation: '{}'. Expected: SELECT, INSERT, UPDATE, or DELETE",
                s
            )),
        }
    }
}

impl Serialize for Operation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// A table reference: name plus optional alias.
#[derive(Debug, Clone, Deserialize)]
pub struct TableRef {
    pub table: String,
    #[serde(default)]
    pub alias: Option<String>,
}

// ============================================================================
// Select-list items
// ============================================================================

/// One projection entry: `field` or `field AS alias`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectionItem {
    pub field: String,
    #[serde(default)]
    pub alias: Option<String>,
}

impl ProjectionItem {
    /// Name a caller-side `fields` filter matches against.
    pub fn exposed_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.field)
    }
}

/// One aggregate entry: `func(field)` or `func(field) AS alias`.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregateItem {
    pub func: String,
    pub field: String,
    #[serde(default)]
    pub alias: Option<String>,
}

/// One window-function entry, carried as a raw expression.
#[derive(Debug, Clone, Deserialize)]
pub struct WindowItem {
    pub expression: String,
    #[serde(default)]
    pub alias: Option<String>,
}

// ============================================================================
// Joins
// ============================================================================

/// One join clause.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinDef {
    /// Join kind as it appears in SQL: INNER, LEFT, CROSS, ...
    #[serde(rename = "type")]
    pub join_type: String,
    pub table: String,
    #[serde(default)]
    pub alias: Option<String>,
    /// Required for every kind except CROSS.
    #[serde(default)]
    pub on: Option<Vec<JoinOn>>,
}

impl JoinDef {
    pub fn is_cross(&self) -> bool {
        self.join_type.eq_ignore_ascii_case("CROSS")
    }
}

/// One ON condition: `left op right`. Either side may embed `:name`
/// placeholders, which bind like condition expressions.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinOn {
    pub left: String,
    pub op: String,
    pub right: String,
    /// Optional ON conditions drop out when their placeholders are absent.
    #[serde(default)]
    pub optional: bool,
}

// ============================================================================
// Condition trees
// ============================================================================

/// A node in a WHERE/HAVING tree: a boolean group or a single predicate.
///
/// Untagged: the presence of `conditions` makes a node a group, anything
/// else is a leaf.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ConditionNode {
    Group(ConditionGroup),
    Leaf(ConditionLeaf),
}

/// AND/OR group over child nodes.
#[derive(Debug, Clone, Deserialize)]
pub struct ConditionGroup {
    /// Boolean connective, AND when absent.
    #[serde(default)]
    pub op: BoolOp,
    pub conditions: Vec<ConditionNode>,
    /// An optional group vanishes when all of its children drop out.
    #[serde(default)]
    pub optional: bool,
}

/// A single predicate.
///
/// Three authoring forms, checked in this order:
/// - `expression`: raw SQL with embedded `:name` placeholders
/// - `field` + `op` + `param`: parameterized comparison
/// - `field` + `op` + `value`: template-authored literal comparison
///
/// A leaf with none of these resolves to nothing.
#[derive(Debug, Clone, Deserialize)]
pub struct ConditionLeaf {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub op: Option<String>,
    #[serde(default)]
    pub param: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub expression: Option<String>,
    /// Applied to the parameter value before binding.
    #[serde(default)]
    pub transform: Option<ValueTransform>,
    /// Optional predicates vanish when their parameter is missing or blank.
    #[serde(default)]
    pub optional: bool,
}

/// Boolean connective for condition groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoolOp {
    #[default]
    And,
    Or,
}

impl BoolOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
        }
    }
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BoolOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AND" => Ok(BoolOp::And),
            "OR" => Ok(BoolOp::Or),
            _ => Err(format!("Invalid boolean operator: '{}'. Expected: AND or OR", s)),
        }
    }
}

impl Serialize for BoolOp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BoolOp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Value rewrite applied before a parameter is bound.
///
/// The SQL keeps referencing `:name`; only the bound value changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueTransform {
    /// Glue a prefix/suffix onto the value, e.g. for LIKE patterns.
    Concat {
        #[serde(default)]
        prefix: String,
        #[serde(default)]
        suffix: String,
    },
    /// Substitute the value into a pattern, `{value}` marks the spot.
    Wrap {
        #[serde(default = "ValueTransform::default_wrap_pattern")]
        pattern: String,
    },
    /// Wrap the value in a `plainto_tsquery('...')` call for full-text search.
    PlaintoTsquery,
}

impl ValueTransform {
    fn default_wrap_pattern() -> String {
        "%{value}%".to_string()
    }
}

// ============================================================================
// Column assignments (INSERT columns / UPDATE set)
// ============================================================================

/// One INSERT column or UPDATE SET entry.
///
/// Value sources, checked in this order: `param` (caller-bound), `value`
/// (template literal or `{expression}` object), `function` (raw SQL call),
/// `expression` (raw SQL with `:name` placeholders).
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnAssignment {
    pub field: String,
    #[serde(default)]
    pub param: Option<String>,
    #[serde(default)]
    pub value: Option<AssignmentValue>,
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub expression: Option<String>,
    /// Skip this column entirely when its parameter is absent.
    #[serde(default)]
    pub optional: bool,
    /// Emit NULL when the parameter is absent instead of failing.
    #[serde(default)]
    pub nullable: bool,
}

/// Value side of an assignment: raw expression object or plain literal.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AssignmentValue {
    Expression { expression: String },
    Literal(serde_json::Value),
}

// ============================================================================
// CTEs and subqueries
// ============================================================================

/// One common table expression: `name AS (...)` or `name(cols) AS (...)`.
#[derive(Debug, Clone, Deserialize)]
pub struct CteDef {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
    pub query: CteQuery,
}

/// Body of a CTE: a `{subquery: ...}` wrapper or a full nested template.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CteQuery {
    Subquery { subquery: SubquerySpec },
    Template(Box<QueryTemplate>),
}

/// A subquery in one of three shapes: a full template (has `source`), a
/// lightweight select/from/where object, or a raw SQL string with `:name`
/// placeholders.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SubquerySpec {
    Template(Box<QueryTemplate>),
    Lite(SubqueryLite),
    Raw(String),
}

/// Lightweight subquery: no joins, grouping, or paging.
#[derive(Debug, Clone, Deserialize)]
pub struct SubqueryLite {
    pub select: SelectList,
    #[serde(default)]
    pub from: Option<SubqueryFrom>,
    #[serde(default, rename = "where")]
    pub where_clause: Option<ConditionNode>,
}

/// Select list: a single raw item or an array of items.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SelectList {
    Many(Vec<String>),
    One(String),
}

/// FROM side of a lightweight subquery.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SubqueryFrom {
    Table(TableRef),
    Raw(String),
}

// ============================================================================
// Sort and pagination
// ============================================================================

/// ORDER BY specification.
///
/// - `Template`: a string, usually `{param:NAME,default:'...'}`, resolved
///   against request parameters at compile time
/// - `Items`: array of field/direction pairs
/// - `Fields`: literal ordered object of `field: direction`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SortSpec {
    Items(Vec<SortItem>),
    Fields(IndexMap<String, String>),
    Template(String),
}

/// One ORDER BY entry. `direction` may itself be a
/// `{param:NAME,default:'ASC',values:{...}}` template.
#[derive(Debug, Clone, Deserialize)]
pub struct SortItem {
    pub field: String,
    #[serde(default)]
    pub direction: Option<String>,
}

/// LIMIT/OFFSET bound: a literal count, a textual count, or a spec that
/// pulls the count from a request parameter.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PageBound {
    Literal(i64),
    Text(String),
    Spec(PageSpec),
}

/// Parameter-driven page bound.
#[derive(Debug, Clone, Deserialize)]
pub struct PageSpec {
    #[serde(default)]
    pub param: Option<String>,
    #[serde(default)]
    pub default: Option<i64>,
    /// Derived bounds: `offset` computes `(page - 1) * limit`.
    #[serde(default)]
    pub calculated: Option<Calculated>,
}

/// Supported derived page bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Calculated {
    Offset,
    /// Accepted but not derived; the declared default applies.
    PageSize,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_parsing() {
        assert_eq!("select".parse::<Operation>().unwrap(), Operation::Select);
        assert_eq!("INSERT".parse::<Operation>().unwrap(), Operation::Insert);
        assert_eq!("Update".parse::<Operation>().unwrap(), Operation::Update);
        assert!("UPSERT".parse::<Operation>().is_err());
    }

    #[test]
    fn test_operation_defaults_to_select() {
        let t = QueryTemplate::from_json(r#"{"source": {"table": "users"}}"#).unwrap();
        assert_eq!(t.operation, Operation::Select);
    }

    #[test]
    fn test_unknown_operation_rejected() {
        let err = QueryTemplate::from_json(r#"{"operation": "TRUNCATE", "source": {"table": "t"}}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_source_is_required() {
        assert!(QueryTemplate::from_json(r#"{"operation": "SELECT"}"#).is_err());
    }

    #[test]
    fn test_condition_group_vs_leaf() {
        let node: ConditionNode = serde_json::from_str(
            r#"{"op": "OR", "conditions": [{"field": "a", "op": "=", "param": "x"}]}"#,
        )
        .unwrap();
        match node {
            ConditionNode::Group(g) => {
                assert_eq!(g.op, BoolOp::Or);
                assert_eq!(g.conditions.len(), 1);
                assert!(matches!(g.conditions[0], ConditionNode::Leaf(_)));
            }
            ConditionNode::Leaf(_) => panic!("expected group"),
        }
    }

    #[test]
    fn test_group_op_defaults_to_and() {
        let node: ConditionNode = serde_json::from_str(r#"{"conditions": []}"#).unwrap();
        match node {
            ConditionNode::Group(g) => assert_eq!(g.op, BoolOp::And),
            ConditionNode::Leaf(_) => panic!("expected group"),
        }
    }

    #[test]
    fn test_transform_shapes() {
        let t: ValueTransform =
            serde_json::from_str(r#"{"type": "concat", "prefix": "%", "suffix": "%"}"#).unwrap();
        assert!(matches!(t, ValueTransform::Concat { .. }));

        let t: ValueTransform = serde_json::from_str(r#"{"type": "wrap"}"#).unwrap();
        match t {
            ValueTransform::Wrap { pattern } => assert_eq!(pattern, "%{value}%"),
            _ => panic!("expected wrap"),
        }

        let t: ValueTransform = serde_json::from_str(r#"{"type": "plainto_tsquery"}"#).unwrap();
        assert!(matches!(t, ValueTransform::PlaintoTsquery));
    }

    #[test]
    fn test_cte_query_shapes() {
        let q: CteQuery = serde_json::from_str(
            r#"{"subquery": "SELECT id FROM audit WHERE actor = :actor"}"#,
        )
        .unwrap();
        assert!(matches!(
            q,
            CteQuery::Subquery { subquery: SubquerySpec::Raw(_) }
        ));

        let q: CteQuery =
            serde_json::from_str(r#"{"source": {"table": "users"}, "limit": 5}"#).unwrap();
        assert!(matches!(q, CteQuery::Template(_)));
    }

    #[test]
    fn test_subquery_lite_shape() {
        let s: SubquerySpec = serde_json::from_str(
            r#"{"select": ["id"], "from": {"table": "users", "alias": "u"}}"#,
        )
        .unwrap();
        assert!(matches!(s, SubquerySpec::Lite(_)));

        // A nested template wins over the lite form when `source` is present
        let s: SubquerySpec = serde_json::from_str(
            r#"{"operation": "SELECT", "source": {"table": "users"}}"#,
        )
        .unwrap();
        assert!(matches!(s, SubquerySpec::Template(_)));
    }

    #[test]
    fn test_sort_spec_shapes() {
        let s: SortSpec = serde_json::from_str(r#""{param:sortBy,default:'{}'}""#).unwrap();
        assert!(matches!(s, SortSpec::Template(_)));

        let s: SortSpec = serde_json::from_str(r#"[{"field": "name"}]"#).unwrap();
        assert!(matches!(s, SortSpec::Items(_)));

        let s: SortSpec = serde_json::from_str(r#"{"name": "ASC", "id": "DESC"}"#).unwrap();
        match s {
            SortSpec::Fields(m) => {
                let keys: Vec<_> = m.keys().cloned().collect();
                assert_eq!(keys, vec!["name", "id"]);
            }
            _ => panic!("expected fields"),
        }
    }

    #[test]
    fn test_page_bound_shapes() {
        assert!(matches!(
            serde_json::from_str::<PageBound>("25").unwrap(),
            PageBound::Literal(25)
        ));
        assert!(matches!(
            serde_json::from_str::<PageBound>(r#""25""#).unwrap(),
            PageBound::Text(_)
        ));
        let b: PageBound =
            serde_json::from_str(r#"{"calculated": "offset", "default": 0}"#).unwrap();
        match b {
            PageBound::Spec(spec) => assert_eq!(spec.calculated, Some(Calculated::Offset)),
            _ => panic!("expected spec"),
        }
    }

    #[test]
    fn test_assignment_value_shapes() {
        let v: AssignmentValue =
            serde_json::from_str(r#"{"expression": "COALESCE(:note, '')"}"#).unwrap();
        assert!(matches!(v, AssignmentValue::Expression { .. }));

        let v: AssignmentValue = serde_json::from_str(r#""active""#).unwrap();
        assert!(matches!(v, AssignmentValue::Literal(_)));
    }

    #[test]
    fn test_camel_case_keys() {
        let t = QueryTemplate::from_json(
            r#"{
                "operation": "DELETE",
                "source": {"table": "sessions"},
                "allowDeleteAll": true
            }"#,
        )
        .unwrap();
        assert!(t.allow_delete_all);

        let t = QueryTemplate::from_json(
            r#"{
                "source": {"table": "t"},
                "groupBy": ["a"],
                "windowFunctions": [{"expression": "ROW_NUMBER() OVER (ORDER BY id)"}]
            }"#,
        )
        .unwrap();
        assert_eq!(t.group_by, vec!["a"]);
        assert_eq!(t.window_functions.len(), 1);
    }
}
