use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

use crate::error::ProtocolError;
use crate::union::{serialize_union, split_union};

pub const COLUMN_FILTER_RULE: &str = "columnFilterRule";
pub const AND_FILTER_RULE: &str = "andFilterRule";
pub const OR_FILTER_RULE: &str = "orFilterRule";
pub const NOT_FILTER_RULE: &str = "notFilterRule";

pub const STRING_COLUMN_FILTER: &str = "stringColumnFilter";
pub const NUMERIC_COLUMN_FILTER: &str = "numericColumnFilter";
pub const NULL_COLUMN_FILTER: &str = "nullColumnFilter";

pub const OBJECT_PROPERTY: &str = "objectProperty";

/// Operator names emitted by the template builders.
pub mod ops {
    pub const EQUALS: &str = "EQUALS";
    pub const GREATER_THAN_OR_EQUAL: &str = "GREATER_THAN_OR_EQUAL";
    pub const LESS_THAN_OR_EQUAL: &str = "LESS_THAN_OR_EQUAL";
    pub const NULL: &str = "NULL";
    pub const NOT_NULL: &str = "NOT_NULL";
}

/// Boolean filter expression carried by a `filterNode` strategy.
///
/// Child order is preserved exactly as written; the platform evaluates
/// `And`/`Or` commutatively.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterTree {
    /// Comparison against a single object property.
    Column(ColumnFilterRule),
    /// All children must match.
    And(Vec<FilterTree>),
    /// Any child must match.
    Or(Vec<FilterTree>),
    /// Negates the child.
    Not(Box<FilterTree>),
}

impl FilterTree {
    pub const TAGS: [&'static str; 4] = [
        COLUMN_FILTER_RULE,
        AND_FILTER_RULE,
        OR_FILTER_RULE,
        NOT_FILTER_RULE,
    ];

    pub fn column(rule: ColumnFilterRule) -> Self {
        FilterTree::Column(rule)
    }

    pub fn and(children: Vec<FilterTree>) -> Self {
        FilterTree::And(children)
    }

    pub fn or(children: Vec<FilterTree>) -> Self {
        FilterTree::Or(children)
    }

    pub fn not(child: FilterTree) -> Self {
        FilterTree::Not(Box::new(child))
    }

    /// Wire discriminator for this node.
    pub fn tag(&self) -> &'static str {
        match self {
            FilterTree::Column(_) => COLUMN_FILTER_RULE,
            FilterTree::And(_) => AND_FILTER_RULE,
            FilterTree::Or(_) => OR_FILTER_RULE,
            FilterTree::Not(_) => NOT_FILTER_RULE,
        }
    }

    pub fn is_compound(&self) -> bool {
        !matches!(self, FilterTree::Column(_))
    }

    /// Direct children in document order.
    pub fn children(&self) -> &[FilterTree] {
        match self {
            FilterTree::Column(_) => &[],
            FilterTree::And(children) | FilterTree::Or(children) => children,
            FilterTree::Not(child) => std::slice::from_ref(&**child),
        }
    }

    /// Column leaves in depth-first document order.
    pub fn leaves(&self) -> Vec<&ColumnFilterRule> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a ColumnFilterRule>) {
        match self {
            FilterTree::Column(rule) => leaves.push(rule),
            _ => {
                for child in self.children() {
                    child.collect_leaves(leaves);
                }
            }
        }
    }

    /// Strict decoding: any malformed node fails the whole tree.
    pub fn from_value(value: &Value) -> Result<Self, ProtocolError> {
        let (tag, payload) = split_union(value, "filter", &Self::TAGS)?;
        match tag {
            COLUMN_FILTER_RULE => ColumnFilterRule::deserialize(payload)
                .map(FilterTree::Column)
                .map_err(|source| ProtocolError::payload(tag, source)),
            AND_FILTER_RULE => Ok(FilterTree::And(strict_children(tag, payload)?)),
            OR_FILTER_RULE => Ok(FilterTree::Or(strict_children(tag, payload)?)),
            NOT_FILTER_RULE => {
                let inner = payload
                    .get("filter")
                    .ok_or_else(|| ProtocolError::MissingField {
                        tag: tag.to_string(),
                        field: "filter",
                    })?;
                Ok(FilterTree::not(FilterTree::from_value(inner)?))
            }
            other => Err(ProtocolError::UnknownTag {
                context: "filter",
                tag: other.to_string(),
                expected: Self::TAGS.join(", "),
            }),
        }
    }
}

fn strict_children(tag: &'static str, payload: &Value) -> Result<Vec<FilterTree>, ProtocolError> {
    payload
        .get("filters")
        .and_then(Value::as_array)
        .ok_or_else(|| ProtocolError::MissingField {
            tag: tag.to_string(),
            field: "filters",
        })?
        .iter()
        .map(FilterTree::from_value)
        .collect()
}

#[derive(Serialize)]
struct FiltersPayload<'a> {
    filters: &'a [FilterTree],
}

#[derive(Serialize)]
struct NotPayload<'a> {
    filter: &'a FilterTree,
}

impl Serialize for FilterTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterTree::Column(rule) => serialize_union(serializer, COLUMN_FILTER_RULE, rule),
            FilterTree::And(children) => serialize_union(
                serializer,
                AND_FILTER_RULE,
                &FiltersPayload { filters: children },
            ),
            FilterTree::Or(children) => serialize_union(
                serializer,
                OR_FILTER_RULE,
                &FiltersPayload { filters: children },
            ),
            FilterTree::Not(child) => {
                serialize_union(serializer, NOT_FILTER_RULE, &NotPayload { filter: child })
            }
        }
    }
}

impl<'de> Deserialize<'de> for FilterTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        FilterTree::from_value(&value).map_err(D::Error::custom)
    }
}

/// Leaf comparison: one column, one comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilterRule {
    pub column: ColumnRef,
    pub filter: ColumnFilter,
}

impl ColumnFilterRule {
    pub fn new(column: ColumnRef, filter: ColumnFilter) -> Self {
        Self { column, filter }
    }

    pub fn property_id(&self) -> &str {
        self.column.property_id()
    }
}

/// Column reference. Only object properties are addressable today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    ObjectProperty(ObjectPropertyRef),
}

impl ColumnRef {
    pub const TAGS: [&'static str; 1] = [OBJECT_PROPERTY];

    pub fn object_property(object_type_id: impl Into<String>, property_id: impl Into<String>) -> Self {
        ColumnRef::ObjectProperty(ObjectPropertyRef {
            object_type_id: object_type_id.into(),
            property_type_id: property_id.into(),
        })
    }

    pub fn property_id(&self) -> &str {
        match self {
            ColumnRef::ObjectProperty(reference) => &reference.property_type_id,
        }
    }

    pub fn object_type_id(&self) -> &str {
        match self {
            ColumnRef::ObjectProperty(reference) => &reference.object_type_id,
        }
    }

    pub fn from_value(value: &Value) -> Result<Self, ProtocolError> {
        let (tag, payload) = split_union(value, "column", &Self::TAGS)?;
        ObjectPropertyRef::deserialize(payload)
            .map(ColumnRef::ObjectProperty)
            .map_err(|source| ProtocolError::payload(tag, source))
    }
}

impl Serialize for ColumnRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ColumnRef::ObjectProperty(reference) => {
                serialize_union(serializer, OBJECT_PROPERTY, reference)
            }
        }
    }
}

impl<'de> Deserialize<'de> for ColumnRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ColumnRef::from_value(&value).map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPropertyRef {
    pub object_type_id: String,
    pub property_type_id: String,
}

/// Comparison family of a column filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterKind {
    String,
    Numeric,
    Null,
}

impl FilterKind {
    /// Kind named by a comparison union tag such as `stringColumnFilter`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            STRING_COLUMN_FILTER => Some(FilterKind::String),
            NUMERIC_COLUMN_FILTER => Some(FilterKind::Numeric),
            NULL_COLUMN_FILTER => Some(FilterKind::Null),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::String => "string",
            FilterKind::Numeric => "numeric",
            FilterKind::Null => "null",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The comparison applied to a column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnFilter {
    String(StringColumnFilter),
    Numeric(NumericColumnFilter),
    Null(NullColumnFilter),
}

impl ColumnFilter {
    pub const TAGS: [&'static str; 3] = [
        STRING_COLUMN_FILTER,
        NUMERIC_COLUMN_FILTER,
        NULL_COLUMN_FILTER,
    ];

    /// Operator name, e.g. `EQUALS` or `NOT_NULL`.
    pub fn op(&self) -> &str {
        match self {
            ColumnFilter::String(filter) => &filter.op,
            ColumnFilter::Numeric(filter) => &filter.op,
            ColumnFilter::Null(filter) => &filter.op,
        }
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            ColumnFilter::String(_) => FilterKind::String,
            ColumnFilter::Numeric(_) => FilterKind::Numeric,
            ColumnFilter::Null(_) => FilterKind::Null,
        }
    }

    pub fn from_value(value: &Value) -> Result<Self, ProtocolError> {
        let (tag, payload) = split_union(value, "column filter", &Self::TAGS)?;
        let decoded = match tag {
            STRING_COLUMN_FILTER => StringColumnFilter::deserialize(payload).map(ColumnFilter::String),
            NUMERIC_COLUMN_FILTER => {
                NumericColumnFilter::deserialize(payload).map(ColumnFilter::Numeric)
            }
            NULL_COLUMN_FILTER => NullColumnFilter::deserialize(payload).map(ColumnFilter::Null),
            other => {
                return Err(ProtocolError::UnknownTag {
                    context: "column filter",
                    tag: other.to_string(),
                    expected: Self::TAGS.join(", "),
                })
            }
        };
        decoded.map_err(|source| ProtocolError::payload(tag, source))
    }
}

impl Serialize for ColumnFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ColumnFilter::String(filter) => serialize_union(serializer, STRING_COLUMN_FILTER, filter),
            ColumnFilter::Numeric(filter) => {
                serialize_union(serializer, NUMERIC_COLUMN_FILTER, filter)
            }
            ColumnFilter::Null(filter) => serialize_union(serializer, NULL_COLUMN_FILTER, filter),
        }
    }
}

impl<'de> Deserialize<'de> for ColumnFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ColumnFilter::from_value(&value).map_err(D::Error::custom)
    }
}

/// Value macro attached to built string and numeric filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueMacro {
    pub function: String,
    pub input_type: String,
    pub output_type: String,
}

impl ValueMacro {
    /// The identity macro: compare against the literal values.
    pub fn value() -> Self {
        Self {
            function: "VALUE".into(),
            input_type: "ALL_TYPES".into(),
            output_type: "ALL_TYPES".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringColumnFilter {
    #[serde(rename = "type")]
    pub op: String,
    #[serde(default)]
    pub case_sensitive: bool,
    /// `None` when the document does not state the flag at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_whitespace: Option<bool>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default, rename = "macro", skip_serializing_if = "Option::is_none")]
    pub value_macro: Option<ValueMacro>,
}

impl StringColumnFilter {
    pub fn new(op: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            op: op.into(),
            case_sensitive: false,
            ignore_whitespace: Some(false),
            values,
            value_macro: Some(ValueMacro::value()),
        }
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn ignore_whitespace(mut self, ignore_whitespace: bool) -> Self {
        self.ignore_whitespace = Some(ignore_whitespace);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumnFilter {
    #[serde(rename = "type")]
    pub op: String,
    #[serde(default)]
    pub values: Vec<Number>,
    #[serde(default, rename = "macro", skip_serializing_if = "Option::is_none")]
    pub value_macro: Option<ValueMacro>,
}

impl NumericColumnFilter {
    pub fn new(op: impl Into<String>, values: Vec<Number>) -> Self {
        Self {
            op: op.into(),
            values,
            value_macro: Some(ValueMacro::value()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullColumnFilter {
    #[serde(rename = "type")]
    pub op: String,
}

impl NullColumnFilter {
    pub fn new(op: impl Into<String>) -> Self {
        Self { op: op.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(property: &str, op: &str) -> Value {
        json!({
            "columnFilterRule": {
                "column": {
                    "objectProperty": {
                        "objectTypeId": "test-object",
                        "propertyTypeId": property,
                    },
                    "type": "objectProperty",
                },
                "filter": {
                    "stringColumnFilter": {"type": op, "values": ["x"]},
                    "type": "stringColumnFilter",
                },
            },
            "type": "columnFilterRule",
        })
    }

    #[test]
    fn decodes_nested_tree() {
        let value = json!({
            "orFilterRule": {"filters": [
                leaf("a", "EQUALS"),
                {"notFilterRule": {"filter": leaf("b", "CONTAINS")}, "type": "notFilterRule"},
            ]},
            "type": "orFilterRule",
        });

        let tree = FilterTree::from_value(&value).expect("decode");
        let properties: Vec<&str> = tree.leaves().iter().map(|rule| rule.property_id()).collect();
        assert_eq!(properties, vec!["a", "b"]);
        assert!(matches!(tree, FilterTree::Or(ref children) if children.len() == 2));
    }

    #[test]
    fn strict_decoding_rejects_malformed_children() {
        let value = json!({
            "andFilterRule": {"filters": [leaf("a", "EQUALS"), {"bogus": true}]},
            "type": "andFilterRule",
        });

        assert!(FilterTree::from_value(&value).is_err());
    }

    #[test]
    fn serializes_in_platform_shape() {
        let tree = FilterTree::not(FilterTree::column(ColumnFilterRule::new(
            ColumnRef::object_property("obj", "prop"),
            ColumnFilter::Null(NullColumnFilter::new(ops::NULL)),
        )));

        let value = serde_json::to_value(&tree).expect("serialize");
        assert_eq!(value["type"], "notFilterRule");
        let inner = &value["notFilterRule"]["filter"]["columnFilterRule"];
        assert_eq!(inner["column"]["objectProperty"]["propertyTypeId"], "prop");
        assert_eq!(inner["filter"]["type"], "nullColumnFilter");
        assert_eq!(inner["filter"]["nullColumnFilter"]["type"], "NULL");
    }

    #[test]
    fn numeric_values_keep_their_representation() {
        let filter = NumericColumnFilter::new(ops::GREATER_THAN_OR_EQUAL, vec![Number::from(10)]);
        let value = serde_json::to_value(&filter).expect("serialize");
        assert_eq!(serde_json::to_string(&value["values"]).expect("json"), "[10]");
    }

    #[test]
    fn string_filter_distinguishes_missing_whitespace_flag() {
        let filter: StringColumnFilter =
            serde_json::from_value(json!({"type": "EQUALS", "values": ["a"]})).expect("decode");
        assert_eq!(filter.ignore_whitespace, None);
        assert!(!filter.case_sensitive);
    }
}
