//! Piecewise reading of filter trees for inspection.
//!
//! A [`FilterView`] borrows the raw document and reads each part of a leaf
//! on its own: a comparison payload that does not decode still leaves its
//! column and operator visible. Only nodes that cannot be reached at all are
//! dropped.

use serde_json::Value;

use crate::filter::{
    ColumnFilter, FilterKind, FilterTree, AND_FILTER_RULE, COLUMN_FILTER_RULE, NOT_FILTER_RULE,
    OBJECT_PROPERTY, OR_FILTER_RULE,
};
use crate::union::{split_union, TAG_FIELD};

#[derive(Debug, Clone, PartialEq)]
pub enum FilterView<'a> {
    Leaf(LeafView<'a>),
    And(Vec<FilterView<'a>>),
    Or(Vec<FilterView<'a>>),
    Not(Box<FilterView<'a>>),
}

impl<'a> FilterView<'a> {
    /// Reads a filter node. `None` when the node itself is unrecognisable.
    pub fn parse(value: &'a Value) -> Option<Self> {
        let (tag, payload) = split_union(value, "filter", &FilterTree::TAGS).ok()?;
        match tag {
            COLUMN_FILTER_RULE => LeafView::read(payload).map(FilterView::Leaf),
            AND_FILTER_RULE => Some(FilterView::And(children(payload))),
            OR_FILTER_RULE => Some(FilterView::Or(children(payload))),
            NOT_FILTER_RULE => payload
                .get("filter")
                .and_then(FilterView::parse)
                .map(|inner| FilterView::Not(Box::new(inner))),
            _ => None,
        }
    }

    pub fn is_compound(&self) -> bool {
        !matches!(self, FilterView::Leaf(_))
    }

    /// Leaves in depth-first document order.
    pub fn leaves(&self) -> Vec<&LeafView<'a>> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'s>(&'s self, leaves: &mut Vec<&'s LeafView<'a>>) {
        match self {
            FilterView::Leaf(leaf) => leaves.push(leaf),
            FilterView::And(children) | FilterView::Or(children) => {
                for child in children {
                    child.collect_leaves(leaves);
                }
            }
            FilterView::Not(child) => child.collect_leaves(leaves),
        }
    }
}

fn children(payload: &Value) -> Vec<FilterView<'_>> {
    payload
        .get("filters")
        .and_then(Value::as_array)
        .map(|filters| filters.iter().filter_map(FilterView::parse).collect())
        .unwrap_or_default()
}

/// A `columnFilterRule` payload, read field by field.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafView<'a> {
    column: Option<&'a Value>,
    comparison_tag: Option<&'a str>,
    comparison: Option<&'a Value>,
}

impl<'a> LeafView<'a> {
    fn read(payload: &'a Value) -> Option<Self> {
        let rule = payload.as_object()?;
        let (comparison_tag, comparison) = match rule.get("filter").and_then(comparison_union) {
            Some((tag, body)) => (Some(tag), Some(body)),
            None => (None, None),
        };
        Some(Self {
            column: rule.get("column"),
            comparison_tag,
            comparison,
        })
    }

    /// `column.objectProperty.propertyTypeId`, whatever the comparison holds.
    pub fn property_id(&self) -> Option<&'a str> {
        self.column?
            .get(OBJECT_PROPERTY)?
            .get("propertyTypeId")?
            .as_str()
            .filter(|id| !id.is_empty())
    }

    /// Comparison tag as written, including kinds this crate does not model.
    pub fn comparison_tag(&self) -> Option<&'a str> {
        self.comparison_tag
    }

    pub fn kind(&self) -> Option<FilterKind> {
        self.comparison_tag.and_then(FilterKind::from_tag)
    }

    /// Operator name from the comparison's `type` field.
    pub fn op(&self) -> Option<&'a str> {
        self.comparison?
            .get(TAG_FIELD)?
            .as_str()
            .filter(|op| !op.is_empty())
    }

    /// The `ignoreWhitespace` flag when it is a boolean.
    pub fn ignore_whitespace(&self) -> Option<bool> {
        self.comparison?.get("ignoreWhitespace")?.as_bool()
    }

    /// Typed comparison, when the payload decodes.
    pub fn filter(&self) -> Option<ColumnFilter> {
        let tag = self.comparison_tag?;
        let body = self.comparison?;
        let mut union = serde_json::Map::new();
        union.insert(tag.to_string(), body.clone());
        union.insert(TAG_FIELD.to_string(), Value::String(tag.to_string()));
        ColumnFilter::from_value(&Value::Object(union)).ok()
    }
}

/// Splits a comparison union without restricting its tag.
fn comparison_union(value: &Value) -> Option<(&str, &Value)> {
    let object = value.as_object()?;
    if let Some(tag) = object.get(TAG_FIELD).and_then(Value::as_str) {
        return object.get(tag).map(|body| (tag, body));
    }
    ColumnFilter::TAGS
        .iter()
        .find_map(|tag| object.get_key_value(*tag))
        .map(|(tag, body)| (tag.as_str(), body))
}
