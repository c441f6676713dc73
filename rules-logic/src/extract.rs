//! Read-only traversal of filter trees and rule logic documents.
//!
//! Everything here accepts partial or malformed input: parts that cannot be
//! recognised contribute nothing. Results are sorted so reports are stable.

use std::collections::BTreeSet;

use rules_protocol::filter::{FilterKind, FilterTree};
use rules_protocol::inspect::{FilterView, LeafView};
use rules_protocol::logic::{AGGREGATION_NODE, FILTER_NODE, WINDOW_NODE};
use serde::Serialize;
use serde_json::Value;

/// Operator names in use, grouped by comparison kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsedFilters {
    pub string: Vec<String>,
    pub numeric: Vec<String>,
    pub null: Vec<String>,
}

impl UsedFilters {
    pub fn get(&self, kind: FilterKind) -> &[String] {
        match kind {
            FilterKind::String => &self.string,
            FilterKind::Numeric => &self.numeric,
            FilterKind::Null => &self.null,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.string.is_empty() && self.numeric.is_empty() && self.null.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertySummary {
    pub properties: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSummary {
    pub string: Vec<String>,
    pub numeric: Vec<String>,
    pub null: Vec<String>,
    pub has_compound_filters: bool,
}

/// Walks a dotted path through nested objects and arrays.
pub(crate) fn locate<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.').filter(|segment| !segment.is_empty()) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Distinct property ids referenced anywhere in the tree.
pub fn tree_properties(tree: &FilterTree) -> BTreeSet<String> {
    tree.leaves()
        .into_iter()
        .map(|rule| rule.property_id().to_string())
        .collect()
}

/// Distinct operator names in the tree, grouped by kind.
pub fn tree_filter_types(tree: &FilterTree) -> UsedFilters {
    group_operators(
        tree.leaves()
            .into_iter()
            .map(|rule| (rule.filter.kind(), rule.filter.op())),
    )
}

fn group_operators<'a>(entries: impl IntoIterator<Item = (FilterKind, &'a str)>) -> UsedFilters {
    let mut string = BTreeSet::new();
    let mut numeric = BTreeSet::new();
    let mut null = BTreeSet::new();

    for (kind, op) in entries {
        let op = op.to_string();
        match kind {
            FilterKind::String => string.insert(op),
            FilterKind::Numeric => numeric.insert(op),
            FilterKind::Null => null.insert(op),
        };
    }

    UsedFilters {
        string: string.into_iter().collect(),
        numeric: numeric.into_iter().collect(),
        null: null.into_iter().collect(),
    }
}

/// The filter tree of a `filterNode` rule, read leaf by leaf.
///
/// A leaf whose comparison does not decode still reports its column and
/// operator; only unreachable nodes are dropped.
pub fn filter_view(logic: &Value) -> Option<FilterView<'_>> {
    locate(logic, "strategy.filterNode.filter").and_then(FilterView::parse)
}

/// Distinct property ids referenced by the leaves of a view.
pub fn view_properties(view: &FilterView<'_>) -> BTreeSet<String> {
    view.leaves()
        .into_iter()
        .filter_map(LeafView::property_id)
        .map(str::to_string)
        .collect()
}

/// Operator names of a view, grouped by kind. Unmodelled comparison kinds are skipped.
pub fn view_filter_types(view: &FilterView<'_>) -> UsedFilters {
    group_operators(
        view.leaves()
            .into_iter()
            .filter_map(|leaf| Some((leaf.kind()?, leaf.op()?))),
    )
}

fn column_property(column: Option<&Value>) -> Option<String> {
    column
        .and_then(|column| locate(column, "objectProperty.propertyTypeId"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn array_at<'a>(node: &'a Value, key: &str) -> &'a [Value] {
    node.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn window_properties(node: &Value, out: &mut BTreeSet<String>) {
    for entry in array_at(node, "columnsToAdd") {
        out.extend(column_property(locate(entry, "columnDefinition.column")));
    }
    for column in array_at(node, "partitionBy") {
        out.extend(column_property(Some(column)));
    }
}

fn aggregation_properties(node: &Value, out: &mut BTreeSet<String>) {
    for entry in array_at(node, "columnsToAdd") {
        out.extend(column_property(locate(entry, "columnDefinition.aggregationColumn")));
    }
    for entry in array_at(node, "groupByColumns") {
        out.extend(column_property(entry.get("column")));
    }
}

/// Every property id a rule logic document refers to, sorted.
///
/// Covers the filter tree, window and aggregation columns, and effect
/// parameters bound to a column.
pub fn logic_properties(logic: &Value) -> Vec<String> {
    let mut properties = BTreeSet::new();

    if let Some(view) = filter_view(logic) {
        properties.extend(view_properties(&view));
    }
    if let Some(node) = locate(logic, "strategy.windowNode") {
        window_properties(node, &mut properties);
    }
    if let Some(node) = locate(logic, "strategy.aggregationNode") {
        aggregation_properties(node, &mut properties);
    }
    if let Some(Value::Object(parameters)) = locate(logic, "effect.v2.parameterValues") {
        for parameter in parameters.values() {
            if parameter.get("type").and_then(Value::as_str) == Some("column") {
                properties.extend(column_property(parameter.get("column")));
            }
        }
    }

    properties.into_iter().collect()
}

/// Operator names used by the filter tree of a rule logic document.
pub fn logic_filter_types(logic: &Value) -> UsedFilters {
    filter_view(logic)
        .map(|view| view_filter_types(&view))
        .unwrap_or_default()
}

pub fn property_summary(logic: &Value) -> PropertySummary {
    let properties = logic_properties(logic);
    PropertySummary {
        count: properties.len(),
        properties,
    }
}

pub fn filter_summary(logic: &Value) -> FilterSummary {
    let view = filter_view(logic);
    let used = view.as_ref().map(view_filter_types).unwrap_or_default();
    FilterSummary {
        string: used.string,
        numeric: used.numeric,
        null: used.null,
        has_compound_filters: view.as_ref().is_some_and(FilterView::is_compound),
    }
}

pub fn strategy_type(logic: &Value) -> Option<&str> {
    locate(logic, "strategy.type").and_then(Value::as_str)
}

/// Object type the rule reads from, taken from the first strategy node that declares one.
pub fn extract_object_type_id(logic: &Value) -> Option<&str> {
    [FILTER_NODE, WINDOW_NODE, AGGREGATION_NODE]
        .iter()
        .filter_map(|kind| logic.get("strategy")?.get(*kind))
        .filter_map(|node| locate(node, "nodeInput.source.objectTypeId"))
        .filter_map(Value::as_str)
        .find(|id| !id.is_empty())
}

pub fn extract_workflow_rid(logic: &Value) -> Option<&str> {
    logic
        .get("workflowRid")
        .and_then(Value::as_str)
        .filter(|rid| !rid.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column(property: &str) -> Value {
        json!({
            "objectProperty": {"objectTypeId": "obj", "propertyTypeId": property},
            "type": "objectProperty",
        })
    }

    fn leaf(property: &str, kind: &str, op: &str) -> Value {
        json!({
            "columnFilterRule": {
                "column": column(property),
                "filter": {kind: {"type": op, "values": []}, "type": kind},
            },
            "type": "columnFilterRule",
        })
    }

    fn logic_with(filter: Value) -> Value {
        json!({
            "grammarVersion": "V1",
            "workflowRid": "ri.workflow.1",
            "strategy": {
                "filterNode": {
                    "nodeInput": {"source": {"objectTypeId": "obj", "type": "objectTypeId"}, "type": "source"},
                    "filter": filter,
                    "joinFilterInputs": {},
                },
                "type": "filterNode",
            },
            "effect": {"v2": {"outputAndVersion": {}, "parameterValues": {}}, "type": "v2"},
        })
    }

    #[test]
    fn finds_properties_at_any_depth() {
        let filter = json!({
            "andFilterRule": {"filters": [
                {"orFilterRule": {"filters": [
                    leaf("propA", "stringColumnFilter", "EQUALS"),
                    {"notFilterRule": {"filter": leaf("propB", "nullColumnFilter", "NULL")}, "type": "notFilterRule"},
                ]}, "type": "orFilterRule"},
                leaf("propA", "numericColumnFilter", "LESS_THAN"),
            ]},
            "type": "andFilterRule",
        });

        assert_eq!(logic_properties(&logic_with(filter)), vec!["propA", "propB"]);
    }

    #[test]
    fn groups_operators_by_kind() {
        let filter = json!({
            "orFilterRule": {"filters": [
                leaf("a", "stringColumnFilter", "EQUALS"),
                leaf("b", "stringColumnFilter", "CONTAINS"),
                leaf("c", "stringColumnFilter", "EQUALS"),
                leaf("d", "nullColumnFilter", "NOT_NULL"),
            ]},
            "type": "orFilterRule",
        });

        let used = logic_filter_types(&logic_with(filter));
        assert_eq!(used.string, vec!["CONTAINS", "EQUALS"]);
        assert!(used.numeric.is_empty());
        assert_eq!(used.get(FilterKind::Null), ["NOT_NULL".to_string()]);
    }

    #[test]
    fn tolerates_garbage() {
        for value in [json!(null), json!(42), json!({}), json!({"strategy": "nope"})] {
            assert!(logic_properties(&value).is_empty());
            assert!(logic_filter_types(&value).is_empty());
            assert_eq!(strategy_type(&value), None);
            assert_eq!(extract_object_type_id(&value), None);
        }

        let broken = logic_with(json!({"orFilterRule": {"filters": [7, null, {"x": 1}]}}));
        assert!(logic_properties(&broken).is_empty());
    }

    #[test]
    fn reads_window_aggregation_and_effect_columns() {
        let window = json!({
            "strategy": {
                "type": "windowNode",
                "windowNode": {
                    "nodeInput": {"source": {"objectTypeId": "win-obj"}},
                    "columnsToAdd": [{"columnDefinition": {"column": column("w1")}}],
                    "partitionBy": [column("w2"), {"junk": true}],
                },
                "aggregationNode": {
                    "columnsToAdd": [{"columnDefinition": {"aggregationColumn": column("g1")}}],
                    "groupByColumns": [{"column": column("g2")}],
                },
            },
            "effect": {"v2": {"parameterValues": {
                "target": {"type": "column", "column": column("e1")},
                "literal": {"type": "string", "value": "e2"},
            }}},
        });

        assert_eq!(logic_properties(&window), vec!["e1", "g1", "g2", "w1", "w2"]);
        assert_eq!(strategy_type(&window), Some("windowNode"));
        assert_eq!(extract_object_type_id(&window), Some("win-obj"));
    }

    #[test]
    fn summaries_report_counts_and_compound_filters() {
        let compound = logic_with(json!({
            "notFilterRule": {"filter": leaf("x", "stringColumnFilter", "EQUALS")},
            "type": "notFilterRule",
        }));
        let summary = property_summary(&compound);
        assert_eq!(summary.count, 1);
        assert!(filter_summary(&compound).has_compound_filters);

        let single = logic_with(leaf("x", "stringColumnFilter", "EQUALS"));
        assert!(!filter_summary(&single).has_compound_filters);
        assert_eq!(extract_workflow_rid(&single), Some("ri.workflow.1"));
        assert_eq!(extract_object_type_id(&single), Some("obj"));
    }

    #[test]
    fn leaves_with_undecodable_comparisons_still_count() {
        let filter = json!({
            "andFilterRule": {"filters": [
                {"columnFilterRule": {
                    "column": {"objectProperty": {"propertyTypeId": "flag"}, "type": "objectProperty"},
                    "filter": {"booleanColumnFilter": {"type": "IS_TRUE"}, "type": "booleanColumnFilter"},
                }, "type": "columnFilterRule"},
                {"columnFilterRule": {
                    "column": {"objectProperty": {"objectTypeId": "obj", "propertyTypeId": "label"}, "type": "objectProperty"},
                    "filter": {"stringColumnFilter": {"type": "REGEX", "values": "a.*"}, "type": "stringColumnFilter"},
                }, "type": "columnFilterRule"},
                {"columnFilterRule": {
                    "column": {"objectProperty": {"propertyTypeId": "amount"}, "type": "objectProperty"},
                    "filter": {"numericColumnFilter": {"type": "LESS_THAN", "values": ["10"]}, "type": "numericColumnFilter"},
                }, "type": "columnFilterRule"},
            ]},
            "type": "andFilterRule",
        });
        let logic = logic_with(filter);

        assert_eq!(logic_properties(&logic), vec!["amount", "flag", "label"]);
        let used = logic_filter_types(&logic);
        assert_eq!(used.string, vec!["REGEX"]);
        assert_eq!(used.numeric, vec!["LESS_THAN"]);
        assert!(used.null.is_empty());
    }

    #[test]
    fn typed_trees_report_properties_and_operators() {
        use crate::template::{null_check, string_or};

        let tree = FilterTree::and(vec![
            string_or("obj", "region", &["north".to_string(), "south".to_string()], false),
            FilterTree::not(null_check("obj", "owner", true)),
        ]);

        let properties: Vec<String> = tree_properties(&tree).into_iter().collect();
        assert_eq!(properties, vec!["owner", "region"]);
        let used = tree_filter_types(&tree);
        assert_eq!(used.string, vec!["EQUALS"]);
        assert_eq!(used.null, vec!["NULL"]);
        assert!(used.numeric.is_empty());
    }
}
