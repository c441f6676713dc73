//! The rule logic envelope submitted with a proposal.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::ProtocolError;
use crate::filter::FilterTree;
use crate::union::{serialize_union, split_union};

pub const DEFAULT_GRAMMAR_VERSION: &str = "V1";

pub const FILTER_NODE: &str = "filterNode";
pub const WINDOW_NODE: &str = "windowNode";
pub const AGGREGATION_NODE: &str = "aggregationNode";

pub const SOURCE: &str = "source";
pub const OBJECT_TYPE_ID: &str = "objectTypeId";
pub const EFFECT_V2: &str = "v2";

/// Full rule logic document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleLogic {
    #[serde(default)]
    pub named_strategies: Map<String, Value>,
    #[serde(default)]
    pub strategy_components: Value,
    pub grammar_version: String,
    pub strategy: Strategy,
    pub workflow_rid: String,
    pub effect: Effect,
}

impl RuleLogic {
    /// Builds a `filterNode` rule over `object_type_id`.
    pub fn filter_node(
        object_type_id: impl Into<String>,
        filter: FilterTree,
        workflow_rid: impl Into<String>,
        output: OutputAndVersion,
    ) -> Self {
        Self {
            named_strategies: Map::new(),
            strategy_components: Value::Null,
            grammar_version: DEFAULT_GRAMMAR_VERSION.to_string(),
            strategy: Strategy::FilterNode(FilterNode::new(object_type_id, filter)),
            workflow_rid: workflow_rid.into(),
            effect: Effect::V2(EffectV2::new(output)),
        }
    }

    pub fn filter(&self) -> Option<&FilterTree> {
        match &self.strategy {
            Strategy::FilterNode(node) => Some(&node.filter),
            Strategy::Other { .. } => None,
        }
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Strategy payload selected by the strategy kind.
///
/// Only `filterNode` is modelled in full; other kinds are carried verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    FilterNode(FilterNode),
    Other { kind: String, payload: Value },
}

impl Strategy {
    pub const KNOWN_KINDS: [&'static str; 3] = [FILTER_NODE, WINDOW_NODE, AGGREGATION_NODE];

    pub fn kind(&self) -> &str {
        match self {
            Strategy::FilterNode(_) => FILTER_NODE,
            Strategy::Other { kind, .. } => kind,
        }
    }

    pub fn from_value(value: &Value) -> Result<Self, ProtocolError> {
        let object = value
            .as_object()
            .ok_or(ProtocolError::NotAnObject { context: "strategy" })?;

        let kind = match object.get("type").and_then(Value::as_str) {
            Some(kind) => kind.to_string(),
            None => split_union(value, "strategy", &Self::KNOWN_KINDS)?.0.to_string(),
        };
        let payload = object.get(&kind).ok_or_else(|| ProtocolError::MissingField {
            tag: "strategy".to_string(),
            field: "payload",
        })?;

        if kind == FILTER_NODE {
            return FilterNode::deserialize(payload)
                .map(Strategy::FilterNode)
                .map_err(|source| ProtocolError::payload(FILTER_NODE, source));
        }
        Ok(Strategy::Other {
            kind,
            payload: payload.clone(),
        })
    }
}

impl Serialize for Strategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Strategy::FilterNode(node) => serialize_union(serializer, FILTER_NODE, node),
            Strategy::Other { kind, payload } => serialize_union(serializer, kind, payload),
        }
    }
}

impl<'de> Deserialize<'de> for Strategy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Strategy::from_value(&value).map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterNode {
    pub node_input: NodeInput,
    pub filter: FilterTree,
    #[serde(default)]
    pub join_filter_inputs: Map<String, Value>,
}

impl FilterNode {
    pub fn new(object_type_id: impl Into<String>, filter: FilterTree) -> Self {
        Self {
            node_input: NodeInput::Source(InputSource::ObjectTypeId(object_type_id.into())),
            filter,
            join_filter_inputs: Map::new(),
        }
    }

    pub fn object_type_id(&self) -> &str {
        self.node_input.object_type_id()
    }
}

/// Input of a strategy node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeInput {
    Source(InputSource),
}

impl NodeInput {
    pub fn object_type_id(&self) -> &str {
        match self {
            NodeInput::Source(InputSource::ObjectTypeId(id)) => id,
        }
    }
}

impl Serialize for NodeInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NodeInput::Source(source) => serialize_union(serializer, SOURCE, source),
        }
    }
}

impl<'de> Deserialize<'de> for NodeInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let (_, payload) = split_union(&value, "node input", &[SOURCE]).map_err(D::Error::custom)?;
        InputSource::deserialize(payload)
            .map(NodeInput::Source)
            .map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    ObjectTypeId(String),
}

impl Serialize for InputSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            InputSource::ObjectTypeId(id) => serialize_union(serializer, OBJECT_TYPE_ID, id),
        }
    }
}

impl<'de> Deserialize<'de> for InputSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let (_, payload) =
            split_union(&value, "input source", &[OBJECT_TYPE_ID]).map_err(D::Error::custom)?;
        payload
            .as_str()
            .map(|id| InputSource::ObjectTypeId(id.to_string()))
            .ok_or_else(|| D::Error::custom("objectTypeId must be a string"))
    }
}

/// Effect applied when a rule matches.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    V2(EffectV2),
}

impl Serialize for Effect {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Effect::V2(effect) => serialize_union(serializer, EFFECT_V2, effect),
        }
    }
}

impl<'de> Deserialize<'de> for Effect {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let (_, payload) = split_union(&value, "effect", &[EFFECT_V2]).map_err(D::Error::custom)?;
        EffectV2::deserialize(payload)
            .map(Effect::V2)
            .map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectV2 {
    pub output_and_version: OutputAndVersion,
    #[serde(default)]
    pub parameter_values: Map<String, Value>,
}

impl EffectV2 {
    pub fn new(output_and_version: OutputAndVersion) -> Self {
        Self {
            output_and_version,
            parameter_values: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputAndVersion {
    pub output_id: String,
    pub output_version: String,
    pub workflow_rid: String,
}
