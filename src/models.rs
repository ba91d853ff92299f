use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{LibError, Result};

/// Weight given to edges drawn interactively.
pub const DEFAULT_EDGE_WEIGHT: f64 = 0.5;

/// Prefix of edge ids minted by the editor rather than by the remote store.
pub const LOCAL_EDGE_PREFIX: &str = "edge-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    #[default]
    Similar,
    Related,
    Combo,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 3] = [EdgeKind::Similar, EdgeKind::Related, EdgeKind::Combo];

    pub const fn as_wire_value(self) -> &'static str {
        match self {
            EdgeKind::Similar => "similar",
            EdgeKind::Related => "related",
            EdgeKind::Combo => "combo",
        }
    }

    pub fn from_wire_value(value: &str) -> Option<Self> {
        match value {
            "similar" => Some(EdgeKind::Similar),
            "related" => Some(EdgeKind::Related),
            "combo" => Some(EdgeKind::Combo),
            _ => None,
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire_value())
    }
}

impl FromStr for EdgeKind {
    type Err = LibError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_wire_value(s).ok_or_else(|| {
            LibError::invalid_edge_type(
                "Edge type must be one of similar, related or combo",
                anyhow!("unknown edge type {:?}", s),
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Mints a session-unique id that does not depend on the edge's endpoints.
    pub fn generate() -> Self {
        Self(format!("{}{}", LOCAL_EDGE_PREFIX, Uuid::new_v4()))
    }

    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_EDGE_PREFIX)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// JSON has no encoding for NaN or infinities.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: NodeId,
    pub label: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

/// The aggregate loaded and saved as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl ProductGraph {
    /// Compares node and edge contents while ignoring edge ids, which the remote
    /// store is free to reassign.
    pub fn equivalent_to(&self, other: &ProductGraph) -> bool {
        if self.nodes.len() != other.nodes.len() || self.edges.len() != other.edges.len() {
            return false;
        }

        let mut ours = self.nodes.iter().collect::<Vec<_>>();
        let mut theirs = other.nodes.iter().collect::<Vec<_>>();
        ours.sort_by(|a, b| a.id.cmp(&b.id));
        theirs.sort_by(|a, b| a.id.cmp(&b.id));
        if ours != theirs {
            return false;
        }

        let mut ours = self.edges.iter().map(edge_signature).collect::<Vec<_>>();
        let mut theirs = other.edges.iter().map(edge_signature).collect::<Vec<_>>();
        ours.sort();
        theirs.sort();
        ours == theirs
    }
}

fn edge_signature(edge: &GraphEdge) -> (NodeId, NodeId, EdgeKind, u64) {
    (
        edge.source.clone(),
        edge.target.clone(),
        edge.kind,
        edge.weight.to_bits(),
    )
}

impl PartialOrd for EdgeKind {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EdgeKind {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_wire_value().cmp(other.as_wire_value())
    }
}

/// Partial edge edit as submitted by an edit form. The type stays a raw string so
/// unknown values are reported rather than rejected by deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl EdgeUpdate {
    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn normalize(&self) -> Result<EdgePatch> {
        let weight = self.weight.map(validate_weight).transpose()?;
        let kind = self
            .kind
            .as_deref()
            .map(|value| value.trim().parse::<EdgeKind>())
            .transpose()?;
        Ok(EdgePatch { weight, kind })
    }
}

/// A validated `EdgeUpdate`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgePatch {
    pub weight: Option<f64>,
    pub kind: Option<EdgeKind>,
}

pub fn validate_weight(weight: f64) -> Result<f64> {
    if weight.is_finite() && (0.0..=1.0).contains(&weight) {
        Ok(weight)
    } else {
        Err(LibError::invalid_weight(
            "Edge weight must be between 0 and 1",
            anyhow!("weight {} outside [0, 1]", weight),
        ))
    }
}

/// Catalog entry used to resolve node labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    #[serde(deserialize_with = "deserialize_catalog_id")]
    pub id: NodeId,
    pub name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCatalogId {
    Number(i64),
    Text(String),
}

fn deserialize_catalog_id<'de, D>(deserializer: D) -> std::result::Result<NodeId, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawCatalogId::deserialize(deserializer)? {
        RawCatalogId::Number(id) => NodeId(id.to_string()),
        RawCatalogId::Text(id) => NodeId(id),
    })
}

/// The catalog endpoint answers with either a bare list or a paginated envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CatalogResponse {
    List(Vec<CatalogProduct>),
    Paged {
        #[serde(default)]
        results: Vec<CatalogProduct>,
    },
}

impl CatalogResponse {
    pub fn into_products(self) -> Vec<CatalogProduct> {
        match self {
            CatalogResponse::List(products) => products,
            CatalogResponse::Paged { results } => results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeIdAssignment {
    pub local: EdgeId,
    pub remote: EdgeId,
}

/// Acknowledgement of a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    #[serde(default)]
    pub edge_ids: Vec<EdgeIdAssignment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GraphInvariantViolation {
    DuplicateNodeId {
        node_id: NodeId,
    },
    NonFinitePosition {
        node_id: NodeId,
    },
    DuplicateEdgeId {
        edge_id: EdgeId,
    },
    UnknownNodeReference {
        edge_id: EdgeId,
        source: NodeId,
        target: NodeId,
        missing_node_id: NodeId,
    },
    WeightOutOfRange {
        edge_id: EdgeId,
        weight: f64,
    },
    SelfLoop {
        edge_id: EdgeId,
        node_id: NodeId,
    },
    DuplicateEdgePair {
        edge_id: EdgeId,
        source: NodeId,
        target: NodeId,
    },
}

impl GraphInvariantViolation {
    /// Advisory violations are tolerated in loaded data and only refused when an
    /// operator draws a new edge.
    pub const fn is_advisory(&self) -> bool {
        matches!(
            self,
            GraphInvariantViolation::SelfLoop { .. }
                | GraphInvariantViolation::DuplicateEdgePair { .. }
        )
    }

    pub const fn error_code(&self) -> &'static str {
        match self {
            GraphInvariantViolation::DuplicateNodeId { .. } => "graph_duplicate_node_id",
            GraphInvariantViolation::NonFinitePosition { .. } => "graph_non_finite_position",
            GraphInvariantViolation::DuplicateEdgeId { .. } => "graph_duplicate_edge_id",
            GraphInvariantViolation::UnknownNodeReference { .. } => "graph_unknown_node_reference",
            GraphInvariantViolation::WeightOutOfRange { .. } => "graph_weight_out_of_range",
            GraphInvariantViolation::SelfLoop { .. } => "graph_self_loop",
            GraphInvariantViolation::DuplicateEdgePair { .. } => "graph_duplicate_edge",
        }
    }

    pub const fn public_message(&self) -> &'static str {
        match self {
            GraphInvariantViolation::DuplicateNodeId { .. } => {
                "Node IDs must be unique within a graph"
            }
            GraphInvariantViolation::NonFinitePosition { .. } => {
                "Node position must be a finite coordinate"
            }
            GraphInvariantViolation::DuplicateEdgeId { .. } => {
                "Edge IDs must be unique within a graph"
            }
            GraphInvariantViolation::UnknownNodeReference { .. } => {
                "Edge references a node that does not exist"
            }
            GraphInvariantViolation::WeightOutOfRange { .. } => {
                "Edge weight must be between 0 and 1"
            }
            GraphInvariantViolation::SelfLoop { .. } => "Edges cannot connect a node to itself",
            GraphInvariantViolation::DuplicateEdgePair { .. } => {
                "An edge already connects these nodes"
            }
        }
    }
}
