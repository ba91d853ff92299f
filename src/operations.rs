use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::GraphModel;
use crate::models::{EdgeId, EdgeUpdate, GraphEdge, NodeId, Position};

/// Edit actions a canvas can forward as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum GraphEditOperation {
    MoveNode {
        node_id: NodeId,
        position: Position,
    },
    ConnectNodes {
        source: NodeId,
        target: NodeId,
    },
    UpdateEdge {
        edge_id: EdgeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weight: Option<f64>,
        #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
    },
    RemoveEdge {
        edge_id: EdgeId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum GraphEditResult {
    NodeMoved { node_id: NodeId },
    EdgeCreated { edge: GraphEdge },
    EdgeUpdated { edge: GraphEdge },
    EdgeRemoved { edge_id: EdgeId },
}

impl GraphEditOperation {
    pub const fn name(&self) -> &'static str {
        match self {
            GraphEditOperation::MoveNode { .. } => "move_node",
            GraphEditOperation::ConnectNodes { .. } => "connect_nodes",
            GraphEditOperation::UpdateEdge { .. } => "update_edge",
            GraphEditOperation::RemoveEdge { .. } => "remove_edge",
        }
    }

    pub fn apply(self, model: &mut GraphModel) -> Result<GraphEditResult> {
        match self {
            GraphEditOperation::MoveNode { node_id, position } => {
                model.move_node(&node_id, position)?;
                Ok(GraphEditResult::NodeMoved { node_id })
            }
            GraphEditOperation::ConnectNodes { source, target } => {
                let edge = model.connect_nodes(&source, &target)?;
                Ok(GraphEditResult::EdgeCreated { edge })
            }
            GraphEditOperation::UpdateEdge {
                edge_id,
                weight,
                kind,
            } => {
                let edge = model.update_edge(&edge_id, &EdgeUpdate { weight, kind })?;
                Ok(GraphEditResult::EdgeUpdated { edge })
            }
            GraphEditOperation::RemoveEdge { edge_id } => {
                model.remove_edge(&edge_id)?;
                Ok(GraphEditResult::EdgeRemoved { edge_id })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{EdgeKind, GraphNode};

    fn model() -> GraphModel {
        let mut model = GraphModel::new();
        model
            .load_graph(
                ["p1", "p2"]
                    .into_iter()
                    .map(|id| GraphNode {
                        id: NodeId::from(id),
                        label: id.to_string(),
                        position: Position::default(),
                    })
                    .collect(),
                vec![],
            )
            .expect("graph should load");
        model
    }

    #[test]
    fn operations_decode_from_tagged_json() {
        let op: GraphEditOperation = serde_json::from_value(json!({
            "operation": "update_edge",
            "edge_id": "e1",
            "weight": 0.9,
            "type": "combo"
        }))
        .expect("update decodes");
        assert_eq!(
            op,
            GraphEditOperation::UpdateEdge {
                edge_id: EdgeId::from("e1"),
                weight: Some(0.9),
                kind: Some("combo".to_string()),
            }
        );

        let op: GraphEditOperation = serde_json::from_value(json!({
            "operation": "move_node",
            "node_id": "p1",
            "position": {"x": 3.0, "y": 4.0}
        }))
        .expect("move decodes");
        assert_eq!(op.name(), "move_node");
    }

    #[test]
    fn apply_runs_connect_update_remove() {
        let mut model = model();

        let created = GraphEditOperation::ConnectNodes {
            source: NodeId::from("p1"),
            target: NodeId::from("p2"),
        }
        .apply(&mut model)
        .expect("connect");
        let GraphEditResult::EdgeCreated { edge } = created else {
            panic!("expected edge creation");
        };

        let updated = GraphEditOperation::UpdateEdge {
            edge_id: edge.id.clone(),
            weight: None,
            kind: Some("related".to_string()),
        }
        .apply(&mut model)
        .expect("update");
        assert!(matches!(
            updated,
            GraphEditResult::EdgeUpdated { edge: GraphEdge { kind: EdgeKind::Related, .. } }
        ));

        GraphEditOperation::RemoveEdge {
            edge_id: edge.id.clone(),
        }
        .apply(&mut model)
        .expect("remove");
        assert_eq!(model.edge_count(), 0);
    }

    #[test]
    fn apply_surfaces_model_errors() {
        let mut model = model();
        let err = GraphEditOperation::MoveNode {
            node_id: NodeId::from("ghost"),
            position: Position::new(1.0, 1.0),
        }
        .apply(&mut model)
        .expect_err("unknown node");
        assert_eq!(err.kind, ErrorKind::NodeNotFound);
    }

    #[test]
    fn results_serialize_with_result_tag() {
        let value = serde_json::to_value(GraphEditResult::EdgeRemoved {
            edge_id: EdgeId::from("e9"),
        })
        .expect("serializes");
        assert_eq!(value, json!({"result": "edge_removed", "edge_id": "e9"}));
    }
}
