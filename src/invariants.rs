use std::collections::HashSet;

use anyhow::anyhow;

use crate::error::{ErrorKind, LibError, Result};
use crate::models::{GraphEdge, GraphInvariantViolation, GraphNode, NodeId};

/// Lists every violation in `nodes`/`edges`, blocking and advisory alike.
pub fn graph_invariant_violations(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
) -> Vec<GraphInvariantViolation> {
    let mut violations = Vec::new();

    let mut node_ids: HashSet<&NodeId> = HashSet::with_capacity(nodes.len());
    for node in nodes {
        if !node_ids.insert(&node.id) {
            violations.push(GraphInvariantViolation::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
        if !node.position.is_finite() {
            violations.push(GraphInvariantViolation::NonFinitePosition {
                node_id: node.id.clone(),
            });
        }
    }

    let mut edge_ids = HashSet::with_capacity(edges.len());
    let mut pairs = HashSet::with_capacity(edges.len());
    for edge in edges {
        if !edge_ids.insert(&edge.id) {
            violations.push(GraphInvariantViolation::DuplicateEdgeId {
                edge_id: edge.id.clone(),
            });
        }

        if !node_ids.contains(&edge.source) {
            violations.push(GraphInvariantViolation::UnknownNodeReference {
                edge_id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                missing_node_id: edge.source.clone(),
            });
            continue;
        }
        if !node_ids.contains(&edge.target) {
            violations.push(GraphInvariantViolation::UnknownNodeReference {
                edge_id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                missing_node_id: edge.target.clone(),
            });
            continue;
        }

        if !(edge.weight.is_finite() && (0.0..=1.0).contains(&edge.weight)) {
            violations.push(GraphInvariantViolation::WeightOutOfRange {
                edge_id: edge.id.clone(),
                weight: edge.weight,
            });
        }

        if edge.source == edge.target {
            violations.push(GraphInvariantViolation::SelfLoop {
                edge_id: edge.id.clone(),
                node_id: edge.source.clone(),
            });
        }

        if !pairs.insert((&edge.source, &edge.target)) {
            violations.push(GraphInvariantViolation::DuplicateEdgePair {
                edge_id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
            });
        }
    }

    violations
}

/// Fails on the first blocking violation, reported with `kind`, and returns the
/// advisory ones so the caller can log them.
pub fn ensure_graph_invariants(
    kind: ErrorKind,
    nodes: &[GraphNode],
    edges: &[GraphEdge],
) -> Result<Vec<GraphInvariantViolation>> {
    let (advisory, blocking): (Vec<_>, Vec<_>) = graph_invariant_violations(nodes, edges)
        .into_iter()
        .partition(GraphInvariantViolation::is_advisory);

    if let Some(first) = blocking.first() {
        let source = anyhow!("graph invariant validation failed: {:?}", blocking);
        let mut err = match kind {
            ErrorKind::Validation => {
                LibError::validation(first.error_code(), first.public_message(), source)
            }
            _ => LibError::malformed(first.error_code(), first.public_message(), source),
        };
        err.details = serde_json::to_value(&blocking).ok();
        return Err(err);
    }

    Ok(advisory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EdgeId, EdgeKind, Position};

    fn node(id: &str) -> GraphNode {
        GraphNode {
            id: NodeId::from(id),
            label: id.to_uppercase(),
            position: Position::default(),
        }
    }

    fn edge(id: &str, from: &str, to: &str) -> GraphEdge {
        GraphEdge {
            id: EdgeId::from(id),
            source: NodeId::from(from),
            target: NodeId::from(to),
            weight: 0.5,
            kind: EdgeKind::Similar,
        }
    }

    #[test]
    fn valid_graph_has_no_violations() {
        let violations = graph_invariant_violations(
            &[node("a"), node("b"), node("c")],
            &[edge("e1", "a", "b"), edge("e2", "b", "c"), edge("e3", "c", "a")],
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn unknown_node_references_are_reported() {
        let violations = graph_invariant_violations(&[node("a")], &[edge("e1", "a", "zz")]);
        assert!(matches!(
            &violations[0],
            GraphInvariantViolation::UnknownNodeReference { missing_node_id, .. }
                if missing_node_id.0 == "zz"
        ));
    }

    #[test]
    fn duplicate_ids_are_reported() {
        let violations = graph_invariant_violations(
            &[node("a"), node("a"), node("b")],
            &[edge("e1", "a", "b"), edge("e1", "b", "a")],
        );
        assert!(
            violations
                .iter()
                .any(|v| matches!(v, GraphInvariantViolation::DuplicateNodeId { .. }))
        );
        assert!(
            violations
                .iter()
                .any(|v| matches!(v, GraphInvariantViolation::DuplicateEdgeId { .. }))
        );
    }

    #[test]
    fn out_of_range_weights_are_reported() {
        let mut heavy = edge("e1", "a", "b");
        heavy.weight = 1.01;
        let violations = graph_invariant_violations(&[node("a"), node("b")], &[heavy]);
        assert!(matches!(
            &violations[0],
            GraphInvariantViolation::WeightOutOfRange { weight, .. } if *weight == 1.01
        ));
    }

    #[test]
    fn non_finite_positions_block_save() {
        let mut drifting = node("b");
        drifting.position = Position::new(f64::NAN, 3.0);

        let err = ensure_graph_invariants(
            ErrorKind::Validation,
            &[node("a"), drifting],
            &[edge("e1", "a", "b")],
        )
        .expect_err("NaN cannot be encoded as JSON");
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.code, "graph_non_finite_position");
    }

    #[test]
    fn self_loops_and_repeated_pairs_are_advisory() {
        let advisory = ensure_graph_invariants(
            ErrorKind::MalformedGraph,
            &[node("a"), node("b")],
            &[edge("e1", "a", "a"), edge("e2", "a", "b"), edge("e3", "a", "b")],
        )
        .expect("advisory violations do not block");

        assert_eq!(advisory.len(), 2);
        assert!(advisory.iter().all(GraphInvariantViolation::is_advisory));
    }

    #[test]
    fn ensure_reports_blocking_violation_with_requested_kind() {
        let err = ensure_graph_invariants(
            ErrorKind::Validation,
            &[node("a")],
            &[edge("e1", "a", "missing")],
        )
        .expect_err("dangling edge should fail");
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.code, "graph_unknown_node_reference");
        assert!(err.details.is_some());

        let err = ensure_graph_invariants(
            ErrorKind::MalformedGraph,
            &[node("a")],
            &[edge("e1", "a", "missing")],
        )
        .expect_err("dangling edge should fail");
        assert_eq!(err.kind, ErrorKind::MalformedGraph);
    }
}
