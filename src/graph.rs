use std::collections::HashMap;

use anyhow::anyhow;

use crate::error::{ErrorKind, LibError, Result};
use crate::invariants;
use crate::models::{
    CatalogProduct, DEFAULT_EDGE_WEIGHT, EdgeId, EdgeKind, EdgeUpdate, GraphEdge, GraphNode,
    NodeId, Position, ProductGraph,
};

/// Live, mutable product graph.
///
/// Every mutation validates before it touches state, so after any call (successful
/// or not) each edge's endpoints resolve to nodes in the graph.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    node_index: HashMap<NodeId, usize>,
    edge_index: HashMap<EdgeId, usize>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole graph. Nothing changes unless the input is well formed.
    pub fn load_graph(
        &mut self,
        nodes: Vec<GraphNode>,
        edges: Vec<GraphEdge>,
    ) -> Result<ProductGraph> {
        let advisory = invariants::ensure_graph_invariants(ErrorKind::MalformedGraph, &nodes, &edges)?;
        for violation in &advisory {
            tracing::warn!(
                code = violation.error_code(),
                ?violation,
                "loaded graph carries a relationship the editor would not create"
            );
        }

        self.nodes = nodes;
        self.edges = edges;
        self.reindex();

        tracing::debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "graph model loaded"
        );
        Ok(self.snapshot())
    }

    pub fn move_node(&mut self, id: &NodeId, position: Position) -> Result<()> {
        let idx = self.node_position(id)?;
        if !position.is_finite() {
            return Err(LibError::invalid_position(
                "Node position must be a finite coordinate",
                anyhow!("node {} cannot move to ({}, {})", id, position.x, position.y),
            ));
        }
        self.nodes[idx].position = position;
        Ok(())
    }

    /// Draws a new `similar` edge of weight 0.5 between two existing nodes.
    pub fn connect_nodes(&mut self, source: &NodeId, target: &NodeId) -> Result<GraphEdge> {
        self.node_position(source)?;
        self.node_position(target)?;

        if source == target {
            return Err(LibError::invalid_edge(
                "graph_self_loop",
                "Edges cannot connect a node to itself",
                anyhow!("self-loop requested on node {}", source),
            ));
        }
        if let Some(existing) = self
            .edges
            .iter()
            .find(|edge| edge.source == *source && edge.target == *target)
        {
            return Err(LibError::invalid_edge(
                "graph_duplicate_edge",
                "An edge already connects these nodes",
                anyhow!(
                    "edge {} already connects {} to {}",
                    existing.id,
                    source,
                    target
                ),
            ));
        }

        let mut id = EdgeId::generate();
        while self.edge_index.contains_key(&id) {
            id = EdgeId::generate();
        }

        let edge = GraphEdge {
            id,
            source: source.clone(),
            target: target.clone(),
            weight: DEFAULT_EDGE_WEIGHT,
            kind: EdgeKind::default(),
        };
        self.edge_index.insert(edge.id.clone(), self.edges.len());
        self.edges.push(edge.clone());
        Ok(edge)
    }

    pub fn update_edge(&mut self, id: &EdgeId, update: &EdgeUpdate) -> Result<GraphEdge> {
        let idx = self.edge_position(id)?;
        let patch = update.normalize()?;

        let edge = &mut self.edges[idx];
        if let Some(weight) = patch.weight {
            edge.weight = weight;
        }
        if let Some(kind) = patch.kind {
            edge.kind = kind;
        }
        Ok(edge.clone())
    }

    /// Removes an edge; its endpoint nodes stay.
    pub fn remove_edge(&mut self, id: &EdgeId) -> Result<()> {
        let idx = self.edge_position(id)?;
        self.edges.remove(idx);
        self.reindex_edges();
        Ok(())
    }

    /// Gives an edge the id the remote store assigned to it.
    pub fn rename_edge(&mut self, from: &EdgeId, to: EdgeId) -> Result<()> {
        let idx = self.edge_position(from)?;
        if *from == to {
            return Ok(());
        }
        if self.edge_index.contains_key(&to) {
            return Err(LibError::invalid_edge(
                "graph_duplicate_edge_id",
                "Edge IDs must be unique within a graph",
                anyhow!("cannot rename edge {} to existing id {}", from, to),
            ));
        }

        self.edge_index.remove(from);
        self.edge_index.insert(to.clone(), idx);
        self.edges[idx].id = to;
        Ok(())
    }

    /// Re-syncs node labels from catalog entries. Returns how many labels changed.
    pub fn resolve_labels(&mut self, catalog: &[CatalogProduct]) -> usize {
        let mut changed = 0;
        for product in catalog {
            if let Some(&idx) = self.node_index.get(&product.id) {
                let node = &mut self.nodes[idx];
                if node.label != product.name {
                    node.label = product.name.clone();
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Owned copy of the current graph, detached from further edits.
    pub fn snapshot(&self) -> ProductGraph {
        ProductGraph {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&GraphEdge> {
        self.edge_index.get(id).map(|&idx| &self.edges[idx])
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Edges with `id` as either endpoint.
    pub fn edges_touching<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a GraphEdge> {
        self.edges
            .iter()
            .filter(move |edge| edge.source == *id || edge.target == *id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn node_position(&self, id: &NodeId) -> Result<usize> {
        self.node_index.get(id).copied().ok_or_else(|| {
            LibError::node_not_found("Node not found", anyhow!("node {} is not in the graph", id))
        })
    }

    fn edge_position(&self, id: &EdgeId) -> Result<usize> {
        self.edge_index.get(id).copied().ok_or_else(|| {
            LibError::edge_not_found("Edge not found", anyhow!("edge {} is not in the graph", id))
        })
    }

    fn reindex(&mut self) {
        self.node_index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id.clone(), idx))
            .collect();
        self.reindex_edges();
    }

    fn reindex_edges(&mut self) {
        self.edge_index = self
            .edges
            .iter()
            .enumerate()
            .map(|(idx, edge)| (edge.id.clone(), idx))
            .collect();
    }
}

impl TryFrom<ProductGraph> for GraphModel {
    type Error = LibError;

    fn try_from(graph: ProductGraph) -> Result<Self> {
        let mut model = GraphModel::new();
        model.load_graph(graph.nodes, graph.edges)?;
        Ok(model)
    }
}
