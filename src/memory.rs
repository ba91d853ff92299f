use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{ErrorKind, Result};
use crate::invariants;
use crate::models::{CatalogProduct, EdgeId, EdgeIdAssignment, ProductGraph, SaveReceipt};
use crate::store::GraphStore;

/// Process-local `GraphStore` that validates and replaces its graph the way the
/// REST backend does.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    graph: Mutex<ProductGraph>,
    catalog: Option<Vec<CatalogProduct>>,
    assign_remote_ids: bool,
    next_remote_id: AtomicU64,
    saves: AtomicU64,
}

impl InMemoryGraphStore {
    pub fn new(graph: ProductGraph) -> Self {
        Self {
            graph: Mutex::new(graph),
            ..Self::default()
        }
    }

    pub fn with_catalog(mut self, catalog: Vec<CatalogProduct>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Replace editor-minted edge ids with store-assigned ones on save.
    pub fn assigning_remote_ids(mut self) -> Self {
        self.assign_remote_ids = true;
        self
    }

    pub fn graph(&self) -> ProductGraph {
        self.graph
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Overwrites the stored graph, as another writer on the backend would.
    pub fn replace(&self, graph: ProductGraph) {
        *self
            .graph
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = graph;
    }

    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }

    fn accept(&self, graph: &ProductGraph) -> Result<(ProductGraph, SaveReceipt)> {
        invariants::ensure_graph_invariants(ErrorKind::Validation, &graph.nodes, &graph.edges)?;

        let mut stored = graph.clone();
        let mut receipt = SaveReceipt::default();
        if self.assign_remote_ids {
            for edge in stored.edges.iter_mut().filter(|edge| edge.id.is_local()) {
                let remote = EdgeId(format!(
                    "rel-{}",
                    self.next_remote_id.fetch_add(1, Ordering::SeqCst) + 1
                ));
                receipt.edge_ids.push(EdgeIdAssignment {
                    local: edge.id.clone(),
                    remote: remote.clone(),
                });
                edge.id = remote;
            }
        }
        Ok((stored, receipt))
    }
}

impl GraphStore for InMemoryGraphStore {
    async fn load_graph(&self) -> Result<ProductGraph> {
        Ok(self.graph())
    }

    async fn save_graph(&self, graph: &ProductGraph) -> Result<SaveReceipt> {
        let (stored, receipt) = self.accept(graph)?;
        self.replace(stored);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(receipt)
    }

    async fn list_products(&self) -> Result<Option<Vec<CatalogProduct>>> {
        Ok(self.catalog.clone())
    }
}
