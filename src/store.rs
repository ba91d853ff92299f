use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{CatalogProduct, ProductGraph, SaveReceipt};

/// Remote side of an editing session: owns the authoritative graph.
///
/// `save_graph` receives the complete desired graph, never a diff, and must either
/// accept all of it or none of it.
pub trait GraphStore: Send + Sync {
    fn load_graph(&self) -> impl Future<Output = Result<ProductGraph>> + Send;

    fn save_graph(&self, graph: &ProductGraph) -> impl Future<Output = Result<SaveReceipt>> + Send;

    /// Catalog entries used to resolve node labels at load time. `None` keeps the
    /// labels that came with the graph.
    fn list_products(&self) -> impl Future<Output = Result<Option<Vec<CatalogProduct>>>> + Send {
        async { Ok(None) }
    }
}

impl<S: GraphStore> GraphStore for Arc<S> {
    fn load_graph(&self) -> impl Future<Output = Result<ProductGraph>> + Send {
        S::load_graph(self)
    }

    fn save_graph(&self, graph: &ProductGraph) -> impl Future<Output = Result<SaveReceipt>> + Send {
        S::save_graph(self, graph)
    }

    fn list_products(&self) -> impl Future<Output = Result<Option<Vec<CatalogProduct>>>> + Send {
        S::list_products(self)
    }
}
