#[cfg(feature = "http")]
pub mod client;
pub mod controller;
pub mod error;
pub mod graph;
pub mod invariants;
pub mod memory;
pub mod models;
pub mod operations;
pub mod store;

pub mod prelude {
    #[cfg(feature = "http")]
    pub use crate::client::{GraphClientConfig, HttpGraphStore};
    pub use crate::controller::{EditorState, GraphEditor};
    pub use crate::error::{ErrorKind, LibError, Result};
    pub use crate::graph::GraphModel;
    pub use crate::memory::InMemoryGraphStore;
    pub use crate::models::{
        CatalogProduct, EdgeId, EdgeKind, EdgeUpdate, GraphEdge, GraphNode, NodeId, Position,
        ProductGraph, SaveReceipt,
    };
    pub use crate::operations::{GraphEditOperation, GraphEditResult};
    pub use crate::store::GraphStore;
}
