use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ErrorKind, LibError, Result};
use crate::graph::GraphModel;
use crate::invariants;
use crate::models::{EdgeId, EdgeUpdate, GraphEdge, NodeId, Position, ProductGraph, SaveReceipt};
use crate::operations::{GraphEditOperation, GraphEditResult};
use crate::store::GraphStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorState {
    Idle,
    Loading,
    Clean,
    Dirty,
    Saving,
    LoadFailed,
}

impl EditorState {
    /// States in which a loaded graph is available for editing.
    pub const fn is_editable(self) -> bool {
        matches!(
            self,
            EditorState::Clean | EditorState::Dirty | EditorState::Saving
        )
    }
}

#[derive(Debug)]
struct Session {
    model: GraphModel,
    state: EditorState,
    /// Bumped by every successful edit.
    revision: u64,
    /// Revision last confirmed by the store.
    saved_revision: u64,
    last_loaded_at: Option<DateTime<Utc>>,
    last_saved_at: Option<DateTime<Utc>>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            model: GraphModel::new(),
            state: EditorState::Idle,
            revision: 0,
            saved_revision: 0,
            last_loaded_at: None,
            last_saved_at: None,
        }
    }
}

/// One operator's editing session over the product graph.
///
/// Edits apply to the local model immediately; only `save` talks to the store, and
/// it submits the whole graph. The session lock is never held across an `.await`, so
/// edits stay possible while a save is in flight.
#[derive(Debug)]
pub struct GraphEditor<S> {
    store: S,
    session: Mutex<Session>,
}

impl<S: GraphStore> GraphEditor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            session: Mutex::new(Session::default()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn state(&self) -> EditorState {
        self.lock().state
    }

    /// Whether the local graph has edits the store has not confirmed.
    ///
    /// Agrees with `state() == Dirty`, and while `Saving` reports edits not covered by
    /// the save in flight.
    pub fn is_dirty(&self) -> bool {
        let session = self.lock();
        match session.state {
            EditorState::Dirty => true,
            EditorState::Saving => session.revision != session.saved_revision,
            _ => false,
        }
    }

    pub fn last_loaded_at(&self) -> Option<DateTime<Utc>> {
        self.lock().last_loaded_at
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.lock().last_saved_at
    }

    pub fn snapshot(&self) -> ProductGraph {
        self.lock().model.snapshot()
    }

    /// Runs `f` against the live model without editing it.
    pub fn read<T>(&self, f: impl FnOnce(&GraphModel) -> T) -> T {
        f(&self.lock().model)
    }

    /// Fetches the remote graph and replaces the local one, discarding unsaved edits.
    ///
    /// On failure the previously loaded graph is kept as is. A session that was
    /// already editable returns to its prior `Clean` or `Dirty` state, so unsaved edits
    /// can still be saved; otherwise the state becomes `LoadFailed`. Calling `load`
    /// again retries.
    pub async fn load(&self) -> Result<ProductGraph> {
        let previous = {
            let mut session = self.lock();
            if session.state == EditorState::Saving {
                return Err(LibError::save_in_progress());
            }
            if session.state == EditorState::Dirty {
                tracing::warn!(
                    revision = session.revision,
                    "reloading product graph discards unsaved edits"
                );
            }
            let previous = session.state;
            session.state = EditorState::Loading;
            previous
        };

        let fetched = self.fetch_model().await;

        let mut session = self.lock();
        match fetched {
            Ok(model) => {
                let snapshot = model.snapshot();
                session.model = model;
                session.state = EditorState::Clean;
                session.revision = 0;
                session.saved_revision = 0;
                session.last_loaded_at = Some(Utc::now());
                tracing::info!(
                    nodes = snapshot.nodes.len(),
                    edges = snapshot.edges.len(),
                    "product graph loaded"
                );
                Ok(snapshot)
            }
            Err(err) => {
                session.state = match previous {
                    EditorState::Clean | EditorState::Dirty => previous,
                    _ => EditorState::LoadFailed,
                };
                tracing::error!(
                    kind = ?err.kind,
                    error = %err.source,
                    state = ?session.state,
                    "product graph load failed"
                );
                Err(err)
            }
        }
    }

    async fn fetch_model(&self) -> Result<GraphModel> {
        let graph = self.store.load_graph().await?;
        let mut model = GraphModel::try_from(graph)?;

        match self.store.list_products().await {
            Ok(Some(catalog)) => {
                let changed = model.resolve_labels(&catalog);
                tracing::debug!(changed, "resolved node labels from catalog");
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    kind = ?err.kind,
                    error = %err.source,
                    "catalog unavailable, keeping labels from the graph snapshot"
                );
            }
        }
        Ok(model)
    }

    /// Submits the complete graph as one request.
    ///
    /// Fails with `SaveInProgress` while another save is in flight. Any other failure
    /// leaves the local graph as it was and the session `Dirty`.
    pub async fn save(&self) -> Result<SaveReceipt> {
        let (snapshot, revision) = {
            let mut session = self.lock();
            match session.state {
                EditorState::Saving => return Err(LibError::save_in_progress()),
                EditorState::Clean | EditorState::Dirty => {}
                state => return Err(not_loaded(state)),
            }

            let snapshot = session.model.snapshot();
            invariants::ensure_graph_invariants(
                ErrorKind::Validation,
                &snapshot.nodes,
                &snapshot.edges,
            )?;
            session.state = EditorState::Saving;
            (snapshot, session.revision)
        };

        let mut guard = SaveGuard {
            session: &self.session,
            armed: true,
        };
        let result = self.store.save_graph(&snapshot).await;
        guard.armed = false;

        let mut session = self.lock();
        match result {
            Ok(receipt) => {
                for assignment in &receipt.edge_ids {
                    if let Err(err) = session
                        .model
                        .rename_edge(&assignment.local, assignment.remote.clone())
                    {
                        tracing::warn!(
                            local = %assignment.local,
                            remote = %assignment.remote,
                            error = %err.source,
                            "could not apply remote edge id"
                        );
                    }
                }

                session.saved_revision = revision;
                session.state = if session.revision == revision {
                    EditorState::Clean
                } else {
                    EditorState::Dirty
                };
                session.last_saved_at = Some(Utc::now());
                tracing::info!(
                    nodes = snapshot.nodes.len(),
                    edges = snapshot.edges.len(),
                    remapped = receipt.edge_ids.len(),
                    "product graph saved"
                );
                Ok(receipt)
            }
            Err(err) => {
                session.state = EditorState::Dirty;
                tracing::warn!(
                    kind = ?err.kind,
                    code = err.code,
                    error = %err.source,
                    "product graph save failed, local edits kept"
                );
                Err(err)
            }
        }
    }

    pub fn move_node(&self, id: &NodeId, position: Position) -> Result<()> {
        self.edit("move_node", |model| model.move_node(id, position))
    }

    pub fn connect_nodes(&self, source: &NodeId, target: &NodeId) -> Result<GraphEdge> {
        self.edit("connect_nodes", |model| model.connect_nodes(source, target))
    }

    pub fn update_edge(&self, id: &EdgeId, update: &EdgeUpdate) -> Result<GraphEdge> {
        self.edit("update_edge", |model| model.update_edge(id, update))
    }

    pub fn remove_edge(&self, id: &EdgeId) -> Result<()> {
        self.edit("remove_edge", |model| model.remove_edge(id))
    }

    pub fn apply(&self, operation: GraphEditOperation) -> Result<GraphEditResult> {
        self.edit(operation.name(), |model| operation.apply(model))
    }

    fn edit<T>(
        &self,
        action: &'static str,
        f: impl FnOnce(&mut GraphModel) -> Result<T>,
    ) -> Result<T> {
        let mut session = self.lock();
        if !session.state.is_editable() {
            return Err(not_loaded(session.state));
        }

        let output = f(&mut session.model)?;
        session.revision += 1;
        if session.state == EditorState::Clean {
            session.state = EditorState::Dirty;
        }
        tracing::debug!(action, revision = session.revision, "product graph edited");
        Ok(output)
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_loaded(state: EditorState) -> LibError {
    LibError::not_loaded(
        "Load the product graph before editing or saving",
        anyhow!("editor is {:?}", state),
    )
}

/// Returns an abandoned save to `Dirty` so the session does not stay locked in `Saving`.
struct SaveGuard<'a> {
    session: &'a Mutex<Session>,
    armed: bool,
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if session.state == EditorState::Saving {
            session.state = EditorState::Dirty;
            tracing::warn!("product graph save abandoned before completion");
        }
    }
}
