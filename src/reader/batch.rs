//! Batch commit controller
//!
//! [`BatchLoader`] sits between the reader and a [`GraphStore`]. It resolves
//! document ids to store handles, counts mutations, and commits every
//! `batch_size` mutations so a large document never builds one giant
//! transaction. Creating a vertex or edge together with its id property is a
//! single mutation; each property value set afterwards is one more.

use crate::error::{ReadError, Result};
use crate::reader::record::{expand_edge, expand_vertex};
use crate::store::{GraphStore, StoreFeatures};
use crate::types::{DecodedValue, EdgeRecord, PropertyValue, VertexRecord};
use std::collections::HashMap;
use tracing::debug;

/// Kind of mutation waiting for the next commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    CreateVertex,
    SetVertexProperty,
    CreateEdge,
    SetEdgeProperty,
}

/// Mutations applied since the last commit, counted per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingBatch {
    vertices: usize,
    vertex_properties: usize,
    edges: usize,
    edge_properties: usize,
}

impl PendingBatch {
    pub fn len(&self) -> usize {
        self.vertices + self.vertex_properties + self.edges + self.edge_properties
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, kind: Mutation) -> usize {
        match kind {
            Mutation::CreateVertex => self.vertices,
            Mutation::SetVertexProperty => self.vertex_properties,
            Mutation::CreateEdge => self.edges,
            Mutation::SetEdgeProperty => self.edge_properties,
        }
    }

    fn push(&mut self, kind: Mutation) {
        match kind {
            Mutation::CreateVertex => self.vertices += 1,
            Mutation::SetVertexProperty => self.vertex_properties += 1,
            Mutation::CreateEdge => self.edges += 1,
            Mutation::SetEdgeProperty => self.edge_properties += 1,
        }
    }
}

/// Totals for one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub vertices_created: u64,
    pub edges_created: u64,
    pub properties_set: u64,
    pub variables_set: u64,
    /// Commits triggered by the batch threshold, not counting the final one
    pub interim_commits: u64,
}

/// Wraps a store for one logical read
pub struct BatchLoader<'s, S: GraphStore> {
    store: &'s mut S,
    features: StoreFeatures,
    batch_size: u64,
    vertex_id_key: String,
    edge_id_key: String,
    vertex_cache: HashMap<DecodedValue, S::Vertex>,
    pending: PendingBatch,
    summary: LoadSummary,
}

impl<'s, S: GraphStore> BatchLoader<'s, S> {
    /// `batch_size` of 0 disables interim commits
    pub fn new(store: &'s mut S, batch_size: u64, vertex_id_key: &str, edge_id_key: &str) -> Self {
        let features = store.features();
        BatchLoader {
            store,
            features,
            batch_size,
            vertex_id_key: vertex_id_key.to_string(),
            edge_id_key: edge_id_key.to_string(),
            vertex_cache: HashMap::new(),
            pending: PendingBatch::default(),
            summary: LoadSummary::default(),
        }
    }

    pub fn pending(&self) -> &PendingBatch {
        &self.pending
    }

    pub fn summary(&self) -> LoadSummary {
        self.summary
    }

    /// Return the vertex for `id`, creating it with `label` if neither this
    /// session nor the store knows it
    pub fn ensure_vertex(&mut self, id: Option<&DecodedValue>, label: &str) -> Result<S::Vertex> {
        // a null id is no id: the store assigns one
        let Some(id) = id.filter(|id| !id.is_null()) else {
            let vertex = self
                .store
                .add_vertex(None, label)
                .map_err(|e| ReadError::store("add vertex", e))?;
            self.record(Mutation::CreateVertex)?;
            self.summary.vertices_created += 1;
            return Ok(vertex);
        };

        if let Some(vertex) = self.vertex_cache.get(id) {
            return Ok(vertex.clone());
        }

        let existing = if self.features.user_supplied_ids {
            self.store.find_vertex(id)
        } else {
            self.store.find_vertex_by_property(&self.vertex_id_key, id)
        }
        .map_err(|e| ReadError::store("find vertex", e))?;

        let vertex = match existing {
            Some(vertex) => vertex,
            None => {
                let vertex = self.create_vertex(id, label)?;
                self.record(Mutation::CreateVertex)?;
                self.summary.vertices_created += 1;
                vertex
            }
        };
        self.vertex_cache.insert(id.clone(), vertex.clone());
        Ok(vertex)
    }

    fn create_vertex(&mut self, id: &DecodedValue, label: &str) -> Result<S::Vertex> {
        if self.features.user_supplied_ids {
            return self
                .store
                .add_vertex(Some(id), label)
                .map_err(|e| ReadError::store("add vertex", e));
        }

        let vertex = self
            .store
            .add_vertex(None, label)
            .map_err(|e| ReadError::store("add vertex", e))?;
        self.store
            .set_vertex_property(&vertex, &self.vertex_id_key, &PropertyValue::new(id.clone()))
            .map_err(|e| ReadError::store("set vertex id property", e))?;
        Ok(vertex)
    }

    /// Return the edge for `id`, creating it between the two handles if the
    /// store does not have it yet
    pub fn ensure_edge(
        &mut self,
        id: &DecodedValue,
        label: &str,
        out_vertex: &S::Vertex,
        in_vertex: &S::Vertex,
    ) -> Result<S::Edge> {
        let existing = if self.features.user_supplied_ids {
            self.store.find_edge(id)
        } else {
            self.store.find_edge_by_property(&self.edge_id_key, id)
        }
        .map_err(|e| ReadError::store("find edge", e))?;
        if let Some(edge) = existing {
            return Ok(edge);
        }

        let edge = if self.features.user_supplied_ids {
            self.store
                .add_edge(Some(id), label, out_vertex, in_vertex)
                .map_err(|e| ReadError::store("add edge", e))?
        } else {
            let edge = self
                .store
                .add_edge(None, label, out_vertex, in_vertex)
                .map_err(|e| ReadError::store("add edge", e))?;
            self.store
                .set_edge_property(&edge, &self.edge_id_key, id)
                .map_err(|e| ReadError::store("set edge id property", e))?;
            edge
        };
        self.record(Mutation::CreateEdge)?;
        self.summary.edges_created += 1;
        Ok(edge)
    }

    /// Append one value; the value id is dropped for stores that cannot keep it
    pub fn set_vertex_property(&mut self, vertex: &S::Vertex, key: &str, value: &PropertyValue) -> Result<()> {
        let result = if value.id.is_some() && !self.features.vertex_property_ids {
            let stripped = PropertyValue {
                id: None,
                ..value.clone()
            };
            self.store.set_vertex_property(vertex, key, &stripped)
        } else {
            self.store.set_vertex_property(vertex, key, value)
        };
        result.map_err(|e| ReadError::store("set vertex property", e))?;
        self.summary.properties_set += 1;
        self.record(Mutation::SetVertexProperty)
    }

    pub fn set_edge_property(&mut self, edge: &S::Edge, key: &str, value: &DecodedValue) -> Result<()> {
        self.store
            .set_edge_property(edge, key, value)
            .map_err(|e| ReadError::store("set edge property", e))?;
        self.summary.properties_set += 1;
        self.record(Mutation::SetEdgeProperty)
    }

    /// Forward a graph variable; returns false when the store has no variables
    pub fn set_variable(&mut self, key: &str, value: &DecodedValue) -> Result<bool> {
        if !self.features.variables {
            return Ok(false);
        }
        self.store
            .set_variable(key, value)
            .map_err(|e| ReadError::store("set variable", e))?;
        self.summary.variables_set += 1;
        Ok(true)
    }

    /// Attach a detached vertex and all of its property values
    pub fn apply_vertex(&mut self, record: &VertexRecord) -> Result<S::Vertex> {
        let vertex = self.ensure_vertex(record.id.as_ref(), &record.label)?;
        for (key, value) in expand_vertex(record) {
            self.set_vertex_property(&vertex, key, value)?;
        }
        Ok(vertex)
    }

    /// Attach a detached edge, creating endpoints that are not known yet.
    /// Endpoints created here only get an id and a label.
    pub fn apply_edge(&mut self, record: &EdgeRecord) -> Result<S::Edge> {
        if record.id.is_null() || record.out_vertex_id.is_null() || record.in_vertex_id.is_null() {
            return Err(ReadError::malformed(format!(
                "edge `{}` needs non-null id, outV and inV",
                record.label
            )));
        }
        let out_vertex = self.ensure_vertex(Some(&record.out_vertex_id), &record.out_vertex_label)?;
        let in_vertex = self.ensure_vertex(Some(&record.in_vertex_id), &record.in_vertex_label)?;
        let edge = self.ensure_edge(&record.id, &record.label, &out_vertex, &in_vertex)?;
        for (key, value) in expand_edge(record) {
            self.set_edge_property(&edge, key, value)?;
        }
        Ok(edge)
    }

    fn record(&mut self, mutation: Mutation) -> Result<()> {
        self.pending.push(mutation);
        if self.batch_size > 0 && self.pending.len() as u64 >= self.batch_size {
            self.commit()?;
            self.summary.interim_commits += 1;
        }
        Ok(())
    }

    /// Commit whatever is pending
    pub fn commit(&mut self) -> Result<()> {
        debug!(
            mutations = self.pending.len(),
            vertices = self.pending.count(Mutation::CreateVertex),
            edges = self.pending.count(Mutation::CreateEdge),
            "graphson.batch.commit"
        );
        self.store.commit().map_err(|e| ReadError::store("commit", e))?;
        self.pending = PendingBatch::default();
        Ok(())
    }

    /// Final commit, issued regardless of how much is pending
    pub fn finish(mut self) -> Result<LoadSummary> {
        self.commit()?;
        Ok(self.summary)
    }
}
