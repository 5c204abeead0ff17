//! In-memory graph store
//!
//! A small [`GraphStore`] that keeps everything in vectors. Useful as a scratch
//! target (read into it, copy elsewhere on success) and as the store behind the
//! reader's own tests.

use crate::store::{GraphStore, StoreFeatures};
use crate::types::{DecodedValue, PropertyValue};
use anyhow::{anyhow, bail, Result};
use std::collections::{BTreeMap, HashMap};

/// Handle to a vertex in a [`MemoryGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexKey(usize);

/// Handle to an edge in a [`MemoryGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey(usize);

#[derive(Debug, Clone)]
pub struct MemoryVertex {
    pub id: DecodedValue,
    pub label: String,
    /// Every value ever set, in order; keys repeat for multi-valued properties
    pub properties: Vec<(String, PropertyValue)>,
}

impl MemoryVertex {
    /// All values stored under `key`, in the order they were set
    pub fn values(&self, key: &str) -> Vec<&PropertyValue> {
        self.properties
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct MemoryEdge {
    pub id: DecodedValue,
    pub label: String,
    pub out_vertex: VertexKey,
    pub in_vertex: VertexKey,
    pub properties: BTreeMap<String, DecodedValue>,
}

/// Vector-backed property graph
#[derive(Debug)]
pub struct MemoryGraph {
    features: StoreFeatures,
    vertices: Vec<MemoryVertex>,
    edges: Vec<MemoryEdge>,
    vertex_ids: HashMap<DecodedValue, VertexKey>,
    edge_ids: HashMap<DecodedValue, EdgeKey>,
    variables: BTreeMap<String, DecodedValue>,
    commits: usize,
    next_id: i64,
}

impl Default for MemoryGraph {
    fn default() -> Self {
        MemoryGraph {
            features: StoreFeatures {
                variables: true,
                ..StoreFeatures::default()
            },
            vertices: Vec::new(),
            edges: Vec::new(),
            vertex_ids: HashMap::new(),
            edge_ids: HashMap::new(),
            variables: BTreeMap::new(),
            commits: 0,
            next_id: 0,
        }
    }
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A graph reporting a different feature set, e.g. one that assigns its own ids
    pub fn with_features(features: StoreFeatures) -> Self {
        MemoryGraph {
            features,
            ..Self::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn vertices(&self) -> &[MemoryVertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[MemoryEdge] {
        &self.edges
    }

    /// Look up a vertex by its store id
    pub fn vertex(&self, id: &DecodedValue) -> Option<&MemoryVertex> {
        self.vertex_ids.get(id).map(|key| &self.vertices[key.0])
    }

    /// Look up an edge by its store id
    pub fn edge(&self, id: &DecodedValue) -> Option<&MemoryEdge> {
        self.edge_ids.get(id).map(|key| &self.edges[key.0])
    }

    pub fn vertex_at(&self, key: VertexKey) -> &MemoryVertex {
        &self.vertices[key.0]
    }

    pub fn edge_at(&self, key: EdgeKey) -> &MemoryEdge {
        &self.edges[key.0]
    }

    pub fn variables(&self) -> &BTreeMap<String, DecodedValue> {
        &self.variables
    }

    /// Number of commits received so far
    pub fn commits(&self) -> usize {
        self.commits
    }

    fn generate_id(&mut self) -> DecodedValue {
        loop {
            let candidate = DecodedValue::Integer(self.next_id);
            self.next_id += 1;
            if !self.vertex_ids.contains_key(&candidate) && !self.edge_ids.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    fn assign_id(&mut self, id: Option<&DecodedValue>) -> DecodedValue {
        match id {
            Some(id) if self.features.user_supplied_ids => id.clone(),
            _ => self.generate_id(),
        }
    }

    fn vertex_mut(&mut self, key: VertexKey) -> Result<&mut MemoryVertex> {
        self.vertices
            .get_mut(key.0)
            .ok_or_else(|| anyhow!("unknown vertex handle {}", key.0))
    }
}

impl GraphStore for MemoryGraph {
    type Vertex = VertexKey;
    type Edge = EdgeKey;

    fn features(&self) -> StoreFeatures {
        self.features
    }

    fn find_vertex(&mut self, id: &DecodedValue) -> Result<Option<VertexKey>> {
        Ok(self.vertex_ids.get(id).copied())
    }

    fn find_vertex_by_property(&mut self, key: &str, value: &DecodedValue) -> Result<Option<VertexKey>> {
        Ok(self
            .vertices
            .iter()
            .position(|v| v.properties.iter().any(|(k, p)| k == key && &p.value == value))
            .map(VertexKey))
    }

    fn add_vertex(&mut self, id: Option<&DecodedValue>, label: &str) -> Result<VertexKey> {
        let id = self.assign_id(id);
        if self.vertex_ids.contains_key(&id) {
            bail!("vertex with id {} already exists", id);
        }
        let key = VertexKey(self.vertices.len());
        self.vertices.push(MemoryVertex {
            id: id.clone(),
            label: label.to_string(),
            properties: Vec::new(),
        });
        self.vertex_ids.insert(id, key);
        Ok(key)
    }

    fn find_edge(&mut self, id: &DecodedValue) -> Result<Option<EdgeKey>> {
        Ok(self.edge_ids.get(id).copied())
    }

    fn find_edge_by_property(&mut self, key: &str, value: &DecodedValue) -> Result<Option<EdgeKey>> {
        Ok(self
            .edges
            .iter()
            .position(|e| e.properties.get(key) == Some(value))
            .map(EdgeKey))
    }

    fn add_edge(
        &mut self,
        id: Option<&DecodedValue>,
        label: &str,
        out_vertex: &VertexKey,
        in_vertex: &VertexKey,
    ) -> Result<EdgeKey> {
        if out_vertex.0 >= self.vertices.len() || in_vertex.0 >= self.vertices.len() {
            bail!("edge endpoints must exist before the edge");
        }
        let id = self.assign_id(id);
        if self.edge_ids.contains_key(&id) {
            bail!("edge with id {} already exists", id);
        }
        let key = EdgeKey(self.edges.len());
        self.edges.push(MemoryEdge {
            id: id.clone(),
            label: label.to_string(),
            out_vertex: *out_vertex,
            in_vertex: *in_vertex,
            properties: BTreeMap::new(),
        });
        self.edge_ids.insert(id, key);
        Ok(key)
    }

    fn set_vertex_property(&mut self, vertex: &VertexKey, key: &str, value: &PropertyValue) -> Result<()> {
        let vertex = self.vertex_mut(*vertex)?;
        vertex.properties.push((key.to_string(), value.clone()));
        Ok(())
    }

    fn set_edge_property(&mut self, edge: &EdgeKey, key: &str, value: &DecodedValue) -> Result<()> {
        let edge = self
            .edges
            .get_mut(edge.0)
            .ok_or_else(|| anyhow!("unknown edge handle {}", edge.0))?;
        edge.properties.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        Ok(())
    }

    fn set_variable(&mut self, key: &str, value: &DecodedValue) -> Result<()> {
        if !self.features.variables {
            bail!("graph variables are not supported (variable `{}`)", key);
        }
        self.variables.insert(key.to_string(), value.clone());
        Ok(())
    }
}
