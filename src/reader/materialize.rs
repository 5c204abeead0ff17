//! Materializers turn detached records into whatever the caller wants
//!
//! Single-element reads hand each record to a materializer instead of writing
//! into a store themselves. Plain closures work, and [`StoreMaterializer`]
//! attaches records to a [`GraphStore`].

use crate::error::Result;
use crate::reader::batch::{BatchLoader, LoadSummary};
use crate::store::GraphStore;
use crate::types::{EdgeRecord, VertexRecord};

pub trait VertexMaterializer {
    type Vertex;

    fn materialize_vertex(&mut self, record: VertexRecord) -> Result<Self::Vertex>;
}

/// Edge counterpart of [`VertexMaterializer`]; `H` is the addressing context
/// the caller passed along with the read
pub trait EdgeMaterializer<H: ?Sized> {
    type Edge;

    fn materialize_edge(&mut self, record: EdgeRecord, host: &H) -> Result<Self::Edge>;
}

impl<V, F> VertexMaterializer for F
where
    F: FnMut(VertexRecord) -> Result<V>,
{
    type Vertex = V;

    fn materialize_vertex(&mut self, record: VertexRecord) -> Result<V> {
        self(record)
    }
}

impl<H: ?Sized, E, F> EdgeMaterializer<H> for F
where
    F: FnMut(EdgeRecord, &H) -> Result<E>,
{
    type Edge = E;

    fn materialize_edge(&mut self, record: EdgeRecord, host: &H) -> Result<E> {
        self(record, host)
    }
}

/// Attaches records to a store without interim commits; the caller decides
/// when to call [`StoreMaterializer::commit`]
pub struct StoreMaterializer<'s, S: GraphStore> {
    loader: BatchLoader<'s, S>,
}

impl<'s, S: GraphStore> StoreMaterializer<'s, S> {
    pub fn new(store: &'s mut S, vertex_id_key: &str, edge_id_key: &str) -> Self {
        StoreMaterializer {
            loader: BatchLoader::new(store, 0, vertex_id_key, edge_id_key),
        }
    }

    pub fn summary(&self) -> LoadSummary {
        self.loader.summary()
    }

    pub fn commit(&mut self) -> Result<()> {
        self.loader.commit()
    }
}

impl<S: GraphStore> VertexMaterializer for StoreMaterializer<'_, S> {
    type Vertex = S::Vertex;

    fn materialize_vertex(&mut self, record: VertexRecord) -> Result<S::Vertex> {
        self.loader.apply_vertex(&record)
    }
}

impl<H: ?Sized, S: GraphStore> EdgeMaterializer<H> for StoreMaterializer<'_, S> {
    type Edge = S::Edge;

    fn materialize_edge(&mut self, record: EdgeRecord, _host: &H) -> Result<S::Edge> {
        self.loader.apply_edge(&record)
    }
}
