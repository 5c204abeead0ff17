//! The target graph store, seen from the reader
//!
//! The reader never implements storage. It drives whatever sits behind
//! [`GraphStore`], one mutation at a time and strictly in document order.

use crate::types::{DecodedValue, PropertyValue};
use anyhow::{bail, Result};

/// Capabilities a store reports to the reader.
///
/// The default matches a store that implements only the required
/// [`GraphStore`] methods: native ids, no graph variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreFeatures {
    /// Graph-level variables can be set
    pub variables: bool,

    /// Vertices and edges keep the ids the document gives them
    pub user_supplied_ids: bool,

    /// Vertex property values keep the ids the document gives them
    pub vertex_property_ids: bool,
}

impl Default for StoreFeatures {
    fn default() -> Self {
        StoreFeatures {
            variables: false,
            user_supplied_ids: true,
            vertex_property_ids: true,
        }
    }
}

/// A mutable property graph the reader writes into.
///
/// Handles are store-native and opaque to the reader. When
/// [`StoreFeatures::user_supplied_ids`] is false the reader passes `None` as
/// the id on creation, stores the document id as a property, and looks it up
/// again through the `find_*_by_property` methods.
pub trait GraphStore {
    type Vertex: Clone;
    type Edge;

    fn features(&self) -> StoreFeatures {
        StoreFeatures::default()
    }

    fn find_vertex(&mut self, id: &DecodedValue) -> Result<Option<Self::Vertex>>;

    fn find_vertex_by_property(&mut self, key: &str, value: &DecodedValue) -> Result<Option<Self::Vertex>>;

    fn add_vertex(&mut self, id: Option<&DecodedValue>, label: &str) -> Result<Self::Vertex>;

    fn find_edge(&mut self, id: &DecodedValue) -> Result<Option<Self::Edge>>;

    fn find_edge_by_property(&mut self, key: &str, value: &DecodedValue) -> Result<Option<Self::Edge>>;

    fn add_edge(
        &mut self,
        id: Option<&DecodedValue>,
        label: &str,
        out_vertex: &Self::Vertex,
        in_vertex: &Self::Vertex,
    ) -> Result<Self::Edge>;

    /// Append one value under `key` (list cardinality, never replaces)
    fn set_vertex_property(&mut self, vertex: &Self::Vertex, key: &str, value: &PropertyValue) -> Result<()>;

    fn set_edge_property(&mut self, edge: &Self::Edge, key: &str, value: &DecodedValue) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    /// Only called when [`StoreFeatures::variables`] is set
    fn set_variable(&mut self, key: &str, _value: &DecodedValue) -> Result<()> {
        bail!("graph variables are not supported (variable `{}`)", key)
    }
}
