//! # GraphSON - streaming property graph reader
//!
//! Decodes the JSON graph format (vertices, edges, their properties and
//! graph-level variables) and replays it as mutations against any store that
//! implements [`GraphStore`], committing every `batch_size` mutations so that
//! arbitrarily large documents stay bounded in memory.
//!
//! ## Modules
//!
//! - **reader**: value decoding, record building, batch loading and the
//!   [`GraphSONReader`] facade with its four read modes
//! - **store**: the [`GraphStore`] trait the reader writes into
//! - **memory**: [`MemoryGraph`], an in-memory store
//!
//! ## Quick Start
//!
//! ### Full graph
//!
//! ```rust
//! use graphson::{read_graph, DecodedValue, MemoryGraph, ReaderConfig};
//!
//! # fn main() -> Result<(), graphson::ReadError> {
//! let doc = r#"{
//!     "vertices": [
//!         {"id": 1, "label": "person", "properties": {"name": [{"value": "marko"}]}},
//!         {"id": 2, "label": "person", "properties": {"name": [{"value": "vadas"}]}}
//!     ],
//!     "edges": [
//!         {"id": 7, "label": "knows", "outV": 1, "outVLabel": "person",
//!          "inV": 2, "inVLabel": "person", "properties": {"weight": 0.5}}
//!     ]
//! }"#;
//!
//! let mut graph = MemoryGraph::new();
//! let summary = read_graph(doc.as_bytes(), &mut graph, ReaderConfig::default())?;
//!
//! assert_eq!(summary.vertices_created, 2);
//! assert_eq!(graph.edge(&DecodedValue::Integer(7)).unwrap().label, "knows");
//! # Ok(())
//! # }
//! ```
//!
//! ### One vertex per line
//!
//! ```rust
//! use graphson::{Direction, EdgeRecord, GraphSONReader, VertexRecord};
//!
//! # fn main() -> Result<(), graphson::ReadError> {
//! let lines = "{\"id\":1,\"label\":\"person\"}\n{\"id\":2,\"label\":\"software\"}\n";
//! let reader = GraphSONReader::builder().build()?;
//!
//! let labels = reader
//!     .read_vertices(
//!         lines.as_bytes(),
//!         Direction::Neither,
//!         |v: VertexRecord| -> graphson::Result<String> { Ok(v.label) },
//!         |_: EdgeRecord, _: &Direction| -> graphson::Result<()> { Ok(()) },
//!     )
//!     .collect::<Result<Vec<_>, _>>()?;
//!
//! assert_eq!(labels, ["person", "software"]);
//! # Ok(())
//! # }
//! ```

use std::io::Read;

pub mod error;
pub mod memory;
pub mod reader;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{ReadError, Result};
pub use memory::MemoryGraph;
pub use reader::{
    EdgeMaterializer, GraphSONReader, GraphSONReaderBuilder, JsonValueDecoder, LoadSummary, StoreMaterializer,
    ValueDecoder, VertexMaterializer, VertexStream,
};
pub use store::{GraphStore, StoreFeatures};
pub use types::{
    DecodeProfile, DecodedValue, Direction, EdgeRecord, IntegerOverflow, PropertyValue, ReaderConfig, VertexRecord,
    DEFAULT_BATCH_SIZE,
};

/// Main entry point: replay a full graph document into `store`
pub fn read_graph<R: Read, S: GraphStore>(input: R, store: &mut S, config: ReaderConfig) -> Result<LoadSummary> {
    let reader = GraphSONReader::new(config)?;
    reader.read_graph(input, store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    /// A cut of the "crew" toy graph: multi-valued property with meta-properties
    fn crew() -> String {
        json!({
            "variables": {"creator": "stephen"},
            "vertices": [
                {"id": 1, "label": "person", "properties": {
                    "name": [{"id": 0, "value": "marko"}],
                    "location": [
                        {"id": 6, "value": "san diego", "startTime": 1997, "endTime": 2001},
                        {"id": 7, "value": "santa cruz", "startTime": 2001, "endTime": 2004},
                        {"id": 8, "value": "brussels", "startTime": 2004, "endTime": 2005},
                        {"id": 9, "value": "santa fe", "startTime": 2005}
                    ]
                }},
                {"id": 10, "label": "software", "properties": {"name": [{"id": 4, "value": "gremlin"}]}}
            ],
            "edges": [
                {"id": 13, "label": "develops", "outV": 1, "outVLabel": "person",
                 "inV": 10, "inVLabel": "software", "properties": {"since": 2009}}
            ]
        })
        .to_string()
    }

    #[test]
    fn test_multiplicity_preserved() {
        let mut graph = MemoryGraph::new();
        read_graph(crew().as_bytes(), &mut graph, ReaderConfig::default()).unwrap();

        let marko = graph.vertex(&DecodedValue::Integer(1)).unwrap();
        let locations: Vec<String> = marko
            .values("location")
            .iter()
            .map(|p| p.value.to_string())
            .collect();
        assert_eq!(locations, vec!["san diego", "santa cruz", "brussels", "santa fe"]);

        let first = marko.values("location")[0];
        assert_eq!(first.id, Some(DecodedValue::Integer(6)));
        assert_eq!(first.meta.get("endTime"), Some(&DecodedValue::Integer(2001)));
        assert_eq!(graph.variables().get("creator"), Some(&DecodedValue::from("stephen")));
    }

    #[test]
    fn test_round_trip_through_records() {
        let mut graph = MemoryGraph::new();
        read_graph(crew().as_bytes(), &mut graph, ReaderConfig::default()).unwrap();

        // key -> multiset of values, as the document states them
        let mut expected: BTreeMap<&str, Vec<DecodedValue>> = BTreeMap::new();
        expected.insert("name", vec!["marko".into()]);
        expected.insert(
            "location",
            vec!["san diego".into(), "santa cruz".into(), "brussels".into(), "santa fe".into()],
        );

        let marko = graph.vertex(&DecodedValue::Integer(1)).unwrap();
        for (key, values) in expected {
            let stored: Vec<DecodedValue> = marko.values(key).iter().map(|p| p.value.clone()).collect();
            assert_eq!(stored, values);
        }

        let edge = graph.edge(&DecodedValue::Integer(13)).unwrap();
        assert_eq!(graph.vertex_at(edge.out_vertex).label, "person");
        assert_eq!(graph.vertex_at(edge.in_vertex).label, "software");
        assert_eq!(edge.properties.get("since"), Some(&DecodedValue::Integer(2009)));
    }

    #[test]
    fn test_store_without_variable_support() {
        // only the required methods
        struct Minimal(MemoryGraph);

        impl GraphStore for Minimal {
            type Vertex = <MemoryGraph as GraphStore>::Vertex;
            type Edge = <MemoryGraph as GraphStore>::Edge;

            fn find_vertex(&mut self, id: &DecodedValue) -> anyhow::Result<Option<Self::Vertex>> {
                self.0.find_vertex(id)
            }
            fn find_vertex_by_property(&mut self, key: &str, value: &DecodedValue) -> anyhow::Result<Option<Self::Vertex>> {
                self.0.find_vertex_by_property(key, value)
            }
            fn add_vertex(&mut self, id: Option<&DecodedValue>, label: &str) -> anyhow::Result<Self::Vertex> {
                self.0.add_vertex(id, label)
            }
            fn find_edge(&mut self, id: &DecodedValue) -> anyhow::Result<Option<Self::Edge>> {
                self.0.find_edge(id)
            }
            fn find_edge_by_property(&mut self, key: &str, value: &DecodedValue) -> anyhow::Result<Option<Self::Edge>> {
                self.0.find_edge_by_property(key, value)
            }
            fn add_edge(
                &mut self,
                id: Option<&DecodedValue>,
                label: &str,
                out_vertex: &Self::Vertex,
                in_vertex: &Self::Vertex,
            ) -> anyhow::Result<Self::Edge> {
                self.0.add_edge(id, label, out_vertex, in_vertex)
            }
            fn set_vertex_property(&mut self, vertex: &Self::Vertex, key: &str, value: &PropertyValue) -> anyhow::Result<()> {
                self.0.set_vertex_property(vertex, key, value)
            }
            fn set_edge_property(&mut self, edge: &Self::Edge, key: &str, value: &DecodedValue) -> anyhow::Result<()> {
                self.0.set_edge_property(edge, key, value)
            }
            fn commit(&mut self) -> anyhow::Result<()> {
                self.0.commit()
            }
        }

        let mut store = Minimal(MemoryGraph::new());
        let summary = read_graph(crew().as_bytes(), &mut store, ReaderConfig::default()).unwrap();
        assert_eq!(summary.variables_set, 0);
        assert_eq!(summary.vertices_created, 2);
        assert_eq!(store.0.edge_count(), 1);
        assert!(store.0.variables().is_empty());
    }

    #[test]
    fn test_store_failure_is_io_class() {
        struct RejectEdges(MemoryGraph);

        impl GraphStore for RejectEdges {
            type Vertex = <MemoryGraph as GraphStore>::Vertex;
            type Edge = <MemoryGraph as GraphStore>::Edge;

            fn features(&self) -> StoreFeatures {
                self.0.features()
            }
            fn find_vertex(&mut self, id: &DecodedValue) -> anyhow::Result<Option<Self::Vertex>> {
                self.0.find_vertex(id)
            }
            fn find_vertex_by_property(&mut self, key: &str, value: &DecodedValue) -> anyhow::Result<Option<Self::Vertex>> {
                self.0.find_vertex_by_property(key, value)
            }
            fn add_vertex(&mut self, id: Option<&DecodedValue>, label: &str) -> anyhow::Result<Self::Vertex> {
                self.0.add_vertex(id, label)
            }
            fn find_edge(&mut self, id: &DecodedValue) -> anyhow::Result<Option<Self::Edge>> {
                self.0.find_edge(id)
            }
            fn find_edge_by_property(&mut self, key: &str, value: &DecodedValue) -> anyhow::Result<Option<Self::Edge>> {
                self.0.find_edge_by_property(key, value)
            }
            fn add_edge(
                &mut self,
                _id: Option<&DecodedValue>,
                _label: &str,
                _out_vertex: &Self::Vertex,
                _in_vertex: &Self::Vertex,
            ) -> anyhow::Result<Self::Edge> {
                anyhow::bail!("edges are read-only here")
            }
            fn set_vertex_property(&mut self, vertex: &Self::Vertex, key: &str, value: &PropertyValue) -> anyhow::Result<()> {
                self.0.set_vertex_property(vertex, key, value)
            }
            fn set_edge_property(&mut self, edge: &Self::Edge, key: &str, value: &DecodedValue) -> anyhow::Result<()> {
                self.0.set_edge_property(edge, key, value)
            }
            fn commit(&mut self) -> anyhow::Result<()> {
                self.0.commit()
            }
            fn set_variable(&mut self, key: &str, value: &DecodedValue) -> anyhow::Result<()> {
                self.0.set_variable(key, value)
            }
        }

        let mut store = RejectEdges(MemoryGraph::new());
        let config = ReaderConfig {
            batch_size: 2,
            ..ReaderConfig::default()
        };
        let err = read_graph(crew().as_bytes(), &mut store, config).unwrap_err();
        assert!(matches!(err, ReadError::StoreFailure { operation: "add edge", .. }));

        // interim commits already landed before the failure
        assert!(store.0.commits() > 0);
        assert_eq!(store.0.vertex_count(), 2);

        let io: std::io::Error = err.into();
        assert!(io.to_string().contains("add edge"));
    }
}
