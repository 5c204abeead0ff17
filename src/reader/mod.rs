//! GraphSON reading - decode graph documents and replay them into a store
//!
//! Data flows leaves-first through the submodules: `value` turns parsed JSON
//! into [`DecodedValue`](crate::types::DecodedValue)s, `record` builds detached
//! vertex and edge records and expands their properties, `batch` applies them
//! to a store with periodic commits, and `graphson`/`stream` drive the whole
//! thing for each read mode.

pub mod batch;
pub mod graphson;
pub mod materialize;
pub mod record;
pub mod stream;
pub mod value;

pub use batch::{BatchLoader, LoadSummary, Mutation, PendingBatch};
pub use graphson::{GraphSONReader, GraphSONReaderBuilder};
pub use materialize::{EdgeMaterializer, StoreMaterializer, VertexMaterializer};
pub use record::{build_edge, build_vertex, build_vertex_document, expand_edge, expand_vertex, VertexDocument};
pub use stream::VertexStream;
pub use value::{JsonValueDecoder, ValueDecoder};
