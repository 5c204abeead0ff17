//! The reader facade
//!
//! [`GraphSONReader`] is the entry point for every read mode:
//!
//! - [`read_graph`](GraphSONReader::read_graph): a whole graph document,
//!   replayed into a [`GraphStore`] with interim commits
//! - [`read_vertex`](GraphSONReader::read_vertex) and
//!   [`read_vertex_with_edges`](GraphSONReader::read_vertex_with_edges): one
//!   vertex document, handed to a materializer
//! - [`read_edge`](GraphSONReader::read_edge): one edge document
//! - [`read_vertices`](GraphSONReader::read_vertices): one vertex document per
//!   line, as a lazy iterator
//!
//! The full-graph read walks the top-level object token by token; only one
//! vertex or edge document is held in memory at a time.

use crate::error::{ReadError, Result};
use crate::reader::batch::{BatchLoader, LoadSummary};
use crate::reader::materialize::{EdgeMaterializer, VertexMaterializer};
use crate::reader::record::{build_edge, build_vertex_document, into_field_map};
use crate::reader::stream::VertexStream;
use crate::reader::value::{JsonValueDecoder, ValueDecoder};
use crate::store::GraphStore;
use crate::types::{DecodeProfile, DecodedValue, Direction, ReaderConfig};
use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};
use std::fmt;
use std::io::{BufRead, BufReader, Read};
use tracing::{debug, info};

/// Reads graph documents and replays them as store mutations
#[derive(Debug, Clone)]
pub struct GraphSONReader<D = JsonValueDecoder> {
    config: ReaderConfig,
    decoder: D,
}

impl GraphSONReader {
    pub fn builder() -> GraphSONReaderBuilder {
        GraphSONReaderBuilder {
            config: ReaderConfig::default(),
            decoder: JsonValueDecoder::default(),
        }
    }

    pub fn new(config: ReaderConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }
}

impl<D: ValueDecoder> GraphSONReader<D> {
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Replay a full graph document into `store`.
    ///
    /// The document is an object with optional `variables`, `vertices` and
    /// `edges` fields; any other field fails the read. Commits land every
    /// `batch_size` mutations and once more at the end. A failure after an
    /// interim commit leaves the committed part in the store.
    pub fn read_graph<R: Read, S: GraphStore>(&self, input: R, store: &mut S) -> Result<LoadSummary> {
        let mut load = GraphLoad {
            loader: BatchLoader::new(
                store,
                self.config.batch_size,
                &self.config.vertex_id_key,
                &self.config.edge_id_key,
            ),
            decoder: &self.decoder,
            failure: None,
        };

        let mut de = serde_json::Deserializer::from_reader(BufReader::new(input));
        let parsed = serde::Deserializer::deserialize_map(&mut de, DocumentVisitor { load: &mut load });
        if let Some(err) = load.failure.take() {
            return Err(err);
        }
        parsed?;
        de.end()?;

        let summary = load.loader.finish()?;
        info!(
            vertices = summary.vertices_created,
            edges = summary.edges_created,
            properties = summary.properties_set,
            interim_commits = summary.interim_commits,
            "graphson.read_graph.done"
        );
        Ok(summary)
    }

    /// Decode one vertex document and hand it to `vertex_maker`
    pub fn read_vertex<R, M>(&self, input: R, vertex_maker: &mut M) -> Result<M::Vertex>
    where
        R: Read,
        M: VertexMaterializer,
    {
        let fields = into_field_map(self.read_value(input)?, "vertex")?;
        let document = build_vertex_document(fields)?;
        vertex_maker.materialize_vertex(document.vertex)
    }

    /// Decode one vertex document, materialize it, then materialize the
    /// adjacent edges listed under `outE`/`inE` that `direction` selects
    pub fn read_vertex_with_edges<R, M, E>(
        &self,
        input: R,
        direction: Direction,
        vertex_maker: &mut M,
        edge_maker: &mut E,
    ) -> Result<M::Vertex>
    where
        R: Read,
        M: VertexMaterializer,
        E: EdgeMaterializer<Direction>,
    {
        let node: Value = serde_json::from_reader(BufReader::new(input))?;
        self.materialize_vertex_document(node, direction, vertex_maker, edge_maker)
    }

    /// Decode one edge document and hand it to `edge_maker` together with `host`
    pub fn read_edge<R, H, M>(&self, input: R, host: &H, edge_maker: &mut M) -> Result<M::Edge>
    where
        R: Read,
        H: ?Sized,
        M: EdgeMaterializer<H>,
    {
        let fields = into_field_map(self.read_value(input)?, "edge")?;
        edge_maker.materialize_edge(build_edge(fields)?, host)
    }

    /// Lazily read one vertex document per line.
    ///
    /// Each call to `next` reads and materializes one line. The first bad
    /// line ends the stream with its error; vertices already yielded stay
    /// materialized.
    pub fn read_vertices<R, M, E>(
        &self,
        input: R,
        direction: Direction,
        vertex_maker: M,
        edge_maker: E,
    ) -> VertexStream<'_, R, D, M, E>
    where
        R: BufRead,
        M: VertexMaterializer,
        E: EdgeMaterializer<Direction>,
    {
        VertexStream::new(self, input, direction, vertex_maker, edge_maker)
    }

    /// Decode an arbitrary JSON document with the configured decoder
    pub fn read_value<R: Read>(&self, input: R) -> Result<DecodedValue> {
        let node: Value = serde_json::from_reader(BufReader::new(input))?;
        self.decoder.decode(node)
    }

    pub(crate) fn materialize_vertex_document<M, E>(
        &self,
        node: Value,
        direction: Direction,
        vertex_maker: &mut M,
        edge_maker: &mut E,
    ) -> Result<M::Vertex>
    where
        M: VertexMaterializer,
        E: EdgeMaterializer<Direction>,
    {
        let fields = into_field_map(self.decoder.decode(node)?, "vertex")?;
        let document = build_vertex_document(fields)?;
        let vertex = vertex_maker.materialize_vertex(document.vertex)?;

        if direction.includes_out() {
            for edge in document.out_edges {
                let record = build_edge(into_field_map(edge, "edge")?)?;
                edge_maker.materialize_edge(record, &Direction::Out)?;
            }
        }
        if direction.includes_in() {
            for edge in document.in_edges {
                let record = build_edge(into_field_map(edge, "edge")?)?;
                edge_maker.materialize_edge(record, &Direction::In)?;
            }
        }
        Ok(vertex)
    }
}

/// Builder for [`GraphSONReader`]
#[derive(Debug, Clone)]
pub struct GraphSONReaderBuilder<D = JsonValueDecoder> {
    config: ReaderConfig,
    decoder: D,
}

impl GraphSONReaderBuilder<JsonValueDecoder> {
    /// Replace the whole configuration, decode profile included
    pub fn config(mut self, config: ReaderConfig) -> Self {
        self.decoder = JsonValueDecoder::new(config.decode.clone());
        self.config = config;
        self
    }

    pub fn decode_profile(mut self, profile: DecodeProfile) -> Self {
        self.decoder = JsonValueDecoder::new(profile.clone());
        self.config.decode = profile;
        self
    }
}

impl<D: ValueDecoder> GraphSONReaderBuilder<D> {
    /// Mutations per interim commit; 0 leaves only the final commit
    pub fn batch_size(mut self, batch_size: u64) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn vertex_id_key(mut self, key: impl Into<String>) -> Self {
        self.config.vertex_id_key = key.into();
        self
    }

    pub fn edge_id_key(mut self, key: impl Into<String>) -> Self {
        self.config.edge_id_key = key.into();
        self
    }

    /// Use a different value decoder; the decode profile no longer applies
    pub fn decoder<D2: ValueDecoder>(self, decoder: D2) -> GraphSONReaderBuilder<D2> {
        GraphSONReaderBuilder {
            config: self.config,
            decoder,
        }
    }

    pub fn build(self) -> Result<GraphSONReader<D>> {
        if self.config.vertex_id_key.is_empty() {
            return Err(ReadError::InvalidConfig("vertex id key must not be empty".to_string()));
        }
        if self.config.edge_id_key.is_empty() {
            return Err(ReadError::InvalidConfig("edge id key must not be empty".to_string()));
        }
        Ok(GraphSONReader {
            config: self.config,
            decoder: self.decoder,
        })
    }
}

/// Top-level fields of a full graph document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GraphField {
    Variables,
    Vertices,
    Edges,
}

impl GraphField {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "variables" => Ok(GraphField::Variables),
            "vertices" => Ok(GraphField::Vertices),
            "edges" => Ok(GraphField::Edges),
            other => Err(ReadError::UnexpectedField {
                document: "graph",
                field: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Vertex,
    Edge,
}

/// State of one full-graph read. Errors raised inside the serde visitors are
/// parked in `failure` so the caller gets the typed error, not a string.
struct GraphLoad<'r, S: GraphStore, D> {
    loader: BatchLoader<'r, S>,
    decoder: &'r D,
    failure: Option<ReadError>,
}

impl<S: GraphStore, D: ValueDecoder> GraphLoad<'_, S, D> {
    fn fail<E: de::Error>(&mut self, err: ReadError) -> E {
        let wrapped = E::custom(&err);
        self.failure = Some(err);
        wrapped
    }

    fn apply_variables(&mut self, variables: Map<String, Value>) -> Result<()> {
        for (key, value) in variables {
            let value = self.decoder.decode(value)?;
            if !self.loader.set_variable(&key, &value)? {
                debug!(variable = %key, "graphson.variables.unsupported");
            }
        }
        Ok(())
    }

    fn apply_element(&mut self, element: Element, node: Value) -> Result<()> {
        match element {
            Element::Vertex => {
                let fields = into_field_map(self.decoder.decode(node)?, "vertex")?;
                let document = build_vertex_document(fields)?;
                if !document.out_edges.is_empty() || !document.in_edges.is_empty() {
                    debug!("graphson.read_graph.adjacent_edges_ignored");
                }
                self.loader.apply_vertex(&document.vertex)?;
            }
            Element::Edge => {
                let fields = into_field_map(self.decoder.decode(node)?, "edge")?;
                self.loader.apply_edge(&build_edge(fields)?)?;
            }
        }
        Ok(())
    }
}

struct DocumentVisitor<'l, 'r, S: GraphStore, D> {
    load: &'l mut GraphLoad<'r, S, D>,
}

impl<'de, S: GraphStore, D: ValueDecoder> Visitor<'de> for DocumentVisitor<'_, '_, S, D> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a graph document object")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut seen = Vec::with_capacity(3);
        while let Some(name) = map.next_key::<String>()? {
            let field = GraphField::parse(&name).map_err(|e| self.load.fail::<A::Error>(e))?;
            if seen.contains(&field) {
                return Err(self.load.fail(ReadError::UnexpectedField {
                    document: "graph",
                    field: name,
                }));
            }
            seen.push(field);
            match field {
                GraphField::Variables => {
                    let variables: Option<Map<String, Value>> = map.next_value()?;
                    if let Some(variables) = variables {
                        self.load
                            .apply_variables(variables)
                            .map_err(|e| self.load.fail::<A::Error>(e))?;
                    }
                }
                GraphField::Vertices => map.next_value_seed(ElementsSeed {
                    load: &mut *self.load,
                    element: Element::Vertex,
                })?,
                GraphField::Edges => map.next_value_seed(ElementsSeed {
                    load: &mut *self.load,
                    element: Element::Edge,
                })?,
            }
        }
        Ok(())
    }
}

/// Applies each element of a `vertices` or `edges` array as soon as it is parsed
struct ElementsSeed<'l, 'r, S: GraphStore, D> {
    load: &'l mut GraphLoad<'r, S, D>,
    element: Element,
}

impl<'de, S: GraphStore, D: ValueDecoder> DeserializeSeed<'de> for ElementsSeed<'_, '_, S, D> {
    type Value = ();

    fn deserialize<De>(self, deserializer: De) -> std::result::Result<(), De::Error>
    where
        De: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de, S: GraphStore, D: ValueDecoder> Visitor<'de> for ElementsSeed<'_, '_, S, D> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self.element {
            Element::Vertex => formatter.write_str("an array of vertex documents"),
            Element::Edge => formatter.write_str("an array of edge documents"),
        }
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        while let Some(node) = seq.next_element::<Value>()? {
            self.load
                .apply_element(self.element, node)
                .map_err(|e| self.load.fail::<A::Error>(e))?;
        }
        Ok(())
    }
}
