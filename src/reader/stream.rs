//! Line-delimited vertex stream

use crate::error::Result;
use crate::reader::graphson::GraphSONReader;
use crate::reader::materialize::{EdgeMaterializer, VertexMaterializer};
use crate::reader::value::ValueDecoder;
use crate::types::Direction;
use serde_json::Value;
use simd_json::ErrorType;
use std::io::{BufRead, Lines};
use std::iter::FusedIterator;
use tracing::warn;

/// Lazy iterator over vertex documents, one per line.
///
/// Blank lines are skipped. After the first error the stream yields nothing
/// more; dropping it releases the input.
pub struct VertexStream<'r, R, D, M, E> {
    reader: &'r GraphSONReader<D>,
    lines: Lines<R>,
    direction: Direction,
    vertex_maker: M,
    edge_maker: E,
    line_number: usize,
    done: bool,
}

impl<'r, R, D, M, E> VertexStream<'r, R, D, M, E>
where
    R: BufRead,
    D: ValueDecoder,
    M: VertexMaterializer,
    E: EdgeMaterializer<Direction>,
{
    pub(crate) fn new(
        reader: &'r GraphSONReader<D>,
        input: R,
        direction: Direction,
        vertex_maker: M,
        edge_maker: E,
    ) -> Self {
        VertexStream {
            reader,
            lines: input.lines(),
            direction,
            vertex_maker,
            edge_maker,
            line_number: 0,
            done: false,
        }
    }

    /// 1-based number of the last line read
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Give the materializers back, e.g. to commit a store materializer
    pub fn into_materializers(self) -> (M, E) {
        (self.vertex_maker, self.edge_maker)
    }

    fn read_line(&mut self, line: String) -> Result<M::Vertex> {
        let node = parse_line(line)?;
        self.reader
            .materialize_vertex_document(node, self.direction, &mut self.vertex_maker, &mut self.edge_maker)
    }
}

/// Parse one line with simd-json. Numbers simd-json cannot hold (integers
/// beyond 64 bits, huge exponents) are parsed again with serde_json, which
/// keeps their literal text for the value decoder to judge.
fn parse_line(line: String) -> Result<Value> {
    let mut bytes = line.as_bytes().to_vec();
    match simd_json::serde::from_slice::<Value>(&mut bytes) {
        Ok(node) => Ok(node),
        Err(err) if matches!(err.error(), ErrorType::InvalidNumber | ErrorType::InvalidExponent) => {
            Ok(serde_json::from_str(&line)?)
        }
        Err(err) => Err(err.into()),
    }
}

impl<R, D, M, E> Iterator for VertexStream<'_, R, D, M, E>
where
    R: BufRead,
    D: ValueDecoder,
    M: VertexMaterializer,
    E: EdgeMaterializer<Direction>,
{
    type Item = Result<M::Vertex>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let line = match self.lines.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err.into()));
                }
                Some(Ok(line)) => line,
            };
            self.line_number += 1;

            if line.trim().is_empty() {
                continue;
            }

            let result = self.read_line(line);
            if let Err(err) = &result {
                warn!(line = self.line_number, error = %err, "graphson.stream.line_failed");
                self.done = true;
            }
            return Some(result);
        }
    }
}

impl<R, D, M, E> FusedIterator for VertexStream<'_, R, D, M, E>
where
    R: BufRead,
    D: ValueDecoder,
    M: VertexMaterializer,
    E: EdgeMaterializer<Direction>,
{
}
