//! Entity record building and property reconstruction
//!
//! A decoded entity document is a [`FieldMap`]. Each document kind has a closed
//! set of field names; anything else is rejected rather than looked up and
//! ignored. No store access happens here.

use crate::error::{ReadError, Result};
use crate::types::{DecodedValue, EdgeRecord, FieldMap, PropertyValue, VertexRecord};
use std::collections::BTreeMap;

const VERTEX: &str = "vertex";
const EDGE: &str = "edge";
const VERTEX_PROPERTY: &str = "vertex property";

/// Fields a vertex document may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VertexField {
    Id,
    Label,
    Properties,
    /// Element discriminator written alongside every element; ignored
    Type,
    OutE,
    InE,
}

impl VertexField {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "id" => Ok(VertexField::Id),
            "label" => Ok(VertexField::Label),
            "properties" => Ok(VertexField::Properties),
            "type" => Ok(VertexField::Type),
            "outE" => Ok(VertexField::OutE),
            "inE" => Ok(VertexField::InE),
            other => Err(ReadError::UnexpectedField {
                document: VERTEX,
                field: other.to_string(),
            }),
        }
    }
}

/// Fields an edge document may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeField {
    Id,
    Label,
    OutV,
    OutVLabel,
    InV,
    InVLabel,
    Properties,
    Type,
}

impl EdgeField {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "id" => Ok(EdgeField::Id),
            "label" => Ok(EdgeField::Label),
            "outV" => Ok(EdgeField::OutV),
            "outVLabel" => Ok(EdgeField::OutVLabel),
            "inV" => Ok(EdgeField::InV),
            "inVLabel" => Ok(EdgeField::InVLabel),
            "properties" => Ok(EdgeField::Properties),
            "type" => Ok(EdgeField::Type),
            other => Err(ReadError::UnexpectedField {
                document: EDGE,
                field: other.to_string(),
            }),
        }
    }
}

/// A vertex record plus the raw adjacent edge documents of the per-vertex format
#[derive(Debug, Clone, PartialEq)]
pub struct VertexDocument {
    pub vertex: VertexRecord,
    pub out_edges: Vec<DecodedValue>,
    pub in_edges: Vec<DecodedValue>,
}

/// Unwrap a decoded document into its field map
pub fn into_field_map(document: DecodedValue, entity: &str) -> Result<FieldMap> {
    match document {
        DecodedValue::Map(fields) => Ok(fields),
        other => Err(ReadError::malformed(format!(
            "{} document must be an object, found {}",
            entity,
            other.kind()
        ))),
    }
}

fn text(value: DecodedValue, entity: &str, field: &str) -> Result<String> {
    match value {
        DecodedValue::String(s) => Ok(s),
        other => Err(ReadError::malformed(format!(
            "{} field `{}` must be a string, found {}",
            entity,
            field,
            other.kind()
        ))),
    }
}

/// Edge documents name their own id and both endpoints; none of them may be null
fn element_id(value: DecodedValue, field: &str) -> Result<DecodedValue> {
    match value {
        DecodedValue::Null => Err(ReadError::malformed(format!("edge field `{}` must not be null", field))),
        value => Ok(value),
    }
}

fn edge_list(value: DecodedValue, field: &str) -> Result<Vec<DecodedValue>> {
    match value {
        DecodedValue::List(edges) => Ok(edges),
        other => Err(ReadError::malformed(format!(
            "vertex field `{}` must be a list of edges, found {}",
            field,
            other.kind()
        ))),
    }
}

/// Build a vertex record, keeping any `outE`/`inE` entries for later
pub fn build_vertex_document(fields: FieldMap) -> Result<VertexDocument> {
    let mut id = None;
    let mut label = None;
    let mut properties = BTreeMap::new();
    let mut out_edges = Vec::new();
    let mut in_edges = Vec::new();

    for (name, value) in fields {
        match VertexField::parse(&name)? {
            // null means absent: the store assigns an id
            VertexField::Id => id = Some(value).filter(|v| !v.is_null()),
            VertexField::Label => label = Some(text(value, VERTEX, "label")?),
            VertexField::Properties => properties = vertex_properties(value)?,
            VertexField::Type => {}
            VertexField::OutE => out_edges = edge_list(value, "outE")?,
            VertexField::InE => in_edges = edge_list(value, "inE")?,
        }
    }

    let label = label.ok_or(ReadError::MissingRequiredField {
        entity: VERTEX,
        field: "label",
    })?;

    Ok(VertexDocument {
        vertex: VertexRecord { id, label, properties },
        out_edges,
        in_edges,
    })
}

/// Build a vertex record from one vertex document
pub fn build_vertex(fields: FieldMap) -> Result<VertexRecord> {
    Ok(build_vertex_document(fields)?.vertex)
}

/// Build an edge record from one edge document
pub fn build_edge(fields: FieldMap) -> Result<EdgeRecord> {
    let mut id = None;
    let mut label = None;
    let mut out_id = None;
    let mut out_label = None;
    let mut in_id = None;
    let mut in_label = None;
    let mut properties = BTreeMap::new();

    for (name, value) in fields {
        match EdgeField::parse(&name)? {
            EdgeField::Id => id = Some(element_id(value, "id")?),
            EdgeField::Label => label = Some(text(value, EDGE, "label")?),
            EdgeField::OutV => out_id = Some(element_id(value, "outV")?),
            EdgeField::OutVLabel => out_label = Some(text(value, EDGE, "outVLabel")?),
            EdgeField::InV => in_id = Some(element_id(value, "inV")?),
            EdgeField::InVLabel => in_label = Some(text(value, EDGE, "inVLabel")?),
            EdgeField::Properties => {
                properties = match value {
                    DecodedValue::Map(entries) => entries,
                    DecodedValue::Null => BTreeMap::new(),
                    other => {
                        return Err(ReadError::malformed(format!(
                            "edge properties must be an object, found {}",
                            other.kind()
                        )))
                    }
                }
            }
            EdgeField::Type => {}
        }
    }

    let missing = |field| ReadError::MissingRequiredField { entity: EDGE, field };
    Ok(EdgeRecord {
        id: id.ok_or_else(|| missing("id"))?,
        label: label.ok_or_else(|| missing("label"))?,
        out_vertex_id: out_id.ok_or_else(|| missing("outV"))?,
        out_vertex_label: out_label.ok_or_else(|| missing("outVLabel"))?,
        in_vertex_id: in_id.ok_or_else(|| missing("inV"))?,
        in_vertex_label: in_label.ok_or_else(|| missing("inVLabel"))?,
        properties,
    })
}

fn vertex_properties(value: DecodedValue) -> Result<BTreeMap<String, Vec<PropertyValue>>> {
    let entries = match value {
        DecodedValue::Map(entries) => entries,
        DecodedValue::Null => return Ok(BTreeMap::new()),
        other => {
            return Err(ReadError::malformed(format!(
                "vertex properties must be an object, found {}",
                other.kind()
            )))
        }
    };

    let mut properties = BTreeMap::new();
    for (key, values) in entries {
        let values = match values {
            DecodedValue::List(values) => values,
            other => {
                return Err(ReadError::malformed(format!(
                    "vertex property `{}` must be a list of values, found {}",
                    key,
                    other.kind()
                )))
            }
        };
        let decoded = values
            .into_iter()
            .map(property_value)
            .collect::<Result<Vec<_>>>()?;
        properties.insert(key, decoded);
    }
    Ok(properties)
}

/// One entry of a vertex property list: `id`, `value`, and meta-properties
/// either inline or nested under `properties`
fn property_value(entry: DecodedValue) -> Result<PropertyValue> {
    let fields = into_field_map(entry, VERTEX_PROPERTY)?;

    let mut id = None;
    let mut value = None;
    let mut meta = BTreeMap::new();
    for (name, field) in fields {
        match name.as_str() {
            "id" => id = Some(field).filter(|v| !v.is_null()),
            "value" => value = Some(field),
            "properties" => match field {
                DecodedValue::Map(nested) => meta.extend(nested),
                other => {
                    meta.insert(name, other);
                }
            },
            _ => {
                meta.insert(name, field);
            }
        }
    }

    Ok(PropertyValue {
        id,
        value: value.ok_or(ReadError::MissingRequiredField {
            entity: VERTEX_PROPERTY,
            field: "value",
        })?,
        meta,
    })
}

/// Every property value of a vertex, one item per value, in encounter order per key
pub fn expand_vertex(record: &VertexRecord) -> impl Iterator<Item = (&str, &PropertyValue)> {
    record
        .properties
        .iter()
        .flat_map(|(key, values)| values.iter().map(move |value| (key.as_str(), value)))
}

/// Every property of an edge; edges are single-valued and carry no meta-properties
pub fn expand_edge(record: &EdgeRecord) -> impl Iterator<Item = (&str, &DecodedValue)> {
    record.properties.iter().map(|(key, value)| (key.as_str(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::value::{JsonValueDecoder, ValueDecoder};
    use serde_json::{json, Value};

    fn fields(doc: Value) -> FieldMap {
        let decoded = JsonValueDecoder::default().decode(doc).unwrap();
        into_field_map(decoded, "test").unwrap()
    }

    #[test]
    fn test_vertex_with_multi_valued_property() {
        let record = build_vertex(fields(json!({
            "id": 1,
            "label": "person",
            "type": "vertex",
            "properties": {
                "location": [
                    {"id": 100, "value": "san diego", "startTime": 1997},
                    {"id": 101, "value": "santa cruz", "properties": {"startTime": 2001}},
                    {"value": "san diego"}
                ],
                "name": [{"value": "marko"}]
            }
        })))
        .unwrap();

        assert_eq!(record.id, Some(DecodedValue::Integer(1)));
        assert_eq!(record.label, "person");

        let expanded: Vec<_> = expand_vertex(&record).collect();
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded[0].0, "location");
        assert_eq!(expanded[0].1.value, DecodedValue::from("san diego"));
        assert_eq!(expanded[0].1.id, Some(DecodedValue::Integer(100)));
        assert_eq!(expanded[0].1.meta.get("startTime"), Some(&DecodedValue::Integer(1997)));
        assert_eq!(expanded[1].1.meta.get("startTime"), Some(&DecodedValue::Integer(2001)));
        // duplicates by value stay independent
        assert_eq!(expanded[2].1.value, DecodedValue::from("san diego"));
        assert!(expanded[2].1.id.is_none());
        assert_eq!(expanded[3], ("name", &PropertyValue::new("marko")));
    }

    #[test]
    fn test_vertex_requires_label() {
        let err = build_vertex(fields(json!({"id": 1}))).unwrap_err();
        assert!(matches!(
            err,
            ReadError::MissingRequiredField { entity: "vertex", field: "label" }
        ));
    }

    #[test]
    fn test_null_ids() {
        let record = build_vertex(fields(json!({"id": null, "label": "person"}))).unwrap();
        assert!(record.id.is_none());

        let edge = json!({"id": 7, "label": "knows", "outV": 1, "outVLabel": "person", "inV": 2, "inVLabel": "person"});
        for field in ["id", "outV", "inV"] {
            let mut doc = edge.clone();
            doc[field] = Value::Null;
            assert!(
                matches!(build_edge(fields(doc)), Err(ReadError::MalformedValue(_))),
                "null `{}` should be rejected",
                field
            );
        }
    }

    #[test]
    fn test_vertex_without_id() {
        let record = build_vertex(fields(json!({"label": "person"}))).unwrap();
        assert!(record.id.is_none());
        assert!(record.properties.is_empty());
    }

    #[test]
    fn test_vertex_rejects_unknown_field() {
        let err = build_vertex(fields(json!({"id": 1, "label": "x", "colour": "red"}))).unwrap_err();
        assert!(matches!(err, ReadError::UnexpectedField { field, .. } if field == "colour"));
    }

    #[test]
    fn test_property_entry_requires_value() {
        let err = build_vertex(fields(json!({
            "label": "x",
            "properties": {"name": [{"id": 3}]}
        })))
        .unwrap_err();
        assert!(matches!(err, ReadError::MissingRequiredField { field: "value", .. }));
    }

    #[test]
    fn test_vertex_document_keeps_adjacent_edges() {
        let doc = build_vertex_document(fields(json!({
            "id": 1,
            "label": "person",
            "outE": [{"id": 10, "label": "knows", "outV": 1, "outVLabel": "person", "inV": 2, "inVLabel": "person"}],
            "inE": []
        })))
        .unwrap();
        assert_eq!(doc.out_edges.len(), 1);
        assert!(doc.in_edges.is_empty());
    }

    #[test]
    fn test_edge() {
        let record = build_edge(fields(json!({
            "id": 10,
            "label": "knows",
            "type": "edge",
            "outV": 1,
            "outVLabel": "person",
            "inV": "two",
            "inVLabel": "person",
            "properties": {"weight": 0.5}
        })))
        .unwrap();

        assert_eq!(record.id, DecodedValue::Integer(10));
        assert_eq!(record.in_vertex_id, DecodedValue::from("two"));
        let props: Vec<_> = expand_edge(&record).collect();
        assert_eq!(props, vec![("weight", &DecodedValue::Float(0.5))]);
    }

    #[test]
    fn test_edge_missing_endpoint() {
        let err = build_edge(fields(json!({
            "id": 10, "label": "knows", "outV": 1, "outVLabel": "person", "inVLabel": "person"
        })))
        .unwrap_err();
        assert!(matches!(err, ReadError::MissingRequiredField { entity: "edge", field: "inV" }));
    }

    #[test]
    fn test_edge_label_must_be_text() {
        let err = build_edge(fields(json!({
            "id": 10, "label": 5, "outV": 1, "outVLabel": "person", "inV": 2, "inVLabel": "person"
        })))
        .unwrap_err();
        assert!(matches!(err, ReadError::MalformedValue(_)));
    }
}
