use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Number of mutations applied before the batch loader issues an interim commit
pub const DEFAULT_BATCH_SIZE: u64 = 100_000;

/// Property key used to carry element ids on stores that assign their own ids
pub const DEFAULT_ID_KEY: &str = "id";

/// A JSON value restricted to the kinds the graph format can carry.
///
/// Floats compare and hash by bit pattern so that a `DecodedValue` can key the
/// id cache; `1` and `1.0` are different ids.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DecodedValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<DecodedValue>),
    Map(BTreeMap<String, DecodedValue>),
}

/// Field map of one decoded entity document
pub type FieldMap = BTreeMap<String, DecodedValue>;

impl DecodedValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DecodedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DecodedValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DecodedValue::Float(f) => Some(*f),
            DecodedValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DecodedValue::Null)
    }

    /// Short name of the value kind, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            DecodedValue::Null => "null",
            DecodedValue::Boolean(_) => "boolean",
            DecodedValue::Integer(_) => "integer",
            DecodedValue::Float(_) => "float",
            DecodedValue::String(_) => "string",
            DecodedValue::List(_) => "list",
            DecodedValue::Map(_) => "map",
        }
    }
}

impl PartialEq for DecodedValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DecodedValue::Null, DecodedValue::Null) => true,
            (DecodedValue::Boolean(a), DecodedValue::Boolean(b)) => a == b,
            (DecodedValue::Integer(a), DecodedValue::Integer(b)) => a == b,
            (DecodedValue::Float(a), DecodedValue::Float(b)) => a.to_bits() == b.to_bits(),
            (DecodedValue::String(a), DecodedValue::String(b)) => a == b,
            (DecodedValue::List(a), DecodedValue::List(b)) => a == b,
            (DecodedValue::Map(a), DecodedValue::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for DecodedValue {}

impl Hash for DecodedValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            DecodedValue::Null => {}
            DecodedValue::Boolean(b) => b.hash(state),
            DecodedValue::Integer(n) => n.hash(state),
            DecodedValue::Float(f) => f.to_bits().hash(state),
            DecodedValue::String(s) => s.hash(state),
            DecodedValue::List(items) => items.hash(state),
            DecodedValue::Map(entries) => entries.hash(state),
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::String(s) => f.write_str(s),
            other => {
                let json = serde_json::to_string(other).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<&str> for DecodedValue {
    fn from(s: &str) -> Self {
        DecodedValue::String(s.to_string())
    }
}

impl From<String> for DecodedValue {
    fn from(s: String) -> Self {
        DecodedValue::String(s)
    }
}

impl From<i64> for DecodedValue {
    fn from(n: i64) -> Self {
        DecodedValue::Integer(n)
    }
}

impl From<f64> for DecodedValue {
    fn from(f: f64) -> Self {
        DecodedValue::Float(f)
    }
}

impl From<bool> for DecodedValue {
    fn from(b: bool) -> Self {
        DecodedValue::Boolean(b)
    }
}

/// One value of a vertex property, with its optional id and meta-properties
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyValue {
    pub id: Option<DecodedValue>,
    pub value: DecodedValue,
    pub meta: BTreeMap<String, DecodedValue>,
}

impl PropertyValue {
    pub fn new(value: impl Into<DecodedValue>) -> Self {
        PropertyValue {
            id: None,
            value: value.into(),
            meta: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<DecodedValue>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<DecodedValue>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// A detached vertex: everything the document says about it, no store handle
#[derive(Debug, Clone, PartialEq)]
pub struct VertexRecord {
    /// Absent only when the document leaves id assignment to the store
    pub id: Option<DecodedValue>,
    pub label: String,
    /// Values per key in encounter order; list cardinality is preserved
    pub properties: BTreeMap<String, Vec<PropertyValue>>,
}

/// A detached edge with both endpoints identified by id and label
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub id: DecodedValue,
    pub label: String,
    pub out_vertex_id: DecodedValue,
    pub out_vertex_label: String,
    pub in_vertex_id: DecodedValue,
    pub in_vertex_label: String,
    pub properties: BTreeMap<String, DecodedValue>,
}

/// Which adjacent edges a single-vertex read should materialize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Out,
    In,
    Both,
    #[serde(rename = "none")]
    Neither,
}

impl Direction {
    pub fn includes_out(self) -> bool {
        matches!(self, Direction::Out | Direction::Both)
    }

    pub fn includes_in(self) -> bool {
        matches!(self, Direction::In | Direction::Both)
    }
}

/// What to do with a JSON integer that does not fit in `i64`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegerOverflow {
    /// Fail with a malformed value error
    #[default]
    Reject,
    /// Keep the value as a (lossy) float
    AsFloat,
}

/// Knobs of the default value decoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeProfile {
    /// Deepest list/map nesting accepted inside one value
    pub max_depth: usize,

    pub integer_overflow: IntegerOverflow,
}

impl Default for DecodeProfile {
    fn default() -> Self {
        DecodeProfile {
            max_depth: 128,
            integer_overflow: IntegerOverflow::Reject,
        }
    }
}

/// Configuration for a reader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Mutations per interim commit in full-graph reads (0 = only the final commit)
    pub batch_size: u64,

    /// Property key holding vertex ids on stores without user-supplied ids
    pub vertex_id_key: String,

    /// Property key holding edge ids on stores without user-supplied ids
    pub edge_id_key: String,

    /// Profile for the default value decoder
    pub decode: DecodeProfile,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            batch_size: DEFAULT_BATCH_SIZE,
            vertex_id_key: String::from(DEFAULT_ID_KEY),
            edge_id_key: String::from(DEFAULT_ID_KEY),
            decode: DecodeProfile::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_float_ids_hash_by_bits() {
        let mut ids = HashSet::new();
        ids.insert(DecodedValue::Float(0.5));
        ids.insert(DecodedValue::Float(0.5));
        ids.insert(DecodedValue::Integer(1));
        ids.insert(DecodedValue::Float(1.0));
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_display() {
        assert_eq!(DecodedValue::from("marko").to_string(), "marko");
        assert_eq!(DecodedValue::Integer(7).to_string(), "7");
        assert_eq!(DecodedValue::List(vec![1i64.into(), "a".into()]).to_string(), r#"[1,"a"]"#);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: ReaderConfig = serde_json::from_str(r#"{"batch_size": 10, "decode": {"integer_overflow": "as_float"}}"#).unwrap();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.vertex_id_key, "id");
        assert_eq!(config.decode.max_depth, 128);
        assert_eq!(config.decode.integer_overflow, IntegerOverflow::AsFloat);
    }

    #[test]
    fn test_direction_names() {
        let d: Direction = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(d, Direction::Neither);
        assert!(Direction::Both.includes_out() && Direction::Both.includes_in());
        assert!(!Direction::Out.includes_in());
    }
}
