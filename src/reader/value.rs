//! Value decoding - map generic JSON onto the value kinds the format carries

use crate::error::{ReadError, Result};
use crate::types::{DecodeProfile, DecodedValue, IntegerOverflow};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Converts one parsed JSON node into a [`DecodedValue`].
///
/// The reader runs every entity document and every graph variable through its
/// decoder before building records, so swapping the decoder changes how the
/// whole document is typed.
pub trait ValueDecoder {
    fn decode(&self, node: Value) -> Result<DecodedValue>;
}

/// The default decoder, driven by a [`DecodeProfile`]
#[derive(Debug, Clone, Default)]
pub struct JsonValueDecoder {
    profile: DecodeProfile,
}

impl JsonValueDecoder {
    pub fn new(profile: DecodeProfile) -> Self {
        JsonValueDecoder { profile }
    }

    pub fn profile(&self) -> &DecodeProfile {
        &self.profile
    }

    fn decode_at(&self, node: Value, depth: usize) -> Result<DecodedValue> {
        if depth > self.profile.max_depth {
            return Err(ReadError::malformed(format!(
                "value nested deeper than {} levels",
                self.profile.max_depth
            )));
        }

        match node {
            Value::Null => Ok(DecodedValue::Null),
            Value::Bool(b) => Ok(DecodedValue::Boolean(b)),
            Value::Number(n) => self.decode_number(&n),
            Value::String(s) => Ok(DecodedValue::String(s)),
            Value::Array(items) => {
                let decoded = items
                    .into_iter()
                    .map(|item| self.decode_at(item, depth + 1))
                    .collect::<Result<Vec<_>>>()?;
                Ok(DecodedValue::List(decoded))
            }
            Value::Object(fields) => {
                let mut decoded = BTreeMap::new();
                for (key, value) in fields {
                    decoded.insert(key, self.decode_at(value, depth + 1)?);
                }
                Ok(DecodedValue::Map(decoded))
            }
        }
    }

    fn decode_number(&self, n: &Number) -> Result<DecodedValue> {
        if let Some(i) = n.as_i64() {
            return Ok(DecodedValue::Integer(i));
        }

        // Numbers keep their literal text, so an integer literal outside i64
        // is still recognisable here, however large
        let literal = n.as_str();
        if !literal.contains(['.', 'e', 'E']) {
            return match self.profile.integer_overflow {
                IntegerOverflow::Reject => Err(ReadError::malformed(format!(
                    "integer {} does not fit in 64-bit signed range",
                    literal
                ))),
                IntegerOverflow::AsFloat => match literal.parse::<f64>() {
                    Ok(f) if f.is_finite() => Ok(DecodedValue::Float(f)),
                    _ => Err(ReadError::malformed(format!("unrepresentable number {}", literal))),
                },
            };
        }

        match n.as_f64() {
            Some(f) if f.is_finite() => Ok(DecodedValue::Float(f)),
            _ => Err(ReadError::malformed(format!("non-finite number {}", literal))),
        }
    }
}

impl ValueDecoder for JsonValueDecoder {
    fn decode(&self, node: Value) -> Result<DecodedValue> {
        self.decode_at(node, 0)
    }
}
