//! Wire codec for [`Value`]
//!
//! Converts between the [`Value`] model and the JSON shapes WebDriver BiDi puts
//! on the wire.
//!
//! # Functions
//!
//! - `decode()` - Parses a runtime→client value; dispatches on the `type` field
//! - `encode()` - Produces the wire JSON for a value (never fails)
//! - `from_native()` - Converts native Rust values via [`IntoValue`]
//!
//! # Protocol Format
//!
//! - `{"type": "undefined"}`, `{"type": "null"}`
//! - `{"type": "string", "value": "hello"}`, `{"type": "boolean", "value": true}`
//! - `{"type": "number", "value": 42}` - finite numbers are bare JSON numbers
//! - `{"type": "number", "value": "-0"}` - `NaN`, `-0`, `Infinity`, `-Infinity` are strings
//! - `{"type": "bigint", "value": "12345678901234567890"}`
//! - `{"type": "array", "value": [...]}` (also `set`, `nodelist`, `htmlcollection`)
//! - `{"type": "object", "value": [["key", {...}], [{...}, {...}]]}` (also `map`);
//!   entries are pairs because keys may be values themselves
//! - `{"type": "date", "value": "2025-12-25T00:00:00.000Z"}`
//! - `{"type": "regexp", "value": {"pattern": "a+", "flags": "g"}}`
//! - `{"type": "node", "sharedId": "...", "value": {"nodeType": 1, ...}}`
//! - `{"type": "window", "value": {"context": "..."}}`
//! - `{"type": "promise", "handle": "..."}` and the other by-reference types
//! - `{"sharedId": "...", "handle": "..."}`, `{"handle": "..."}` - argument-only
//!   references, written without a `type` field
//!
//! Remote values may additionally carry `handle` and `internalId`.

use crate::error::DecodeError;
use crate::protocol::value::{
    Handle, InternalId, IntoValue, ListValue, MappingValue, NodeProperties, NodeValue,
    NumberLiteral, PropertyKey, Reference, RegExpValue, SharedId, Value, WindowValue,
};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue, json};

/// Decodes a value received from the runtime.
///
/// An unknown `type` discriminant is an [`DecodeError::UnknownVariant`]; so are
/// the argument-only reference shapes, which the runtime never sends.
pub fn decode(json: &JsonValue) -> Result<Value, DecodeError> {
    let obj = json
        .as_object()
        .ok_or_else(|| DecodeError::shape("value object", json))?;

    let type_name = match obj.get("type") {
        Some(JsonValue::String(t)) => t.as_str(),
        Some(other) => return Err(DecodeError::shape("string discriminant", other)),
        None if obj.contains_key("sharedId") => {
            return Err(DecodeError::unknown_variant("sharedReference"));
        }
        None if obj.contains_key("handle") => {
            return Err(DecodeError::unknown_variant("remoteObjectReference"));
        }
        None => return Err(DecodeError::missing_field("type")),
    };

    let value = match type_name {
        "undefined" => Value::Undefined,
        "null" => Value::Null,
        "string" => Value::String(required_str(obj, "value")?.to_string()),
        "boolean" => match required(obj, "value")? {
            JsonValue::Bool(b) => Value::Boolean(*b),
            other => return Err(DecodeError::shape("boolean", other)),
        },
        "number" => Value::Number(decode_number(required(obj, "value")?)?),
        "bigint" => Value::BigInt(required_str(obj, "value")?.to_string()),

        "array" => Value::Array(decode_list(obj)?),
        "set" => Value::Set(decode_list(obj)?),
        "nodelist" => Value::NodeList(decode_list(obj)?),
        "htmlcollection" => Value::HtmlCollection(decode_list(obj)?),
        "object" => Value::Object(decode_mapping(obj)?),
        "map" => Value::Map(decode_mapping(obj)?),
        "date" => Value::Date(required_str(obj, "value")?.to_string()),
        "regexp" => Value::RegExp(decode_regexp(obj)?),

        "symbol" => Value::Symbol(decode_reference(obj)?),
        "function" => Value::Function(decode_reference(obj)?),
        "weakmap" => Value::WeakMap(decode_reference(obj)?),
        "weakset" => Value::WeakSet(decode_reference(obj)?),
        "generator" => Value::Generator(decode_reference(obj)?),
        "error" => Value::Error(decode_reference(obj)?),
        "proxy" => Value::Proxy(decode_reference(obj)?),
        "promise" => Value::Promise(decode_reference(obj)?),
        "typedarray" => Value::TypedArray(decode_reference(obj)?),
        "arraybuffer" => Value::ArrayBuffer(decode_reference(obj)?),
        "node" => Value::Node(decode_node(obj)?),
        "window" => Value::Window(decode_window(obj)?),

        other => return Err(DecodeError::unknown_variant(other)),
    };

    Ok(value)
}

/// Encodes a value into its wire JSON.
pub fn encode(value: &Value) -> JsonValue {
    match value {
        Value::Undefined => json!({"type": "undefined"}),
        Value::Null => json!({"type": "null"}),
        Value::String(s) => json!({"type": "string", "value": s}),
        Value::Boolean(b) => json!({"type": "boolean", "value": b}),
        Value::Number(n) => json!({"type": "number", "value": encode_number(n)}),
        Value::BigInt(s) => json!({"type": "bigint", "value": s}),

        Value::Array(list)
        | Value::Set(list)
        | Value::NodeList(list)
        | Value::HtmlCollection(list) => {
            let mut out = tagged(value.type_name());
            if let Some(items) = &list.value {
                out.insert(
                    "value".to_string(),
                    JsonValue::Array(items.iter().map(encode).collect()),
                );
            }
            insert_ids(&mut out, list.handle.as_ref(), list.internal_id.as_ref());
            JsonValue::Object(out)
        }
        Value::Object(mapping) | Value::Map(mapping) => {
            let mut out = tagged(value.type_name());
            if let Some(entries) = &mapping.value {
                let pairs = entries
                    .iter()
                    .map(|(key, val)| {
                        let key = match key {
                            PropertyKey::String(s) => JsonValue::String(s.clone()),
                            PropertyKey::Value(v) => encode(v),
                        };
                        JsonValue::Array(vec![key, encode(val)])
                    })
                    .collect();
                out.insert("value".to_string(), JsonValue::Array(pairs));
            }
            insert_ids(
                &mut out,
                mapping.handle.as_ref(),
                mapping.internal_id.as_ref(),
            );
            JsonValue::Object(out)
        }
        Value::Date(s) => json!({"type": "date", "value": s}),
        Value::RegExp(re) => {
            let mut inner = Map::new();
            inner.insert("pattern".to_string(), JsonValue::String(re.pattern.clone()));
            if let Some(flags) = &re.flags {
                inner.insert("flags".to_string(), JsonValue::String(flags.clone()));
            }
            let mut out = tagged("regexp");
            out.insert("value".to_string(), JsonValue::Object(inner));
            insert_ids(&mut out, re.handle.as_ref(), re.internal_id.as_ref());
            JsonValue::Object(out)
        }

        Value::Symbol(r)
        | Value::Function(r)
        | Value::WeakMap(r)
        | Value::WeakSet(r)
        | Value::Generator(r)
        | Value::Error(r)
        | Value::Proxy(r)
        | Value::Promise(r)
        | Value::TypedArray(r)
        | Value::ArrayBuffer(r) => {
            let mut out = tagged(value.type_name());
            insert_ids(&mut out, r.handle.as_ref(), r.internal_id.as_ref());
            JsonValue::Object(out)
        }
        Value::Node(node) => {
            let mut out = tagged("node");
            if let Some(shared_id) = &node.shared_id {
                out.insert(
                    "sharedId".to_string(),
                    JsonValue::String(shared_id.to_string()),
                );
            }
            if let Some(props) = &node.properties {
                // NodeProperties only holds strings, integers and nested values
                if let Ok(props) = serde_json::to_value(props) {
                    out.insert("value".to_string(), props);
                }
            }
            insert_ids(&mut out, node.handle.as_ref(), node.internal_id.as_ref());
            JsonValue::Object(out)
        }
        Value::Window(window) => {
            let mut out = tagged("window");
            out.insert("value".to_string(), json!({"context": window.context}));
            insert_ids(&mut out, window.handle.as_ref(), window.internal_id.as_ref());
            JsonValue::Object(out)
        }

        Value::SharedReference(r) => {
            let mut out = Map::new();
            out.insert(
                "sharedId".to_string(),
                JsonValue::String(r.shared_id.to_string()),
            );
            if let Some(handle) = &r.handle {
                out.insert("handle".to_string(), JsonValue::String(handle.to_string()));
            }
            JsonValue::Object(out)
        }
        Value::RemoteObjectReference(r) => {
            let mut out = Map::new();
            out.insert("handle".to_string(), JsonValue::String(r.handle.to_string()));
            if let Some(shared_id) = &r.shared_id {
                out.insert(
                    "sharedId".to_string(),
                    JsonValue::String(shared_id.to_string()),
                );
            }
            JsonValue::Object(out)
        }
    }
}

/// Converts a native Rust value into a [`Value`].
///
/// There is no inverse: decoding only ever produces [`Value`]s.
pub fn from_native<T: IntoValue>(value: T) -> Value {
    value.into_value()
}

/// Decodes a `number` payload: a bare JSON number or a reserved token string.
pub fn decode_number(json: &JsonValue) -> Result<NumberLiteral, DecodeError> {
    match json {
        JsonValue::Number(n) => Ok(NumberLiteral::from_number(n.clone())),
        JsonValue::String(token) => NumberLiteral::from_token(token).ok_or_else(|| {
            DecodeError::ShapeMismatch {
                expected: "number or one of NaN, -0, Infinity, -Infinity".to_string(),
                found: format!("string {token:?}"),
            }
        }),
        other => Err(DecodeError::shape("number", other)),
    }
}

pub fn encode_number(number: &NumberLiteral) -> JsonValue {
    match number {
        NumberLiteral::Finite(n) => JsonValue::Number(n.clone()),
        reserved => JsonValue::String(reserved.token().unwrap_or("NaN").to_string()),
    }
}

fn tagged(type_name: &str) -> Map<String, JsonValue> {
    let mut out = Map::new();
    out.insert("type".to_string(), JsonValue::String(type_name.to_string()));
    out
}

fn insert_ids(out: &mut Map<String, JsonValue>, handle: Option<&Handle>, internal_id: Option<&InternalId>) {
    if let Some(handle) = handle {
        out.insert("handle".to_string(), JsonValue::String(handle.to_string()));
    }
    if let Some(internal_id) = internal_id {
        out.insert(
            "internalId".to_string(),
            JsonValue::String(internal_id.to_string()),
        );
    }
}

fn required<'a>(obj: &'a Map<String, JsonValue>, field: &str) -> Result<&'a JsonValue, DecodeError> {
    obj.get(field)
        .ok_or_else(|| DecodeError::missing_field(field))
}

fn required_str<'a>(obj: &'a Map<String, JsonValue>, field: &str) -> Result<&'a str, DecodeError> {
    let value = required(obj, field)?;
    value
        .as_str()
        .ok_or_else(|| DecodeError::shape("string", value))
}

fn optional_str<'a>(
    obj: &'a Map<String, JsonValue>,
    field: &str,
) -> Result<Option<&'a str>, DecodeError> {
    match obj.get(field) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s)),
        Some(other) => Err(DecodeError::shape("string", other)),
    }
}

fn decode_ids(obj: &Map<String, JsonValue>) -> Result<(Option<Handle>, Option<InternalId>), DecodeError> {
    let handle = optional_str(obj, "handle")?.map(Handle::from);
    let internal_id = optional_str(obj, "internalId")?.map(InternalId::from);
    Ok((handle, internal_id))
}

fn decode_list(obj: &Map<String, JsonValue>) -> Result<ListValue, DecodeError> {
    let (handle, internal_id) = decode_ids(obj)?;
    let value = match obj.get("value") {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::Array(items)) => Some(items.iter().map(decode).collect::<Result<_, _>>()?),
        Some(other) => return Err(DecodeError::shape("array", other)),
    };
    Ok(ListValue {
        value,
        handle,
        internal_id,
    })
}

fn decode_mapping(obj: &Map<String, JsonValue>) -> Result<MappingValue, DecodeError> {
    let (handle, internal_id) = decode_ids(obj)?;
    let value = match obj.get("value") {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::Array(entries)) => Some(
            entries
                .iter()
                .map(decode_entry)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Some(other) => return Err(DecodeError::shape("array of entries", other)),
    };
    Ok(MappingValue {
        value,
        handle,
        internal_id,
    })
}

fn decode_entry(entry: &JsonValue) -> Result<(PropertyKey, Value), DecodeError> {
    let pair = match entry.as_array() {
        Some(pair) if pair.len() == 2 => pair,
        _ => return Err(DecodeError::shape("[key, value] pair", entry)),
    };
    let key = match &pair[0] {
        JsonValue::String(s) => PropertyKey::String(s.clone()),
        key @ JsonValue::Object(_) => PropertyKey::Value(decode(key)?),
        other => return Err(DecodeError::shape("string or value key", other)),
    };
    Ok((key, decode(&pair[1])?))
}

fn decode_regexp(obj: &Map<String, JsonValue>) -> Result<RegExpValue, DecodeError> {
    let (handle, internal_id) = decode_ids(obj)?;
    let inner = required(obj, "value")?;
    let inner = inner
        .as_object()
        .ok_or_else(|| DecodeError::shape("object", inner))?;
    Ok(RegExpValue {
        pattern: required_str(inner, "pattern")?.to_string(),
        flags: optional_str(inner, "flags")?.map(str::to_string),
        handle,
        internal_id,
    })
}

fn decode_reference(obj: &Map<String, JsonValue>) -> Result<Reference, DecodeError> {
    let (handle, internal_id) = decode_ids(obj)?;
    Ok(Reference {
        handle,
        internal_id,
    })
}

fn decode_node(obj: &Map<String, JsonValue>) -> Result<NodeValue, DecodeError> {
    let (handle, internal_id) = decode_ids(obj)?;
    let shared_id = optional_str(obj, "sharedId")?.map(SharedId::from);
    let properties = match obj.get("value") {
        None | Some(JsonValue::Null) => None,
        Some(props) => Some(
            NodeProperties::deserialize(props).map_err(|e| DecodeError::from_serde(&e))?,
        ),
    };
    Ok(NodeValue {
        shared_id,
        handle,
        internal_id,
        properties,
    })
}

fn decode_window(obj: &Map<String, JsonValue>) -> Result<WindowValue, DecodeError> {
    let (handle, internal_id) = decode_ids(obj)?;
    let inner = required(obj, "value")?;
    let inner = inner
        .as_object()
        .ok_or_else(|| DecodeError::shape("object", inner))?;
    Ok(WindowValue {
        context: required_str(inner, "context")?.to_string(),
        handle,
        internal_id,
    })
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = JsonValue::deserialize(deserializer)?;
        decode(&json).map_err(|e| D::Error::custom(serde_message(&e)))
    }
}

/// Renders a decode error the way serde's derive phrases the same failure,
/// so errors nested inside derived payload structs classify the same way.
fn serde_message(err: &DecodeError) -> String {
    match err {
        DecodeError::UnknownVariant { found } => {
            format!("unknown variant `{found}`, expected a remote value type")
        }
        DecodeError::MissingField { field } => format!("missing field `{field}`"),
        DecodeError::ShapeMismatch { expected, found } => {
            format!("invalid type: {found}, expected {expected}")
        }
    }
}
