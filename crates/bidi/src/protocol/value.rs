//! Value model for the WebDriver BiDi script module
//!
//! [`Value`] is the tagged union exchanged with the remote runtime: arguments
//! sent with `script.callFunction`, results coming back, and every event field
//! whose shape is decided at runtime (script message `data`, console `args`).
//!
//! The wire encoding lives in [`crate::protocol::value_codec`]; this module only
//! holds the data model, its identity rules and conversions from native Rust
//! values.
//!
//! See: <https://w3c.github.io/webdriver-bidi/#type-script-RemoteValue>

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Realm-scoped handle to a remote object.
    ///
    /// <https://w3c.github.io/webdriver-bidi/#type-script-Handle>
    Handle
);

string_id!(
    /// Identity of a DOM node that stays stable across calls within one
    /// navigation.
    ///
    /// <https://w3c.github.io/webdriver-bidi/#type-script-SharedId>
    SharedId
);

string_id!(
    /// Per-serialization identity used to express cycles.
    ///
    /// <https://w3c.github.io/webdriver-bidi/#type-script-InternalId>
    InternalId
);

/// A JavaScript number as carried on the wire.
///
/// Finite numbers travel as bare JSON numbers; the four values JSON cannot
/// express travel as the strings `"NaN"`, `"-0"`, `"Infinity"` and
/// `"-Infinity"`.
///
/// <https://w3c.github.io/webdriver-bidi/#type-script-PrimitiveProtocolValue>
#[derive(Debug, Clone, PartialEq)]
pub enum NumberLiteral {
    /// A finite number, kept in its JSON form so integers stay integers
    Finite(serde_json::Number),
    NaN,
    NegativeZero,
    Infinity,
    NegativeInfinity,
}

impl NumberLiteral {
    /// Classifies a float, mapping the non-JSON values onto reserved tokens.
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            NumberLiteral::NaN
        } else if value == f64::INFINITY {
            NumberLiteral::Infinity
        } else if value == f64::NEG_INFINITY {
            NumberLiteral::NegativeInfinity
        } else if value == 0.0 && value.is_sign_negative() {
            NumberLiteral::NegativeZero
        } else {
            serde_json::Number::from_f64(value).map_or(NumberLiteral::NaN, NumberLiteral::Finite)
        }
    }

    /// Wraps a JSON number. A float negative zero becomes [`NumberLiteral::NegativeZero`]
    /// so it has a single representation.
    pub fn from_number(number: serde_json::Number) -> Self {
        match number.as_f64() {
            Some(value) if number.is_f64() && value == 0.0 && value.is_sign_negative() => {
                NumberLiteral::NegativeZero
            }
            _ => NumberLiteral::Finite(number),
        }
    }

    /// Parses a reserved token (`"NaN"`, `"-0"`, `"Infinity"`, `"-Infinity"`).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "NaN" => Some(NumberLiteral::NaN),
            "-0" => Some(NumberLiteral::NegativeZero),
            "Infinity" => Some(NumberLiteral::Infinity),
            "-Infinity" => Some(NumberLiteral::NegativeInfinity),
            _ => None,
        }
    }

    /// Returns the reserved token for non-finite values and negative zero.
    pub fn token(&self) -> Option<&'static str> {
        match self {
            NumberLiteral::Finite(_) => None,
            NumberLiteral::NaN => Some("NaN"),
            NumberLiteral::NegativeZero => Some("-0"),
            NumberLiteral::Infinity => Some("Infinity"),
            NumberLiteral::NegativeInfinity => Some("-Infinity"),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            NumberLiteral::Finite(n) => n.as_f64().unwrap_or(f64::NAN),
            NumberLiteral::NaN => f64::NAN,
            NumberLiteral::NegativeZero => -0.0,
            NumberLiteral::Infinity => f64::INFINITY,
            NumberLiteral::NegativeInfinity => f64::NEG_INFINITY,
        }
    }
}

impl From<i64> for NumberLiteral {
    fn from(value: i64) -> Self {
        NumberLiteral::Finite(value.into())
    }
}

impl From<u64> for NumberLiteral {
    fn from(value: u64) -> Self {
        NumberLiteral::Finite(value.into())
    }
}

impl From<f64> for NumberLiteral {
    fn from(value: f64) -> Self {
        NumberLiteral::from_f64(value)
    }
}

/// Remote identity carried by every by-reference value.
///
/// Equality compares the ids only; the runtime decides identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reference {
    pub handle: Option<Handle>,
    pub internal_id: Option<InternalId>,
}

impl Reference {
    pub fn with_handle(handle: impl Into<Handle>) -> Self {
        Self {
            handle: Some(handle.into()),
            internal_id: None,
        }
    }
}

/// Sequence-shaped values: `array`, `set`, `nodelist`, `htmlcollection`.
///
/// `value` is absent when the runtime stopped serializing at the requested
/// depth; `handle`/`internal_id` are only present on remote values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListValue {
    pub value: Option<Vec<Value>>,
    pub handle: Option<Handle>,
    pub internal_id: Option<InternalId>,
}

impl ListValue {
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            value: Some(items),
            ..Default::default()
        }
    }
}

/// Key of an `object` or `map` entry.
///
/// Keys are strings on the common path but may be any value, so entries are
/// kept as ordered pairs rather than a string-keyed map.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    String(String),
    Value(Value),
}

impl From<&str> for PropertyKey {
    fn from(value: &str) -> Self {
        PropertyKey::String(value.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(value: String) -> Self {
        PropertyKey::String(value)
    }
}

impl From<Value> for PropertyKey {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => PropertyKey::String(s),
            other => PropertyKey::Value(other),
        }
    }
}

/// Entry-shaped values: `object` and `map`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingValue {
    pub value: Option<Vec<(PropertyKey, Value)>>,
    pub handle: Option<Handle>,
    pub internal_id: Option<InternalId>,
}

impl MappingValue {
    pub fn new(entries: Vec<(PropertyKey, Value)>) -> Self {
        Self {
            value: Some(entries),
            ..Default::default()
        }
    }

    /// Looks up the first entry with a string key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.value.as_ref()?.iter().find_map(|(k, v)| match k {
            PropertyKey::String(s) if s == key => Some(v),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegExpValue {
    pub pattern: String,
    pub flags: Option<String>,
    pub handle: Option<Handle>,
    pub internal_id: Option<InternalId>,
}

/// Shadow root mode of a node snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowRootMode {
    Open,
    Closed,
}

/// Snapshot of a DOM node taken at serialization time.
///
/// <https://w3c.github.io/webdriver-bidi/#type-script-NodeProperties>
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperties {
    pub node_type: u32,
    pub child_node_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ShadowRootMode>,
    #[serde(
        rename = "namespaceURI",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub namespace_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_root: Option<Box<Value>>,
}

/// A DOM node.
///
/// Two nodes with a `shared_id` are equal exactly when the ids match;
/// `properties` is a snapshot and never takes part in equality.
#[derive(Debug, Clone, Default)]
pub struct NodeValue {
    pub shared_id: Option<SharedId>,
    pub handle: Option<Handle>,
    pub internal_id: Option<InternalId>,
    pub properties: Option<NodeProperties>,
}

impl PartialEq for NodeValue {
    fn eq(&self, other: &Self) -> bool {
        match (&self.shared_id, &other.shared_id) {
            (Some(a), Some(b)) => a == b,
            _ => {
                self.shared_id == other.shared_id
                    && self.handle == other.handle
                    && self.internal_id == other.internal_id
            }
        }
    }
}

/// A window proxy; identified by the browsing context it wraps.
#[derive(Debug, Clone)]
pub struct WindowValue {
    pub context: String,
    pub handle: Option<Handle>,
    pub internal_id: Option<InternalId>,
}

impl PartialEq for WindowValue {
    fn eq(&self, other: &Self) -> bool {
        self.context == other.context
    }
}

/// Reference to a node by shared id, sent back to the runtime as an argument.
///
/// <https://w3c.github.io/webdriver-bidi/#type-script-SharedReference>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedReference {
    pub shared_id: SharedId,
    pub handle: Option<Handle>,
}

/// Reference to a remote object by handle, sent back to the runtime as an
/// argument.
///
/// <https://w3c.github.io/webdriver-bidi/#type-script-RemoteObjectReference>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObjectReference {
    pub handle: Handle,
    pub shared_id: Option<SharedId>,
}

/// Any value exchanged with the remote runtime.
///
/// The variant list is closed and mirrors the `type` discriminants of the
/// wire format; [`SharedReference`](Value::SharedReference) and
/// [`RemoteObjectReference`](Value::RemoteObjectReference) are write-only and
/// never produced by decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    String(String),
    Number(NumberLiteral),
    Boolean(bool),
    BigInt(String),

    Array(ListValue),
    Set(ListValue),
    NodeList(ListValue),
    HtmlCollection(ListValue),
    Object(MappingValue),
    Map(MappingValue),
    Date(String),
    RegExp(RegExpValue),

    Symbol(Reference),
    Function(Reference),
    WeakMap(Reference),
    WeakSet(Reference),
    Generator(Reference),
    Error(Reference),
    Proxy(Reference),
    Promise(Reference),
    TypedArray(Reference),
    ArrayBuffer(Reference),
    Node(NodeValue),
    Window(WindowValue),

    SharedReference(SharedReference),
    RemoteObjectReference(RemoteObjectReference),
}

impl Value {
    /// The wire discriminant for this variant.
    ///
    /// Remote-only references have no discriminant on the wire; their
    /// descriptive names are returned instead.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::BigInt(_) => "bigint",
            Value::Array(_) => "array",
            Value::Set(_) => "set",
            Value::NodeList(_) => "nodelist",
            Value::HtmlCollection(_) => "htmlcollection",
            Value::Object(_) => "object",
            Value::Map(_) => "map",
            Value::Date(_) => "date",
            Value::RegExp(_) => "regexp",
            Value::Symbol(_) => "symbol",
            Value::Function(_) => "function",
            Value::WeakMap(_) => "weakmap",
            Value::WeakSet(_) => "weakset",
            Value::Generator(_) => "generator",
            Value::Error(_) => "error",
            Value::Proxy(_) => "proxy",
            Value::Promise(_) => "promise",
            Value::TypedArray(_) => "typedarray",
            Value::ArrayBuffer(_) => "arraybuffer",
            Value::Node(_) => "node",
            Value::Window(_) => "window",
            Value::SharedReference(_) => "sharedReference",
            Value::RemoteObjectReference(_) => "remoteObjectReference",
        }
    }

    /// Returns true for the argument-only reference variants.
    pub fn is_remote_only(&self) -> bool {
        matches!(
            self,
            Value::SharedReference(_) | Value::RemoteObjectReference(_)
        )
    }

    /// Handle of a remote object, if the runtime assigned one.
    pub fn handle(&self) -> Option<&Handle> {
        match self {
            Value::Array(v) | Value::Set(v) | Value::NodeList(v) | Value::HtmlCollection(v) => {
                v.handle.as_ref()
            }
            Value::Object(v) | Value::Map(v) => v.handle.as_ref(),
            Value::RegExp(v) => v.handle.as_ref(),
            Value::Symbol(r)
            | Value::Function(r)
            | Value::WeakMap(r)
            | Value::WeakSet(r)
            | Value::Generator(r)
            | Value::Error(r)
            | Value::Proxy(r)
            | Value::Promise(r)
            | Value::TypedArray(r)
            | Value::ArrayBuffer(r) => r.handle.as_ref(),
            Value::Node(n) => n.handle.as_ref(),
            Value::Window(w) => w.handle.as_ref(),
            Value::SharedReference(r) => r.handle.as_ref(),
            Value::RemoteObjectReference(r) => Some(&r.handle),
            _ => None,
        }
    }

    pub fn shared_id(&self) -> Option<&SharedId> {
        match self {
            Value::Node(n) => n.shared_id.as_ref(),
            Value::SharedReference(r) => Some(&r.shared_id),
            Value::RemoteObjectReference(r) => r.shared_id.as_ref(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Value::String(value.into())
    }

    pub fn number(value: impl Into<NumberLiteral>) -> Self {
        Value::Number(value.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(ListValue::new(items))
    }

    pub fn set(items: Vec<Value>) -> Self {
        Value::Set(ListValue::new(items))
    }

    pub fn object<K: Into<PropertyKey>>(entries: Vec<(K, Value)>) -> Self {
        Value::Object(MappingValue::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn map<K: Into<PropertyKey>>(entries: Vec<(K, Value)>) -> Self {
        Value::Map(MappingValue::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn shared_reference(shared_id: impl Into<SharedId>) -> Self {
        Value::SharedReference(SharedReference {
            shared_id: shared_id.into(),
            handle: None,
        })
    }

    pub fn remote_reference(handle: impl Into<Handle>) -> Self {
        Value::RemoteObjectReference(RemoteObjectReference {
            handle: handle.into(),
            shared_id: None,
        })
    }

    /// Converts any serde-serializable value through its JSON form.
    ///
    /// JSON objects become `object` values with string keys in document
    /// order; there is no way to produce references this way.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> crate::error::Result<Value> {
        let json = serde_json::to_value(value)?;
        Ok(Value::from_plain_json(json))
    }

    pub(crate) fn from_plain_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => Value::Number(NumberLiteral::from_number(n)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::array(items.into_iter().map(Value::from_plain_json).collect())
            }
            serde_json::Value::Object(entries) => Value::object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_plain_json(v)))
                    .collect(),
            ),
        }
    }
}

/// Conversion from native Rust values into [`Value`].
///
/// Values that already are [`Value`]s, including references received from
/// the runtime, pass through untouched so their identity is preserved.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for &Value {
    fn into_value(self) -> Value {
        self.clone()
    }
}

impl IntoValue for SharedReference {
    fn into_value(self) -> Value {
        Value::SharedReference(self)
    }
}

impl IntoValue for RemoteObjectReference {
    fn into_value(self) -> Value {
        Value::RemoteObjectReference(self)
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Undefined
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Boolean(self)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_string())
    }
}

macro_rules! into_value_int {
    ($($t:ty),*) => {
        $(impl IntoValue for $t {
            fn into_value(self) -> Value {
                Value::Number(NumberLiteral::Finite(self.into()))
            }
        })*
    };
}

into_value_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Number(NumberLiteral::from_f64(f64::from(self)))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Number(NumberLiteral::from_f64(self))
    }
}

impl IntoValue for i128 {
    fn into_value(self) -> Value {
        match i64::try_from(self) {
            Ok(v) => v.into_value(),
            Err(_) => Value::BigInt(self.to_string()),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::array(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: IntoValue + Clone> IntoValue for &[T] {
    fn into_value(self) -> Value {
        Value::array(self.iter().cloned().map(IntoValue::into_value).collect())
    }
}

impl<T: IntoValue> IntoValue for BTreeSet<T> {
    fn into_value(self) -> Value {
        Value::set(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: IntoValue, S> IntoValue for HashSet<T, S> {
    fn into_value(self) -> Value {
        Value::set(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<K: IntoValue, V: IntoValue> IntoValue for BTreeMap<K, V> {
    fn into_value(self) -> Value {
        Value::map(
            self.into_iter()
                .map(|(k, v)| (k.into_value(), v.into_value()))
                .collect(),
        )
    }
}

impl<K: IntoValue, V: IntoValue, S> IntoValue for HashMap<K, V, S> {
    fn into_value(self) -> Value {
        Value::map(
            self.into_iter()
                .map(|(k, v)| (k.into_value(), v.into_value()))
                .collect(),
        )
    }
}
