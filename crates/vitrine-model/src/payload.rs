//! Content payloads: the loosely-structured field maps carried by container
//! items and content documents.
//!
//! A payload value is a recursive sum type. The page model encodes two
//! special object shapes which are recognised during decoding:
//!
//! - `{"$ref": "<id>"}` - a [`DocumentRef`] into the snapshot's document index
//! - `{"contentType": "hippostd:html", "value": "<markup>"}` - rich text
//!
//! Every other object is a nested [`Payload`]. `null` values are dropped so
//! that an explicit `null` and an absent field are the same thing.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Content type tag the page model uses for rich-text compound fields.
pub const RICH_TEXT_CONTENT_TYPE: &str = "hippostd:html";

/// Key of a reference object in the page model.
pub const REFERENCE_KEY: &str = "$ref";

/// An opaque pointer from a payload field to a content document by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentRef {
    #[serde(rename = "$ref")]
    id: String,
}

impl DocumentRef {
    /// Create a reference to the document with the given id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The referenced document id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl From<&str> for DocumentRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A scalar leaf value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    /// A string value.
    String(String),
    /// A numeric value.
    Number(f64),
    /// A boolean value.
    Bool(bool),
}

/// A single payload value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// String, number or boolean.
    Scalar(Scalar),
    /// Reference to a document in the snapshot's index.
    Reference(DocumentRef),
    /// Markup that may contain internal reference markers.
    RichText(String),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Nested field map.
    Payload(Payload),
}

impl Value {
    /// Convert a decoded JSON value, recognising references and rich text.
    ///
    /// Returns `None` for `null`, which callers treat as an absent field.
    #[must_use]
    pub fn from_json(json: JsonValue) -> Option<Self> {
        match json {
            JsonValue::Null => None,
            JsonValue::Bool(b) => Some(Self::Scalar(Scalar::Bool(b))),
            JsonValue::Number(n) => n.as_f64().map(|n| Self::Scalar(Scalar::Number(n))),
            JsonValue::String(s) => Some(Self::Scalar(Scalar::String(s))),
            JsonValue::Array(items) => Some(Self::List(
                items.into_iter().filter_map(Self::from_json).collect(),
            )),
            JsonValue::Object(mut map) => {
                if map.len() == 1
                    && let Some(JsonValue::String(id)) = map.get(REFERENCE_KEY)
                {
                    return Some(Self::Reference(DocumentRef::new(id.clone())));
                }
                let is_rich_text = map
                    .get("contentType")
                    .and_then(JsonValue::as_str)
                    .is_some_and(|t| t == RICH_TEXT_CONTENT_TYPE);
                if is_rich_text
                    && map.get("value").is_some_and(JsonValue::is_string)
                    && let Some(JsonValue::String(html)) = map.remove("value")
                {
                    return Some(Self::RichText(html));
                }
                Some(Self::Payload(Payload::from_json_map(map)))
            }
        }
    }

    /// The string content if this is a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// The reference if this value is one.
    #[must_use]
    pub const fn as_reference(&self) -> Option<&DocumentRef> {
        match self {
            Self::Reference(r) => Some(r),
            _ => None,
        }
    }

    /// The nested payload if this value is one.
    #[must_use]
    pub const fn as_payload(&self) -> Option<&Payload> {
        match self {
            Self::Payload(p) => Some(p),
            _ => None,
        }
    }

    /// Whether this value was tagged as rich text by the page model.
    #[must_use]
    pub const fn is_rich_text(&self) -> bool {
        matches!(self, Self::RichText(_))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Scalar(Scalar::String(s))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Scalar(Scalar::Number(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Scalar(Scalar::Bool(b))
    }
}

impl From<DocumentRef> for Value {
    fn from(r: DocumentRef) -> Self {
        Self::Reference(r)
    }
}

impl From<Payload> for Value {
    fn from(p: Payload) -> Self {
        Self::Payload(p)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = JsonValue::deserialize(deserializer)?;
        Self::from_json(json).ok_or_else(|| D::Error::custom("null is not a content value"))
    }
}

/// A mapping from field name to [`Value`].
///
/// Fields are kept sorted by name so that every walk over a payload is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    fields: BTreeMap<String, Value>,
}

impl Payload {
    /// Create an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a decoded JSON object, dropping `null` fields.
    #[must_use]
    pub fn from_json_map(map: serde_json::Map<String, JsonValue>) -> Self {
        map.into_iter()
            .filter_map(|(name, json)| Value::from_json(json).map(|v| (name, v)))
            .collect()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.fields.insert(name.into(), value.into());
        self
    }

    /// Insert a field, returning the previous value if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Get a field by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Whether a field with this name is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the payload has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Value)> for Payload {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::<String, JsonValue>::deserialize(deserializer)?;
        Ok(Self::from_json_map(map))
    }
}
