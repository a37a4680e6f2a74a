//! JSON wire format.
//!
//! Documents travel between pipeline stages as one JSON object each:
//!
//! ```text
//! { "url": "...", "digest": "sha1:...", "date": ["20081219000000", "20100501120000"],
//!   "title": "...", "outlinks": [ {"url": "...", "text": "..."}, {"url": "..."} ] }
//! ```
//!
//! - One value serializes as a string, several as an array of strings.
//! - Absent properties are omitted; there are no `null` or `""` members.
//! - `outlinks` holds the link list; a link's `text` is omitted when empty.
//!
//! Decoding is lenient. Numbers and booleans become strings, `null` and
//! nested objects are ignored, and links without a `url` are dropped. Which
//! representation a property arrived in never matters: after decoding, the
//! value count alone decides scalar or array.
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::document::{names, Document};
use crate::error::DocumentError;
use crate::value::PropertyValue;

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in &self.properties {
            if name == names::OUTLINKS {
                continue;
            }
            match value {
                PropertyValue::Single(single) => map.serialize_entry(name, single)?,
                PropertyValue::Multi(set) => map.serialize_entry(name, set)?,
            }
        }
        if !self.links.is_empty() {
            map.serialize_entry(names::OUTLINKS, &self.links)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Document::from_json_value(value).map_err(D::Error::custom)
    }
}

impl Document {
    /// Serialize to a compact JSON string.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a JSON object into a document.
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: Value) -> Result<Self, DocumentError> {
        match value {
            Value::Object(object) => Ok(Self::from_json_object(object)),
            _ => Err(DocumentError::NotAnObject),
        }
    }

    fn from_json_object(object: Map<String, Value>) -> Self {
        let mut doc = Document::new();
        for (name, value) in object {
            if name == names::OUTLINKS {
                read_links(&mut doc, value);
                continue;
            }
            match value {
                Value::Array(items) => {
                    for item in items {
                        if let Some(text) = scalar_text(item) {
                            doc.add(&name, &text);
                        }
                    }
                }
                other => {
                    if let Some(text) = scalar_text(other) {
                        doc.add(&name, &text);
                    }
                }
            }
        }
        doc
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn read_links(doc: &mut Document, value: Value) {
    let Value::Array(items) = value else {
        return;
    };
    for item in items {
        let Value::Object(mut link) = item else {
            continue;
        };
        let url = link.remove("url").and_then(scalar_text).unwrap_or_default();
        let text = link.remove("text").and_then(scalar_text).unwrap_or_default();
        doc.add_link(&url, &text);
    }
}
