//! Series metadata catalog model and text codec.
//!
//! The store persists the catalog only in its serialized text form; the
//! structured type exists so callers get a round-tripping document with a
//! mandatory identifier. All descriptive fields (title, dates, creators, ...)
//! are free-form and flattened into the document root.

use serde::{Deserialize, Serialize};

use crate::error::{SeriesError, SeriesResult};

/// A descriptive metadata document for one series.
///
/// `identifier` doubles as the series key inside the caller's organization.
/// Everything else lives in the flattened `fields` map and is opaque to the
/// store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesCatalog {
    pub identifier: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl SeriesCatalog {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self { identifier: identifier.into(), fields: serde_json::Map::new() }
    }

    /// Builder-style field setter for constructing documents in callers/tests.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }
}

/// Decode a stored catalog document. Failures are storage-class: the text on
/// the record was produced by `serialize_catalog`, so corruption means the
/// underlying storage misbehaved.
pub fn parse_catalog(text: &str) -> SeriesResult<SeriesCatalog> {
    serde_json::from_str(text).map_err(|e| {
        SeriesError::storage("catalog_codec", format!("could not decode series catalog: {}", e))
    })
}

pub fn serialize_catalog(catalog: &SeriesCatalog) -> SeriesResult<String> {
    serde_json::to_string(catalog).map_err(|e| {
        SeriesError::storage("catalog_codec", format!("could not serialize series catalog: {}", e))
    })
}
