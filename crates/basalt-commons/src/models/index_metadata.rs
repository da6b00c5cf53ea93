//! Index metadata as carried by table schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::column::ColumnName;
use crate::models::index_name::IndexName;

/// The kind of an index.
///
/// Built-in kinds are constructed by the engine's default constructor;
/// `Custom` carries the registered constructor name to instantiate through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    /// Index over a regular column of a compound-primary-key table.
    Composites,
    /// Index over map keys / legacy thrift-style values.
    Keys,
    /// Pluggable implementation, resolved by constructor name.
    Custom { class: String },
}

/// Schema-carried description of one index.
///
/// Equality of the whole struct drives the reload-on-change decision: an
/// `add_index` call with metadata equal to the registered instance's is a
/// no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub name: IndexName,
    pub kind: IndexKind,
    pub column: ColumnName,
    pub options: BTreeMap<String, String>,
}

impl IndexMetadata {
    pub fn new(name: impl Into<IndexName>, kind: IndexKind, column: impl Into<ColumnName>) -> Self {
        Self {
            name: name.into(),
            kind,
            column: column.into(),
            options: BTreeMap::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.kind, IndexKind::Custom { .. })
    }

    /// The registered constructor name for a custom index, if any.
    pub fn custom_class(&self) -> Option<&str> {
        match &self.kind {
            IndexKind::Custom { class } => Some(class),
            _ => None,
        }
    }
}

// IndexName/ColumnName serialize as their inner string.
impl Serialize for IndexName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IndexName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(IndexName::new)
    }
}

impl Serialize for ColumnName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ColumnName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(ColumnName::new)
    }
}
