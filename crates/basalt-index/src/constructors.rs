//! Pluggable index constructors.
//!
//! Index instances are created from schema metadata through a closed,
//! name-keyed constructor registry resolved at startup: built-in kinds go
//! through the default constructor, custom kinds through the constructor
//! registered under their configured name. There is no open-ended dynamic
//! loading; anything constructed here already satisfies the [`Index`]
//! capability contract.

use std::collections::HashMap;
use std::sync::Arc;

use basalt_commons::{IndexKind, IndexMetadata, TableName};

use crate::error::{IndexError, Result};
use crate::index::Index;

/// Builds an index instance for a table from its metadata.
pub type IndexConstructor =
    Arc<dyn Fn(&TableName, &IndexMetadata) -> Result<Arc<dyn Index>> + Send + Sync>;

/// Registry of named index constructors.
///
/// Construction failures are fatal to the enclosing `add_index` call; no
/// partial registration occurs.
#[derive(Default)]
pub struct IndexConstructors {
    default: Option<IndexConstructor>,
    custom: HashMap<String, IndexConstructor>,
}

impl IndexConstructors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the constructor used for built-in index kinds.
    pub fn set_default(&mut self, constructor: IndexConstructor) {
        self.default = Some(constructor);
    }

    /// Registers a constructor for a custom index class name.
    pub fn register(&mut self, class: impl Into<String>, constructor: IndexConstructor) {
        self.custom.insert(class.into(), constructor);
    }

    /// Resolves the constructor for `metadata` and builds the instance.
    pub fn construct(
        &self,
        table: &TableName,
        metadata: &IndexMetadata,
    ) -> Result<Arc<dyn Index>> {
        let constructor = match &metadata.kind {
            IndexKind::Custom { class } => self.custom.get(class).ok_or_else(|| {
                IndexError::construction(
                    metadata.name.as_str(),
                    format!("no constructor registered for custom index class '{class}'"),
                )
            })?,
            IndexKind::Composites | IndexKind::Keys => self.default.as_ref().ok_or_else(|| {
                IndexError::construction(
                    metadata.name.as_str(),
                    "no built-in index constructor installed",
                )
            })?,
        };
        constructor(table, metadata)
    }
}
