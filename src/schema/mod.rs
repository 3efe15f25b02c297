//! Schema data model for completable context properties.
//!
//! The schema arrives as a JSON feed fetched once per session by the caller
//! and handed over as an immutable value; the engine performs no I/O. Types
//! with fixed children and dynamically-keyed leaf collections are modelled
//! as a tagged variant, resolved only through an explicit [`KeyedAssets`]
//! lookup.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::errors::{TempletError, TempletResult};

/// Property key marking "the accumulated path itself is a valid selection"
pub const DEFAULT_KEY: &str = "__default__";

/// Placeholder substituted with each runtime key when expanding a keyed type
pub const KEY_PLACEHOLDER: &str = "{key}";

/// A named schema field
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Property {
    pub key: String,
    #[serde(default)]
    pub help: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl Property {
    pub fn new(
        key: impl Into<String>,
        help: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            help: help.into(),
            type_name: type_name.into(),
        }
    }
}

/// A schema type: either fixed children or a dynamically-keyed collection
/// whose concrete keys arrive at runtime through [`KeyedAssets`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TypeDef {
    Keyed {
        name: String,
        property_template: Property,
        /// Collaborator hint naming the asset feed that supplies the keys
        key_source: String,
    },
    Fixed {
        name: String,
        #[serde(default)]
        properties: Vec<Property>,
    },
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            TypeDef::Keyed { name, .. } => name,
            TypeDef::Fixed { name, .. } => name,
        }
    }
}

/// Raw wire shape of the schema feed
#[derive(Debug, Deserialize)]
struct SchemaFeed {
    #[serde(default)]
    types: Vec<TypeDef>,
    #[serde(default)]
    root: Vec<Property>,
    #[serde(default)]
    root_no_session: Vec<Property>,
}

/// The completable property tree, immutable once loaded
#[derive(Debug, Clone)]
pub struct Schema {
    types: IndexMap<String, TypeDef>,
    root: Vec<Property>,
    root_no_session: Vec<Property>,
}

impl Schema {
    pub fn new(types: Vec<TypeDef>, root: Vec<Property>, root_no_session: Vec<Property>) -> Self {
        let types = types
            .into_iter()
            .map(|t| (t.name().to_string(), t))
            .collect();
        Self {
            types,
            root,
            root_no_session,
        }
    }

    /// Parse the collaborator's JSON schema feed
    pub fn from_json(json: &str) -> TempletResult<Self> {
        let feed: SchemaFeed =
            serde_json::from_str(json).map_err(|e| TempletError::schema_feed(json, &e))?;
        Ok(Self::new(feed.types, feed.root, feed.root_no_session))
    }

    pub fn type_named(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Root property set: the full session root, or the reduced set for
    /// contexts without an active session
    pub fn root_properties(&self, session: bool) -> &[Property] {
        if session {
            &self.root
        } else {
            &self.root_no_session
        }
    }
}

/// Runtime keys for dynamically-keyed types, loaded once per session.
///
/// Maps a Type name to the list of keys currently available for it (for
/// example the tenant's custom field keys). A missing entry means the asset
/// feed has not been loaded; resolution degrades to zero candidates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyedAssets {
    #[serde(flatten)]
    keys: IndexMap<String, Vec<String>>,
}

impl KeyedAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, type_name: impl Into<String>, keys: Vec<String>) {
        self.keys.insert(type_name.into(), keys);
    }

    pub fn keys_for(&self, type_name: &str) -> &[String] {
        self.keys.get(type_name).map(Vec::as_slice).unwrap_or(&[])
    }
}
