//! Versioned properties
//!
//! Properties are an open string-to-string map attached to a node. Well-known
//! `svn:` keys are conventions, listed in [`svn_props`], not a closed schema.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Property value
pub type PropertyValue = String;

/// Properties of a single node, ordered by key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySet {
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl PropertySet {
    /// Create a new empty property set
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a property value
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Set a property value
    pub fn set(&mut self, name: String, value: PropertyValue) {
        self.properties.insert(name, value);
    }

    /// Remove a property
    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.properties.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Consume into the plain key/value map
    pub fn into_map(self) -> BTreeMap<String, PropertyValue> {
        self.properties
    }

    /// Serialize to binary format
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary format
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

/// SVN standard properties
pub mod svn_props {
    /// MIME type
    pub const MIME_TYPE: &str = "svn:mime-type";

    /// Special file (symlink)
    pub const SPECIAL: &str = "svn:special";

    /// Value for boolean properties such as svn:special
    pub const BOOLEAN_VALUE: &str = "*";

    /// Fallback when no svn:mime-type is set
    pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

    /// A mime type marks content as binary unless it is `text/*`
    /// (or one of the few textual `image/` types svn special-cases)
    pub fn is_binary_mime_type(mime: &str) -> bool {
        let mime = mime.split(';').next().unwrap_or("").trim();
        !(mime.starts_with("text/")
            || mime == "image/x-xbitmap"
            || mime == "image/x-xpixmap")
    }
}
