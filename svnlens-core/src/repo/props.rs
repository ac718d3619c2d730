//! Versioned property queries

use std::collections::BTreeMap;
use tracing::debug;

use super::Repository;
use crate::error::{Error, Result};
use crate::object::Revnum;
use crate::path;
use crate::properties::PropertyValue;

impl Repository {
    /// Every property on `path` at `rev`, ordered by key
    pub fn prop_list(&self, path: &str, rev: Revnum) -> Result<BTreeMap<String, PropertyValue>> {
        let p = path::normalize(path);
        debug!(path = %p, rev, "prop_list");
        let node = self.node(&p, rev)?;
        Ok(self.node_props(&node)?.into_map())
    }

    /// Value of property `key` on `path` at `rev`
    pub fn prop_get(&self, path: &str, rev: Revnum, key: &str) -> Result<PropertyValue> {
        let p = path::normalize(path);
        let mut props = self.prop_list(&p, rev)?;
        props.remove(key).ok_or_else(|| Error::PropertyNotFound {
            path: p,
            rev,
            key: key.to_string(),
        })
    }
}
