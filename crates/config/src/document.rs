//! Read-only view over a resolved stack configuration document.

use std::path::Path;

use serde_yaml::Value;

use crate::error::Error;

/// Value for `shared.database.type` selecting the external database path.
pub static DATABASE_EXTERNAL: &str = "postgresql";

/// Value for `shared.database.type` selecting the embedded database path.
pub static DATABASE_EMBEDDED: &str = "embedded";

/// A resolved configuration document addressed by dotted key-paths
/// (e.g. `shared.database.type`). Immutable once constructed.
#[derive(Clone, Debug)]
pub struct ConfigDocument {
    root: Value,
}

impl ConfigDocument {
    /// Parses a document from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, Error> {
        let root: Value = serde_yaml::from_str(yaml)?;

        Ok(Self { root })
    }

    /// Reads and parses a document from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| Error::Io("failed to read configuration file", e))?;

        Self::from_yaml_str(&yaml)
    }

    /// Returns the value at the given dotted key-path, if present.
    #[must_use]
    pub fn get(&self, key_path: &str) -> Option<&Value> {
        let mut current = &self.root;

        for part in key_path.split('.') {
            current = current.get(part)?;
        }

        Some(current)
    }

    /// Returns whether the given dotted key-path is present.
    #[must_use]
    pub fn contains(&self, key_path: &str) -> bool {
        self.get(key_path).is_some()
    }

    /// Returns the string value at the given key-path, if present and a string.
    #[must_use]
    pub fn get_str(&self, key_path: &str) -> Option<&str> {
        self.get(key_path).and_then(Value::as_str)
    }

    /// Returns all dotted key-paths present in the document, in document order.
    #[must_use]
    pub fn key_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_key_paths(&self.root, "", &mut paths);
        paths
    }

    /// Returns whether the document selects the external database path.
    #[must_use]
    pub fn selects_external_database(&self) -> bool {
        self.get_str("shared.database.type") == Some(DATABASE_EXTERNAL)
    }
}

fn collect_key_paths(value: &Value, prefix: &str, paths: &mut Vec<String>) {
    let Value::Mapping(mapping) = value else {
        return;
    };

    for (key, child) in mapping {
        let Some(key) = key.as_str() else {
            continue;
        };

        let full = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        };

        collect_key_paths(child, &full, paths);
        paths.push(full);
    }
}
