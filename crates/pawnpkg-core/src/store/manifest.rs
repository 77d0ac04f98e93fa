//! `pawn-package.json` handling.

use std::path::Path;

use serde_json::{Map, Value};

use super::StoreError;

const DEPENDENCIES: &str = "dependencies";

/// Declarative dependency manifest kept at the project root.
///
/// Held as an untyped JSON object: only `dependencies` is ever touched, and
/// every other key and value is written back exactly as it was read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageManifest {
    root: Map<String, Value>,
}

impl PackageManifest {
    /// Load a manifest. A missing file, invalid JSON or a non-object document
    /// yields an empty manifest.
    pub fn load(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(Value::Object(root)) => Self { root },
            Ok(_) => {
                tracing::warn!("ignoring {}: not a JSON object", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("ignoring malformed {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// The `dependencies` object, if present and an object.
    pub fn dependencies(&self) -> Option<&Map<String, Value>> {
        self.root.get(DEPENDENCIES).and_then(Value::as_object)
    }

    /// Any top-level value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Set `dependencies[identifier] = "*"`.
    ///
    /// A `dependencies` value that is not an object is replaced. Existing
    /// entries keep their values, whatever their shape.
    pub fn add_dependency(&mut self, identifier: &str) {
        let deps = self
            .root
            .entry(DEPENDENCIES)
            .or_insert_with(|| Value::Object(Map::new()));
        if !deps.is_object() {
            *deps = Value::Object(Map::new());
        }
        if let Value::Object(deps) = deps {
            deps.insert(identifier.to_string(), Value::String("*".to_string()));
        }
    }

    /// Write with 2-space indentation via temp file + rename.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let mut content = serde_json::to_string_pretty(&self.root)?;
        content.push('\n');
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

/// Set `dependencies[identifier] = "*"` and rewrite the manifest.
pub fn update_manifest(path: &Path, identifier: &str) -> Result<(), StoreError> {
    let mut manifest = PackageManifest::load(path);
    manifest.add_dependency(identifier);
    manifest.save(path)
}
