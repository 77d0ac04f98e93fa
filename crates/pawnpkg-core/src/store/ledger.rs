use serde_json::Value;

use super::{StateStore, StoreError};

/// Store key of the installed-package list.
pub const INSTALLED_KEY: &str = "installedPackages";

/// Insertion-ordered set of identifiers that were acquired at least once.
#[derive(Debug)]
pub struct InstallLedger<S> {
    store: S,
}

impl<S: StateStore> InstallLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn installed(&self) -> Result<Vec<String>, StoreError> {
        let value = self.store.get_or(INSTALLED_KEY, Value::Array(Vec::new()))?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn is_installed(&self, identifier: &str) -> Result<bool, StoreError> {
        Ok(self.installed()?.iter().any(|i| i == identifier))
    }

    /// Append `identifier` unless present. Returns `true` if it was added.
    pub fn record(&self, identifier: &str) -> Result<bool, StoreError> {
        let mut installed = self.installed()?;
        if installed.iter().any(|i| i == identifier) {
            return Ok(false);
        }
        installed.push(identifier.to_string());
        self.store
            .update(INSTALLED_KEY, serde_json::to_value(installed)?)?;
        tracing::debug!("recorded {identifier} as installed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_record_is_set_like() {
        let ledger = InstallLedger::new(MemoryStore::new());
        assert!(ledger.record("Y-Less/sscanf").unwrap());
        assert!(ledger.record("streamer").unwrap());
        assert!(!ledger.record("Y-Less/sscanf").unwrap());

        assert_eq!(ledger.installed().unwrap(), vec!["Y-Less/sscanf", "streamer"]);
        assert!(ledger.is_installed("streamer").unwrap());
        assert!(!ledger.is_installed("other").unwrap());
    }

    #[test]
    fn test_corrupt_value_is_error() {
        let store = MemoryStore::new();
        store.update(INSTALLED_KEY, json!({"not": "a list"})).unwrap();
        let ledger = InstallLedger::new(store);
        assert!(matches!(ledger.installed(), Err(StoreError::Json(_))));
    }
}
