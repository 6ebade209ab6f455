use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

use super::LocalStorage;

/// Volatile key-value store for boards without flash partitions, and for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    type Error = core::convert::Infallible;

    async fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.items.get(key).cloned())
    }

    async fn set_item(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&mut self, key: &str) -> Result<(), Self::Error> {
        self.items.remove(key);
        Ok(())
    }
}
