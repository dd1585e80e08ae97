use crate::store::KeyValueStorage;
use anyhow::{Result, anyhow, bail};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// In-memory storage, optionally limited to a total size in bytes.
#[derive(Default)]
pub struct MemoryStorage {
    inner: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects writes once the stored values would exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            quota: Some(bytes),
        }
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self
            .inner
            .read()
            .map_err(|_| anyhow!("Memory storage lock poisoned"))?;
        let value = map.get(key).cloned();
        if value.is_some() {
            debug!("Storage HIT for key: {}", key);
        } else {
            debug!("Storage MISS for key: {}", key);
        }
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| anyhow!("Memory storage lock poisoned"))?;

        if let Some(quota) = self.quota {
            let others: usize = map
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            if others + value.len() > quota {
                bail!("Storage quota of {} bytes exceeded", quota);
            }
        }

        map.insert(key.to_string(), value.to_string());
        debug!("Storage PUT for key: {}", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| anyhow!("Memory storage lock poisoned"))?;
        map.remove(key);
        debug!("Storage REMOVE for key: {}", key);
        Ok(())
    }
}
