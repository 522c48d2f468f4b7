use std::{collections::HashMap, sync::RwLock};

use async_trait::async_trait;

use crate::{Result, backend::GroupBackend, fragment::Fragment};

/// Process-local backend. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryBackend {
    // std lock: never held across an `.await`.
    groups: RwLock<HashMap<String, Vec<Fragment>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored groups.
    pub fn len(&self) -> usize {
        self.groups.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl GroupBackend for MemoryBackend {
    async fn read(&self, key: &str) -> Result<Option<Vec<Fragment>>> {
        let groups = self.groups.read().unwrap_or_else(|e| e.into_inner());
        Ok(groups.get(key).cloned())
    }

    async fn write(&self, key: &str, fragments: &[Fragment]) -> Result<()> {
        let mut groups = self.groups.write().unwrap_or_else(|e| e.into_inner());
        groups.insert(key.to_string(), fragments.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut groups = self.groups.write().unwrap_or_else(|e| e.into_inner());
        groups.remove(key);
        Ok(())
    }
}
