//! A store handle shared between threads.
//!
//! `ParameterStore` has no internal synchronization. `SharedParameterStore`
//! serializes access: a parse holds the write lock from its first event to its
//! last, lookups take the read lock.

use std::{path::Path, sync::Arc};

use parking_lot::RwLock;

use crate::{error::Result, limits::ParserLimits, store::ParameterStore, types::ParameterValue};

#[derive(Debug, Clone, Default)]
pub struct SharedParameterStore {
    inner: Arc<RwLock<ParameterStore>>,
}

impl SharedParameterStore {
    pub fn new(store: ParameterStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn with_limits(limits: ParserLimits) -> Self {
        Self::new(ParameterStore::with_limits(limits))
    }

    pub fn load_str(&self, text: &str) -> Result<()> {
        self.inner.write().parse_str(text)
    }

    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.inner.write().parse_file(path)
    }

    pub fn update_value(&self, node: &str, param: &str, text: &str) -> Result<()> {
        self.inner.write().parse_value(node, param, text)
    }

    /// Current value of `param` on `node`, cloned out of the lock.
    pub fn get(&self, node: &str, param: &str) -> Option<ParameterValue> {
        self.inner.read().get(node, param).cloned()
    }

    pub fn snapshot(&self) -> ParameterStore {
        self.inner.read().clone()
    }
}

impl From<ParameterStore> for SharedParameterStore {
    fn from(store: ParameterStore) -> Self {
        Self::new(store)
    }
}
