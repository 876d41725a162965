//! Thread-safe in-memory [`ScopeStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{ScopeStore, StoreError},
};

type SlotMap = Arc<RwLock<HashMap<String, String>>>;

/// Storage backend that keeps slot entries in-process; nothing survives a restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(SlotMap);
impl ScopeStore for MemoryStore {
	fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		Ok(self.0.read().get(key).cloned())
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
		self.0.write().insert(key.into(), value.into());

		Ok(())
	}

	fn remove(&self, key: &str) -> Result<(), StoreError> {
		self.0.write().remove(key);

		Ok(())
	}
}
