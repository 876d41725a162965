//! Persisted key-value slot for the reporting-period selection.
//!
//! Switching reporting periods is a deliberate, resumable user choice, so the chosen
//! identifier is the only piece of client state allowed to survive a reload. The
//! credential cache in [`crate::credential`] must never be wired into one of these
//! backends.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Slot key under which the last-chosen reporting-period identifier is persisted.
pub const ACTIVE_PERIOD_KEY: &str = "active-period";

/// Returns `true` for values that must never be treated as real identifiers.
///
/// Earlier portal builds persisted the literal strings `undefined` and `null` into
/// the slot; those values (and blanks) are treated as absent rather than looked up.
pub fn is_sentinel_garbage(raw: &str) -> bool {
	matches!(raw.trim(), "" | "undefined" | "null")
}

/// Storage backend contract for the persisted slot.
///
/// Readers must tolerate the slot being absent, empty, or containing sentinel
/// garbage left behind by a previous client version.
pub trait ScopeStore
where
	Self: Send + Sync,
{
	/// Fetches the value stored under `key`, if present.
	fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

	/// Persists or replaces the value stored under `key`.
	fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

	/// Removes the value stored under `key`, if present.
	fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Error type produced by [`ScopeStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
