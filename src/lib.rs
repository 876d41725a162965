//! Client-side session manager for the portal backend—silent credential renewal,
//! single-flight refresh, a proactive re-arm timer, and a persisted reporting-period
//! switch in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod context;
pub mod credential;
pub mod error;
pub mod http;
pub mod obs;
pub mod permission;
pub mod profile;
pub mod scheduler;
pub mod scope;
pub mod session;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience helpers for tests; enabled via `cfg(test)` or the `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		context::RequestContext,
		http::ApiClient,
		scope::ScopeManager,
		session::SessionClient,
		store::{MemoryStore, ScopeStore},
	};

	/// Builds an [`ApiClient`] rooted at the provided base URL with a fresh request context.
	pub fn build_test_api(base: &str) -> Arc<ApiClient> {
		let url = Url::parse(base).expect("Test base URL should parse.");
		let api = ApiClient::new(url, Arc::new(RequestContext::default()))
			.expect("Failed to build test API client.");

		Arc::new(api)
	}

	/// Builds a session client wired to the provided mock backend base URL.
	pub fn build_test_session(base: &str) -> (Arc<SessionClient>, Arc<ApiClient>) {
		let api = build_test_api(base);
		let session = SessionClient::new(api.clone());

		(session, api)
	}

	/// Builds a scope manager backed by an in-memory persisted slot.
	pub fn build_test_scope(api: &Arc<ApiClient>) -> (Arc<ScopeManager>, Arc<MemoryStore>) {
		let backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn ScopeStore> = backend.clone();

		(ScopeManager::new(api.clone(), store), backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{HashMap, HashSet},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
