//! Request-scoping seam shared by the credential and reporting-period managers.
//!
//! Deeply nested request helpers need a bearer token and the active reporting-period
//! identifier without being handed references to the orchestrator objects. The
//! managers each register a provider here during their own (synchronous)
//! initialization; [`crate::http::ApiClient`] consults the registry when building
//! authenticated requests. The managers stay the single source of truth and no
//! parameter threading crosses the presentation layers.

// self
use crate::{_prelude::*, credential::AccessToken};

/// Boxed future returned by [`TokenSource::access_token`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Option<AccessToken>> + 'a + Send>>;

/// Provider of the current access credential.
///
/// Implementations may renew an expired credential before answering; returning `None`
/// means no usable credential exists and the caller should treat the session as
/// anonymous.
pub trait TokenSource: Send + Sync {
	/// Returns a currently valid access token, renewing first if necessary.
	fn access_token(&self) -> TokenFuture<'_>;
}

/// Provider of the active reporting-period identifier.
pub trait ScopeSource: Send + Sync {
	/// Returns the identifier of the reporting period currently in view, if any.
	fn scope_id(&self) -> Option<String>;
}

/// Shared registration point holding the two nullable providers.
#[derive(Default)]
pub struct RequestContext {
	token: RwLock<Option<Arc<dyn TokenSource>>>,
	scope: RwLock<Option<Arc<dyn ScopeSource>>>,
}
impl RequestContext {
	/// Wires the credential provider; called once during session-client construction.
	pub fn set_token_source(&self, source: Arc<dyn TokenSource>) {
		*self.token.write() = Some(source);
	}

	/// Wires the reporting-period provider; called once during scope-manager construction.
	pub fn set_scope_source(&self, source: Arc<dyn ScopeSource>) {
		*self.scope.write() = Some(source);
	}

	/// Resolves a bearer token through the registered provider, if one is wired.
	pub async fn bearer(&self) -> Option<AccessToken> {
		// Clone the provider out so the lock is not held across the await.
		let source = self.token.read().clone();

		match source {
			Some(source) => source.access_token().await,
			None => None,
		}
	}

	/// Resolves the active reporting-period identifier, if a provider is wired.
	pub fn scope_id(&self) -> Option<String> {
		self.scope.read().as_ref().and_then(|source| source.scope_id())
	}
}
impl Debug for RequestContext {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestContext")
			.field("token_source_set", &self.token.read().is_some())
			.field("scope_source_set", &self.scope.read().is_some())
			.finish()
	}
}
