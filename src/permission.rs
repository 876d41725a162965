//! Capability sets and the permission resolver with its degraded fallback.

// self
use crate::{
	_prelude::*,
	http::ApiClient,
	profile::{Profile, Role},
};

/// Sentinel capability meaning "all capabilities granted."
pub const WILDCARD_PERMISSION: &str = "*";

const PERMISSIONS_PATH: &str = "users/me/permissions";

/// Set of capability tokens derived from the resolved profile.
///
/// Never hand-edited: re-resolved through [`PermissionSet::resolve`] whenever the
/// profile changes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermissionSet(HashSet<String>);
impl PermissionSet {
	/// Builds a set from the provided capability tokens.
	pub fn new<I, S>(permissions: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self(permissions.into_iter().map(Into::into).collect())
	}

	/// Builds the all-capabilities set.
	pub fn wildcard() -> Self {
		Self::new([WILDCARD_PERMISSION])
	}

	/// Returns `true` when no capability is granted.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns `true` when the set contains the wildcard token.
	pub fn is_wildcard(&self) -> bool {
		self.0.contains(WILDCARD_PERMISSION)
	}

	/// Checks a single capability; wildcard short-circuits to `true`.
	pub fn has(&self, permission: &str) -> bool {
		self.is_wildcard() || self.0.contains(permission)
	}

	/// Checks whether any of the capabilities is granted; wildcard short-circuits.
	pub fn has_any(&self, permissions: &[&str]) -> bool {
		self.is_wildcard() || permissions.iter().any(|permission| self.0.contains(*permission))
	}

	/// Checks whether all of the capabilities are granted; wildcard short-circuits.
	pub fn has_all(&self, permissions: &[&str]) -> bool {
		self.is_wildcard() || permissions.iter().all(|permission| self.0.contains(*permission))
	}

	/// Resolves the caller's capabilities from the permissions endpoint.
	///
	/// No profile yields the empty set. When the endpoint call fails the resolver
	/// degrades instead of erroring: administrators fall back to the wildcard so the
	/// portal stays operable, everyone else falls back to no capabilities.
	pub async fn resolve(api: &ApiClient, profile: Option<&Profile>) -> Self {
		let Some(profile) = profile else { return Self::default() };

		match api.get_authed::<PermissionsPayload>(PERMISSIONS_PATH).await {
			Ok(payload) => Self::new(payload.permissions),
			Err(_) if profile.role == Role::Admin => Self::wildcard(),
			Err(_) => Self::default(),
		}
	}
}

#[derive(Deserialize)]
struct PermissionsPayload {
	permissions: Vec<String>,
}
