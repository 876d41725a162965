//! In-memory credential cache and the redacted access-token wrapper.
//!
//! The cache is deliberately pure state: it performs no I/O and is never backed by a
//! durable store, so a credential cannot be exfiltrated by reading persisted storage
//! or inspecting the process after a restart. The persisted reporting-period slot in
//! [`crate::store`] is the only state that crosses the reload boundary.

// self
use crate::_prelude::*;

/// Safety margin subtracted from every advertised token lifetime.
///
/// A token that the backend considers valid for `expires_in` seconds is treated as
/// expired one minute earlier, so requests dispatched near the boundary never race
/// the server-side clock.
pub const EXPIRY_MARGIN: Duration = Duration::seconds(60);

/// Floor applied to the margin-adjusted lifetime.
///
/// A grant shorter than [`EXPIRY_MARGIN`] would otherwise be cached already expired;
/// it keeps a few seconds of usability instead.
pub const MIN_LIFETIME: Duration = Duration::seconds(5);

/// Redacted access-token wrapper keeping bearer material out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);
impl AccessToken {
	/// Wraps a new bearer token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for AccessToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AccessToken").field(&"<redacted>").finish()
	}
}
impl Display for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[derive(Debug)]
struct CredentialSlot {
	token: Option<AccessToken>,
	expires_at: OffsetDateTime,
}
impl Default for CredentialSlot {
	fn default() -> Self {
		Self { token: None, expires_at: OffsetDateTime::UNIX_EPOCH }
	}
}

/// Process-memory slot holding the current access credential and its expiry instant.
///
/// The single mutable slot is overwritten on every refresh; the session flows in
/// [`crate::session`] are its only writers.
#[derive(Debug, Default)]
pub struct CredentialCache(RwLock<CredentialSlot>);
impl CredentialCache {
	/// Stores a token, computing `expires_at = now + expires_in - EXPIRY_MARGIN` when a
	/// lifetime is provided, floored at [`MIN_LIFETIME`] so the freshly cached token is
	/// never already expired. Passing `None` as the token clears the slot.
	pub fn set(&self, token: Option<AccessToken>, expires_in: Option<Duration>) {
		let mut slot = self.0.write();

		match token {
			Some(token) => {
				slot.token = Some(token);

				if let Some(expires_in) = expires_in {
					let lifetime = (expires_in - EXPIRY_MARGIN).max(MIN_LIFETIME);

					slot.expires_at = OffsetDateTime::now_utc() + lifetime;
				}
			},
			None => {
				slot.token = None;
				slot.expires_at = OffsetDateTime::UNIX_EPOCH;
			},
		}
	}

	/// Clears the slot, resetting the expiry instant to a sentinel in the past.
	pub fn clear(&self) {
		self.set(None, None);
	}

	/// Returns `true` if no token is cached or the margin-adjusted expiry has passed.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Expiry check against an explicit instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		let slot = self.0.read();

		slot.token.is_none() || instant >= slot.expires_at
	}

	/// Returns the raw cached token without triggering any refresh.
	pub fn peek(&self) -> Option<AccessToken> {
		self.0.read().token.clone()
	}

	/// Margin-adjusted expiry instant of the cached token, if one is present.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		let slot = self.0.read();

		slot.token.as_ref().map(|_| slot.expires_at)
	}

	/// Time left until the margin-adjusted expiry, if a token is present.
	pub fn remaining(&self) -> Option<Duration> {
		self.expires_at().map(|expires_at| expires_at - OffsetDateTime::now_utc())
	}
}
