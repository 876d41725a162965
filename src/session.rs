//! Session bootstrap/teardown orchestration and the single-flight refresh coordinator.
//!
//! [`SessionClient`] owns the credential cache and the renewal timer, drives the
//! `Loading -> Authenticated | Anonymous` state machine, and registers itself as the
//! [`TokenSource`] other request helpers consult. The renewal exchange trades the
//! long-lived proof (an HTTP-only cookie the transport carries implicitly) for a
//! short-lived bearer token; concurrent callers share one in-flight exchange.

// std
use std::sync::{
	Weak,
	atomic::{AtomicU64, Ordering},
};
// self
use crate::{
	_prelude::*,
	context::{TokenFuture, TokenSource},
	credential::{AccessToken, CredentialCache},
	http::ApiClient,
	obs::{FlowKind, FlowSpan},
	permission::PermissionSet,
	profile::{Profile, Role, SignUpRequest},
	scheduler::{RENEWAL_FALLBACK_SECS, RenewalTimer, renewal_delay},
};

const REFRESH_PATH: &str = "auth/refresh";
const LOGIN_PATH: &str = "auth/login";
const REGISTER_PATH: &str = "auth/register";
const LOGOUT_PATH: &str = "auth/logout";
const PROFILE_PATH: &str = "users/me";

/// Lifecycle state of the client session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
	/// Bootstrap has not settled yet.
	Loading,
	/// A valid credential and profile are held.
	Authenticated,
	/// No session; the caller must sign in.
	Anonymous,
}

/// Landing area a caller should route to after a lifecycle transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Landing {
	/// Administrative area for privileged roles.
	Admin,
	/// Standard member area.
	Member,
	/// Public area shown to anonymous visitors.
	Public,
}
impl Landing {
	/// Post-sign-in landing area for the provided role.
	pub const fn for_role(role: Role) -> Self {
		if role.is_administrative() { Self::Admin } else { Self::Member }
	}
}

/// Callback invoked after every permission re-resolution.
pub type PermissionsCallback = Box<dyn Fn(&PermissionSet) + Send + Sync>;

#[derive(Debug, Deserialize)]
struct TokenGrant {
	access_token: String,
	expires_in: i64,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
	email: &'a str,
	password: &'a str,
}

/// Orchestrates sign-in, sign-up, sign-out, and first-load session recovery.
pub struct SessionClient {
	api: Arc<ApiClient>,
	cache: CredentialCache,
	renew_guard: AsyncMutex<()>,
	renew_seq: AtomicU64,
	last_grant: Mutex<Option<i64>>,
	timer: RenewalTimer,
	state: RwLock<SessionState>,
	profile: RwLock<Option<Profile>>,
	permissions: RwLock<PermissionSet>,
	epoch: AtomicU64,
	on_permissions_changed: Mutex<Option<PermissionsCallback>>,
	weak: Weak<SessionClient>,
}
impl SessionClient {
	/// Builds the client and wires its token provider into the shared request context
	/// before any asynchronous work can observe it.
	pub fn new(api: Arc<ApiClient>) -> Arc<Self> {
		let client = Arc::new_cyclic(|weak| Self {
			api: api.clone(),
			cache: CredentialCache::default(),
			renew_guard: AsyncMutex::new(()),
			renew_seq: AtomicU64::new(0),
			last_grant: Mutex::new(None),
			timer: RenewalTimer::default(),
			state: RwLock::new(SessionState::Loading),
			profile: RwLock::new(None),
			permissions: RwLock::new(PermissionSet::default()),
			epoch: AtomicU64::new(0),
			on_permissions_changed: Mutex::new(None),
			weak: weak.clone(),
		});

		api.context().set_token_source(client.clone());

		client
	}

	/// Current lifecycle state.
	pub fn state(&self) -> SessionState {
		*self.state.read()
	}

	/// Read-only snapshot of the resolved profile, if any.
	pub fn profile(&self) -> Option<Profile> {
		self.profile.read().clone()
	}

	/// Snapshot of the currently resolved permission set.
	pub fn permissions(&self) -> PermissionSet {
		self.permissions.read().clone()
	}

	/// Registers the callback fired after every permission re-resolution.
	pub fn on_permissions_changed(&self, callback: PermissionsCallback) {
		*self.on_permissions_changed.lock() = Some(callback);
	}

	/// Returns `true` while a proactive renewal is scheduled.
	pub fn is_renewal_armed(&self) -> bool {
		self.timer.is_armed()
	}

	/// Delay the renewal timer was last armed with, while it remains armed.
	pub fn renewal_armed_for(&self) -> Option<std::time::Duration> {
		self.timer.armed_for()
	}

	/// Checks a single capability against the resolved set.
	pub fn has_permission(&self, permission: &str) -> bool {
		self.permissions.read().has(permission)
	}

	/// Checks whether any of the capabilities is granted.
	pub fn has_any_permission(&self, permissions: &[&str]) -> bool {
		self.permissions.read().has_any(permissions)
	}

	/// Checks whether all of the capabilities are granted.
	pub fn has_all_permissions(&self, permissions: &[&str]) -> bool {
		self.permissions.read().has_all(permissions)
	}

	/// Externally exposed credential accessor, registered as the [`TokenSource`].
	///
	/// An expired cache triggers a (shared) renewal first; the new token is returned
	/// only if the renewal succeeded. A fresh cache answers directly.
	pub async fn access_token(&self) -> Option<AccessToken> {
		if self.cache.is_expired() && !self.renew().await {
			return None;
		}

		self.cache.peek()
	}

	/// Silently renews the cached credential, returning `true` on success.
	///
	/// Renewal failures are session outcomes, not errors: network failures and
	/// non-success responses alike clear the cache and yield `false`. No retry is
	/// attempted here—the timer's next tick or the next explicit call decides.
	pub async fn renew(&self) -> bool {
		self.renew_grant().await.is_some()
	}

	/// Single-flight renewal returning the granted lifetime in seconds.
	///
	/// Callers that were already waiting while another renewal ran do not start a
	/// second exchange; they adopt that renewal's outcome, successful or not. A call
	/// arriving after a flight has fully settled always performs its own exchange.
	async fn renew_grant(&self) -> Option<i64> {
		let span = FlowSpan::new(FlowKind::Renew, "renew_grant");

		span.instrument(async move {
			let seq = self.renew_seq.load(Ordering::SeqCst);
			let _singleflight = self.renew_guard.lock().await;

			if self.renew_seq.load(Ordering::SeqCst) != seq {
				return *self.last_grant.lock();
			}

			let outcome = match self.api.post_empty::<TokenGrant>(REFRESH_PATH).await {
				Ok(grant) => {
					self.cache.set(
						Some(AccessToken::new(grant.access_token)),
						Some(Duration::seconds(grant.expires_in)),
					);

					Some(grant.expires_in)
				},
				Err(_) => {
					self.cache.clear();

					None
				},
			};

			*self.last_grant.lock() = outcome;
			self.renew_seq.fetch_add(1, Ordering::SeqCst);

			outcome
		})
		.await
	}

	/// Cold-start session recovery.
	///
	/// Attempts a silent renewal; on success fetches the profile, arms the renewal
	/// timer, and resolves permissions. Every failure path settles in
	/// [`SessionState::Anonymous`] without surfacing an error. A teardown begun while
	/// the bootstrap is in flight abandons the result without mutating client state.
	pub async fn bootstrap(&self) -> SessionState {
		let span = FlowSpan::new(FlowKind::Bootstrap, "bootstrap");

		span.instrument(async move {
			let epoch = self.epoch.load(Ordering::SeqCst);

			*self.state.write() = SessionState::Loading;

			let Some(expires_in) = self.renew_grant().await else {
				if !self.torn_down(epoch) {
					*self.state.write() = SessionState::Anonymous;
				}

				return SessionState::Anonymous;
			};

			if self.torn_down(epoch) {
				self.cache.clear();

				return SessionState::Anonymous;
			}

			let profile = match self.api.get_authed::<Profile>(PROFILE_PATH).await {
				Ok(profile) => profile,
				Err(_) => {
					if !self.torn_down(epoch) {
						self.cache.clear();
						*self.state.write() = SessionState::Anonymous;
					}

					return SessionState::Anonymous;
				},
			};

			if self.torn_down(epoch) {
				self.cache.clear();

				return SessionState::Anonymous;
			}

			*self.profile.write() = Some(profile);
			self.arm_renewal(expires_in);
			self.resolve_permissions().await;

			if self.torn_down(epoch) {
				self.timer.disarm();
				self.cache.clear();

				return SessionState::Anonymous;
			}

			*self.state.write() = SessionState::Authenticated;

			SessionState::Authenticated
		})
		.await
	}

	/// Exchanges credentials for a token pair and establishes the session.
	///
	/// A credential or profile left over from a previous, uncleaned session triggers a
	/// best-effort logout call first so a stale cookie cannot leak another account into
	/// this one; failures of that cleanup are swallowed.
	pub async fn sign_in(&self, email: &str, password: &str) -> Result<Landing> {
		let span = FlowSpan::new(FlowKind::SignIn, "sign_in");

		span.instrument(async move {
			self.evict_stale_session().await;

			let grant: TokenGrant =
				self.api.post_json(LOGIN_PATH, &LoginRequest { email, password }).await?;

			self.establish(grant).await
		})
		.await
	}

	/// Exchanges registration fields for a token pair; identical to sign-in from the
	/// token handling onward.
	pub async fn sign_up(&self, request: &SignUpRequest) -> Result<Landing> {
		let span = FlowSpan::new(FlowKind::SignUp, "sign_up");

		span.instrument(async move {
			let grant: TokenGrant = self.api.post_json(REGISTER_PATH, request).await?;

			self.establish(grant).await
		})
		.await
	}

	/// Ends the session: best-effort server-side revocation, local state cleared,
	/// timer disarmed. Always lands on the public area.
	pub async fn sign_out(&self) -> Landing {
		let span = FlowSpan::new(FlowKind::SignOut, "sign_out");

		span.instrument(async move {
			// Server-side revocation is best-effort; local state is cleared regardless.
			let _ = self.api.post_ok(LOGOUT_PATH).await;

			self.clear_local_state();
			*self.state.write() = SessionState::Anonymous;

			Landing::Public
		})
		.await
	}

	/// Re-fetches the profile (and re-resolves permissions) without touching the
	/// credential or the renewal timer.
	pub async fn refresh_profile(&self) -> Result<Profile> {
		let profile = self.api.get_authed::<Profile>(PROFILE_PATH).await?;

		*self.profile.write() = Some(profile.clone());
		self.resolve_permissions().await;

		Ok(profile)
	}

	/// Tears the client down, cancelling the renewal timer and marking any in-flight
	/// bootstrap as abandoned. Equivalent to component unmount.
	pub fn close(&self) {
		self.epoch.fetch_add(1, Ordering::SeqCst);
		self.timer.disarm();
		self.cache.clear();
	}

	fn torn_down(&self, epoch: u64) -> bool {
		self.epoch.load(Ordering::SeqCst) != epoch
	}

	async fn evict_stale_session(&self) {
		if self.cache.peek().is_none() && self.profile.read().is_none() {
			return;
		}

		let _ = self.api.post_ok(LOGOUT_PATH).await;

		self.clear_local_state();
	}

	async fn establish(&self, grant: TokenGrant) -> Result<Landing> {
		self.cache.set(
			Some(AccessToken::new(grant.access_token)),
			Some(Duration::seconds(grant.expires_in)),
		);

		let profile = match self.api.get_authed::<Profile>(PROFILE_PATH).await {
			Ok(profile) => profile,
			Err(e) => {
				self.clear_local_state();

				return Err(e);
			},
		};
		let landing = Landing::for_role(profile.role);

		*self.profile.write() = Some(profile);
		self.arm_renewal(grant.expires_in);
		self.resolve_permissions().await;
		*self.state.write() = SessionState::Authenticated;

		Ok(landing)
	}

	fn arm_renewal(&self, expires_in: i64) {
		let weak = self.weak.clone();

		self.timer.arm(renewal_delay(expires_in), move || async move {
			let Some(client) = weak.upgrade() else { return };

			// On success the timer re-arms with the fallback window; on failure it stays
			// disarmed and the session requires re-authentication.
			if client.renew().await {
				client.arm_renewal(RENEWAL_FALLBACK_SECS);
			}
		});
	}

	async fn resolve_permissions(&self) {
		let profile = self.profile.read().clone();
		let resolved = PermissionSet::resolve(&self.api, profile.as_ref()).await;

		*self.permissions.write() = resolved.clone();
		self.notify_permissions(&resolved);
	}

	fn clear_local_state(&self) {
		self.cache.clear();
		self.timer.disarm();
		*self.profile.write() = None;

		let cleared = PermissionSet::default();

		*self.permissions.write() = cleared.clone();
		self.notify_permissions(&cleared);
	}

	fn notify_permissions(&self, permissions: &PermissionSet) {
		if let Some(callback) = self.on_permissions_changed.lock().as_ref() {
			callback(permissions);
		}
	}
}
impl TokenSource for SessionClient {
	fn access_token(&self) -> TokenFuture<'_> {
		Box::pin(SessionClient::access_token(self))
	}
}
impl Debug for SessionClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionClient")
			.field("state", &*self.state.read())
			.field("profile", &*self.profile.read())
			.field("renewal_armed", &self.timer.is_armed())
			.finish()
	}
}
