//! Reporting-period switch ("time travel") with persisted restore and fallback.
//!
//! The manager is independent of credential state except that its own network calls
//! require a valid bearer token. The current selection is the period the user chose
//! to view, which is not necessarily the period the backend considers live—viewing a
//! past period is a supported, deliberate choice and survives reloads through the
//! persisted slot.

// self
use crate::{
	_prelude::*,
	context::ScopeSource,
	http::ApiClient,
	obs::{FlowKind, FlowSpan},
	store::{self, ACTIVE_PERIOD_KEY, ScopeStore},
};

const LIST_PATH: &str = "sessions/";
const ACTIVE_PATH: &str = "sessions/active";

/// Reporting period detail as served by the period endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ReportingPeriod {
	/// Canonical period identifier (`_id` and `id` aliases reconcile here).
	#[serde(alias = "_id")]
	pub id: String,
	/// Display name, e.g. `2024/2025`.
	pub name: String,
	/// Whether the backend considers this period live.
	#[serde(rename = "isActive", default)]
	pub is_active: bool,
	/// Index of the semester currently running inside the period.
	#[serde(rename = "currentSemester", default = "default_semester")]
	pub semester: u8,
	/// Period start, as serialized by the backend.
	#[serde(rename = "startDate", default)]
	pub start_date: Option<String>,
	/// Period end, as serialized by the backend.
	#[serde(rename = "endDate", default)]
	pub end_date: Option<String>,
}

/// Lightweight period summary served by the list endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PeriodSummary {
	/// Canonical period identifier.
	#[serde(alias = "_id")]
	pub id: String,
	/// Display name.
	pub name: String,
	/// Whether the backend considers this period live.
	#[serde(rename = "isActive", default)]
	pub is_active: bool,
	/// Index of the semester currently running inside the period.
	#[serde(rename = "currentSemester", default = "default_semester")]
	pub semester: u8,
}

const fn default_semester() -> u8 {
	1
}

/// Holder of the reporting period currently in view.
pub struct ScopeManager {
	api: Arc<ApiClient>,
	store: Arc<dyn ScopeStore>,
	current: RwLock<Option<ReportingPeriod>>,
}
impl ScopeManager {
	/// Builds the manager and wires its scope provider into the shared request context
	/// before any asynchronous work can observe it.
	pub fn new(api: Arc<ApiClient>, store: Arc<dyn ScopeStore>) -> Arc<Self> {
		let manager = Arc::new(Self { api: api.clone(), store, current: RwLock::new(None) });

		api.context().set_scope_source(manager.clone());

		manager
	}

	/// Returns the selection currently in view, if any.
	pub fn current(&self) -> Option<ReportingPeriod> {
		self.current.read().clone()
	}

	/// Lists all reporting periods the caller may view.
	pub async fn fetch_all(&self) -> Result<Vec<PeriodSummary>> {
		self.api.get_authed(LIST_PATH).await
	}

	/// Fetches the period the backend currently considers live and adopts it as the
	/// selection. The live default is not persisted—only deliberate switches are.
	pub async fn fetch_active(&self) -> Result<ReportingPeriod> {
		let period: ReportingPeriod = self.api.get_authed(ACTIVE_PATH).await?;

		*self.current.write() = Some(period.clone());

		Ok(period)
	}

	/// Switches the selection to the provided period.
	///
	/// Sentinel garbage (`""`, `"undefined"`, `"null"`) is rejected silently: no state
	/// change and no network call, signalled by `Ok(None)`. On success the identifier
	/// is persisted so the choice survives a reload.
	pub async fn switch_to(&self, id: &str) -> Result<Option<ReportingPeriod>> {
		if store::is_sentinel_garbage(id) {
			return Ok(None);
		}

		let span = FlowSpan::new(FlowKind::Scope, "switch_to");
		let period = span
			.instrument(async move {
				let period: ReportingPeriod =
					self.api.get_authed(&format!("sessions/{id}")).await?;

				self.store.set(ACTIVE_PERIOD_KEY, &period.id)?;
				*self.current.write() = Some(period.clone());

				Ok::<_, Error>(period)
			})
			.await?;

		Ok(Some(period))
	}

	/// Re-fetches the list and the current selection's detail to pick up attribute
	/// changes (date ranges, semester rollovers) without losing the chosen scope.
	///
	/// A live selection is re-read through the active endpoint, a historical one
	/// through its specific-period endpoint.
	pub async fn refresh(&self) -> Result<Option<ReportingPeriod>> {
		let span = FlowSpan::new(FlowKind::Scope, "refresh");

		span.instrument(async move {
			let summaries = self.fetch_all().await?;
			let Some(current) = self.current() else { return Ok(None) };
			let is_live =
				summaries.iter().any(|summary| summary.id == current.id && summary.is_active);
			let updated: ReportingPeriod = if is_live {
				self.api.get_authed(ACTIVE_PATH).await?
			} else {
				self.api.get_authed(&format!("sessions/{}", current.id)).await?
			};

			*self.current.write() = Some(updated.clone());

			Ok(Some(updated))
		})
		.await
	}

	/// Restores the last-chosen period after a reload.
	///
	/// A valid persisted identifier is switched to directly. When that fetch fails
	/// (deleted or invalid period) the stale identifier is removed and the live period
	/// becomes the selection instead—a stale slot must never leave the user stuck.
	pub async fn restore(&self) -> Result<ReportingPeriod> {
		let span = FlowSpan::new(FlowKind::Scope, "restore");

		span.instrument(async move {
			if let Some(saved) = self.persisted_id() {
				match self.switch_to(&saved).await {
					Ok(Some(period)) => return Ok(period),
					Ok(None) => {},
					Err(_) => {
						let _ = self.store.remove(ACTIVE_PERIOD_KEY);
					},
				}
			}

			self.fetch_active().await
		})
		.await
	}

	fn persisted_id(&self) -> Option<String> {
		self.store
			.get(ACTIVE_PERIOD_KEY)
			.ok()
			.flatten()
			.filter(|raw| !store::is_sentinel_garbage(raw))
	}
}
impl ScopeSource for ScopeManager {
	fn scope_id(&self) -> Option<String> {
		self.current.read().as_ref().map(|period| period.id.clone())
	}
}
impl Debug for ScopeManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ScopeManager").field("current", &*self.current.read()).finish()
	}
}
