// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use portal_session::{
	context::{RequestContext, TokenFuture, TokenSource},
	credential::AccessToken,
	http::ApiClient,
	scope::ScopeManager,
	store::{ACTIVE_PERIOD_KEY, MemoryStore, ScopeStore},
	url::Url,
};

struct StaticToken;
impl TokenSource for StaticToken {
	fn access_token(&self) -> TokenFuture<'_> {
		Box::pin(async { Some(AccessToken::new("scope-tok")) })
	}
}

fn build_scope(server: &MockServer) -> (Arc<ScopeManager>, Arc<MemoryStore>) {
	let base = Url::parse(&server.base_url()).expect("Mock base URL should parse.");
	let context = Arc::new(RequestContext::default());

	context.set_token_source(Arc::new(StaticToken));

	let api =
		Arc::new(ApiClient::new(base, context).expect("Failed to build API client for tests."));
	let backend = Arc::new(MemoryStore::default());
	let manager = ScopeManager::new(api, backend.clone());

	(manager, backend)
}

#[tokio::test]
async fn restore_falls_back_to_the_live_period_when_the_slot_is_stale() {
	let server = MockServer::start_async().await;
	let stale = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/sessions/p-stale")
				.header("authorization", "Bearer scope-tok");
			then.status(404)
				.header("content-type", "application/json")
				.body(r#"{"detail":"Session not found"}"#);
		})
		.await;
	let active = server
		.mock_async(|when, then| {
			when.method(GET).path("/sessions/active");
			then.status(200).header("content-type", "application/json").body(
				r#"{"_id":"p-live","name":"2025/2026","isActive":true,"currentSemester":1}"#,
			);
		})
		.await;
	let (manager, backend) = build_scope(&server);

	backend.set(ACTIVE_PERIOD_KEY, "p-stale").expect("Seeding the slot should succeed.");

	let restored = manager.restore().await.expect("Restore should fall back to the live period.");

	assert_eq!(restored.id, "p-live");
	assert_eq!(manager.current().map(|period| period.id).as_deref(), Some("p-live"));
	// The stale identifier was evicted; the live default is not written back.
	assert_eq!(backend.get(ACTIVE_PERIOD_KEY), Ok(None));
	stale.assert_async().await;
	active.assert_async().await;
}

#[tokio::test]
async fn restore_without_a_slot_adopts_the_live_period() {
	let server = MockServer::start_async().await;
	let active = server
		.mock_async(|when, then| {
			when.method(GET).path("/sessions/active");
			then.status(200).header("content-type", "application/json").body(
				r#"{"_id":"p-live","name":"2025/2026","isActive":true,"currentSemester":2}"#,
			);
		})
		.await;
	let (manager, backend) = build_scope(&server);
	let restored = manager.restore().await.expect("Restore should adopt the live period.");

	assert_eq!(restored.id, "p-live");
	assert_eq!(restored.semester, 2);
	assert_eq!(backend.get(ACTIVE_PERIOD_KEY), Ok(None));
	active.assert_async().await;
}

#[tokio::test]
async fn switch_persists_and_scopes_subsequent_requests() {
	let server = MockServer::start_async().await;
	let detail = server
		.mock_async(|when, then| {
			when.method(GET).path("/sessions/p-old");
			then.status(200).header("content-type", "application/json").body(
				r#"{"_id":"p-old","name":"2023/2024","isActive":false,"currentSemester":2,"startDate":"2023-09-01T00:00:00","endDate":"2024-07-31T00:00:00"}"#,
			);
		})
		.await;
	// The list call issued after the switch must carry the selection header.
	let list = server
		.mock_async(|when, then| {
			when.method(GET).path("/sessions/").header("x-session-id", "p-old");
			then.status(200).header("content-type", "application/json").body(
				r#"[{"_id":"p-live","name":"2025/2026","isActive":true},{"_id":"p-old","name":"2023/2024","isActive":false}]"#,
			);
		})
		.await;
	let (manager, backend) = build_scope(&server);
	let switched = manager
		.switch_to("p-old")
		.await
		.expect("Switching to a valid period should succeed.")
		.expect("A non-sentinel identifier should produce a selection.");

	assert_eq!(switched.id, "p-old");
	assert!(!switched.is_active);
	assert_eq!(backend.get(ACTIVE_PERIOD_KEY), Ok(Some("p-old".into())));

	let summaries = manager.fetch_all().await.expect("Listing periods should succeed.");

	assert_eq!(summaries.len(), 2);
	detail.assert_async().await;
	list.assert_async().await;
}

#[tokio::test]
async fn refresh_re_reads_a_historical_selection_through_its_own_endpoint() {
	let server = MockServer::start_async().await;
	let _detail_initial = server
		.mock_async(|when, then| {
			when.method(GET).path("/sessions/p-old");
			then.status(200).header("content-type", "application/json").body(
				r#"{"_id":"p-old","name":"2023/2024","isActive":false,"currentSemester":1}"#,
			);
		})
		.await;
	let _list = server
		.mock_async(|when, then| {
			when.method(GET).path("/sessions/");
			then.status(200).header("content-type", "application/json").body(
				r#"[{"_id":"p-live","name":"2025/2026","isActive":true},{"_id":"p-old","name":"2023/2024","isActive":false}]"#,
			);
		})
		.await;
	let active = server
		.mock_async(|when, then| {
			when.method(GET).path("/sessions/active");
			then.status(200).header("content-type", "application/json").body(
				r#"{"_id":"p-live","name":"2025/2026","isActive":true,"currentSemester":1}"#,
			);
		})
		.await;
	let (manager, _backend) = build_scope(&server);

	manager
		.switch_to("p-old")
		.await
		.expect("Switching to a valid period should succeed.")
		.expect("A non-sentinel identifier should produce a selection.");

	let refreshed = manager
		.refresh()
		.await
		.expect("Refreshing the selection should succeed.")
		.expect("A selection was held, so refresh should return one.");

	assert_eq!(refreshed.id, "p-old");
	assert_eq!(manager.current().map(|period| period.id).as_deref(), Some("p-old"));
	// The active endpoint belongs to live selections only.
	assert_eq!(active.calls_async().await, 0);
}
