// std
use std::{
	sync::{Arc, Mutex},
	time::Duration,
};
// crates.io
use httpmock::prelude::*;
// self
use portal_session::{
	context::RequestContext,
	http::ApiClient,
	permission::PermissionSet,
	session::{SessionClient, SessionState},
	url::Url,
};

fn build_session(server: &MockServer) -> Arc<SessionClient> {
	let base = Url::parse(&server.base_url()).expect("Mock base URL should parse.");
	let api = ApiClient::new(base, Arc::new(RequestContext::default()))
		.expect("Failed to build API client for tests.");

	SessionClient::new(Arc::new(api))
}

#[tokio::test]
async fn cold_start_with_valid_cookie_authenticates_and_arms() {
	let server = MockServer::start_async().await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"tok-boot","token_type":"bearer","expires_in":900}"#);
		})
		.await;
	let profile = server
		.mock_async(|when, then| {
			when.method(GET).path("/users/me").header("authorization", "Bearer tok-boot");
			then.status(200).header("content-type", "application/json").body(
				r#"{"_id":"u1","email":"ada@portal.test","firstName":"Ada","lastName":"Bell","role":"student"}"#,
			);
		})
		.await;
	let permissions = server
		.mock_async(|when, then| {
			when.method(GET).path("/users/me/permissions");
			then.status(200).header("content-type", "application/json").body(
				r#"{"permissions":["payment:create","event:view"],"session_id":"p1","session_name":"2024/2025"}"#,
			);
		})
		.await;
	let session = build_session(&server);
	let notified: Arc<Mutex<Option<PermissionSet>>> = Arc::new(Mutex::new(None));
	let sink = notified.clone();

	session.on_permissions_changed(Box::new(move |set| {
		*sink.lock().expect("Notification sink should lock.") = Some(set.clone());
	}));

	let state = session.bootstrap().await;

	refresh.assert_async().await;
	profile.assert_async().await;
	permissions.assert_async().await;

	assert_eq!(state, SessionState::Authenticated);
	assert_eq!(session.state(), SessionState::Authenticated);
	assert_eq!(session.renewal_armed_for(), Some(Duration::from_secs(840)));
	assert!(session.has_permission("payment:create"));
	assert!(!session.has_permission("payment:delete"));
	assert_eq!(
		session.profile().map(|profile| profile.full_name()).as_deref(),
		Some("Ada Bell"),
	);

	let notified = notified.lock().expect("Notification sink should lock.");

	assert!(notified.as_ref().is_some_and(|set| set.has("event:view")));

	// A fresh cache answers directly; no second renewal exchange happens.
	let token = session.access_token().await.expect("Fresh cache should answer.");

	assert_eq!(token.expose(), "tok-boot");
	assert_eq!(refresh.calls_async().await, 1);
}

#[tokio::test]
async fn timer_fired_renewal_re_arms_with_the_fallback_window() {
	let server = MockServer::start_async().await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"tok-short","token_type":"bearer","expires_in":30}"#);
		})
		.await;
	let _profile = server
		.mock_async(|when, then| {
			when.method(GET).path("/users/me").header("authorization", "Bearer tok-short");
			then.status(200).header("content-type", "application/json").body(
				r#"{"_id":"u1","email":"ada@portal.test","firstName":"Ada","lastName":"Bell","role":"student"}"#,
			);
		})
		.await;
	let _permissions = server
		.mock_async(|when, then| {
			when.method(GET).path("/users/me/permissions");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"permissions":["event:view"]}"#);
		})
		.await;
	let session = build_session(&server);

	assert_eq!(session.bootstrap().await, SessionState::Authenticated);
	// A 30-second grant schedules at the floor delay.
	assert_eq!(session.renewal_armed_for(), Some(Duration::from_secs(5)));

	tokio::time::sleep(Duration::from_secs(7)).await;

	// The fired timer renewed silently and re-armed with the fallback window.
	assert_eq!(refresh.calls_async().await, 2);
	assert_eq!(session.renewal_armed_for(), Some(Duration::from_secs(840)));
	assert_eq!(session.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn rejected_renewal_settles_anonymous_without_arming() {
	let server = MockServer::start_async().await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"detail":"Invalid refresh token"}"#);
		})
		.await;
	let session = build_session(&server);
	let state = session.bootstrap().await;

	assert_eq!(state, SessionState::Anonymous);
	assert_eq!(session.state(), SessionState::Anonymous);
	assert!(session.profile().is_none());
	assert!(!session.is_renewal_armed());
	assert!(session.permissions().is_empty());

	// The exposed accessor retries the exchange and reports no usable credential.
	assert!(session.access_token().await.is_none());
	assert_eq!(refresh.calls_async().await, 2);
}

#[tokio::test]
async fn profile_failure_after_renewal_settles_anonymous() {
	let server = MockServer::start_async().await;
	let _refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"tok-orphan","token_type":"bearer","expires_in":900}"#);
		})
		.await;
	let _profile = server
		.mock_async(|when, then| {
			when.method(GET).path("/users/me");
			then.status(500)
				.header("content-type", "application/json")
				.body(r#"{"detail":"profile backend down"}"#);
		})
		.await;
	let session = build_session(&server);
	let state = session.bootstrap().await;

	assert_eq!(state, SessionState::Anonymous);
	assert_eq!(session.state(), SessionState::Anonymous);
	assert!(!session.is_renewal_armed());
}

#[tokio::test]
async fn teardown_mid_bootstrap_abandons_the_result() {
	let server = MockServer::start_async().await;
	let _refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"tok-late","token_type":"bearer","expires_in":900}"#)
				.delay(Duration::from_millis(250));
		})
		.await;
	let session = build_session(&server);
	let task = tokio::spawn({
		let session = session.clone();

		async move { session.bootstrap().await }
	});

	tokio::time::sleep(Duration::from_millis(50)).await;
	session.close();

	let outcome = task.await.expect("Bootstrap task should not panic.");

	assert_eq!(outcome, SessionState::Anonymous);
	assert_ne!(session.state(), SessionState::Authenticated);
	assert!(session.profile().is_none());
	assert!(!session.is_renewal_armed());
}
