//! JSON transport against the portal backend.
//!
//! [`ApiClient`] owns the base URL, the reqwest client (with its cookie jar, where the
//! long-lived renewal proof lives as an HTTP-only cookie this code never reads), and
//! the shared [`RequestContext`]. Authenticated helpers consult the context for a
//! bearer token and the active reporting-period identifier; unauthenticated helpers
//! rely on the cookie jar alone.

// crates.io
use reqwest::Response;
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, context::RequestContext};

/// Header carrying the active reporting-period identifier on scoped requests.
pub const SCOPE_HEADER: &str = "X-Session-ID";

/// Reqwest-backed JSON client for the portal API.
#[derive(Debug)]
pub struct ApiClient {
	base: Url,
	client: ReqwestClient,
	context: Arc<RequestContext>,
}
impl ApiClient {
	/// Builds a client with a fresh cookie-jar-enabled transport.
	pub fn new(base: Url, context: Arc<RequestContext>) -> Result<Self> {
		let client =
			ReqwestClient::builder().cookie_store(true).build().map_err(Error::client_build)?;

		Ok(Self::with_client(base, client, context))
	}

	/// Wraps an existing [`ReqwestClient`]. The client must keep a cookie store enabled,
	/// otherwise the renewal proof is lost between calls.
	pub fn with_client(mut base: Url, client: ReqwestClient, context: Arc<RequestContext>) -> Self {
		// A base path without a trailing slash would swallow its last segment on join.
		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());

			base.set_path(&path);
		}

		Self { base, client, context }
	}

	/// Returns the shared request context used for provider registration.
	pub fn context(&self) -> &Arc<RequestContext> {
		&self.context
	}

	fn endpoint(&self, path: &str) -> Result<Url> {
		self.base
			.join(path.trim_start_matches('/'))
			.map_err(|source| Error::InvalidEndpoint { source })
	}

	/// POSTs a JSON body without authentication and decodes the JSON response.
	pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		let url = self.endpoint(path)?;
		let response = self.client.post(url).json(body).send().await?;

		decode(response).await
	}

	/// POSTs an empty body without authentication and decodes the JSON response.
	pub async fn post_empty<T>(&self, path: &str) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let url = self.endpoint(path)?;
		let response = self.client.post(url).send().await?;

		decode(response).await
	}

	/// POSTs an empty body and only checks the status, discarding any response payload.
	pub async fn post_ok(&self, path: &str) -> Result<()> {
		let url = self.endpoint(path)?;
		let response = self.client.post(url).send().await?;
		let status = response.status();

		if status.is_success() {
			Ok(())
		} else {
			let bytes = response.bytes().await.unwrap_or_default();

			Err(Error::Endpoint { status: status.as_u16(), message: extract_detail(&bytes) })
		}
	}

	/// GETs a JSON payload with a bearer token and, when available, the active
	/// reporting-period header attached via the request context.
	pub async fn get_authed<T>(&self, path: &str) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let url = self.endpoint(path)?;
		let token = self.context.bearer().await.ok_or(Error::SessionRequired)?;
		let mut request = self.client.get(url).bearer_auth(token.expose());

		if let Some(scope) = self.context.scope_id() {
			request = request.header(SCOPE_HEADER, scope);
		}

		let response = request.send().await?;

		decode(response).await
	}
}

async fn decode<T>(response: Response) -> Result<T>
where
	T: DeserializeOwned,
{
	let status = response.status();
	let bytes = response.bytes().await?;

	if !status.is_success() {
		return Err(Error::Endpoint { status: status.as_u16(), message: extract_detail(&bytes) });
	}

	let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::ResponseParse { source, status: Some(status.as_u16()) })
}

// The backend reports failures as `{"detail": "..."}`; fall back to the raw body.
fn extract_detail(bytes: &[u8]) -> String {
	#[derive(Deserialize)]
	struct Failure {
		detail: String,
	}

	if let Ok(failure) = serde_json::from_slice::<Failure>(bytes) {
		return failure.detail;
	}

	let raw = String::from_utf8_lossy(bytes);
	let raw = raw.trim();

	if raw.is_empty() { "no detail provided".into() } else { raw.into() }
}
