//! Crate-level error types shared across session, scope, and transport layers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
///
/// Silent flows (cold-start bootstrap, proactive renewal) absorb these internally and
/// resolve to an anonymous session instead; explicit user actions (sign-in, sign-up,
/// scope switch) propagate them with human-readable messages.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Persisted-slot failure.
	#[error("{0}")]
	Store(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	ClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// An endpoint path produced an invalid URL against the configured base.
	#[error("Endpoint path produced an invalid URL.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the portal API.")]
	Transport {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Portal API answered with a non-success status.
	#[error("Portal API returned HTTP {status}: {message}.")]
	Endpoint {
		/// HTTP status code returned by the endpoint.
		status: u16,
		/// Human-readable detail extracted from the response body.
		message: String,
	},
	/// Portal API answered with a body that could not be parsed.
	#[error("Portal API returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// An authenticated call was attempted with no usable credential.
	#[error("No usable credential is available; sign in first.")]
	SessionRequired,
}
impl Error {
	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Wraps a transport's builder failure.
	pub fn client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::ClientBuild { source: Box::new(src) }
	}

	/// Returns the HTTP status carried by endpoint and parse failures, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Endpoint { status, .. } => Some(*status),
			Self::ResponseParse { status, .. } => *status,
			_ => None,
		}
	}
}
impl From<ReqwestError> for Error {
	fn from(e: ReqwestError) -> Self {
		Self::transport(e)
	}
}
