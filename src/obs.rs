//! Optional observability helpers for session flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `portal_session.flow` with the `flow`
//!   (operation) and `stage` (call site) fields.

mod tracing;

pub use tracing::*;

// self
use crate::_prelude::*;

/// Session flow kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Cold-start session recovery.
	Bootstrap,
	/// Credential-for-password exchange.
	SignIn,
	/// Registration exchange.
	SignUp,
	/// Session teardown.
	SignOut,
	/// Silent credential renewal.
	Renew,
	/// Reporting-period operations.
	Scope,
}
impl FlowKind {
	/// Returns a stable label suitable for span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Bootstrap => "bootstrap",
			FlowKind::SignIn => "sign_in",
			FlowKind::SignUp => "sign_up",
			FlowKind::SignOut => "sign_out",
			FlowKind::Renew => "renew",
			FlowKind::Scope => "scope",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
