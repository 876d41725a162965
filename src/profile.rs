//! Resolved member profile, roles, and the registration payload.

// self
use crate::_prelude::*;

/// Member role as issued by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	/// Regular member account.
	Student,
	/// Executive-committee account.
	Exco,
	/// Administrator account.
	Admin,
}
impl Role {
	/// Returns a stable label matching the wire representation.
	pub const fn as_str(self) -> &'static str {
		match self {
			Role::Student => "student",
			Role::Exco => "exco",
			Role::Admin => "admin",
		}
	}

	/// Roles that land on the administrative area after sign-in.
	pub const fn is_administrative(self) -> bool {
		matches!(self, Role::Admin | Role::Exco)
	}
}
impl Display for Role {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Read-only profile snapshot fetched with a valid credential.
///
/// The backend serializes the identifier as either `_id` or `id` depending on the
/// endpoint; both aliases reconcile to the canonical [`Profile::id`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Profile {
	/// Canonical member identifier.
	#[serde(alias = "_id")]
	pub id: String,
	/// Account email address.
	pub email: String,
	/// Given name.
	#[serde(rename = "firstName")]
	pub first_name: String,
	/// Family name.
	#[serde(rename = "lastName")]
	pub last_name: String,
	/// Role driving landing-route and permission fallbacks.
	pub role: Role,
	/// Matriculation number, when recorded.
	#[serde(rename = "matricNumber", default)]
	pub matric_number: Option<String>,
	/// Contact phone number, when recorded.
	#[serde(default)]
	pub phone: Option<String>,
	/// Study level label, when recorded.
	#[serde(default)]
	pub level: Option<String>,
}
impl Profile {
	/// Full display name.
	pub fn full_name(&self) -> String {
		format!("{} {}", self.first_name, self.last_name)
	}
}

/// Registration fields exchanged for a token pair during sign-up.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
	/// Account email address.
	pub email: String,
	/// Plain-text password; redacted from [`Debug`] output.
	pub password: String,
	/// Given name.
	pub first_name: String,
	/// Family name.
	pub last_name: String,
	/// Matriculation number, if supplied.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub matric_number: Option<String>,
	/// Contact phone number, if supplied.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
	/// Study level label, if supplied.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub level: Option<String>,
	/// Admission year, if supplied.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub admission_year: Option<i32>,
}
impl Debug for SignUpRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignUpRequest")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.field("first_name", &self.first_name)
			.field("last_name", &self.last_name)
			.field("matric_number", &self.matric_number)
			.field("phone", &self.phone)
			.field("level", &self.level)
			.field("admission_year", &self.admission_year)
			.finish()
	}
}
