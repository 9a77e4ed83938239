//! Cached user profile and role types mirroring the backend's wire contract.

// self
use crate::_prelude::*;

/// Page-level role reported by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	/// Field user submitting per-store survey responses.
	User,
	/// Administrator operating the dashboard surfaces.
	Admin,
}
impl Role {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Role::User => "user",
			Role::Admin => "admin",
		}
	}
}
impl Display for Role {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Profile snapshot cached at login/verification time.
///
/// The snapshot is a convenience for rendering; the server re-checks the role on every
/// protected call, so nothing here grants access by itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
	/// Login name.
	pub username: String,
	/// Role the server reported for this account.
	pub role: Role,
	/// Team-leader assignment for field users, when set.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub leader: Option<String>,
	/// Stores this account may submit surveys for.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub assigned_stores: Option<Vec<String>>,
	/// Super-admin flag; informational only.
	#[serde(default)]
	pub is_super_admin: bool,
}
