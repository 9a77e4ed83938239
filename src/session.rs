//! Client-held session state: the token pair plus the cached user profile.

pub mod profile;
pub mod secret;

pub use profile::{Role, UserProfile};
pub use secret::TokenSecret;

// self
use crate::_prelude::*;

/// Authenticated client identity: access and refresh tokens and the cached profile snapshot.
///
/// A value of this type always holds both tokens; the both-or-neither invariant is enforced
/// when a raw store snapshot is interpreted, not here.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
	/// Short-lived bearer credential attached to every protected call.
	pub access_token: TokenSecret,
	/// Long-lived credential exchanged only for new access tokens; rotated on each use.
	pub refresh_token: TokenSecret,
	/// Cached profile snapshot; never trusted for authorization decisions.
	pub user: Option<UserProfile>,
}
impl Session {
	/// Creates a session from a freshly issued token pair and profile.
	pub fn new(
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
		user: Option<UserProfile>,
	) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
			user,
		}
	}

	/// Returns a copy with the access token replaced in place (silent rotation).
	pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = TokenSecret::new(token);

		self
	}

	/// Returns a copy with the cached profile replaced (verification re-caches it).
	pub fn with_user(mut self, user: UserProfile) -> Self {
		self.user = Some(user);

		self
	}
}
impl Debug for Session {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("user", &self.user)
			.finish()
	}
}
