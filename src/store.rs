//! Storage contracts and built-in session stores.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	session::{Session, TokenSecret, UserProfile},
};

/// Boxed future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for the client-held session triple.
///
/// Implementations expose exactly three operations: read the raw snapshot, replace the whole
/// triple, and clear it. There is no partial-field write; the atomicity invariant of the
/// session lives at this seam, which keeps it enforceable and testable in isolation from any
/// page.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Returns the raw persisted fields, each possibly absent.
	fn load(&self) -> StoreFuture<'_, SessionSnapshot>;

	/// Atomically overwrites all three fields with the provided session.
	fn replace(&self, session: Session) -> StoreFuture<'_, ()>;

	/// Removes all three fields together.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Raw persisted fields as a reader may observe them.
///
/// [`SessionStore::replace`] can only produce matched snapshots, but persisted data may have
/// been written by an older client or truncated externally; [`SessionSnapshot::into_state`]
/// classifies the result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
	/// Persisted access token, if present.
	pub access_token: Option<TokenSecret>,
	/// Persisted refresh token, if present.
	pub refresh_token: Option<TokenSecret>,
	/// Persisted profile snapshot, if present.
	pub user: Option<UserProfile>,
}
impl SessionSnapshot {
	/// Interprets the snapshot: both tokens present is a session, neither is signed-out, and
	/// exactly one is corrupt.
	pub fn into_state(self) -> SnapshotState {
		match (self.access_token, self.refresh_token) {
			(Some(access_token), Some(refresh_token)) =>
				SnapshotState::Authenticated(Session { access_token, refresh_token, user: self.user }),
			(None, None) => SnapshotState::SignedOut,
			_ => SnapshotState::Corrupt,
		}
	}
}
impl From<Session> for SessionSnapshot {
	fn from(session: Session) -> Self {
		Self {
			access_token: Some(session.access_token),
			refresh_token: Some(session.refresh_token),
			user: session.user,
		}
	}
}

/// Classification produced by [`SessionSnapshot::into_state`].
#[derive(Clone, Debug)]
pub enum SnapshotState {
	/// Both tokens were present.
	Authenticated(Session),
	/// Neither token was present.
	SignedOut,
	/// Exactly one token was present; the reader must clear the store.
	Corrupt,
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn snapshot_classification_covers_all_states() {
		let full = SessionSnapshot::from(Session::new("a-1", "r-1", None));

		assert!(matches!(full.into_state(), SnapshotState::Authenticated(_)));
		assert!(matches!(SessionSnapshot::default().into_state(), SnapshotState::SignedOut));

		let access_only = SessionSnapshot {
			access_token: Some(TokenSecret::new("a-1")),
			refresh_token: None,
			user: None,
		};

		assert!(matches!(access_only.into_state(), SnapshotState::Corrupt));

		let refresh_only = SessionSnapshot {
			access_token: None,
			refresh_token: Some(TokenSecret::new("r-1")),
			user: None,
		};

		assert!(matches!(refresh_only.into_state(), SnapshotState::Corrupt));
	}

	#[test]
	fn store_error_converts_into_session_error_with_source() {
		let store_error = StoreError::Backend { message: "disk full".into() };
		let session_error: Error = store_error.clone().into();

		assert!(matches!(session_error, Error::Storage(_)));
		assert!(session_error.to_string().contains("disk full"));

		let source = StdError::source(&session_error)
			.expect("Session error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}
}
