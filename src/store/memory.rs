//! Thread-safe in-memory [`SessionStore`] for local development and tests.

// self
use crate::{
	_prelude::*,
	session::Session,
	store::{SessionSnapshot, SessionStore, StoreFuture},
};

type Slot = Arc<RwLock<SessionSnapshot>>;

/// In-process store that keeps the session triple behind a single lock, so the whole-triple
/// replacement guarantee holds trivially.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Slot);
impl MemoryStore {
	/// Overwrites the raw snapshot directly, bypassing the triple invariant.
	///
	/// Only tests need this: [`SessionStore::replace`] cannot produce a mismatched snapshot,
	/// yet corruption handling still has to be exercised.
	pub fn inject_snapshot(&self, snapshot: SessionSnapshot) {
		*self.0.write() = snapshot;
	}

	fn load_now(slot: Slot) -> SessionSnapshot {
		slot.read().clone()
	}

	fn replace_now(slot: Slot, session: Session) {
		*slot.write() = session.into();
	}

	fn clear_now(slot: Slot) {
		*slot.write() = SessionSnapshot::default();
	}
}
impl SessionStore for MemoryStore {
	fn load(&self) -> StoreFuture<'_, SessionSnapshot> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(Self::load_now(slot)) })
	}

	fn replace(&self, session: Session) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			Self::replace_now(slot, session);

			Ok(())
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			Self::clear_now(slot);

			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::session::{Role, UserProfile};

	fn profile() -> UserProfile {
		UserProfile {
			username: "field-1".into(),
			role: Role::User,
			leader: None,
			assigned_stores: None,
			is_super_admin: false,
		}
	}

	#[tokio::test]
	async fn replace_overwrites_the_whole_triple() {
		let store = MemoryStore::default();

		store
			.replace(Session::new("a-1", "r-1", Some(profile())))
			.await
			.expect("First replace should succeed.");
		store
			.replace(Session::new("a-2", "r-2", None))
			.await
			.expect("Second replace should succeed.");

		let snapshot = store.load().await.expect("Load should succeed.");

		assert_eq!(snapshot.access_token.as_ref().map(AsRef::as_ref), Some("a-2"));
		assert_eq!(snapshot.refresh_token.as_ref().map(AsRef::as_ref), Some("r-2"));
		assert_eq!(snapshot.user, None, "Profile from the first triple must not survive.");
	}

	#[tokio::test]
	async fn clear_removes_all_three_fields() {
		let store = MemoryStore::default();

		store
			.replace(Session::new("a-1", "r-1", Some(profile())))
			.await
			.expect("Replace should succeed.");
		store.clear().await.expect("Clear should succeed.");

		assert_eq!(store.load().await.expect("Load should succeed."), SessionSnapshot::default());
	}
}
