//! File-backed [`SessionStore`] mirroring the browser-local storage layout.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	session::{Session, TokenSecret, UserProfile},
	store::{SessionSnapshot, SessionStore, StoreError, StoreFuture},
};

/// Serialized document layout: three independent string-keyed entries, with the profile kept
/// as a nested JSON string exactly as the browser clients persist it.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedEntries {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	access_token: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	refresh_token: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	user: Option<String>,
}
impl PersistedEntries {
	fn from_snapshot(snapshot: &SessionSnapshot) -> Result<Self, StoreError> {
		let user = snapshot
			.user
			.as_ref()
			.map(serde_json::to_string)
			.transpose()
			.map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize profile entry: {e}"),
			})?;

		Ok(Self {
			access_token: snapshot.access_token.as_ref().map(|t| t.expose().to_owned()),
			refresh_token: snapshot.refresh_token.as_ref().map(|t| t.expose().to_owned()),
			user,
		})
	}

	fn into_snapshot(self) -> Result<SessionSnapshot, StoreError> {
		let user = self
			.user
			.as_deref()
			.map(serde_json::from_str::<UserProfile>)
			.transpose()
			.map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse profile entry: {e}"),
			})?;

		Ok(SessionSnapshot {
			access_token: self.access_token.map(TokenSecret::new),
			refresh_token: self.refresh_token.map(TokenSecret::new),
			user,
		})
	}
}

/// Persists the session triple to a JSON document after each mutation.
///
/// Writes go through a temp file followed by a rename, so a crash mid-write never leaves a
/// half-replaced triple on disk.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<SessionSnapshot>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot =
			if path.exists() { Self::load_snapshot(&path)? } else { SessionSnapshot::default() };

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	fn load_snapshot(path: &Path) -> Result<SessionSnapshot, StoreError> {
		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(SessionSnapshot::default());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;
		let entries: PersistedEntries =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		entries.into_snapshot()
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}
		Ok(())
	}

	fn persist_locked(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let entries = PersistedEntries::from_snapshot(snapshot)?;
		let serialized =
			serde_json::to_vec_pretty(&entries).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize session snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl SessionStore for FileStore {
	fn load(&self) -> StoreFuture<'_, SessionSnapshot> {
		Box::pin(async move { Ok(self.inner.read().clone()) })
	}

	fn replace(&self, session: Session) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			*guard = session.into();
			self.persist_locked(&guard)?;

			Ok(())
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			*guard = SessionSnapshot::default();
			self.persist_locked(&guard)?;

			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{
		env, process,
		time::{SystemTime, UNIX_EPOCH},
	};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::session::Role;

	fn temp_path() -> PathBuf {
		let nanos = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.expect("System clock should be past the epoch.")
			.as_nanos();
		let unique = format!("posm_session_file_store_{}_{nanos}.json", process::id());

		env::temp_dir().join(unique)
	}

	fn build_session() -> Session {
		let user = UserProfile {
			username: "field-9".into(),
			role: Role::User,
			leader: Some("lead-1".into()),
			assigned_stores: Some(vec!["store-x".into()]),
			is_super_admin: false,
		};

		Session::new("access-token", "refresh-token", Some(user))
	}

	#[test]
	fn replace_and_reload_round_trip() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.replace(build_session()))
			.expect("Failed to persist session to file store.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let snapshot =
			rt.block_on(reopened.load()).expect("Failed to load snapshot from file store.");

		assert_eq!(snapshot.access_token.as_ref().map(AsRef::as_ref), Some("access-token"));
		assert_eq!(snapshot.refresh_token.as_ref().map(AsRef::as_ref), Some("refresh-token"));
		assert_eq!(
			snapshot.user.as_ref().map(|user| user.username.as_str()),
			Some("field-9"),
		);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn persisted_document_uses_client_storage_keys() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for layout test.");

		rt.block_on(store.replace(build_session()))
			.expect("Failed to persist session for layout inspection.");

		let raw = fs::read_to_string(&path).expect("Persisted document should be readable.");
		let document: serde_json::Value =
			serde_json::from_str(&raw).expect("Persisted document should be valid JSON.");

		assert_eq!(document["accessToken"], "access-token");
		assert_eq!(document["refreshToken"], "refresh-token");
		assert!(
			document["user"].is_string(),
			"Profile must be stored as a serialized JSON string entry.",
		);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn clear_empties_the_document() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for clear test.");

		rt.block_on(store.replace(build_session())).expect("Failed to persist session.");
		rt.block_on(store.clear()).expect("Failed to clear file store.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen cleared file store.");
		let snapshot = rt.block_on(reopened.load()).expect("Failed to load cleared snapshot.");

		assert_eq!(snapshot, SessionSnapshot::default());

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}
