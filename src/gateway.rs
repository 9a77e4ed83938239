//! The authenticated request gateway and the issuer operations built on it.

pub mod metrics;

mod call;
mod issuer;
mod refresh;

pub use issuer::Credentials;
pub use metrics::SessionMetrics;

// self
use crate::{
	_prelude::*,
	descriptor::ServiceDescriptor,
	http::SessionHttpClient,
	session::Session,
	store::{SessionStore, SnapshotState, StoreError},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

pub(crate) const HTTP_UNAUTHORIZED: u16 = 401;

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestHttpClient>;

/// Drives every protected call for a page family: bearer attachment, refresh-on-401 with a
/// one-retry budget, silent rotation, and terminal session resets.
///
/// The gateway owns the transport, the session store, and the service descriptor so page
/// controllers only describe requests. It signals authentication failures; acting on them
/// (navigating to a login surface) stays with the caller, which keeps the gateway testable
/// and composable.
#[derive(Clone)]
pub struct Gateway<C>
where
	C: ?Sized + SessionHttpClient,
{
	/// Transport used for every outbound call.
	pub http_client: Arc<C>,
	/// Session store shared with the bootstrapper.
	pub store: Arc<dyn SessionStore>,
	/// Backend endpoints and timeout policy.
	pub descriptor: ServiceDescriptor,
	/// Counters for refreshes, rotations, and forced resets.
	pub metrics: Arc<SessionMetrics>,
	refresh_guard: Arc<AsyncMutex<()>>,
}
impl<C> Gateway<C>
where
	C: ?Sized + SessionHttpClient,
{
	/// Creates a gateway that reuses a caller-provided transport.
	pub fn with_http_client(
		store: Arc<dyn SessionStore>,
		descriptor: ServiceDescriptor,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			store,
			descriptor,
			metrics: Default::default(),
			refresh_guard: Default::default(),
		}
	}

	/// Reads the persisted snapshot, clearing it first when it violates the both-or-neither
	/// token invariant.
	pub(crate) async fn read_session(&self) -> Result<Option<Session>, StoreError> {
		match self.store.load().await?.into_state() {
			SnapshotState::Authenticated(session) => Ok(Some(session)),
			SnapshotState::SignedOut => Ok(None),
			SnapshotState::Corrupt => {
				self.store.clear().await?;
				self.metrics.record_session_reset();

				Ok(None)
			},
		}
	}

	/// Clears the store and counts the forced reset.
	pub(crate) async fn reset_session(&self) -> Result<(), StoreError> {
		self.store.clear().await?;
		self.metrics.record_session_reset();

		Ok(())
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestHttpClient> {
	/// Creates a gateway with the crate's default reqwest transport.
	pub fn new(store: Arc<dyn SessionStore>, descriptor: ServiceDescriptor) -> Self {
		Self::with_http_client(store, descriptor, ReqwestHttpClient::default())
	}
}
impl<C> Debug for Gateway<C>
where
	C: ?Sized + SessionHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway").field("descriptor", &self.descriptor).finish()
	}
}
