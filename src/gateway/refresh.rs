//! Refresh-token exchange with a singleflight guard and store-level coalescing.
//!
//! Many pages can observe expired-access 401s at once; only the first caller into the guard
//! performs the network exchange, while later callers re-read the store and reuse the fresh
//! session. The exchange itself is pure: it replaces the store on success and never clears
//! it, so failure policy stays with the call loop.

// self
use crate::{
	_prelude::*,
	error::{ConfigError, ProtocolError, TransportError},
	gateway::{Gateway, issuer::SessionGrant},
	http::{ApiRequest, SessionHttpClient},
	obs::{self, CallKind, CallOutcome, CallSpan},
	session::Session,
	store::StoreError,
};

/// Internal refresh outcome; the call loop maps these onto the public error taxonomy and
/// decides whether the session gets cleared.
#[derive(Debug)]
pub(crate) enum RefreshFailure {
	/// The store held no session when the guard was acquired; a peer signed out.
	SessionGone,
	/// The issuer rejected the refresh token.
	Rejected {
		/// HTTP status the issuer returned.
		status: u16,
	},
	/// The issuer responded with a payload the grant parser could not interpret.
	Malformed(ProtocolError),
	/// The exchange failed at the transport level.
	Transport(TransportError),
	/// The store failed while reading or replacing the session.
	Storage(StoreError),
	/// The exchange could not be constructed locally.
	Config(ConfigError),
}
impl From<Error> for RefreshFailure {
	fn from(e: Error) -> Self {
		match e {
			Error::Storage(e) => Self::Storage(e),
			Error::Config(e) => Self::Config(e),
			Error::Protocol(e) => Self::Malformed(e),
			Error::Transport(e) => Self::Transport(e),
			// Unauthenticated dispatches cannot produce authentication-class errors.
			Error::AuthRequired
			| Error::AuthExpired { .. }
			| Error::CredentialsRejected { .. } => Self::SessionGone,
		}
	}
}

impl<C> Gateway<C>
where
	C: ?Sized + SessionHttpClient,
{
	/// Exchanges the stored refresh token for a new session, coalescing concurrent callers.
	///
	/// `stale_access` is the access token the caller just saw rejected; when the store already
	/// holds a different one, a peer refreshed first and its session is reused without a
	/// second exchange.
	pub(crate) async fn refresh_session(
		&self,
		stale_access: &str,
	) -> Result<Session, RefreshFailure> {
		const KIND: CallKind = CallKind::Refresh;

		let span = CallSpan::new(KIND, "refresh_session");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);
		self.metrics.record_refresh_attempt();

		let result = span.instrument(self.refresh_session_guarded(stale_access)).await;

		match &result {
			Ok(_) => {
				self.metrics.record_refresh_success();
				obs::record_call_outcome(KIND, CallOutcome::Success);
			},
			Err(_) => {
				self.metrics.record_refresh_failure();
				obs::record_call_outcome(KIND, CallOutcome::Failure);
			},
		}

		result
	}

	async fn refresh_session_guarded(
		&self,
		stale_access: &str,
	) -> Result<Session, RefreshFailure> {
		let _singleflight = self.refresh_guard.lock().await;
		// A peer may have rotated the pair while this task waited on the guard; reuse its
		// session instead of spending the single-use refresh token again.
		let current = self
			.read_session()
			.await
			.map_err(RefreshFailure::Storage)?
			.ok_or(RefreshFailure::SessionGone)?;

		if current.access_token.expose() != stale_access {
			return Ok(current);
		}

		let request = ApiRequest::post(self.descriptor.issuer_paths.refresh.clone())
			.json(serde_json::json!({ "refreshToken": current.refresh_token.expose() }));
		let response = self.dispatch(&request, None).await?;

		if !response.is_success() {
			return Err(RefreshFailure::Rejected { status: response.status() });
		}

		let grant = response.json::<SessionGrant>().map_err(RefreshFailure::Malformed)?;
		let mut session = Session::from(grant);

		// Issuers may omit the profile on refresh; the cached one stays valid.
		if session.user.is_none() {
			session.user = current.user;
		}

		self.store.replace(session.clone()).await.map_err(RefreshFailure::Storage)?;

		Ok(session)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn dispatch_errors_map_onto_refresh_failures() {
		assert!(matches!(
			RefreshFailure::from(Error::Transport(TransportError::Timeout)),
			RefreshFailure::Transport(TransportError::Timeout),
		));
		assert!(matches!(
			RefreshFailure::from(Error::Storage(StoreError::Backend {
				message: "disk full".into(),
			})),
			RefreshFailure::Storage(StoreError::Backend { .. }),
		));
	}
}
