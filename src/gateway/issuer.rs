//! Credential-issuer operations: login, stored-token verification, and logout.

// self
use crate::{
	_prelude::*,
	error::{ConfigError, ProtocolError},
	gateway::{Gateway, HTTP_UNAUTHORIZED},
	http::{ApiRequest, SessionHttpClient},
	obs::{self, CallKind, CallOutcome, CallSpan},
	session::{Session, UserProfile},
};

/// Login credentials for the survey backend.
#[derive(Clone, Serialize)]
pub struct Credentials {
	/// Account name.
	pub username: String,
	/// Plain-text password; redacted from all formatting output.
	pub password: String,
}
impl Credentials {
	/// Creates a credentials pair.
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self { username: username.into(), password: password.into() }
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Token pair (and optional profile) as the issuer serializes it on login and refresh.
/// Deliberately not `Debug`; it holds raw token strings.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionGrant {
	pub access_token: String,
	pub refresh_token: String,
	#[serde(default)]
	pub user: Option<UserProfile>,
}
impl From<SessionGrant> for Session {
	fn from(grant: SessionGrant) -> Self {
		Session::new(grant.access_token, grant.refresh_token, grant.user)
	}
}

/// Rejection-body shape inspected for a human-readable login failure reason.
#[derive(Debug, Default, Deserialize)]
struct RejectionEnvelope {
	message: Option<String>,
	error: Option<String>,
}

impl<C> Gateway<C>
where
	C: ?Sized + SessionHttpClient,
{
	/// Exchanges credentials for a session, persisting the full triple atomically.
	///
	/// A 401 from the issuer means the credentials were wrong and surfaces as
	/// [`Error::CredentialsRejected`]; the stored session (if any) is left untouched so a
	/// failed re-login does not sign the user out.
	pub async fn login(&self, credentials: Credentials) -> Result<UserProfile> {
		const KIND: CallKind = CallKind::Login;

		let span = CallSpan::new(KIND, "login");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.login_inner(credentials)).await;

		obs::record_call_outcome(
			KIND,
			if result.is_ok() { CallOutcome::Success } else { CallOutcome::Failure },
		);

		result
	}

	async fn login_inner(&self, credentials: Credentials) -> Result<UserProfile> {
		let body = serde_json::to_value(&credentials)
			.map_err(|source| ConfigError::InvalidJsonBody { source })?;
		let request = ApiRequest::post(self.descriptor.issuer_paths.login.clone()).json(body);
		let response = self.dispatch(&request, None).await?;

		if response.status() == HTTP_UNAUTHORIZED {
			return Err(Error::CredentialsRejected {
				reason: rejection_reason(response.body()),
			});
		}
		if !response.is_success() {
			return Err(ProtocolError::Endpoint {
				message: format!("login failed with status {}", response.status()),
				status: Some(response.status()),
			}
			.into());
		}

		let grant = response.json::<SessionGrant>()?;
		let user = grant.user.clone().ok_or_else(|| ProtocolError::Endpoint {
			message: "login response omitted the user profile".into(),
			status: Some(response.status()),
		})?;

		self.store.replace(Session::from(grant)).await?;

		Ok(user)
	}

	/// Verifies the stored session against the issuer and re-caches the returned profile.
	///
	/// Routed through [`Gateway::send`](crate::gateway::Gateway::send), so an expired access
	/// token is refreshed transparently before verification fails.
	pub async fn verify(&self) -> Result<UserProfile> {
		const KIND: CallKind = CallKind::Verify;

		let span = CallSpan::new(KIND, "verify");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.verify_inner()).await;

		obs::record_call_outcome(
			KIND,
			if result.is_ok() { CallOutcome::Success } else { CallOutcome::Failure },
		);

		result
	}

	async fn verify_inner(&self) -> Result<UserProfile> {
		let response =
			self.send(ApiRequest::get(self.descriptor.issuer_paths.verify.clone())).await?;

		if !response.is_success() {
			return Err(ProtocolError::Endpoint {
				message: format!("verification failed with status {}", response.status()),
				status: Some(response.status()),
			}
			.into());
		}

		let user = response.json::<UserProfile>()?;

		// The server's view of the profile wins over whatever login cached.
		if let Some(session) = self.read_session().await? {
			self.store.replace(session.with_user(user.clone())).await?;
		}

		Ok(user)
	}

	/// Signs out: best-effort server-side invalidation, then an unconditional local clear.
	///
	/// Only a storage failure while clearing surfaces as an error; an unreachable or erroring
	/// issuer never blocks local sign-out.
	pub async fn logout(&self) -> Result<()> {
		const KIND: CallKind = CallKind::Logout;

		let span = CallSpan::new(KIND, "logout");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.logout_inner()).await;

		obs::record_call_outcome(
			KIND,
			if result.is_ok() { CallOutcome::Success } else { CallOutcome::Failure },
		);

		result
	}

	async fn logout_inner(&self) -> Result<()> {
		if let Ok(Some(session)) = self.read_session().await {
			let request = ApiRequest::post(self.descriptor.issuer_paths.logout.clone());
			let _ = self.dispatch(&request, Some(session.access_token.expose())).await;
		}

		self.store.clear().await?;

		Ok(())
	}
}

/// Extracts a human-readable rejection reason from a 401 login body.
fn rejection_reason(body: &[u8]) -> String {
	if let Ok(envelope) = serde_json::from_slice::<RejectionEnvelope>(body) {
		if let Some(reason) =
			[envelope.message, envelope.error].into_iter().flatten().find(|r| !r.is_empty())
		{
			return reason;
		}
	}

	let raw = String::from_utf8_lossy(body);
	let raw = raw.trim();

	if raw.is_empty() { "the issuer gave no reason".into() } else { raw.to_owned() }
}
