// self
use crate::{
	_prelude::*,
	error::{ConfigError, ExpiryCause},
	gateway::{refresh::RefreshFailure, Gateway, HTTP_UNAUTHORIZED},
	http::{ApiRequest, ApiResponse, RequestBody, SessionHttpClient, WireRequest},
	obs::{record_call_outcome, CallKind, CallOutcome, CallSpan},
};

/// Error code the backend uses to distinguish an inactivity timeout from an ordinary expired
/// access token.
const INACTIVITY_TIMEOUT_CODE: &str = "SESSION_TIMEOUT";

/// Retry budget for one logical call: exactly one refresh-and-retry, never more.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RetryBudget {
	/// First attempt; a 401 may still be recovered by refreshing.
	Initial,
	/// Post-refresh attempt; a second 401 is terminal.
	Retried,
}

/// Minimal error-body shape the 401 classifier inspects. Unknown fields and non-JSON bodies
/// are tolerated and classify as a generic expiry.
#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
	code: Option<String>,
	error: Option<String>,
}

impl<C> Gateway<C>
where
	C: ?Sized + SessionHttpClient,
{
	/// Executes one protected call: attaches the stored bearer token, applies silent rotation,
	/// and on a recoverable 401 refreshes once and retries.
	///
	/// Application-level non-2xx responses are returned as values; only storage, transport,
	/// protocol, and authentication failures surface as errors.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		let span = CallSpan::new(CallKind::Protected, "send");

		record_call_outcome(CallKind::Protected, CallOutcome::Attempt);

		let result = span.instrument(self.send_with_budget(request)).await;

		match &result {
			Ok(_) => record_call_outcome(CallKind::Protected, CallOutcome::Success),
			Err(_) => record_call_outcome(CallKind::Protected, CallOutcome::Failure),
		}

		result
	}

	async fn send_with_budget(&self, request: ApiRequest) -> Result<ApiResponse> {
		let mut budget = RetryBudget::Initial;

		loop {
			let Some(session) = self.read_session().await? else {
				return Err(Error::AuthRequired);
			};
			let response =
				self.dispatch(&request, Some(session.access_token.expose())).await?;

			if let Some(rotated) = response.rotated_access_token() {
				self.store.replace(session.clone().with_access_token(rotated)).await?;
				self.metrics.record_rotation();
			}
			if response.status() != HTTP_UNAUTHORIZED {
				return Ok(response);
			}
			if is_inactivity_timeout(response.body()) {
				self.reset_session().await?;

				return Err(Error::AuthExpired { cause: ExpiryCause::InactivityTimeout });
			}

			match budget {
				RetryBudget::Initial =>
					match self.refresh_session(session.access_token.expose()).await {
						Ok(_) => budget = RetryBudget::Retried,
						Err(RefreshFailure::SessionGone) => return Err(Error::AuthRequired),
						Err(RefreshFailure::Storage(e)) => return Err(Error::Storage(e)),
						Err(RefreshFailure::Config(e)) => return Err(Error::Config(e)),
						Err(
							RefreshFailure::Rejected { .. }
							| RefreshFailure::Malformed(_)
							| RefreshFailure::Transport(_),
						) => {
							self.reset_session().await?;

							return Err(Error::AuthExpired {
								cause: ExpiryCause::RefreshRejected,
							});
						},
					},
				RetryBudget::Retried => {
					self.reset_session().await?;

					return Err(Error::AuthExpired { cause: ExpiryCause::RetryExhausted });
				},
			}
		}
	}

	/// Resolves an [`ApiRequest`] into a wire request and executes it.
	///
	/// The optional bearer credential is attached here and nowhere else; caller-supplied
	/// headers come after the defaults so their overrides win at the transport.
	pub(crate) async fn dispatch(
		&self,
		request: &ApiRequest,
		bearer: Option<&str>,
	) -> Result<ApiResponse> {
		let url = self.descriptor.endpoint(&request.path)?;
		let timeout = self.descriptor.timeouts.resolve(request.timeout);
		let (body, content_type) = resolve_body(&request.body)?;
		let mut headers = Vec::with_capacity(request.headers.len() + 2);

		if let Some(token) = bearer {
			headers.push(("authorization".to_owned(), format!("Bearer {token}")));
		}
		if let (Some(content_type), None) = (content_type, request.content_type_override()) {
			headers.push(("content-type".to_owned(), content_type));
		}

		headers.extend(request.headers.iter().cloned());

		let wire = WireRequest { method: request.method, url, headers, body, timeout };

		Ok(self.http_client.execute(wire).await?)
	}
}

/// Serializes the request body and derives its default content type.
fn resolve_body(body: &RequestBody) -> Result<(Vec<u8>, Option<String>), ConfigError> {
	Ok(match body {
		RequestBody::Empty => (Vec::new(), None),
		RequestBody::Json(value) => (
			serde_json::to_vec(value).map_err(|source| ConfigError::InvalidJsonBody { source })?,
			Some("application/json".to_owned()),
		),
		RequestBody::Binary { content_type, bytes } =>
			(bytes.clone(), Some(content_type.clone())),
	})
}

/// Returns `true` when a 401 body carries the explicit inactivity-timeout code in either its
/// `code` or `error` field.
fn is_inactivity_timeout(body: &[u8]) -> bool {
	let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) else {
		return false;
	};

	[envelope.code, envelope.error]
		.iter()
		.flatten()
		.any(|value| value.eq_ignore_ascii_case(INACTIVITY_TIMEOUT_CODE))
}
