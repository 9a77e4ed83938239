//! Session-protocol error types shared across the gateway, bootstrapper, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical session error exposed by public APIs.
///
/// Application-level non-2xx responses are deliberately absent: the gateway returns them as
/// plain responses for page controllers to interpret.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Credential-endpoint protocol violation.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// Transport failure (DNS, TCP, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// No credentials are stored locally; no network call was attempted.
	#[error("No session credentials are stored; sign in first.")]
	AuthRequired,
	/// Stored credentials were rejected and could not be recovered by refresh.
	#[error("Session is no longer valid: {cause}.")]
	AuthExpired {
		/// Which terminal path invalidated the session.
		cause: ExpiryCause,
	},
	/// Login was rejected by the credential issuer.
	#[error("Credentials were rejected: {reason}.")]
	CredentialsRejected {
		/// Server-supplied reason string, when present.
		reason: String,
	},
}
impl Error {
	/// Returns `true` for the authentication-class failures that require a redirect to a login
	/// surface; callers must not attempt their own recovery for these.
	pub fn requires_login(&self) -> bool {
		matches!(self, Self::AuthRequired | Self::AuthExpired { .. })
	}
}

/// Terminal causes recorded on [`Error::AuthExpired`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryCause {
	/// Server signaled an explicit inactivity timeout; refresh was not attempted.
	InactivityTimeout,
	/// The refresh exchange itself failed.
	RefreshRejected,
	/// The retried call was rejected again after a successful refresh.
	RetryExhausted,
}
impl ExpiryCause {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ExpiryCause::InactivityTimeout => "inactivity_timeout",
			ExpiryCause::RefreshRejected => "refresh_rejected",
			ExpiryCause::RetryExhausted => "retry_exhausted",
		}
	}
}
impl Display for ExpiryCause {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration and validation failures raised by the crate.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A request path could not be joined onto the base URL.
	#[error("Request path `{path}` cannot be joined onto the base URL.")]
	InvalidPath {
		/// Path the caller supplied.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A request JSON body could not be serialized.
	#[error("Request JSON body could not be serialized.")]
	InvalidJsonBody {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Credential-endpoint protocol failures (unexpected responses, malformed payloads).
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// Issuer returned a status the operation cannot interpret.
	#[error("Credential endpoint returned an unexpected response: {message}.")]
	Endpoint {
		/// Summary of the unexpected response.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Issuer responded with JSON that could not be parsed.
	#[error("Credential endpoint returned malformed JSON.")]
	Payload {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, timeout).
///
/// These are never authentication outcomes: the store is untouched and the caller decides
/// whether to retry at the application level.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The call exceeded its configured timeout.
	#[error("The call exceeded its configured timeout.")]
	Timeout,
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::network(e) }
	}
}
