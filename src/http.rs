//! Transport primitives for the session gateway.
//!
//! [`SessionHttpClient`] is the crate's only dependency on an HTTP stack: the gateway resolves
//! an [`ApiRequest`] into a [`WireRequest`] (absolute URL, complete headers with the bearer
//! credential attached, concrete timeout) and hands it to the transport. Implementations
//! report failures as [`TransportError`], keeping timeouts distinct from generic network
//! faults so a slow store network is never mistaken for an authentication outcome.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{
	_prelude::*,
	error::{ProtocolError, TransportError},
};

/// Response header carrying a server-issued replacement access token (silent rotation).
pub const ROTATED_ACCESS_TOKEN_HEADER: &str = "x-new-access-token";

/// Boxed future returned by [`SessionHttpClient::execute`].
pub type TransportFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing gateway calls.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by every
/// page's gateway without additional wrappers. The request is fully resolved by the time it
/// reaches the transport; no header or body interpretation belongs here.
pub trait SessionHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Executes one fully resolved request and returns the raw response.
	fn execute(&self, request: WireRequest) -> TransportFuture<'_, ApiResponse>;
}

/// HTTP methods used by the survey backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestMethod {
	/// HTTP GET.
	Get,
	/// HTTP POST.
	Post,
	/// HTTP PUT.
	Put,
	/// HTTP DELETE.
	Delete,
}
impl RequestMethod {
	/// Returns the canonical method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestMethod::Get => "GET",
			RequestMethod::Post => "POST",
			RequestMethod::Put => "PUT",
			RequestMethod::Delete => "DELETE",
		}
	}
}
impl Display for RequestMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Request payload variants.
#[derive(Clone, Debug)]
pub enum RequestBody {
	/// No payload.
	Empty,
	/// JSON document; the gateway defaults the content type to `application/json` unless the
	/// caller overrode it.
	Json(serde_json::Value),
	/// Binary payload (photo evidence, spreadsheets) carrying its own content type; the
	/// gateway never forces a JSON content type onto it, so boundary-bearing multipart types
	/// survive intact.
	Binary {
		/// Content type the transport must send verbatim.
		content_type: String,
		/// Raw payload bytes.
		bytes: Vec<u8>,
	},
}

/// Timeout class a request selects; the descriptor's timeout policy resolves the value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimeoutClass {
	/// Default per-call timeout.
	#[default]
	Standard,
	/// Longer timeout for uploads from constrained store networks.
	Extended,
}

/// One logical protected call as page controllers describe it.
///
/// Callers never set `Authorization`; the gateway owns bearer attachment.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: RequestMethod,
	/// Path relative to the descriptor's base URL.
	pub path: String,
	/// Request payload.
	pub body: RequestBody,
	/// Caller-supplied header overrides; names are stored lowercase and win over gateway
	/// defaults.
	pub headers: Vec<(String, String)>,
	/// Timeout class for this call.
	pub timeout: TimeoutClass,
}
impl ApiRequest {
	fn new(method: RequestMethod, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			body: RequestBody::Empty,
			headers: Vec::new(),
			timeout: TimeoutClass::default(),
		}
	}

	/// Creates a GET request for the provided path.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(RequestMethod::Get, path)
	}

	/// Creates a POST request for the provided path.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(RequestMethod::Post, path)
	}

	/// Creates a PUT request for the provided path.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(RequestMethod::Put, path)
	}

	/// Creates a DELETE request for the provided path.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(RequestMethod::Delete, path)
	}

	/// Attaches a JSON payload.
	pub fn json(mut self, value: serde_json::Value) -> Self {
		self.body = RequestBody::Json(value);

		self
	}

	/// Attaches a binary payload with its own content type.
	pub fn binary(mut self, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
		self.body = RequestBody::Binary { content_type: content_type.into(), bytes };

		self
	}

	/// Adds a header override.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into().to_ascii_lowercase(), value.into()));

		self
	}

	/// Selects the extended timeout class for constrained networks.
	pub fn extended_timeout(mut self) -> Self {
		self.timeout = TimeoutClass::Extended;

		self
	}

	/// Returns the caller's content-type override, if any.
	pub(crate) fn content_type_override(&self) -> Option<&str> {
		self.headers
			.iter()
			.find(|(name, _)| name == "content-type")
			.map(|(_, value)| value.as_str())
	}
}

/// Fully resolved request handed to the transport.
#[derive(Clone)]
pub struct WireRequest {
	/// HTTP method.
	pub method: RequestMethod,
	/// Absolute URL.
	pub url: Url,
	/// Complete lowercase header list, bearer credential included.
	pub headers: Vec<(String, String)>,
	/// Resolved payload bytes.
	pub body: Vec<u8>,
	/// Concrete timeout for this dispatch.
	pub timeout: Duration,
}
impl Debug for WireRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let headers: Vec<_> = self
			.headers
			.iter()
			.map(|(name, value)| {
				if name == "authorization" { (name.as_str(), "<redacted>") } else { (name.as_str(), value.as_str()) }
			})
			.collect();

		f.debug_struct("WireRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &headers)
			.field("body_len", &self.body.len())
			.field("timeout", &self.timeout)
			.finish()
	}
}

/// Raw response surfaced to the gateway and to page controllers.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	status: u16,
	headers: Vec<(String, String)>,
	body: Vec<u8>,
}
impl ApiResponse {
	/// Builds a response from transport parts; header names are normalized to lowercase.
	pub fn from_parts(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
		let headers = headers
			.into_iter()
			.map(|(name, value)| (name.to_ascii_lowercase(), value))
			.collect();

		Self { status, headers, body }
	}

	/// HTTP status code.
	pub fn status(&self) -> u16 {
		self.status
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// First header value matching the provided name (case-insensitive).
	pub fn header(&self, name: &str) -> Option<&str> {
		let needle = name.to_ascii_lowercase();

		self.headers
			.iter()
			.find(|(header, _)| *header == needle)
			.map(|(_, value)| value.as_str())
	}

	/// Replacement access token from the silent-rotation header, if present.
	pub fn rotated_access_token(&self) -> Option<&str> {
		self.header(ROTATED_ACCESS_TOKEN_HEADER).filter(|value| !value.is_empty())
	}

	/// Raw body bytes.
	pub fn body(&self) -> &[u8] {
		&self.body
	}

	/// Consumes the response and returns the body bytes.
	pub fn into_body(self) -> Vec<u8> {
		self.body
	}

	/// Deserializes the JSON body, reporting the failing path on malformed payloads.
	pub fn json<T>(&self) -> Result<T, ProtocolError>
	where
		T: serde::de::DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ProtocolError::Payload { source, status: Some(self.status) })
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place. Per-call
/// timeouts come from the wire request, so the wrapped client needs no global timeout.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl SessionHttpClient for ReqwestHttpClient {
	fn execute(&self, request: WireRequest) -> TransportFuture<'_, ApiResponse> {
		let client = self.0.clone();

		Box::pin(async move {
			let method = match request.method {
				RequestMethod::Get => reqwest::Method::GET,
				RequestMethod::Post => reqwest::Method::POST,
				RequestMethod::Put => reqwest::Method::PUT,
				RequestMethod::Delete => reqwest::Method::DELETE,
			};
			let mut builder = client.request(method, request.url).timeout(request.timeout);

			for (name, value) in &request.headers {
				builder = builder.header(name, value);
			}
			if !request.body.is_empty() {
				builder = builder.body(request.body);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.map(|(name, value)| {
					(
						name.as_str().to_owned(),
						String::from_utf8_lossy(value.as_bytes()).into_owned(),
					)
				})
				.collect();
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(ApiResponse::from_parts(status, headers, body))
		})
	}
}
