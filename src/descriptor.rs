//! Validated backend configuration consumed by the gateway and bootstrapper.

// self
use crate::{_prelude::*, error::ConfigError, http::TimeoutClass};

/// Relative endpoint paths for the credential issuer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerPaths {
	/// Login endpoint issuing the initial token pair.
	pub login: String,
	/// Token-verification endpoint gating page entry.
	pub verify: String,
	/// Refresh endpoint exchanging the refresh token for a new pair.
	pub refresh: String,
	/// Best-effort server-side invalidation endpoint.
	pub logout: String,
}
impl Default for IssuerPaths {
	fn default() -> Self {
		Self {
			login: "/auth/login".into(),
			verify: "/auth/verify".into(),
			refresh: "/auth/refresh".into(),
			logout: "/auth/logout".into(),
		}
	}
}

/// Per-call timeout policy.
///
/// Survey uploads from in-store networks are routinely slower than dashboard traffic, so the
/// extended class exists as a separate knob instead of one inflated global timeout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutPolicy {
	/// Timeout applied to standard calls.
	pub standard: Duration,
	/// Timeout applied to extended (upload-class) calls.
	pub extended: Duration,
}
impl TimeoutPolicy {
	/// Resolves a timeout class to its concrete duration.
	pub fn resolve(&self, class: TimeoutClass) -> Duration {
		match class {
			TimeoutClass::Standard => self.standard,
			TimeoutClass::Extended => self.extended,
		}
	}
}
impl Default for TimeoutPolicy {
	fn default() -> Self {
		Self { standard: Duration::from_secs(15), extended: Duration::from_secs(60) }
	}
}

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ServiceDescriptorError {
	/// Base URL must use HTTPS unless insecure transport is explicitly allowed.
	#[error("Base URL must use HTTPS: {url}.")]
	InsecureBaseUrl {
		/// Base URL that failed validation.
		url: String,
	},
	/// Base URL must be a hierarchical URL requests can join onto.
	#[error("Base URL cannot be used as a base: {url}.")]
	CannotBeABase {
		/// Base URL that failed validation.
		url: String,
	},
	/// Timeouts must be positive.
	#[error("The {class} timeout must be positive.")]
	NonPositiveTimeout {
		/// Which timeout class failed validation.
		class: &'static str,
	},
	/// Extended timeout must not undercut the standard timeout.
	#[error("Extended timeout must be at least the standard timeout.")]
	ExtendedBelowStandard,
}

/// Immutable backend descriptor consumed by the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceDescriptor {
	/// Base URL every request path joins onto; always normalized to a trailing slash.
	pub base_url: Url,
	/// Credential-issuer endpoint paths.
	pub issuer_paths: IssuerPaths,
	/// Timeout policy.
	pub timeouts: TimeoutPolicy,
	/// Permits plain-HTTP base URLs (local development, mock servers).
	pub allow_insecure: bool,
}
impl ServiceDescriptor {
	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> ServiceDescriptorBuilder {
		ServiceDescriptorBuilder::new(base_url)
	}

	/// Joins a request path onto the base URL.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		// Leading slashes would reset the base path; strip them so `/api/` prefixes survive.
		self.base_url.join(path.trim_start_matches('/')).map_err(|source| {
			ConfigError::InvalidPath { path: path.to_owned(), source }
		})
	}

	fn validate(&self) -> Result<(), ServiceDescriptorError> {
		if self.base_url.cannot_be_a_base() {
			return Err(ServiceDescriptorError::CannotBeABase {
				url: self.base_url.to_string(),
			});
		}
		if !self.allow_insecure && self.base_url.scheme() != "https" {
			return Err(ServiceDescriptorError::InsecureBaseUrl {
				url: self.base_url.to_string(),
			});
		}
		if self.timeouts.standard.is_zero() {
			return Err(ServiceDescriptorError::NonPositiveTimeout { class: "standard" });
		}
		if self.timeouts.extended.is_zero() {
			return Err(ServiceDescriptorError::NonPositiveTimeout { class: "extended" });
		}
		if self.timeouts.extended < self.timeouts.standard {
			return Err(ServiceDescriptorError::ExtendedBelowStandard);
		}

		Ok(())
	}
}

/// Builder for [`ServiceDescriptor`] values.
#[derive(Debug)]
pub struct ServiceDescriptorBuilder {
	/// Base URL every request path joins onto.
	pub base_url: Url,
	/// Credential-issuer endpoint paths.
	pub issuer_paths: IssuerPaths,
	/// Timeout policy.
	pub timeouts: TimeoutPolicy,
	/// Permits plain-HTTP base URLs.
	pub allow_insecure: bool,
}
impl ServiceDescriptorBuilder {
	/// Creates a new builder seeded with the provided base URL.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			issuer_paths: IssuerPaths::default(),
			timeouts: TimeoutPolicy::default(),
			allow_insecure: false,
		}
	}

	/// Overrides the issuer endpoint paths.
	pub fn issuer_paths(mut self, paths: IssuerPaths) -> Self {
		self.issuer_paths = paths;

		self
	}

	/// Overrides the timeout policy.
	pub fn timeouts(mut self, timeouts: TimeoutPolicy) -> Self {
		self.timeouts = timeouts;

		self
	}

	/// Permits plain-HTTP base URLs for local development and mock servers.
	pub fn allow_insecure_transport(mut self) -> Self {
		self.allow_insecure = true;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ServiceDescriptor, ServiceDescriptorError> {
		let mut base_url = self.base_url;

		if !base_url.cannot_be_a_base() && !base_url.path().ends_with('/') {
			let normalized = format!("{}/", base_url.path());

			base_url.set_path(&normalized);
		}

		let descriptor = ServiceDescriptor {
			base_url,
			issuer_paths: self.issuer_paths,
			timeouts: self.timeouts,
			allow_insecure: self.allow_insecure,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}
