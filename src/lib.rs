//! Client session toolkit for the POSM survey platform—bearer attachment, refresh-on-401 with
//! an explicit one-retry budget, silent token rotation, and page gating in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod bootstrap;
pub mod descriptor;
pub mod error;
pub mod gateway;
pub mod http;
pub mod obs;
pub mod session;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		descriptor::ServiceDescriptor,
		gateway::Gateway,
		http::ReqwestHttpClient,
		store::{MemoryStore, SessionStore},
	};

	/// Gateway type alias used by reqwest-backed integration tests.
	pub type ReqwestTestGateway = Gateway<ReqwestHttpClient>;

	/// Builds a descriptor pointing at a local mock server, with plain HTTP permitted.
	pub fn test_descriptor(base_url: &str) -> ServiceDescriptor {
		ServiceDescriptor::builder(
			Url::parse(base_url).expect("Mock base URL should parse successfully."),
		)
		.allow_insecure_transport()
		.build()
		.expect("Service descriptor should build successfully for tests.")
	}

	/// Constructs a [`Gateway`] backed by an in-memory store and the reqwest transport used
	/// across integration tests.
	pub fn build_reqwest_test_gateway(
		descriptor: ServiceDescriptor,
	) -> (ReqwestTestGateway, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn SessionStore> = store_backend.clone();
		let gateway = Gateway::new(store, descriptor);

		(gateway, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
#[cfg(test)] use posm_session as _;
