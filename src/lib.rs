//! Challenge-response token sessions for clients and bearer-token verification for servers,
//! both backed by the same remote security service.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]
#![cfg_attr(test, allow(unused_crate_dependencies))]

pub mod auth;
pub mod endpoint;
pub mod error;
pub mod ext;
pub mod flows;
pub mod http;
pub mod obs;
pub mod verify;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// crates.io
	use base64::{Engine as _, engine::general_purpose::STANDARD};
	// self
	use crate::{
		auth::{AccountId, Credentials},
		ext::{MemoryRateLimiter, RateLimitPolicy},
		flows::{SecurityClient, TokenSession},
		http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
		verify::Verifier,
	};

	/// Security client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = SecurityClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;
	/// Token session type alias used by reqwest-backed integration tests.
	pub type ReqwestTestSession = TokenSession<ReqwestHttpClient, ReqwestTransportErrorMapper>;
	/// Verifier type alias used by reqwest-backed integration tests.
	pub type ReqwestTestVerifier = Verifier<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds test credentials pointing at the provided base server.
	pub fn test_credentials(base_server: &str, account: &str, secret: &str) -> Credentials {
		let base_server = Url::parse(base_server).expect("Failed to parse test base server URL.");
		let account = AccountId::new(account).expect("Failed to build test account identifier.");

		Credentials::new(base_server, account, secret)
	}

	/// Constructs a [`SecurityClient`] bound to `base_server` using the test transport.
	pub fn build_reqwest_test_client(base_server: &str) -> ReqwestTestClient {
		let base_server = Url::parse(base_server).expect("Failed to parse test base server URL.");

		SecurityClient::with_http_client(
			base_server,
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		)
		.expect("Failed to build test security client.")
	}

	/// Constructs a [`TokenSession`] for the provided credentials using the test transport.
	pub fn build_reqwest_test_session(
		base_server: &str,
		account: &str,
		secret: &str,
	) -> ReqwestTestSession {
		let credentials = test_credentials(base_server, account, secret);

		TokenSession::with_http_client(
			credentials,
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		)
		.expect("Failed to build test token session.")
	}

	/// Constructs a [`Verifier`] backed by a fresh [`MemoryRateLimiter`] and the test transport.
	pub fn build_reqwest_test_verifier() -> (ReqwestTestVerifier, Arc<MemoryRateLimiter>) {
		let limiter = Arc::new(MemoryRateLimiter::default());
		let policy: Arc<dyn RateLimitPolicy> = limiter.clone();
		let verifier = Verifier::with_http_client(
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		)
		.with_rate_limiter(policy);

		(verifier, limiter)
	}

	/// Encodes a JSON claims payload the way the security service encodes access tokens.
	pub fn encode_test_access_token(claims: &serde_json::Value) -> String {
		let json = serde_json::to_vec(claims).expect("Failed to serialize test claims.");

		STANDARD.encode(json)
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
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
