//! Client-credentials token acquisition for confidential OAuth 2.0 apps: cache-first lookups,
//! ambiguity-safe matching, and pluggable transports.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod authority;
pub mod cache;
pub mod clock;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fixtures for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	use crate::{
		auth::{AccessTokenEntity, ClientId, TenantId},
		authority::Authority,
		cache::CacheStore,
		clock::Clock,
		error::TransientError,
		flows::ClientCredentialClient,
		oauth::{NetworkFuture, ServerTokenResponse, TokenNetworkClient},
	};
	#[cfg(feature = "reqwest")]
	use crate::{cache::MemoryStore, http::ReqwestHttpClient, oauth::ReqwestTokenNetwork};

	/// Client identifier used by fixtures.
	pub const TEST_CLIENT_ID: &str = "0813e1d1-ad72-46a9-8665-399bba48c201";
	/// Client secret used by fixtures.
	pub const TEST_CLIENT_SECRET: &str = "client_secret_value";
	/// Tenant used by fixtures.
	pub const TEST_TENANT_ID: &str = "3338040d-6c67-4c5b-b112-36a304b66dad";
	/// Authority host used by fixtures.
	pub const TEST_ENVIRONMENT: &str = "login.microsoftonline.com";
	/// Microsoft Graph default scope.
	pub const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";
	/// Instant fixture clocks start at.
	pub const TEST_NOW: OffsetDateTime = time::macros::datetime!(2025-01-01 00:00 UTC);

	/// Fixture client identifier.
	pub fn test_client_id() -> ClientId {
		ClientId::new(TEST_CLIENT_ID).expect("Fixture client identifier should be valid.")
	}

	/// Fixture tenant.
	pub fn test_tenant_id() -> TenantId {
		TenantId::new(TEST_TENANT_ID).expect("Fixture tenant identifier should be valid.")
	}

	/// Authority for [`TEST_ENVIRONMENT`] and [`TEST_TENANT_ID`].
	pub fn test_authority() -> Authority {
		Authority::parse(&format!("https://{TEST_ENVIRONMENT}/{TEST_TENANT_ID}"))
			.expect("Fixture authority should parse.")
	}

	/// App-only access token issued to the fixture client by the fixture authority.
	pub fn test_access_token(
		secret: &str,
		target: &str,
		cached_at: OffsetDateTime,
		expires_in: u64,
	) -> AccessTokenEntity {
		AccessTokenEntity::create_access_token_entity(
			"",
			TEST_ENVIRONMENT,
			secret,
			test_client_id(),
			test_tenant_id(),
			target,
			cached_at,
			expires_in,
			None,
		)
	}

	/// Request observed by [`FakeNetwork`].
	#[derive(Clone, Debug, PartialEq, Eq)]
	pub struct RecordedRequest {
		/// Token endpoint the body was posted to.
		pub endpoint: Url,
		/// Encoded form body.
		pub body: String,
		/// Client clock reading passed along with the request.
		pub requested_at: OffsetDateTime,
	}
	impl RecordedRequest {
		/// Decoded body parameters.
		pub fn params(&self) -> BTreeMap<String, String> {
			url::form_urlencoded::parse(self.body.as_bytes()).into_owned().collect()
		}
	}

	/// Scripted [`TokenNetworkClient`] that records every request.
	///
	/// Responses are consumed in order; once the script runs out every call fails with a
	/// transient error.
	#[derive(Debug, Default)]
	pub struct FakeNetwork {
		responses: Mutex<VecDeque<Result<ServerTokenResponse>>>,
		requests: Mutex<Vec<RecordedRequest>>,
	}
	impl FakeNetwork {
		/// Queues a successful response.
		pub fn respond_with(self, response: ServerTokenResponse) -> Self {
			self.responses.lock().push_back(Ok(response));

			self
		}

		/// Queues a failure.
		pub fn fail_with(self, error: Error) -> Self {
			self.responses.lock().push_back(Err(error));

			self
		}

		/// Number of requests sent so far.
		pub fn calls(&self) -> usize {
			self.requests.lock().len()
		}

		/// Every request sent so far.
		pub fn requests(&self) -> Vec<RecordedRequest> {
			self.requests.lock().clone()
		}
	}
	impl TokenNetworkClient for FakeNetwork {
		fn send_token_request<'a>(
			&'a self,
			endpoint: &'a Url,
			body: String,
			requested_at: OffsetDateTime,
		) -> NetworkFuture<'a> {
			self.requests.lock().push(RecordedRequest {
				endpoint: endpoint.clone(),
				body,
				requested_at,
			});

			let next = self.responses.lock().pop_front().unwrap_or_else(|| {
				Err(TransientError::TokenEndpoint {
					message: "No scripted response left".into(),
					status: None,
					retry_after: None,
				}
				.into())
			});

			Box::pin(async move { next })
		}
	}

	/// Fixture client authenticated with [`TEST_CLIENT_SECRET`].
	pub fn build_test_client(
		store: Arc<dyn CacheStore>,
		network: Arc<FakeNetwork>,
		clock: Arc<dyn Clock>,
	) -> ClientCredentialClient {
		ClientCredentialClient::with_network(test_client_id(), test_authority(), store, network)
			.with_client_secret(TEST_CLIENT_SECRET)
			.with_clock(clock)
	}

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs a reqwest-backed client posting to `token_endpoint`, together with a handle on
	/// its in-memory store.
	#[cfg(feature = "reqwest")]
	pub fn build_reqwest_test_client(token_endpoint: Url) -> (ClientCredentialClient, MemoryStore) {
		let store = MemoryStore::default();
		let authority = Authority::builder(test_tenant_id())
			.token_endpoint(token_endpoint)
			.build()
			.expect("Mock token endpoint should form a valid authority.");
		let network = ReqwestTokenNetwork::new(
			test_reqwest_http_client(),
			crate::oauth::ReqwestTransportErrorMapper,
		);
		let client = ClientCredentialClient::with_network(
			test_client_id(),
			authority,
			Arc::new(store.clone()),
			Arc::new(network),
		)
		.with_client_secret(TEST_CLIENT_SECRET);

		(client, store)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, oauth2_app_cache as _};
