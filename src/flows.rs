//! Confidential client orchestrating cache-first `client_credentials` acquisitions.

pub mod common;

mod client_credentials;

pub use common::*;

// self
use crate::{
	_prelude::*,
	auth::{ClientId, TokenSecret},
	authority::Authority,
	cache::{CacheStore, CredentialMatcher, StoreMatcher},
	clock::{Clock, SystemClock},
	oauth::TokenNetworkClient,
};
#[cfg(feature = "reqwest")] use crate::oauth::ReqwestTokenNetwork;

/// `client_assertion_type` for signed JWT client assertions.
pub const CLIENT_ASSERTION_TYPE_JWT_BEARER: &str =
	"urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Credential proving the client's identity to the token endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientCredential {
	/// Shared secret sent as `client_secret`.
	Secret(TokenSecret),
	/// Pre-minted assertion sent as `client_assertion`.
	Assertion {
		/// Signed assertion.
		assertion: TokenSecret,
		/// Value sent as `client_assertion_type`.
		assertion_type: String,
	},
}

/// Confidential OAuth 2.0 client that acquires app-only tokens.
///
/// The store, matcher, clock, and network collaborator are injected trait objects, so one
/// client can be wired to a shared cache in production and to fakes in tests. The client is
/// cheap to clone; clones share every collaborator.
#[derive(Clone)]
pub struct ClientCredentialClient {
	/// Client identifier sent as `client_id`.
	pub client_id: ClientId,
	/// Authority tokens are requested from.
	pub authority: Authority,
	credential: Option<ClientCredential>,
	store: Arc<dyn CacheStore>,
	matcher: Arc<dyn CredentialMatcher>,
	clock: Arc<dyn Clock>,
	network: Arc<dyn TokenNetworkClient>,
	token_renewal_offset: Duration,
	client_capabilities: Vec<String>,
}
impl ClientCredentialClient {
	/// Creates a client that reuses the caller-provided network collaborator.
	///
	/// The matcher defaults to a [`StoreMatcher`] over `store`, the clock to [`SystemClock`],
	/// and the renewal offset to [`crate::auth::DEFAULT_TOKEN_RENEWAL_OFFSET`].
	pub fn with_network(
		client_id: ClientId,
		authority: Authority,
		store: Arc<dyn CacheStore>,
		network: Arc<dyn TokenNetworkClient>,
	) -> Self {
		Self {
			client_id,
			authority,
			credential: None,
			matcher: Arc::new(StoreMatcher::new(store.clone())),
			store,
			clock: Arc::new(SystemClock),
			network,
			token_renewal_offset: crate::auth::DEFAULT_TOKEN_RENEWAL_OFFSET,
			client_capabilities: Vec::new(),
		}
	}

	/// Authenticates with a client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.credential = Some(ClientCredential::Secret(TokenSecret::new(secret)));

		self
	}

	/// Authenticates with a signed JWT client assertion.
	pub fn with_client_assertion(mut self, assertion: impl Into<String>) -> Self {
		self.credential = Some(ClientCredential::Assertion {
			assertion: TokenSecret::new(assertion),
			assertion_type: CLIENT_ASSERTION_TYPE_JWT_BEARER.into(),
		});

		self
	}

	/// Replaces the cache matcher.
	pub fn with_matcher(mut self, matcher: Arc<dyn CredentialMatcher>) -> Self {
		self.matcher = matcher;

		self
	}

	/// Replaces the time source used for expiry checks and `cached_at`.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Overrides how long before `expires_on` a cached token stops being served.
	///
	/// Negative offsets clamp to zero.
	pub fn with_token_renewal_offset(mut self, offset: Duration) -> Self {
		self.token_renewal_offset = if offset.is_negative() { Duration::ZERO } else { offset };

		self
	}

	/// Declares client capabilities (e.g. `CP1`) sent inside the `claims` parameter.
	pub fn with_client_capabilities<I, S>(mut self, capabilities: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.client_capabilities = capabilities.into_iter().map(Into::into).collect();

		self
	}

	/// Cache the client reads from and writes to.
	pub fn store(&self) -> &Arc<dyn CacheStore> {
		&self.store
	}

	/// Configured renewal offset.
	pub fn token_renewal_offset(&self) -> Duration {
		self.token_renewal_offset
	}

	/// Configured client capabilities.
	pub fn client_capabilities(&self) -> &[String] {
		&self.client_capabilities
	}
}
#[cfg(feature = "reqwest")]
impl ClientCredentialClient {
	/// Creates a client backed by the crate's reqwest transport.
	pub fn new(client_id: ClientId, authority: Authority, store: Arc<dyn CacheStore>) -> Self {
		Self::with_network(client_id, authority, store, Arc::new(ReqwestTokenNetwork::default()))
	}
}
impl Debug for ClientCredentialClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentialClient")
			.field("client_id", &self.client_id)
			.field("authority", &self.authority)
			.field("credential_set", &self.credential.is_some())
			.field("token_renewal_offset", &self.token_renewal_offset)
			.field("client_capabilities", &self.client_capabilities)
			.finish()
	}
}
