//! Error types shared by the cache, the matcher, and token acquisition.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Message carried by [`Error::MultipleMatchingTokens`].
pub const MULTIPLE_MATCHING_TOKENS_MESSAGE: &str = "The cache contains multiple tokens satisfying the requirements. Call acquire_token again providing more requirements such as authority.";

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem or malformed token endpoint response.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The request was rejected before any cache or network work.
	#[error(transparent)]
	InvalidRequest(#[from] RequestError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// More than one cached token answers the same request.
	///
	/// The cache is in an inconsistent state (a normalization mismatch or a forced insertion);
	/// no token is returned and no network call is made.
	#[error("{}", MULTIPLE_MATCHING_TOKENS_MESSAGE)]
	MultipleMatchingTokens {
		/// Number of matching entries.
		count: usize,
	},
	/// Requested scopes are not available to the client.
	#[error("Token endpoint rejected the requested scopes: {reason}.")]
	InsufficientScope {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Authority rejected the grant.
	#[error("Authority rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider-supplied reason string.
		reason: String,
	},
}
impl Error {
	/// Stable, machine-readable code for the failure kind.
	pub fn code(&self) -> &'static str {
		match self {
			Self::Config(_) => "configuration_error",
			Self::InvalidRequest(_) => "invalid_request",
			Self::Transient(_) => "transient_error",
			Self::Transport(_) => "network_error",
			Self::MultipleMatchingTokens { .. } => "multiple_matching_tokens",
			Self::InsufficientScope { .. } => "insufficient_scope",
			Self::InvalidGrant { .. } => "invalid_grant",
			Self::InvalidClient { .. } => "invalid_client",
		}
	}

	/// Returns true for failures reported by the token endpoint round-trip.
	pub fn is_network_failure(&self) -> bool {
		matches!(
			self,
			Self::Transient(_)
				| Self::Transport(_)
				| Self::InsufficientScope { .. }
				| Self::InvalidGrant { .. }
				| Self::InvalidClient { .. }
		)
	}
}

/// Configuration and response validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Authority configuration is invalid.
	#[error(transparent)]
	InvalidAuthority(#[from] crate::authority::AuthorityError),
	/// Neither a client secret nor a client assertion was configured.
	#[error("Client credential is not configured; set a client secret or a client assertion.")]
	MissingClientCredential,
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// App-only tokens were requested from a multi-directory alias instead of one tenant.
	#[error("App-only tokens need a specific tenant, but the authority names {alias}.")]
	TenantAliasNotAllowed {
		/// Alias found in the authority path.
		alias: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Request validation failures raised before the cache or the network is consulted.
#[derive(Debug, ThisError)]
pub enum RequestError {
	/// No scopes were requested.
	#[error("At least one scope must be requested.")]
	EmptyScopes,
	/// A requested scope is malformed.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// The claims parameter is not valid JSON.
	#[error("The claims request parameter is not valid JSON.")]
	InvalidClaims {
		/// Underlying JSON failure.
		#[source]
		source: serde_json::Error,
	},
	/// The claims parameter is valid JSON but not an object.
	#[error("The claims request parameter must be a JSON object.")]
	ClaimsNotObject,
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Token endpoint returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure naming the offending field.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
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
		Self::network(e)
	}
}
