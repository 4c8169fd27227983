//! Authority configuration: where tokens come from and which tenant they are issued for.
//!
//! The authority supplies the environment (host) and realm (tenant) that cached entities are
//! keyed by, plus the token endpoint the network collaborator posts to.

// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, TenantId},
};

/// Errors raised while constructing or validating an [`Authority`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum AuthorityError {
	/// The authority or endpoint URL could not be parsed.
	#[error("Authority URL is invalid: {reason}.")]
	InvalidUrl {
		/// Parser failure description.
		reason: String,
	},
	/// Neither a token endpoint nor an environment host was supplied.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// The URL carries no host.
	#[error("Authority URL has no host: {url}.")]
	MissingHost {
		/// URL that failed validation.
		url: String,
	},
	/// The authority URL carries no tenant path segment.
	#[error("Authority URL has no tenant segment: {url}.")]
	MissingTenant {
		/// URL that failed validation.
		url: String,
	},
	/// The tenant segment is not a valid identifier.
	#[error(transparent)]
	InvalidTenant(#[from] IdentifierError),
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The token endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
}
impl From<url::ParseError> for AuthorityError {
	fn from(e: url::ParseError) -> Self {
		Self::InvalidUrl { reason: e.to_string() }
	}
}

/// Validated token authority.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Authority {
	environment: String,
	tenant: TenantId,
	token_endpoint: Url,
}
impl Authority {
	/// Path appended to `https://{host}/{tenant}` when no explicit token endpoint is given.
	pub const DEFAULT_TOKEN_PATH: &'static str = "oauth2/v2.0/token";

	/// Starts a builder for the given tenant.
	pub fn builder(tenant: TenantId) -> AuthorityBuilder {
		AuthorityBuilder::new(tenant)
	}

	/// Parses an authority URL of the form `https://{host}/{tenant}`.
	///
	/// The token endpoint becomes `https://{host}/{tenant}/oauth2/v2.0/token`.
	pub fn parse(authority: &str) -> Result<Self, AuthorityError> {
		let url = Url::parse(authority)?;
		let host = url.host_str().ok_or_else(|| AuthorityError::MissingHost { url: url.to_string() })?;
		let tenant = url
			.path_segments()
			.and_then(|mut segments| segments.find(|segment| !segment.is_empty()))
			.ok_or_else(|| AuthorityError::MissingTenant { url: url.to_string() })?;
		let tenant = TenantId::new(tenant)?;
		let mut token_endpoint = url.clone();

		token_endpoint.set_path(&format!("{tenant}/{}", Self::DEFAULT_TOKEN_PATH));
		token_endpoint.set_query(None);
		token_endpoint.set_fragment(None);

		Self::builder(tenant).environment(host).token_endpoint(token_endpoint).build()
	}

	/// Authority host recorded as the cache environment.
	pub fn environment(&self) -> &str {
		&self.environment
	}

	/// Tenant recorded as the cache realm.
	pub fn tenant(&self) -> &TenantId {
		&self.tenant
	}

	/// Token endpoint receiving `client_credentials` grants.
	pub fn token_endpoint(&self) -> &Url {
		&self.token_endpoint
	}
}

/// Builder for [`Authority`] values.
#[derive(Debug)]
pub struct AuthorityBuilder {
	/// Tenant tokens are requested for.
	pub tenant: TenantId,
	/// Explicit environment host; defaults to the token endpoint host.
	pub environment: Option<String>,
	/// Explicit token endpoint; derived from the environment when absent.
	pub token_endpoint: Option<Url>,
}
impl AuthorityBuilder {
	/// Creates a builder seeded with the tenant.
	pub fn new(tenant: TenantId) -> Self {
		Self { tenant, environment: None, token_endpoint: None }
	}

	/// Sets the environment host (e.g. `login.microsoftonline.com`).
	pub fn environment(mut self, host: impl Into<String>) -> Self {
		self.environment = Some(host.into());

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Consumes the builder and validates the resulting authority.
	pub fn build(self) -> Result<Authority, AuthorityError> {
		let token_endpoint = match (self.token_endpoint, self.environment.as_deref()) {
			(Some(url), _) => url,
			(None, Some(host)) => Url::parse(&format!(
				"https://{host}/{}/{}",
				self.tenant,
				Authority::DEFAULT_TOKEN_PATH
			))?,
			(None, None) => return Err(AuthorityError::MissingTokenEndpoint),
		};

		validate_endpoint(&token_endpoint)?;

		let environment = match self.environment {
			Some(host) if !host.trim().is_empty() => host.trim().to_ascii_lowercase(),
			_ => token_endpoint
				.host_str()
				.map(str::to_ascii_lowercase)
				.ok_or_else(|| AuthorityError::MissingHost { url: token_endpoint.to_string() })?,
		};

		Ok(Authority { environment, tenant: self.tenant, token_endpoint })
	}
}

fn validate_endpoint(url: &Url) -> Result<(), AuthorityError> {
	let host = url.host_str().ok_or_else(|| AuthorityError::MissingHost { url: url.to_string() })?;

	if url.scheme() == "https" || is_loopback(host) {
		Ok(())
	} else {
		Err(AuthorityError::InsecureEndpoint { url: url.to_string() })
	}
}

fn is_loopback(host: &str) -> bool {
	matches!(host, "localhost" | "127.0.0.1" | "[::1]")
}
