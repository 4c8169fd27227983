//! Immutable cached access token entity and its credential kind tag.

// self
use crate::{
	_prelude::*,
	auth::{
		ClientId, ScopeSet, TenantId,
		token::{expiry, secret::TokenSecret},
	},
	cache::CacheKey,
	clock::Clock,
};

/// Credential kinds a cache can hold; selects the typed map an entry lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CredentialType {
	/// Bearer access token issued by the token endpoint.
	AccessToken,
	/// OpenID Connect ID token.
	IdToken,
	/// Refresh token.
	RefreshToken,
}
impl CredentialType {
	/// Returns the label used inside cache keys.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialType::AccessToken => "AccessToken",
			CredentialType::IdToken => "IdToken",
			CredentialType::RefreshToken => "RefreshToken",
		}
	}
}
impl Display for CredentialType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One cached access token together with the identity it was issued for.
///
/// Entities are created once (after a successful token response or when seeding a cache) and
/// never mutated afterwards; a newer token for the same key replaces the entity wholesale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenEntity {
	/// Home account identifier; empty for app-only tokens.
	pub home_account_id: String,
	/// Authority host that issued the token.
	pub environment: String,
	/// Always [`CredentialType::AccessToken`].
	pub credential_type: CredentialType,
	/// Client the token was issued to.
	pub client_id: ClientId,
	/// Tenant the token was issued for.
	pub realm: TenantId,
	/// Access token value.
	pub secret: TokenSecret,
	/// Granted scopes as a single space-delimited string.
	pub target: String,
	/// Token type reported by the token endpoint.
	pub token_type: String,
	/// Instant the token entered the cache.
	#[serde(with = "time::serde::timestamp")]
	pub cached_at: OffsetDateTime,
	/// Nominal expiry instant.
	#[serde(with = "time::serde::timestamp")]
	pub expires_on: OffsetDateTime,
	/// Extended expiry instant for resilience scenarios.
	#[serde(with = "time::serde::timestamp")]
	pub extended_expires_on: OffsetDateTime,
}
impl AccessTokenEntity {
	/// Token type assumed when the token endpoint omits one.
	pub const DEFAULT_TOKEN_TYPE: &'static str = "Bearer";

	/// Builds an access token entity from relative lifetimes.
	///
	/// `expires_on` is `cached_at + expires_in`. `extended_expires_on` is
	/// `cached_at + ext_expires_in`, falling back to `expires_on` when no extended lifetime was
	/// offered. The scope string is stored verbatim.
	#[allow(clippy::too_many_arguments)]
	pub fn create_access_token_entity(
		home_account_id: impl Into<String>,
		environment: impl Into<String>,
		secret: impl Into<String>,
		client_id: ClientId,
		realm: TenantId,
		scopes: impl Into<String>,
		cached_at: OffsetDateTime,
		expires_in: u64,
		ext_expires_in: Option<u64>,
	) -> Self {
		let expires_on = offset_by_seconds(cached_at, expires_in);
		let extended_expires_on =
			ext_expires_in.map(|secs| offset_by_seconds(cached_at, secs)).unwrap_or(expires_on);

		Self {
			home_account_id: home_account_id.into(),
			environment: environment.into(),
			credential_type: CredentialType::AccessToken,
			client_id,
			realm,
			secret: TokenSecret::new(secret),
			target: scopes.into(),
			token_type: Self::DEFAULT_TOKEN_TYPE.into(),
			cached_at,
			expires_on,
			extended_expires_on,
		}
	}

	/// Overrides the token type (e.g. `pop`).
	pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = token_type.into();

		self
	}

	/// Granted scopes in canonical form.
	pub fn scopes(&self) -> ScopeSet {
		ScopeSet::from_target(&self.target)
	}

	/// Derived cache key for this entity.
	pub fn cache_key(&self) -> CacheKey {
		CacheKey::for_access_token(self)
	}

	/// Returns `true` when the entity is no longer usable under the given safety offset.
	pub fn is_expired<C>(&self, safety_offset: Duration, clock: &C) -> bool
	where
		C: ?Sized + Clock,
	{
		expiry::is_token_expired(self.expires_on, safety_offset, clock)
	}
}

fn offset_by_seconds(base: OffsetDateTime, secs: u64) -> OffsetDateTime {
	base.saturating_add(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)))
}
