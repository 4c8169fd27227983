//! Credential cache contracts: derived keys, filters, and the store trait.
//!
//! A [`CacheStore`] only stores and filters entities. Expiry decisions live in
//! [`crate::auth::is_token_expired`] and the at-most-one rule lives in
//! [`matcher::CredentialMatcher`].

pub mod matcher;
pub mod memory;

pub use matcher::*;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{AccessTokenEntity, ClientId, CredentialType, ScopeSet, TenantId},
};

/// Storage contract for cached credentials.
///
/// Implementations must be safe under concurrent access and must never expose a partially
/// written entity. Lookups are synchronous; only the token endpoint round-trip suspends.
pub trait CacheStore
where
	Self: Send + Sync,
{
	/// Inserts or overwrites the entity stored under its derived key.
	fn set_access_token_credential(&self, entity: AccessTokenEntity);

	/// Returns the entity stored under `key`, if any.
	fn get_access_token_credential(&self, key: &CacheKey) -> Option<AccessTokenEntity>;

	/// Returns every stored credential accepted by `filter`.
	fn get_credentials_filtered_by(&self, filter: &CredentialFilter) -> CredentialCache;

	/// Removes the entity stored under `key`; returns false if there was none.
	fn remove_access_token_credential(&self, key: &CacheKey) -> bool;

	/// Drops every stored credential.
	fn clear(&self);

	/// Stores a freshly issued token and evicts the tokens it supersedes.
	///
	/// Every access token of the same identity (home account, environment, client, realm)
	/// whose scopes [intersect](ScopeSet::intersects) the new token's is removed first, so a
	/// later lookup cannot match both the new token and a stale or overlapping one. Returns
	/// the number of evicted entities, not counting one stored under the same key.
	///
	/// The default implementation is not atomic; stores with their own locking should
	/// override it.
	fn replace_access_token_credential(&self, entity: AccessTokenEntity) -> usize {
		let key = entity.cache_key();
		let superseded = superseded_keys(
			&self.get_credentials_filtered_by(&CredentialFilter::same_identity(&entity)),
			&entity,
			&key,
		);

		for stale in &superseded {
			self.remove_access_token_credential(stale);
		}

		self.set_access_token_credential(entity);

		superseded.len()
	}
}

/// Deterministic cache key derived from a credential's identity and scope set.
///
/// Components are stored apart and compared one by one, so identifiers that contain the `-`
/// separator cannot collide. [`Display`] renders
/// `{home_account_id}-{environment}-{credential_type}-{client_id}-{realm}-{target}` in lower
/// case, with the target in canonical scope order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(Vec<String>);
impl CacheKey {
	/// Derives a key from its components.
	pub fn new(
		home_account_id: &str,
		environment: &str,
		credential_type: CredentialType,
		client_id: &str,
		realm: &str,
		target: &ScopeSet,
	) -> Self {
		let target = target.normalized();

		Self(
			[home_account_id, environment, credential_type.as_str(), client_id, realm, target.as_str()]
				.into_iter()
				.map(str::to_lowercase)
				.collect(),
		)
	}

	/// Derives the key for an access token entity.
	pub fn for_access_token(entity: &AccessTokenEntity) -> Self {
		Self::new(
			&entity.home_account_id,
			&entity.environment,
			entity.credential_type,
			&entity.client_id,
			&entity.realm,
			&entity.scopes(),
		)
	}

	/// Wraps an externally chosen key verbatim.
	///
	/// Custom stores that import foreign cache formats may carry keys that were not derived by
	/// this crate. A raw key is one opaque component and never equals a derived key.
	pub fn from_raw(raw: impl Into<String>) -> Self {
		Self(vec![raw.into()])
	}

	/// Key components in derivation order.
	pub fn components(&self) -> &[String] {
		&self.0
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0.join("-"))
	}
}

/// Predicate over stored credentials; unset fields match anything.
///
/// Identity fields compare case-insensitively. `target` matches when the entity's granted
/// scopes are a superset of the requested ones, so a broader token can answer a narrower
/// request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialFilter {
	/// Required home account identifier (empty string for app-only tokens).
	pub home_account_id: Option<String>,
	/// Required authority host.
	pub environment: Option<String>,
	/// Required credential kind.
	pub credential_type: Option<CredentialType>,
	/// Required client identifier.
	pub client_id: Option<ClientId>,
	/// Required tenant.
	pub realm: Option<TenantId>,
	/// Scopes the credential must cover.
	pub target: Option<ScopeSet>,
}
impl CredentialFilter {
	/// Restricts matches to a home account identifier.
	pub fn home_account_id(mut self, value: impl Into<String>) -> Self {
		self.home_account_id = Some(value.into());

		self
	}

	/// Restricts matches to an authority host.
	pub fn environment(mut self, value: impl Into<String>) -> Self {
		self.environment = Some(value.into());

		self
	}

	/// Restricts matches to a credential kind.
	pub fn credential_type(mut self, value: CredentialType) -> Self {
		self.credential_type = Some(value);

		self
	}

	/// Restricts matches to a client.
	pub fn client_id(mut self, value: ClientId) -> Self {
		self.client_id = Some(value);

		self
	}

	/// Restricts matches to a tenant.
	pub fn realm(mut self, value: TenantId) -> Self {
		self.realm = Some(value);

		self
	}

	/// Requires the credential to cover `scopes`.
	pub fn target(mut self, scopes: ScopeSet) -> Self {
		self.target = Some(scopes);

		self
	}

	/// Matches access tokens issued to the same account, client, and tenant by the same host
	/// as `entity`, whatever their scopes.
	pub fn same_identity(entity: &AccessTokenEntity) -> Self {
		Self::default()
			.home_account_id(entity.home_account_id.clone())
			.environment(entity.environment.clone())
			.credential_type(entity.credential_type)
			.client_id(entity.client_id.clone())
			.realm(entity.realm.clone())
	}

	/// Returns true when the filter admits credentials of `kind`.
	pub fn selects(&self, kind: CredentialType) -> bool {
		self.credential_type.is_none_or(|wanted| wanted == kind)
	}

	/// Returns true when `entity` satisfies every populated field.
	pub fn matches_access_token(&self, entity: &AccessTokenEntity) -> bool {
		self.selects(entity.credential_type)
			&& field_matches(self.home_account_id.as_deref(), &entity.home_account_id)
			&& field_matches(self.environment.as_deref(), &entity.environment)
			&& field_matches(self.client_id.as_deref(), &entity.client_id)
			&& field_matches(self.realm.as_deref(), &entity.realm)
			&& self.target.as_ref().is_none_or(|wanted| entity.scopes().contains_all(wanted))
	}
}

/// Read-only query result holding one typed map per credential kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialCache {
	/// Matching access tokens keyed by their cache key.
	pub access_tokens: BTreeMap<CacheKey, AccessTokenEntity>,
}
impl CredentialCache {
	/// Total number of credentials across every kind.
	pub fn len(&self) -> usize {
		self.access_tokens.len()
	}

	/// Returns true if the query matched nothing.
	pub fn is_empty(&self) -> bool {
		self.access_tokens.is_empty()
	}
}

/// Keys in `candidates` whose entities `fresh` supersedes, excluding `fresh_key` itself.
pub(crate) fn superseded_keys(
	candidates: &CredentialCache,
	fresh: &AccessTokenEntity,
	fresh_key: &CacheKey,
) -> Vec<CacheKey> {
	let granted = fresh.scopes();

	candidates
		.access_tokens
		.iter()
		.filter(|(key, stale)| *key != fresh_key && stale.scopes().intersects(&granted))
		.map(|(key, _)| key.clone())
		.collect()
}

fn field_matches(wanted: Option<&str>, actual: &str) -> bool {
	wanted.is_none_or(|wanted| wanted.eq_ignore_ascii_case(actual))
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn entity(environment: &str, realm: &str, target: &str) -> AccessTokenEntity {
		AccessTokenEntity::create_access_token_entity(
			"",
			environment,
			"secret",
			ClientId::new("client-1").expect("Client fixture should be valid."),
			TenantId::new(realm).expect("Tenant fixture should be valid."),
			target,
			macros::datetime!(2025-01-01 00:00 UTC),
			3600,
			None,
		)
	}

	#[test]
	fn cache_key_is_canonical() {
		let lhs = entity("login.microsoftonline.com", "Tenant-A", "User.Read Mail.Send");
		let rhs = entity("LOGIN.microsoftonline.com", "tenant-a", "mail.send user.read");

		assert_eq!(lhs.cache_key(), rhs.cache_key());
		assert_eq!(
			lhs.cache_key().to_string(),
			"-login.microsoftonline.com-accesstoken-client-1-tenant-a-mail.send user.read"
		);
	}

	#[test]
	fn cache_key_components_never_bleed_into_each_other() {
		let scopes = ScopeSet::new(["user.read"]).expect("Scope fixture should be valid.");
		let key = |client_id: &str, realm: &str| {
			CacheKey::new(
				"",
				"login.microsoftonline.com",
				CredentialType::AccessToken,
				client_id,
				realm,
				&scopes,
			)
		};
		let lhs = key("a-b", "c");
		let rhs = key("a", "b-c");

		assert_eq!(lhs.to_string(), rhs.to_string());
		assert_ne!(lhs, rhs);
		assert_eq!(lhs.components()[3..5], ["a-b", "c"]);
		assert_ne!(CacheKey::from_raw(lhs.to_string()), lhs);
	}

	#[test]
	fn cache_key_separates_identities() {
		let base = entity("login.microsoftonline.com", "tenant-a", "user.read");

		assert_ne!(
			base.cache_key(),
			entity("login.microsoftonline.com", "tenant-b", "user.read").cache_key()
		);
		assert_ne!(
			base.cache_key(),
			entity("login.microsoftonline.us", "tenant-a", "user.read").cache_key()
		);
		assert_ne!(
			base.cache_key(),
			entity("login.microsoftonline.com", "tenant-a", "user.read mail.send").cache_key()
		);
	}

	#[test]
	fn filter_matches_identity_and_scope_superset() {
		let stored = entity("login.microsoftonline.com", "tenant-a", "User.Read Mail.Send");
		let narrower = ScopeSet::new(["user.read"]).expect("Scope fixture should be valid.");
		let broader =
			ScopeSet::new(["user.read", "files.read"]).expect("Scope fixture should be valid.");
		let filter = CredentialFilter::default()
			.home_account_id("")
			.environment("login.microsoftonline.com")
			.credential_type(CredentialType::AccessToken)
			.client_id(ClientId::new("client-1").expect("Client fixture should be valid."))
			.realm(TenantId::new("TENANT-A").expect("Tenant fixture should be valid."));

		assert!(filter.clone().target(narrower).matches_access_token(&stored));
		assert!(!filter.clone().target(broader).matches_access_token(&stored));
		assert!(!filter.clone().environment("login.partner.cn").matches_access_token(&stored));
		assert!(!filter.clone().home_account_id("uid.utid").matches_access_token(&stored));
		assert!(!filter.credential_type(CredentialType::IdToken).matches_access_token(&stored));
	}

	#[test]
	fn empty_filter_matches_everything() {
		let filter = CredentialFilter::default();

		assert!(filter.selects(CredentialType::RefreshToken));
		assert!(
			filter.matches_access_token(&entity("login.microsoftonline.com", "tenant-a", ""))
		);
	}
}
