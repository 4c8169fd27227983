//! Cache matching with the at-most-one rule.
//!
//! A logical token request maps to a [`CredentialFilter`]. The matcher asks the store for
//! every entity that satisfies it and then insists on a single answer: zero is a miss, one is
//! a hit, and anything more is [`Error::MultipleMatchingTokens`]. Picking the newest or the
//! first match would hide a normalization bug or a forced insertion.

// self
use crate::{
	_prelude::*,
	auth::{AccessTokenEntity, AccountInfo, ClientId, CredentialType, ScopeSet, TenantId},
	cache::{CacheStore, CredentialFilter},
};

/// Outcome of a successful cache lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheLookup {
	/// Exactly one entity answers the request.
	Hit(AccessTokenEntity),
	/// No entity answers the request.
	Miss,
}

/// Authority-side coordinates of a cache lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenQuery {
	/// Authority host the token must have been issued by.
	pub environment: String,
	/// Tenant the token must have been issued for.
	pub realm: TenantId,
	/// Scopes the token must cover.
	pub scopes: ScopeSet,
}
impl TokenQuery {
	/// Creates a query for the given host, tenant, and scopes.
	pub fn new(environment: impl Into<String>, realm: TenantId, scopes: ScopeSet) -> Self {
		Self { environment: environment.into(), realm, scopes }
	}

	/// Builds the store filter for `client_id`, optionally restricted to `account`.
	///
	/// App-only lookups (no account) only match entities with an empty home account id.
	pub fn to_filter(&self, client_id: &ClientId, account: Option<&AccountInfo>) -> CredentialFilter {
		CredentialFilter::default()
			.home_account_id(account.map(|a| a.home_account_id.clone()).unwrap_or_default())
			.environment(self.environment.clone())
			.credential_type(CredentialType::AccessToken)
			.client_id(client_id.clone())
			.realm(self.realm.clone())
			.target(self.scopes.clone())
	}
}

/// Resolves a logical token request to at most one cached access token.
pub trait CredentialMatcher
where
	Self: Send + Sync,
{
	/// Looks up the access token answering `query` for `client_id` (and `account`, if any).
	///
	/// Returns [`Error::MultipleMatchingTokens`] when more than one entity matches.
	fn read_access_token_from_cache(
		&self,
		client_id: &ClientId,
		account: Option<&AccountInfo>,
		query: &TokenQuery,
	) -> Result<CacheLookup>;
}

/// Default matcher backed by a [`CacheStore`].
#[derive(Clone)]
pub struct StoreMatcher {
	store: Arc<dyn CacheStore>,
}
impl StoreMatcher {
	/// Creates a matcher that filters `store`.
	pub fn new(store: Arc<dyn CacheStore>) -> Self {
		Self { store }
	}
}
impl CredentialMatcher for StoreMatcher {
	fn read_access_token_from_cache(
		&self,
		client_id: &ClientId,
		account: Option<&AccountInfo>,
		query: &TokenQuery,
	) -> Result<CacheLookup> {
		let filter = query.to_filter(client_id, account);
		let mut matches = self.store.get_credentials_filtered_by(&filter).access_tokens;

		if matches.len() > 1 {
			return Err(Error::MultipleMatchingTokens { count: matches.len() });
		}

		Ok(matches.pop_first().map_or(CacheLookup::Miss, |(_, entity)| CacheLookup::Hit(entity)))
	}
}
impl Debug for StoreMatcher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("StoreMatcher(..)")
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::cache::{CacheKey, CredentialCache, MemoryStore};

	const ENVIRONMENT: &str = "login.microsoftonline.com";

	fn client_id() -> ClientId {
		ClientId::new("client-1").expect("Client fixture should be valid.")
	}

	fn tenant() -> TenantId {
		TenantId::new("tenant-1").expect("Tenant fixture should be valid.")
	}

	fn entity(home_account_id: &str, secret: &str, target: &str) -> AccessTokenEntity {
		AccessTokenEntity::create_access_token_entity(
			home_account_id,
			ENVIRONMENT,
			secret,
			client_id(),
			tenant(),
			target,
			macros::datetime!(2025-01-01 00:00 UTC),
			3600,
			None,
		)
	}

	fn query(scopes: &[&str]) -> TokenQuery {
		TokenQuery::new(
			ENVIRONMENT,
			tenant(),
			ScopeSet::new(scopes.iter().copied()).expect("Scope fixture should be valid."),
		)
	}

	fn matcher_over(store: &MemoryStore) -> StoreMatcher {
		StoreMatcher::new(Arc::new(store.clone()))
	}

	#[test]
	fn empty_store_is_a_miss() {
		let store = MemoryStore::default();
		let lookup = matcher_over(&store)
			.read_access_token_from_cache(&client_id(), None, &query(&["user.read"]))
			.expect("An empty cache should not fail.");

		assert_eq!(lookup, CacheLookup::Miss);
	}

	#[test]
	fn single_match_is_returned_even_when_broader() {
		let store = MemoryStore::default();

		store.set_access_token_credential(entity("", "broad", "user.read mail.send"));

		let lookup = matcher_over(&store)
			.read_access_token_from_cache(&client_id(), None, &query(&["User.Read"]))
			.expect("A single match should not fail.");

		assert!(matches!(lookup, CacheLookup::Hit(ref e) if e.secret.expose() == "broad"));
	}

	#[test]
	fn overlapping_entries_are_ambiguous() {
		let store = MemoryStore::default();

		store.set_access_token_credential(entity("", "narrow", "user.read"));
		store.set_access_token_credential(entity("", "broad", "user.read mail.send"));

		let err = matcher_over(&store)
			.read_access_token_from_cache(&client_id(), None, &query(&["user.read"]))
			.expect_err("Two matching tokens must be reported.");

		assert!(matches!(err, Error::MultipleMatchingTokens { count: 2 }));

		let lookup = matcher_over(&store)
			.read_access_token_from_cache(&client_id(), None, &query(&["mail.send"]))
			.expect("Only the broad token covers mail.send.");

		assert!(matches!(lookup, CacheLookup::Hit(ref e) if e.secret.expose() == "broad"));
	}

	#[test]
	fn account_scopes_the_lookup() {
		let store = MemoryStore::default();
		let account = AccountInfo::new("uid.utid", ENVIRONMENT, tenant());

		store.set_access_token_credential(entity("", "app", "user.read"));
		store.set_access_token_credential(entity("uid.utid", "user", "user.read"));

		let matcher = matcher_over(&store);
		let app = matcher
			.read_access_token_from_cache(&client_id(), None, &query(&["user.read"]))
			.expect("App-only lookups should ignore user tokens.");
		let user = matcher
			.read_access_token_from_cache(&client_id(), Some(&account), &query(&["user.read"]))
			.expect("Account lookups should ignore app tokens.");

		assert!(matches!(app, CacheLookup::Hit(ref e) if e.secret.expose() == "app"));
		assert!(matches!(user, CacheLookup::Hit(ref e) if e.secret.expose() == "user"));
	}

	#[test]
	fn duplicates_from_a_custom_store_are_ambiguous() {
		struct DuplicatingStore;
		impl CacheStore for DuplicatingStore {
			fn set_access_token_credential(&self, _entity: AccessTokenEntity) {}

			fn get_access_token_credential(&self, _key: &CacheKey) -> Option<AccessTokenEntity> {
				None
			}

			fn get_credentials_filtered_by(&self, _filter: &CredentialFilter) -> CredentialCache {
				let mut cache = CredentialCache::default();

				cache.access_tokens.insert(CacheKey::from_raw("key1"), entity("", "a", "x"));
				cache.access_tokens.insert(CacheKey::from_raw("key2"), entity("", "a", "x"));

				cache
			}

			fn remove_access_token_credential(&self, _key: &CacheKey) -> bool {
				false
			}

			fn clear(&self) {}
		}

		let err = StoreMatcher::new(Arc::new(DuplicatingStore))
			.read_access_token_from_cache(&client_id(), None, &query(&["x"]))
			.expect_err("Identical entities under two keys must be reported.");

		assert_eq!(err.to_string(), crate::error::MULTIPLE_MATCHING_TOKENS_MESSAGE);
	}
}
