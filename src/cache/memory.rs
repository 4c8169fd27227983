//! Thread-safe in-memory [`CacheStore`] owned by a client for its whole lifetime.

// self
use crate::{
	_prelude::*,
	auth::{AccessTokenEntity, CredentialType},
	cache::{self, CacheKey, CacheStore, CredentialCache, CredentialFilter},
};

type AccessTokenMap = Arc<RwLock<HashMap<CacheKey, AccessTokenEntity>>>;

/// In-process credential cache.
///
/// Clones share the same underlying maps, so a test can keep a handle while the client owns
/// another. Readers always receive cloned entities.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	access_tokens: AccessTokenMap,
}
impl MemoryStore {
	/// Number of cached access tokens.
	pub fn len(&self) -> usize {
		self.access_tokens.read().len()
	}

	/// Returns true when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.access_tokens.read().is_empty()
	}

	/// Point-in-time copy of every cached access token.
	pub fn access_tokens(&self) -> Vec<AccessTokenEntity> {
		self.access_tokens.read().values().cloned().collect()
	}
}
impl CacheStore for MemoryStore {
	fn set_access_token_credential(&self, entity: AccessTokenEntity) {
		let key = entity.cache_key();

		self.access_tokens.write().insert(key, entity);
	}

	fn get_access_token_credential(&self, key: &CacheKey) -> Option<AccessTokenEntity> {
		self.access_tokens.read().get(key).cloned()
	}

	fn get_credentials_filtered_by(&self, filter: &CredentialFilter) -> CredentialCache {
		filtered(&self.access_tokens.read(), filter)
	}

	fn remove_access_token_credential(&self, key: &CacheKey) -> bool {
		self.access_tokens.write().remove(key).is_some()
	}

	fn clear(&self) {
		self.access_tokens.write().clear();
	}

	fn replace_access_token_credential(&self, entity: AccessTokenEntity) -> usize {
		let key = entity.cache_key();
		let mut access_tokens = self.access_tokens.write();
		let superseded = cache::superseded_keys(
			&filtered(&access_tokens, &CredentialFilter::same_identity(&entity)),
			&entity,
			&key,
		);

		for stale in &superseded {
			access_tokens.remove(stale);
		}

		access_tokens.insert(key, entity);

		superseded.len()
	}
}

fn filtered(
	access_tokens: &HashMap<CacheKey, AccessTokenEntity>,
	filter: &CredentialFilter,
) -> CredentialCache {
	if !filter.selects(CredentialType::AccessToken) {
		return CredentialCache::default();
	}

	let access_tokens = access_tokens
		.iter()
		.filter(|(_, entity)| filter.matches_access_token(entity))
		.map(|(key, entity)| (key.clone(), entity.clone()))
		.collect();

	CredentialCache { access_tokens }
}
