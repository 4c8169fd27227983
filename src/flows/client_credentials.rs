//! Client Credentials acquisition: cache lookup, network fetch, and cache write-back.
//!
//! [`ClientCredentialClient::acquire_token`] consults the matcher unless the request skips the
//! cache or carries claims. A single valid entity is served from the cache; a miss or an
//! expired entity triggers one token endpoint round-trip whose result is stored before it is
//! returned. Ambiguous cache state fails the call without touching the network. Concurrent
//! acquisitions for the same scopes are not coalesced; both may fetch and the last write wins.

// self
use crate::{
	_prelude::*,
	auth::AccessTokenEntity,
	cache::{CacheLookup, TokenQuery},
	error::ConfigError,
	flows::{
		ClientCredential, ClientCredentialClient,
		common::{self, AuthenticationResult, ClientCredentialRequest},
	},
	oauth::form::TokenRequestForm,
	obs::{self, CacheState, FlowOutcome},
};

const GRANT_TYPE: &str = "client_credentials";
const LIBRARY_SKU: &str = env!("CARGO_PKG_NAME");
const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");

impl ClientCredentialClient {
	/// Returns an app-only access token for `request`, from the cache when possible.
	pub async fn acquire_token(
		&self,
		request: ClientCredentialRequest,
	) -> Result<AuthenticationResult> {
		obs::record_flow_outcome(FlowOutcome::Attempt);

		let result = obs::in_acquire_span(
			&self.client_id,
			self.authority.tenant(),
			self.execute_acquisition(request),
		)
		.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(FlowOutcome::Failure),
		}

		result
	}

	/// Encodes the `client_credentials` grant body for `request`.
	///
	/// Contains `client_id`, `scope`, `grant_type`, the client credential, `client-request-id`,
	/// the library identification pair, `claims` when present, then any extra parameters that
	/// do not collide with the ones above.
	pub fn create_token_request_body(
		&self,
		request: &ClientCredentialRequest,
		correlation_id: &str,
	) -> Result<String> {
		let credential = self.credential()?;

		request.scope_set()?;

		let mut form = TokenRequestForm::new()
			.param("client_id", self.client_id.to_string())
			.param("scope", request.requested_scopes().join(" "))
			.param("grant_type", GRANT_TYPE);

		match credential {
			ClientCredential::Secret(secret) => {
				form.push("client_secret", secret.expose());
			},
			ClientCredential::Assertion { assertion, assertion_type } => {
				form.push("client_assertion", assertion.expose());
				form.push("client_assertion_type", assertion_type.as_str());
			},
		}

		form.push("client-request-id", correlation_id);
		form.push("x-client-SKU", LIBRARY_SKU);
		form.push("x-client-VER", LIBRARY_VERSION);

		if let Some(claims) =
			common::merge_claims(request.claims.as_deref(), self.client_capabilities())?
		{
			form.push("claims", claims);
		}

		for (key, value) in &request.extra_parameters {
			form.push(key.as_str(), value.as_str());
		}

		Ok(form.encode())
	}

	async fn execute_acquisition(
		&self,
		request: ClientCredentialRequest,
	) -> Result<AuthenticationResult> {
		self.credential()?;

		if let Some(alias) = self.authority.tenant().alias() {
			return Err(ConfigError::TenantAliasNotAllowed { alias: alias.as_str() }.into());
		}

		let scopes = request.scope_set()?;

		common::merge_claims(request.claims.as_deref(), self.client_capabilities())?;

		let correlation_id =
			request.correlation_id.clone().unwrap_or_else(common::new_correlation_id);

		if request.skip_cache || request.has_claims() {
			obs::observe_cache_state(CacheState::Skipped);
		} else {
			let query = TokenQuery::new(
				self.authority.environment(),
				self.authority.tenant().clone(),
				scopes,
			);

			if let Some(entity) = self.read_valid_cached_token(&query)? {
				return Ok(AuthenticationResult::from_entity(
					&entity,
					request.requested_scopes(),
					true,
					correlation_id,
				));
			}
		}

		self.fetch_and_store(&request, correlation_id).await
	}

	fn read_valid_cached_token(&self, query: &TokenQuery) -> Result<Option<AccessTokenEntity>> {
		let lookup = self
			.matcher
			.read_access_token_from_cache(&self.client_id, None, query)
			.inspect_err(|e| {
				if matches!(e, Error::MultipleMatchingTokens { .. }) {
					obs::observe_cache_state(CacheState::Ambiguous);
				}
			})?;

		match lookup {
			CacheLookup::Miss => {
				obs::observe_cache_state(CacheState::Miss);

				Ok(None)
			},
			CacheLookup::Hit(entity)
				if entity.is_expired(self.token_renewal_offset, self.clock.as_ref()) =>
			{
				obs::observe_cache_state(CacheState::Expired);

				Ok(None)
			},
			CacheLookup::Hit(entity) => {
				obs::observe_cache_state(CacheState::Hit);

				Ok(Some(entity))
			},
		}
	}

	async fn fetch_and_store(
		&self,
		request: &ClientCredentialRequest,
		correlation_id: String,
	) -> Result<AuthenticationResult> {
		let body = self.create_token_request_body(request, &correlation_id)?;
		let requested_at = self.clock.now();
		let response = self
			.network
			.send_token_request(self.authority.token_endpoint(), body, requested_at)
			.await?;
		let (expires_in, ext_expires_in) = response.lifetimes()?;
		let granted = response
			.scope
			.as_deref()
			.map(str::trim)
			.filter(|scope| !scope.is_empty())
			.map(str::to_owned)
			.unwrap_or_else(|| request.requested_scopes().join(" "));
		let entity = AccessTokenEntity::create_access_token_entity(
			"",
			self.authority.environment(),
			response.access_token.expose(),
			self.client_id.clone(),
			self.authority.tenant().clone(),
			granted,
			requested_at,
			expires_in,
			ext_expires_in,
		)
		.with_token_type(response.token_type);

		let evicted = self.store.replace_access_token_credential(entity.clone());

		if evicted > 0 {
			obs::trace_superseded_tokens(evicted);
		}

		let scopes = entity.target.split_whitespace().map(str::to_owned).collect();

		Ok(AuthenticationResult::from_entity(&entity, scopes, false, correlation_id))
	}

	fn credential(&self) -> Result<&ClientCredential> {
		self.credential.as_ref().ok_or_else(|| ConfigError::MissingClientCredential.into())
	}
}
