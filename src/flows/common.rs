//! Request and result types shared by acquisition flows, plus claims and correlation helpers.

// std
use std::collections::HashSet;
// crates.io
use serde_json::{Map, Value, json};
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	auth::{AccessTokenEntity, AccountInfo, ScopeSet, TenantId, TokenSecret},
	error::RequestError,
};

/// Caller input for one `client_credentials` acquisition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientCredentialRequest {
	/// Requested scopes in caller order (e.g. `https://graph.microsoft.com/.default`).
	pub scopes: Vec<String>,
	/// Goes straight to the token endpoint when true.
	pub skip_cache: bool,
	/// Caller-supplied correlation id; one is generated when absent.
	pub correlation_id: Option<String>,
	/// Claims request parameter (a JSON object). Requests carrying claims bypass the cache.
	pub claims: Option<String>,
	/// Additional token request body parameters. Protocol parameters cannot be overridden.
	pub extra_parameters: BTreeMap<String, String>,
}
impl ClientCredentialRequest {
	/// Creates a request for the given scopes.
	pub fn new<I, S>(scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self { scopes: scopes.into_iter().map(Into::into).collect(), ..Default::default() }
	}

	/// Bypasses the cache for this request.
	pub fn skip_cache(mut self) -> Self {
		self.skip_cache = true;

		self
	}

	/// Overrides the cache bypass flag.
	pub fn with_skip_cache(mut self, skip_cache: bool) -> Self {
		self.skip_cache = skip_cache;

		self
	}

	/// Sets the correlation id sent as `client-request-id`.
	pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
		self.correlation_id = Some(correlation_id.into());

		self
	}

	/// Sets the claims request parameter.
	pub fn with_claims(mut self, claims: impl Into<String>) -> Self {
		self.claims = Some(claims.into());

		self
	}

	/// Adds a body parameter.
	pub fn with_extra_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.extra_parameters.insert(key.into(), value.into());

		self
	}

	/// Canonical scope set used as cache key material.
	pub fn scope_set(&self) -> Result<ScopeSet, RequestError> {
		if self.scopes.is_empty() {
			return Err(RequestError::EmptyScopes);
		}

		Ok(ScopeSet::new(self.scopes.iter().cloned())?)
	}

	/// Requested scopes in caller order with case-insensitive duplicates removed.
	pub fn requested_scopes(&self) -> Vec<String> {
		let mut seen = HashSet::new();

		self.scopes.iter().filter(|scope| seen.insert(scope.to_lowercase())).cloned().collect()
	}

	/// Returns true when a non-blank claims parameter is present.
	pub fn has_claims(&self) -> bool {
		self.claims.as_deref().is_some_and(|claims| !claims.trim().is_empty())
	}
}

/// Token handed back to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticationResult {
	/// Access token value.
	pub access_token: TokenSecret,
	/// Scopes the token answers for; the requested scopes on a cache hit.
	pub scopes: Vec<String>,
	/// True when the token came from the cache.
	pub from_cache: bool,
	/// Object id of the signed-in user; always empty for app-only tokens.
	pub unique_id: String,
	/// Tenant the token was issued for.
	pub tenant_id: TenantId,
	/// Signed-in account; always `None` for app-only tokens.
	pub account: Option<AccountInfo>,
	/// Interactive-flow state; always empty here.
	pub state: String,
	/// Nominal expiry instant.
	pub expires_on: OffsetDateTime,
	/// Extended expiry instant.
	pub extended_expires_on: OffsetDateTime,
	/// Token type (`Bearer` unless the server said otherwise).
	pub token_type: String,
	/// Correlation id of the acquisition.
	pub correlation_id: String,
}
impl AuthenticationResult {
	/// Builds an app-only result from a cached or freshly stored entity.
	pub fn from_entity(
		entity: &AccessTokenEntity,
		scopes: Vec<String>,
		from_cache: bool,
		correlation_id: impl Into<String>,
	) -> Self {
		Self {
			access_token: entity.secret.clone(),
			scopes,
			from_cache,
			unique_id: String::new(),
			tenant_id: entity.realm.clone(),
			account: None,
			state: String::new(),
			expires_on: entity.expires_on,
			extended_expires_on: entity.extended_expires_on,
			token_type: entity.token_type.clone(),
			correlation_id: correlation_id.into(),
		}
	}
}

/// Generates a random version 4 UUID in hyphenated form.
pub fn new_correlation_id() -> String {
	Uuid::new_v4().to_string()
}

/// Validates `claims` and folds client capabilities into it.
///
/// Capabilities land under `access_token.xms_cc.values`. Returns `None` when there is nothing
/// to send.
pub fn merge_claims(
	claims: Option<&str>,
	client_capabilities: &[String],
) -> Result<Option<String>, RequestError> {
	let mut merged = match claims.map(str::trim).filter(|claims| !claims.is_empty()) {
		Some(raw) => match serde_json::from_str::<Value>(raw)
			.map_err(|source| RequestError::InvalidClaims { source })?
		{
			Value::Object(map) => map,
			_ => return Err(RequestError::ClaimsNotObject),
		},
		None if client_capabilities.is_empty() => return Ok(None),
		None => Map::new(),
	};

	if !client_capabilities.is_empty() {
		let access_token = merged.entry("access_token").or_insert_with(|| Value::Object(Map::new()));

		if !access_token.is_object() {
			*access_token = Value::Object(Map::new());
		}
		if let Value::Object(access_token) = access_token {
			access_token.insert("xms_cc".into(), json!({ "values": client_capabilities }));
		}
	}

	Ok(Some(Value::Object(merged).to_string()))
}
