//! Account identity attached to user-delegated cache entries.

// self
use crate::{_prelude::*, auth::TenantId};

/// Account whose tokens a cache lookup should be restricted to.
///
/// App-only flows authenticate the application itself and never carry an account; cache
/// queries without one only match entities whose home account identifier is empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountInfo {
	/// Home account identifier (`<object id>.<home tenant id>`).
	pub home_account_id: String,
	/// Authority host the account signed in with.
	pub environment: String,
	/// Tenant the account belongs to.
	pub tenant_id: TenantId,
	/// Preferred username, if known.
	pub username: Option<String>,
}
impl AccountInfo {
	/// Creates an account for the given home account identifier, host, and tenant.
	pub fn new(
		home_account_id: impl Into<String>,
		environment: impl Into<String>,
		tenant_id: TenantId,
	) -> Self {
		Self {
			home_account_id: home_account_id.into(),
			environment: environment.into(),
			tenant_id,
			username: None,
		}
	}

	/// Attaches a preferred username.
	pub fn with_username(mut self, username: impl Into<String>) -> Self {
		self.username = Some(username.into());

		self
	}
}
