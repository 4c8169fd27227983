//! OAuth scope sets compared the way authorization servers grant them: as case-insensitive sets.

// std
use std::collections::BTreeSet;
// self
use crate::_prelude::*;

/// Scopes every OpenID Connect request carries implicitly; they never distinguish two tokens.
pub const OIDC_SCOPES: [&str; 3] = ["openid", "profile", "offline_access"];

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Canonical set of OAuth scopes.
///
/// Entries are lower-cased on the way in, so two requests that differ only in scope order or
/// casing produce the same [`normalized`](Self::normalized) string and therefore the same
/// cache key. Serialized as a sorted list; deserialization re-validates every entry.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ScopeSet(BTreeSet<String>);
impl ScopeSet {
	/// Builds a set from caller-supplied scopes, rejecting blank or padded entries.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		scopes
			.into_iter()
			.map(|scope| {
				let scope = scope.into();

				match scope {
					s if s.is_empty() => Err(ScopeValidationError::Empty),
					s if s.chars().any(char::is_whitespace) =>
						Err(ScopeValidationError::ContainsWhitespace { scope: s }),
					s => Ok(s.to_lowercase()),
				}
			})
			.collect::<Result<_, _>>()
			.map(Self)
	}

	/// Reads the space-delimited `target` of a stored or granted token.
	///
	/// Never fails: whatever the authorization server granted is kept, and any whitespace run
	/// acts as a delimiter.
	pub fn from_target(target: &str) -> Self {
		Self(target.split_whitespace().map(str::to_lowercase).collect())
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Case-insensitive membership test.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.contains(&scope.to_lowercase())
	}

	/// Returns true when `self` grants everything `requested` asks for.
	pub fn contains_all(&self, requested: &ScopeSet) -> bool {
		self.0.is_superset(&requested.0)
	}

	/// Returns true when the two sets share a scope other than the [`OIDC_SCOPES`].
	///
	/// A freshly granted token supersedes every cached token of the same identity that
	/// intersects it.
	pub fn intersects(&self, other: &ScopeSet) -> bool {
		self.0.intersection(&other.0).any(|scope| !OIDC_SCOPES.contains(&scope.as_str()))
	}

	/// Canonical scopes in sorted order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Sorted, space-delimited form used as cache key material.
	pub fn normalized(&self) -> String {
		self.iter().collect::<Vec<_>>().join(" ")
	}
}
impl TryFrom<Vec<String>> for ScopeSet {
	type Error = ScopeValidationError;

	fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<ScopeSet> for Vec<String> {
	fn from(value: ScopeSet) -> Self {
		value.0.into_iter().collect()
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_set().entries(self.iter()).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}
