//! Ordered `application/x-www-form-urlencoded` bodies for token requests.

// crates.io
use url::form_urlencoded::Serializer;

/// Content type sent alongside every encoded form.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=utf-8";

/// Ordered list of token request parameters.
///
/// Keys are unique: the first value set for a key wins, so caller-supplied extras can never
/// override protocol parameters added earlier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenRequestForm {
	pairs: Vec<(String, String)>,
}
impl TokenRequestForm {
	/// Creates an empty form.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends `key=value` unless `key` is already present.
	pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.push(key, value);

		self
	}

	/// In-place variant of [`param`](Self::param); returns false if the key was already set.
	pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
		let key = key.into();

		if self.contains(&key) {
			return false;
		}

		self.pairs.push((key, value.into()));

		true
	}

	/// Returns the value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
	}

	/// Returns true when `key` has been set.
	pub fn contains(&self, key: &str) -> bool {
		self.pairs.iter().any(|(k, _)| k == key)
	}

	/// Parameters in insertion order.
	pub fn pairs(&self) -> &[(String, String)] {
		&self.pairs
	}

	/// Percent-encodes the form.
	pub fn encode(&self) -> String {
		let mut serializer = Serializer::new(String::new());

		serializer.extend_pairs(self.pairs.iter());

		serializer.finish()
	}
}
