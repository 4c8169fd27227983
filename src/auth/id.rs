//! Application and directory identifiers used as authority path segments and cache key material.

// std
use std::{borrow::Borrow, ops::Deref};
// crates.io
use uuid::Uuid;
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// `Client` or `Tenant`.
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// `Client` or `Tenant`.
		kind: &'static str,
	},
	/// The identifier contains a character that cannot appear in an authority path segment.
	#[error("{kind} identifier contains the reserved character {character:?}.")]
	ReservedCharacter {
		/// `Client` or `Tenant`.
		kind: &'static str,
		/// Offending character.
		character: char,
	},
	/// The identifier exceeded the allowed byte count.
	#[error("{kind} identifier exceeds {max} bytes.")]
	TooLong {
		/// `Client` or `Tenant`.
		kind: &'static str,
		/// Maximum permitted length.
		max: usize,
	},
}

/// Application (client) identifier registered with the authority.
///
/// Usually a GUID, but app ID URIs and legacy names are accepted; only blanks, whitespace, and
/// oversized values are rejected.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);
impl ClientId {
	/// Validates and wraps an application identifier.
	pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
		let value = value.into();

		check_common("Client", &value)?;

		Ok(Self(value))
	}

	/// Returns true when the identifier is a hyphenated GUID.
	pub fn is_guid(&self) -> bool {
		is_hyphenated_guid(&self.0)
	}
}

/// Well-known tenant aliases that name a class of directories rather than one directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TenantAlias {
	/// Work, school, and personal accounts.
	Common,
	/// Work and school accounts.
	Organizations,
	/// Personal accounts.
	Consumers,
}
impl TenantAlias {
	/// Path segment form of the alias.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Common => "common",
			Self::Organizations => "organizations",
			Self::Consumers => "consumers",
		}
	}

	fn parse(segment: &str) -> Option<Self> {
		[Self::Common, Self::Organizations, Self::Consumers]
			.into_iter()
			.find(|alias| segment.eq_ignore_ascii_case(alias.as_str()))
	}
}

/// Tenant (realm, directory) an authority issues tokens for.
///
/// Either a directory GUID, a verified domain (`contoso.onmicrosoft.com`), or one of the
/// [`TenantAlias`] values. The value becomes an authority path segment, so `/`, `?`, `#`,
/// and `\` are rejected.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);
impl TenantId {
	/// Validates and wraps a tenant identifier.
	pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
		let value = value.into();

		check_common("Tenant", &value)?;

		if let Some(character) = value.chars().find(|c| matches!(c, '/' | '?' | '#' | '\\')) {
			return Err(IdentifierError::ReservedCharacter { kind: "Tenant", character });
		}

		Ok(Self(value))
	}

	/// Returns the alias this tenant names, if it is not a single directory.
	pub fn alias(&self) -> Option<TenantAlias> {
		TenantAlias::parse(&self.0)
	}

	/// Returns true when the tenant is a directory GUID.
	pub fn is_guid(&self) -> bool {
		is_hyphenated_guid(&self.0)
	}
}

macro_rules! str_newtype_glue {
	($($name:ident => $kind:literal),+ $(,)?) => {$(
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, IdentifierError> {
				Self::new(value)
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, IdentifierError> {
				Self::new(s)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	)+};
}
str_newtype_glue! { ClientId => "Client", TenantId => "Tenant" }

fn check_common(kind: &'static str, value: &str) -> Result<(), IdentifierError> {
	match value {
		"" => Err(IdentifierError::Empty { kind }),
		v if v.chars().any(char::is_whitespace) => Err(IdentifierError::ContainsWhitespace { kind }),
		v if v.len() > IDENTIFIER_MAX_LEN =>
			Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN }),
		_ => Ok(()),
	}
}

fn is_hyphenated_guid(value: &str) -> bool {
	value.len() == 36 && Uuid::try_parse(value).is_ok()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn blanks_whitespace_and_length_are_rejected() {
		assert_eq!(ClientId::new(""), Err(IdentifierError::Empty { kind: "Client" }));
		assert_eq!(
			TenantId::new("tenant\u{00A0}id"),
			Err(IdentifierError::ContainsWhitespace { kind: "Tenant" })
		);
		assert!(ClientId::new("a".repeat(IDENTIFIER_MAX_LEN)).is_ok());
		assert_eq!(
			TenantId::new("a".repeat(IDENTIFIER_MAX_LEN + 1)),
			Err(IdentifierError::TooLong { kind: "Tenant", max: IDENTIFIER_MAX_LEN })
		);
	}

	#[test]
	fn tenants_must_be_single_path_segments() {
		assert_eq!(
			TenantId::new("contoso.onmicrosoft.com/v2.0"),
			Err(IdentifierError::ReservedCharacter { kind: "Tenant", character: '/' })
		);
		assert!(TenantId::new("tenant?x=1").is_err());
		assert!(ClientId::new("api://contoso/app").is_ok(), "App ID URIs are valid client ids.");
	}

	#[test]
	fn tenant_shapes_are_recognized() {
		let guid = TenantId::new("3338040d-6c67-4c5b-b112-36a304b66dad")
			.expect("GUID tenant should be valid.");
		let domain =
			TenantId::new("contoso.onmicrosoft.com").expect("Domain tenant should be valid.");
		let alias = TenantId::new("Organizations").expect("Alias tenant should be valid.");

		assert!(guid.is_guid());
		assert_eq!(guid.alias(), None);
		assert!(!domain.is_guid());
		assert_eq!(domain.alias(), None);
		assert_eq!(alias.alias(), Some(TenantAlias::Organizations));

		let undashed = TenantId::new("3338040d6c674c5bb11236a304b66dad")
			.expect("Undashed tenant should be valid.");

		assert!(!undashed.is_guid());
	}

	#[test]
	fn serde_and_lookups_use_the_raw_value() {
		let client: ClientId = serde_json::from_str("\"0813e1d1-ad72-46a9-8665-399bba48c201\"")
			.expect("Client should deserialize.");

		assert!(client.is_guid());
		assert_eq!(format!("{client:?}"), "Client(0813e1d1-ad72-46a9-8665-399bba48c201)");
		assert!(serde_json::from_str::<TenantId>("\"a/b\"").is_err());

		let map = HashMap::from([(client, 7_u8)]);

		assert_eq!(map.get("0813e1d1-ad72-46a9-8665-399bba48c201"), Some(&7));
	}
}
