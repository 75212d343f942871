//! Realm identifiers that key token storage and interactive remediation.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const REALM_MAX_LEN: usize = 256;

/// Authentication realm shared by every resource served from the same origin.
///
/// Tokens minted for one resource are reused for every other resource in the realm, so the
/// default realm of a resource is the ASCII serialization of its origin
/// (`scheme://host[:port]`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Realm(String);
impl Realm {
	/// Creates a realm after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, RealmError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Derives the realm from a resource identifier's origin.
	///
	/// Opaque origins (e.g. `data:` or `file:` URLs) collapse into the `null` realm.
	pub fn from_url(url: &Url) -> Self {
		Self(url.origin().ascii_serialization())
	}
}
impl Deref for Realm {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for Realm {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for Realm {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<Realm> for String {
	fn from(value: Realm) -> Self {
		value.0
	}
}
impl TryFrom<String> for Realm {
	type Error = RealmError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl FromStr for Realm {
	type Err = RealmError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for Realm {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Realm({})", self.0)
	}
}
impl Display for Realm {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Error returned when realm validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RealmError {
	/// The realm was empty.
	#[error("Realm cannot be empty.")]
	Empty,
	/// The realm contains whitespace characters.
	#[error("Realm contains whitespace.")]
	ContainsWhitespace,
	/// The realm exceeded the allowed length.
	#[error("Realm exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted length.
		max: usize,
	},
}

fn validate_view(view: &str) -> Result<(), RealmError> {
	if view.is_empty() {
		return Err(RealmError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(RealmError::ContainsWhitespace);
	}
	if view.len() > REALM_MAX_LEN {
		return Err(RealmError::TooLong { max: REALM_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Realm URL fixture should parse.")
	}

	#[test]
	fn realm_is_the_resource_origin() {
		let a = Realm::from_url(&url("https://images.example.org/iiif/a/info.json"));
		let b = Realm::from_url(&url("https://images.example.org/iiif/b/info.json"));
		let other_port = Realm::from_url(&url("https://images.example.org:8443/iiif/a/info.json"));

		assert_eq!(a.as_ref(), "https://images.example.org");
		assert_eq!(a, b);
		assert_ne!(a, other_port);
		assert_eq!(&*other_port, "https://images.example.org:8443");
	}

	#[test]
	fn opaque_origins_share_the_null_realm() {
		let realm = Realm::from_url(&url("data:application/json,{}"));

		assert_eq!(realm.as_ref(), "null");
	}

	#[test]
	fn realms_validate_on_construction_and_deserialization() {
		assert_eq!(Realm::new(""), Err(RealmError::Empty));
		assert_eq!(Realm::new("with space"), Err(RealmError::ContainsWhitespace));
		assert_eq!(
			Realm::new("a".repeat(REALM_MAX_LEN + 1)),
			Err(RealmError::TooLong { max: REALM_MAX_LEN })
		);
		Realm::new("a".repeat(REALM_MAX_LEN)).expect("Exact length should succeed.");

		let realm: Realm = serde_json::from_str("\"https://auth.example.org\"")
			.expect("Realm should deserialize successfully.");

		assert_eq!(realm.to_string(), "https://auth.example.org");
		assert!(serde_json::from_str::<Realm>("\"two words\"").is_err());
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<Realm, u8> = HashMap::from_iter([(
			Realm::new("https://images.example.org").expect("Realm fixture should be valid."),
			3_u8,
		)]);

		assert_eq!(map.get("https://images.example.org"), Some(&3));
	}
}
