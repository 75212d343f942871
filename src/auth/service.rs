//! Authentication services advertised by access-controlled resources.

// self
use crate::_prelude::*;

const AUTH_0_PREFIX: &str = "http://iiif.io/api/auth/0/";
const AUTH_1_PREFIX: &str = "http://iiif.io/api/auth/1/";

/// Interaction pattern of an advertised authentication service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceProfile {
	/// Full login in a separate window.
	Login,
	/// Lightweight acknowledgement (terms of use) that unlocks a token.
	ClickThrough,
	/// Unattended login performed without user interaction.
	Kiosk,
	/// Credentials obtained out of band; no interaction is opened.
	External,
	/// Access token service.
	Token,
	/// Logout service.
	Logout,
	/// Profile this crate does not recognize.
	Other(String),
}
impl ServiceProfile {
	/// Parses an Auth 0.9 or 1.0 profile URI.
	pub fn from_uri(uri: &str) -> Self {
		let suffix = uri.strip_prefix(AUTH_1_PREFIX).or_else(|| uri.strip_prefix(AUTH_0_PREFIX));

		match suffix {
			Some("login") => Self::Login,
			Some("clickthrough") => Self::ClickThrough,
			Some("kiosk") => Self::Kiosk,
			Some("external") => Self::External,
			Some("token") => Self::Token,
			Some("logout") => Self::Logout,
			_ => Self::Other(uri.to_owned()),
		}
	}

	/// Returns the Auth 1.0 profile URI, or the raw URI for unrecognized profiles.
	pub fn as_uri(&self) -> &str {
		match self {
			Self::Login => "http://iiif.io/api/auth/1/login",
			Self::ClickThrough => "http://iiif.io/api/auth/1/clickthrough",
			Self::Kiosk => "http://iiif.io/api/auth/1/kiosk",
			Self::External => "http://iiif.io/api/auth/1/external",
			Self::Token => "http://iiif.io/api/auth/1/token",
			Self::Logout => "http://iiif.io/api/auth/1/logout",
			Self::Other(uri) => uri,
		}
	}

	/// Returns `true` when the service opens a user-facing window.
	pub fn is_interactive(&self) -> bool {
		matches!(self, Self::Login | Self::ClickThrough)
	}
}
impl From<String> for ServiceProfile {
	fn from(value: String) -> Self {
		Self::from_uri(&value)
	}
}
impl From<ServiceProfile> for String {
	fn from(value: ServiceProfile) -> Self {
		value.as_uri().to_owned()
	}
}
impl Display for ServiceProfile {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_uri())
	}
}

/// Reference to an authentication service discovered in a fetched resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthService {
	/// Service endpoint.
	#[serde(alias = "@id")]
	pub id: Url,
	/// Interaction pattern.
	pub profile: ServiceProfile,
	/// Short label for the button or link that opens the service.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub label: Option<String>,
	/// Longer text shown before the interaction.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Label of the confirmation control (click-through services).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub confirm_label: Option<String>,
}
impl AuthService {
	/// Creates a service reference without presentation text.
	pub fn new(id: Url, profile: ServiceProfile) -> Self {
		Self { id, profile, label: None, description: None, confirm_label: None }
	}

	/// Attaches a label.
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());

		self
	}

	/// Attaches a confirmation label.
	pub fn with_confirm_label(mut self, label: impl Into<String>) -> Self {
		self.confirm_label = Some(label.into());

		self
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn profiles_parse_both_auth_versions() {
		assert_eq!(
			ServiceProfile::from_uri("http://iiif.io/api/auth/0/clickthrough"),
			ServiceProfile::ClickThrough
		);
		assert_eq!(ServiceProfile::from_uri("http://iiif.io/api/auth/1/login"), ServiceProfile::Login);
		assert_eq!(
			ServiceProfile::from_uri("https://example.org/custom"),
			ServiceProfile::Other("https://example.org/custom".into())
		);
		assert!(ServiceProfile::ClickThrough.is_interactive());
		assert!(!ServiceProfile::Kiosk.is_interactive());
	}

	#[test]
	fn service_deserializes_from_descriptor_json() {
		let payload = r#"{
			"@id": "https://auth.example.org/clickthrough",
			"profile": "http://iiif.io/api/auth/0/clickthrough",
			"label": "Terms of Use",
			"confirmLabel": "Accept"
		}"#;
		let service: AuthService =
			serde_json::from_str(payload).expect("Click-through service should deserialize.");

		assert_eq!(service.id.as_str(), "https://auth.example.org/clickthrough");
		assert_eq!(service.profile, ServiceProfile::ClickThrough);
		assert_eq!(service.label.as_deref(), Some("Terms of Use"));
		assert_eq!(service.confirm_label.as_deref(), Some("Accept"));
		assert_eq!(service.description, None);
	}
}
