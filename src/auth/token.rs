//! Opaque access tokens minted by authentication services.

// self
use crate::_prelude::*;

/// Bearer credential accepted by [`ResourceHandle::fetch`](crate::resource::ResourceHandle::fetch).
///
/// The engine only needs to know whether a token exists and whether two tokens carry the same
/// secret. The secret is redacted from `Debug` and `Display` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
	secret: String,
	issued_at: OffsetDateTime,
	expires_at: Option<OffsetDateTime>,
}
impl AccessToken {
	/// Wraps a secret issued at the current instant, without expiry.
	pub fn new(secret: impl Into<String>) -> Self {
		Self { secret: secret.into(), issued_at: OffsetDateTime::now_utc(), expires_at: None }
	}

	/// Overrides the issued-at instant.
	pub fn with_issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = instant;

		self
	}

	/// Sets the expiry relative to the issued-at instant.
	pub fn with_expires_in(mut self, duration: Duration) -> Self {
		self.expires_at = Some(self.issued_at + duration);

		self
	}

	/// Returns the secret. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.secret
	}

	/// Issued-at instant.
	pub fn issued_at(&self) -> OffsetDateTime {
		self.issued_at
	}

	/// Expiry instant, if the service reported one.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_at
	}

	/// Returns `true` if both tokens carry the same secret.
	pub fn same_secret(&self, other: &Self) -> bool {
		self.secret == other.secret
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}

	/// Returns `true` if the token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("secret", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
impl Display for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
