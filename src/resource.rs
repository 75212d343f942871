//! Caller-owned external resources and the handle contract the negotiation engine drives.
//!
//! A [`ResourceHandle`] is the caller's view of one remote document: it knows how to fetch
//! itself (optionally with an [`AccessToken`]) and how to read access-control hints out of the
//! fetched payload. The engine wraps handles in [`ExternalResource`], which records the last
//! fetch status and the explicit [`NegotiationState`]. Only the engine moves that state; the
//! caller owns the wrapper for the resource's whole lifetime and may re-negotiate it at will
//! (e.g. after cookies expire).

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AuthService, Realm},
	error::TransportError,
};

/// Boxed future returned by [`ResourceHandle::fetch`].
pub type ResourceFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, TransportError>> + 'a + Send>>;

/// Result of the most recent fetch attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceStatus {
	/// No fetch has completed yet.
	#[default]
	Unknown,
	/// The request was satisfied (HTTP 200).
	Success,
	/// The server substituted a degraded variant pending authorization (HTTP 302).
	TemporaryRedirect,
	/// The server refused the request (HTTP 401).
	Unauthorized,
	/// Any other HTTP status.
	Other(u16),
}
impl ResourceStatus {
	/// Maps an HTTP status code.
	pub fn from_http(code: u16) -> Self {
		match code {
			200 => Self::Success,
			302 => Self::TemporaryRedirect,
			401 => Self::Unauthorized,
			code => Self::Other(code),
		}
	}

	/// Returns the HTTP status code, if a fetch has completed.
	pub fn code(self) -> Option<u16> {
		match self {
			Self::Unknown => None,
			Self::Success => Some(200),
			Self::TemporaryRedirect => Some(302),
			Self::Unauthorized => Some(401),
			Self::Other(code) => Some(code),
		}
	}

	/// Returns `true` for a satisfied request.
	pub fn is_success(self) -> bool {
		matches!(self, Self::Success)
	}

	/// Returns `true` when the server redirected to a degraded variant.
	pub fn is_temporary_redirect(self) -> bool {
		matches!(self, Self::TemporaryRedirect)
	}
}
impl Display for ResourceStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self.code() {
			Some(code) => write!(f, "{code}"),
			None => f.write_str("unknown"),
		}
	}
}

/// Position of a resource in the negotiation state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NegotiationState {
	/// No fetch has completed yet.
	#[default]
	Unknown,
	/// The last fetch showed no access control.
	NotControlled,
	/// The resource is access-controlled and has not been unlocked.
	AwaitingRemediation,
	/// A token-bearing fetch succeeded.
	Remediated,
}
impl NegotiationState {
	/// Computes the state that follows a completed fetch.
	pub fn after_fetch(access_controlled: bool, status: ResourceStatus, with_token: bool) -> Self {
		if !access_controlled {
			Self::NotControlled
		} else if with_token && status.is_success() {
			Self::Remediated
		} else {
			Self::AwaitingRemediation
		}
	}
}

/// Contract implemented by callers for one external resource.
///
/// Implementations own the fetched payload and the transport. They must be `Send + Sync` so
/// negotiation futures can hop executors.
pub trait ResourceHandle
where
	Self: Send + Sync,
{
	/// Identifier of the resource (typically an `info.json` or manifest URL).
	fn id(&self) -> &Url;

	/// Realm whose tokens unlock this resource. Defaults to the identifier's origin.
	fn realm(&self) -> Realm {
		Realm::from_url(self.id())
	}

	/// Fetches the resource, presenting `token` when provided, and replaces the payload held by
	/// the handle.
	fn fetch<'a>(&'a mut self, token: Option<&'a AccessToken>)
	-> ResourceFuture<'a, ResourceStatus>;

	/// Returns `true` if the fetched payload advertises access control.
	fn is_access_controlled(&self) -> bool;

	/// Click-through service advertised by the fetched payload.
	fn click_through_service(&self) -> Option<&AuthService>;

	/// Login service advertised by the fetched payload.
	fn login_service(&self) -> Option<&AuthService> {
		None
	}
}

/// Snapshot of a resource handed to collaborators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthContext {
	/// Resource identifier.
	pub resource: Url,
	/// Realm keying stored tokens.
	pub realm: Realm,
	/// Status of the most recent fetch.
	pub status: ResourceStatus,
	/// Advertised click-through service, if any.
	pub click_through_service: Option<AuthService>,
	/// Advertised login service, if any.
	pub login_service: Option<AuthService>,
}

/// A caller-owned resource under negotiation.
#[derive(Debug)]
pub struct ExternalResource<H> {
	handle: H,
	status: ResourceStatus,
	state: NegotiationState,
	response_handled: bool,
}
impl<H> ExternalResource<H>
where
	H: ResourceHandle,
{
	/// Wraps a fresh handle; status and state start as unknown.
	pub fn new(handle: H) -> Self {
		Self {
			handle,
			status: ResourceStatus::Unknown,
			state: NegotiationState::Unknown,
			response_handled: false,
		}
	}

	/// Borrows the wrapped handle (and the payload it holds).
	pub fn handle(&self) -> &H {
		&self.handle
	}

	/// Unwraps the handle.
	pub fn into_handle(self) -> H {
		self.handle
	}

	/// Resource identifier.
	pub fn id(&self) -> &Url {
		self.handle.id()
	}

	/// Status of the most recent fetch.
	pub fn status(&self) -> ResourceStatus {
		self.status
	}

	/// Current negotiation state.
	pub fn state(&self) -> NegotiationState {
		self.state
	}

	/// Returns `true` once a fetch has shown access control.
	pub fn is_access_controlled(&self) -> bool {
		self.status != ResourceStatus::Unknown && self.handle.is_access_controlled()
	}

	/// Click-through service discovered by the most recent fetch.
	pub fn click_through_service(&self) -> Option<&AuthService> {
		match self.status {
			ResourceStatus::Unknown => None,
			_ => self.handle.click_through_service(),
		}
	}

	/// Returns `true` if the caller already acted on the current response.
	pub fn is_response_handled(&self) -> bool {
		self.response_handled
	}

	/// Records that the caller acted on the current response, opting the next negotiation into
	/// interactive remediation instead of deferring.
	pub fn mark_response_handled(&mut self) {
		self.response_handled = true;
	}

	/// Sets or clears the handled latch.
	pub fn set_response_handled(&mut self, handled: bool) {
		self.response_handled = handled;
	}

	/// Builds the snapshot handed to collaborators.
	pub fn context(&self) -> AuthContext {
		let fetched = self.status != ResourceStatus::Unknown;

		AuthContext {
			resource: self.handle.id().clone(),
			realm: self.handle.realm(),
			status: self.status,
			click_through_service: self.click_through_service().cloned(),
			login_service: self.handle.login_service().filter(|_| fetched).cloned(),
		}
	}

	/// Fetches through the handle and advances the negotiation state.
	pub(crate) async fn fetch(&mut self, token: Option<&AccessToken>) -> Result<ResourceStatus> {
		let fetched = self.handle.fetch(token).await;
		let status =
			fetched.map_err(|source| Error::Fetch { resource: self.handle.id().clone(), source })?;

		self.status = status;
		self.state = NegotiationState::after_fetch(
			self.handle.is_access_controlled(),
			status,
			token.is_some(),
		);

		Ok(status)
	}
}
