//! Shared vocabulary for negotiation flows (strategy, options, remediation choice, outcomes).

// self
use crate::{
	_prelude::*,
	auth::Realm,
	collaborators::AuthCollaborators,
	error::{CollaboratorError, ConfigError},
	flows::AccessBroker,
	obs::{self, NegotiationStep},
	resource::{AuthContext, ExternalResource, NegotiationState, ResourceHandle, ResourceStatus},
};

/// Whether cached tokens are trusted before access control is re-verified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessStrategy {
	/// Try a cached token first; negotiate only when it is missing or rejected.
	Optimistic,
	/// Always re-verify access control and re-run the interactive step.
	Pessimistic,
}
impl AccessStrategy {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AccessStrategy::Optimistic => "optimistic",
			AccessStrategy::Pessimistic => "pessimistic",
		}
	}
}
impl Display for AccessStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Options shared by every load issued through an [`AccessBroker`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct LoadOptions {
	/// Selects the pessimistic strategy: access-control cookies may have been cleared, so cached
	/// tokens are never trusted.
	pub pessimistic_access_control: bool,
	/// Runs interactive remediation for one realm under a mutex so concurrent loads do not open
	/// several login windows at once. Fetches stay parallel.
	pub serialize_interactive: bool,
}
impl LoadOptions {
	/// Parses options from JSON (camelCase keys, all optional).
	pub fn from_json(payload: &str) -> Result<Self> {
		let mut de = serde_json::Deserializer::from_str(payload);
		let options = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ConfigError::OptionsParse { source })?;

		Ok(options)
	}

	/// Overrides the pessimistic flag.
	pub fn with_pessimistic_access_control(mut self, pessimistic: bool) -> Self {
		self.pessimistic_access_control = pessimistic;

		self
	}

	/// Overrides interactive serialization.
	pub fn with_serialize_interactive(mut self, serialize: bool) -> Self {
		self.serialize_interactive = serialize;

		self
	}

	/// Strategy implied by the options.
	pub fn strategy(&self) -> AccessStrategy {
		if self.pessimistic_access_control {
			AccessStrategy::Pessimistic
		} else {
			AccessStrategy::Optimistic
		}
	}
}

/// Least-interactive step able to unlock an access-controlled resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Remediation {
	/// Resolve without acting; the caller decides whether to opt into login.
	Defer,
	/// Run the click-through acknowledgement.
	ClickThrough,
	/// Run the full login.
	Login,
}
impl Remediation {
	/// Chooses the remediation for an access-controlled resource that has no usable cached token.
	///
	/// Optimistic negotiation prefers, in order: deferring an unhandled temporary redirect, an
	/// unhandled click-through, then login. Pessimistic negotiation never defers and ignores the
	/// handled latch.
	pub fn select(
		strategy: AccessStrategy,
		status: ResourceStatus,
		click_through_available: bool,
		response_handled: bool,
	) -> Self {
		match strategy {
			AccessStrategy::Optimistic =>
				if status.is_temporary_redirect() && !response_handled {
					Self::Defer
				} else if click_through_available && !response_handled {
					Self::ClickThrough
				} else {
					Self::Login
				},
			AccessStrategy::Pessimistic =>
				if click_through_available {
					Self::ClickThrough
				} else {
					Self::Login
				},
		}
	}

	/// Chooses the remediation from a fetched resource.
	pub fn for_resource<H>(strategy: AccessStrategy, resource: &ExternalResource<H>) -> Self
	where
		H: ResourceHandle,
	{
		Self::select(
			strategy,
			resource.status(),
			resource.click_through_service().is_some(),
			resource.is_response_handled(),
		)
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Remediation::Defer => "defer",
			Remediation::ClickThrough => "click_through",
			Remediation::Login => "login",
		}
	}
}
impl Display for Remediation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How a negotiation resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NegotiationOutcome {
	/// The resource is not access-controlled; no token was involved.
	Unrestricted,
	/// A token-bearing fetch succeeded.
	Authorized,
	/// A temporary redirect is pending; mark the response handled and load again to log in.
	Deferred,
	/// The resource is still unauthorized after the last fetch.
	Denied {
		/// Status of the last fetch.
		status: ResourceStatus,
	},
}
impl NegotiationOutcome {
	/// Derives the outcome from the resource's negotiation state.
	pub fn from_resource<H>(resource: &ExternalResource<H>) -> Self
	where
		H: ResourceHandle,
	{
		match resource.state() {
			NegotiationState::NotControlled => Self::Unrestricted,
			NegotiationState::Remediated => Self::Authorized,
			NegotiationState::AwaitingRemediation | NegotiationState::Unknown =>
				Self::Denied { status: resource.status() },
		}
	}

	/// Returns `true` if the resource now holds its full content.
	pub fn is_accessible(self) -> bool {
		matches!(self, Self::Unrestricted | Self::Authorized)
	}
}

/// Returns (and creates on demand) the interactive guard for a realm.
pub(crate) fn realm_guard<A>(broker: &AccessBroker<A>, realm: &Realm) -> Arc<AsyncMutex<()>>
where
	A: ?Sized + AuthCollaborators,
{
	let mut guards = broker.realm_guards.lock();

	guards.entry(realm.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
}

/// Drops a realm guard handed out by [`realm_guard`], forgetting the realm once no other
/// negotiation holds or awaits it.
pub(crate) fn release_realm_guard<A>(
	broker: &AccessBroker<A>,
	realm: &Realm,
	guard: Arc<AsyncMutex<()>>,
) where
	A: ?Sized + AuthCollaborators,
{
	let mut guards = broker.realm_guards.lock();

	drop(guard);

	// Clones are only handed out under the map lock, so a count of one is the map's own entry.
	if guards.get(realm).is_some_and(|entry| Arc::strong_count(entry) == 1) {
		guards.remove(realm);
	}
}

/// Traces a collaborator step and maps its failure into an engine error.
pub(crate) async fn run_step<T, F>(step: NegotiationStep, ctx: &AuthContext, fut: F) -> Result<T>
where
	F: Future<Output = Result<T, CollaboratorError>>,
{
	obs::trace_step(step, &ctx.resource);

	fut.await.map_err(|source| Error::Collaborator { step, resource: ctx.resource.clone(), source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::{CallLog, MockResource, RecordingCollaborators, RecordingResponseHandler};

	const ITEM: &str = "https://images.example.org/iiif/item-1/info.json";

	#[tokio::test]
	async fn realm_guards_are_forgotten_once_released() {
		let log = CallLog::default();
		let broker = AccessBroker::new(Arc::new(RecordingCollaborators::new(&log, "minted")))
			.with_options(LoadOptions::default().with_serialize_interactive(true));
		let mut resource =
			ExternalResource::new(MockResource::protected(ITEM, &log).accepting("minted"));
		let loaded = broker
			.load_external_resource(&mut resource, &RecordingResponseHandler::new(&log))
			.await
			.expect("Serialized login should unlock.");

		assert_eq!(loaded.outcome, NegotiationOutcome::Authorized);
		assert!(broker.realm_guards.lock().is_empty());

		let realm = resource.context().realm;
		let held = realm_guard(&broker, &realm);
		let waiting = realm_guard(&broker, &realm);

		release_realm_guard(&broker, &realm, held);

		assert_eq!(broker.realm_guards.lock().len(), 1);

		release_realm_guard(&broker, &realm, waiting);

		assert!(broker.realm_guards.lock().is_empty());
	}

	#[test]
	fn redirect_deferral_beats_click_through_and_login() {
		let remediation = Remediation::select(
			AccessStrategy::Optimistic,
			ResourceStatus::TemporaryRedirect,
			true,
			false,
		);

		assert_eq!(remediation, Remediation::Defer);
	}

	#[test]
	fn click_through_beats_login_until_handled() {
		let unhandled =
			Remediation::select(AccessStrategy::Optimistic, ResourceStatus::Unauthorized, true, false);
		let handled =
			Remediation::select(AccessStrategy::Optimistic, ResourceStatus::Unauthorized, true, true);
		let handled_redirect = Remediation::select(
			AccessStrategy::Optimistic,
			ResourceStatus::TemporaryRedirect,
			true,
			true,
		);

		assert_eq!(unhandled, Remediation::ClickThrough);
		assert_eq!(handled, Remediation::Login);
		assert_eq!(handled_redirect, Remediation::Login);
		assert_eq!(
			Remediation::select(AccessStrategy::Optimistic, ResourceStatus::Unauthorized, false, false),
			Remediation::Login
		);
	}

	#[test]
	fn pessimistic_selection_never_defers() {
		assert_eq!(
			Remediation::select(
				AccessStrategy::Pessimistic,
				ResourceStatus::TemporaryRedirect,
				false,
				false
			),
			Remediation::Login
		);
		assert_eq!(
			Remediation::select(AccessStrategy::Pessimistic, ResourceStatus::TemporaryRedirect, true, true),
			Remediation::ClickThrough
		);
	}

	#[test]
	fn options_default_to_optimistic() {
		let options = LoadOptions::default();

		assert_eq!(options.strategy(), AccessStrategy::Optimistic);
		assert!(!options.serialize_interactive);
		assert_eq!(
			LoadOptions::default().with_pessimistic_access_control(true).strategy(),
			AccessStrategy::Pessimistic
		);
	}

	#[test]
	fn options_parse_from_camel_case_json() {
		let options = LoadOptions::from_json(r#"{"pessimisticAccessControl": true}"#)
			.expect("Options JSON should parse.");

		assert_eq!(options.strategy(), AccessStrategy::Pessimistic);
		assert!(!options.serialize_interactive);
		assert_eq!(
			LoadOptions::from_json("{}").expect("Empty options should parse."),
			LoadOptions::default()
		);
	}

	#[test]
	fn options_parse_errors_name_the_field() {
		let err = LoadOptions::from_json(r#"{"serializeInteractive": "yes"}"#)
			.expect_err("A string flag should be rejected.");

		match err {
			Error::Config(ConfigError::OptionsParse { source }) =>
				assert_eq!(source.path().to_string(), "serializeInteractive"),
			other => panic!("Unexpected error: {other:?}"),
		}
	}
}
