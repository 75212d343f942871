//! Negotiation orchestrators powered by the broker facade.

pub mod batch;
pub mod common;
pub mod load;
pub mod metrics;

mod authorize;

pub use batch::*;
pub use common::*;
pub use load::*;
pub use metrics::NegotiationMetrics;

// self
use crate::{_prelude::*, auth::Realm, collaborators::AuthCollaborators};

/// Negotiates access to external resources on behalf of one viewer or client.
///
/// The broker owns the collaborator object (interactive steps + token persistence), the load
/// options, and the shared counters, so the individual flows only deal with the state machine:
/// [`AccessBroker::authorize`] for a single negotiation,
/// [`AccessBroker::load_external_resource`] to pick the optimistic or pessimistic strategy, and
/// [`AccessBroker::load_external_resources`] to fan loads out over a collection.
pub struct AccessBroker<A>
where
	A: ?Sized + AuthCollaborators,
{
	/// Collaborators invoked for interactive steps and token persistence.
	pub collaborators: Arc<A>,
	/// Strategy selection and interactive serialization.
	pub options: LoadOptions,
	/// Shared counters for negotiation outcomes.
	pub metrics: Arc<NegotiationMetrics>,
	realm_guards: Arc<Mutex<HashMap<Realm, Arc<AsyncMutex<()>>>>>,
}
impl<A> AccessBroker<A>
where
	A: ?Sized + AuthCollaborators,
{
	/// Creates a broker with default (optimistic) options.
	pub fn new(collaborators: Arc<A>) -> Self {
		Self {
			collaborators,
			options: LoadOptions::default(),
			metrics: Default::default(),
			realm_guards: Default::default(),
		}
	}

	/// Replaces the load options.
	pub fn with_options(mut self, options: LoadOptions) -> Self {
		self.options = options;

		self
	}
}
impl<A> Clone for AccessBroker<A>
where
	A: ?Sized + AuthCollaborators,
{
	fn clone(&self) -> Self {
		Self {
			collaborators: self.collaborators.clone(),
			options: self.options,
			metrics: self.metrics.clone(),
			realm_guards: self.realm_guards.clone(),
		}
	}
}
impl<A> Debug for AccessBroker<A>
where
	A: ?Sized + AuthCollaborators,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessBroker")
			.field("options", &self.options)
			.field("metrics", &self.metrics)
			.finish()
	}
}
