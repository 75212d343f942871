//! Single-resource loading with optimistic or pessimistic access control.
//!
//! The optimistic strategy assumes access-control cookies survived: it presents a stored token
//! before anything else so previously unlocked resources load without a login window flashing,
//! and falls back to [`AccessBroker::authorize`]'s negotiation only when that token is missing
//! or rejected. The pessimistic strategy assumes cookies may have been cleared: it fetches
//! anonymously and re-runs click-through or login for every access-controlled resource, never
//! trusting the store. Either way the response handler runs once on the final resource.

// self
use crate::{
	_prelude::*,
	collaborators::{AuthCollaborators, ResourceResponseHandler},
	flows::{AccessBroker, AccessStrategy, NegotiationOutcome, Remediation, common},
	obs::{self, FlowOutcome, NegotiationSpan, NegotiationStep},
	resource::{ExternalResource, ResourceHandle},
};

/// Result of one load: how negotiation resolved plus the post-processor's output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedResource<O> {
	/// How the negotiation resolved.
	pub outcome: NegotiationOutcome,
	/// Value produced by the [`ResourceResponseHandler`].
	pub response: O,
}

impl<A> AccessBroker<A>
where
	A: ?Sized + AuthCollaborators,
{
	/// Loads one resource using the strategy selected by [`LoadOptions`](crate::flows::LoadOptions),
	/// then hands it to `handler`.
	pub async fn load_external_resource<H, R>(
		&self,
		resource: &mut ExternalResource<H>,
		handler: &R,
	) -> Result<LoadedResource<R::Output>>
	where
		H: ResourceHandle,
		R: ?Sized + ResourceResponseHandler<H>,
	{
		let strategy = self.options.strategy();
		let span = NegotiationSpan::new(strategy, "load_external_resource", resource.id());

		obs::record_negotiation(strategy, FlowOutcome::Attempt);
		self.metrics.record_attempt();

		let result = span
			.instrument(async move {
				let outcome = match strategy {
					AccessStrategy::Optimistic => self.load_optimistic(resource).await?,
					AccessStrategy::Pessimistic => self.load_pessimistic(resource).await?,
				};
				let ctx = resource.context();
				let response = common::run_step(
					NegotiationStep::HandleResourceResponse,
					&ctx,
					handler.handle_resource_response(resource),
				)
				.await?;

				Ok(LoadedResource { outcome, response })
			})
			.await;

		match &result {
			Ok(_) => obs::record_negotiation(strategy, FlowOutcome::Success),
			Err(_) => {
				self.metrics.record_failure();
				obs::record_negotiation(strategy, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn load_optimistic<H>(&self, resource: &mut ExternalResource<H>) -> Result<NegotiationOutcome>
	where
		H: ResourceHandle,
	{
		let ctx = resource.context();
		let Some(token) = self.reusable_token(&ctx, None).await? else {
			return self.negotiate(resource, None).await;
		};

		self.metrics.record_cached_token();

		if self.fetch(resource, Some(&token)).await?.is_success() {
			return Ok(NegotiationOutcome::from_resource(resource));
		}

		self.negotiate(resource, Some(&token)).await
	}

	async fn load_pessimistic<H>(
		&self,
		resource: &mut ExternalResource<H>,
	) -> Result<NegotiationOutcome>
	where
		H: ResourceHandle,
	{
		self.fetch(resource, None).await?;

		if !resource.is_access_controlled() {
			return Ok(NegotiationOutcome::Unrestricted);
		}

		let remediation = Remediation::for_resource(AccessStrategy::Pessimistic, resource);

		self.remediate(resource, AccessStrategy::Pessimistic, remediation, None).await
	}
}
