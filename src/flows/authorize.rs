//! Single-resource negotiation state machine.
//!
//! [`AccessBroker::authorize`] performs one anonymous fetch to learn whether the resource is
//! access-controlled. Open resources resolve immediately. Otherwise a stored token is tried, and
//! failing that the least-interactive [`Remediation`] runs: deferring an unhandled redirect to
//! the caller, a click-through acknowledgement, or a full login. Each interactive remediation
//! mints one token, stores it once, and re-fetches with it.

// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	collaborators::AuthCollaborators,
	flows::{AccessBroker, AccessStrategy, NegotiationOutcome, Remediation, common},
	obs::{self, NegotiationSpan, NegotiationStep},
	resource::{AuthContext, ExternalResource, ResourceHandle, ResourceStatus},
};

impl<A> AccessBroker<A>
where
	A: ?Sized + AuthCollaborators,
{
	/// Negotiates access to a resource that has not been proven open.
	///
	/// Collaborator and fetch failures are returned as errors; a resource that stays unauthorized
	/// resolves with [`NegotiationOutcome::Denied`].
	pub async fn authorize<H>(&self, resource: &mut ExternalResource<H>) -> Result<NegotiationOutcome>
	where
		H: ResourceHandle,
	{
		let span = NegotiationSpan::new(AccessStrategy::Optimistic, "authorize", resource.id());

		span.instrument(self.negotiate(resource, None)).await
	}

	/// Runs the negotiation, ignoring a stored token that carries the `rejected` secret.
	pub(crate) async fn negotiate<H>(
		&self,
		resource: &mut ExternalResource<H>,
		rejected: Option<&AccessToken>,
	) -> Result<NegotiationOutcome>
	where
		H: ResourceHandle,
	{
		self.fetch(resource, None).await?;

		if !resource.is_access_controlled() {
			return Ok(NegotiationOutcome::Unrestricted);
		}

		let ctx = resource.context();

		if let Some(token) = self.reusable_token(&ctx, rejected).await? {
			self.metrics.record_cached_token();
			self.fetch(resource, Some(&token)).await?;

			return Ok(NegotiationOutcome::from_resource(resource));
		}

		let remediation = Remediation::for_resource(AccessStrategy::Optimistic, resource);

		self.remediate(resource, AccessStrategy::Optimistic, remediation, rejected).await
	}

	/// Applies a remediation to an access-controlled resource.
	pub(crate) async fn remediate<H>(
		&self,
		resource: &mut ExternalResource<H>,
		strategy: AccessStrategy,
		remediation: Remediation,
		rejected: Option<&AccessToken>,
	) -> Result<NegotiationOutcome>
	where
		H: ResourceHandle,
	{
		obs::record_remediation(strategy, remediation);

		if remediation == Remediation::Defer {
			self.metrics.record_deferral();

			return Ok(NegotiationOutcome::Deferred);
		}

		let ctx = resource.context();
		let guard =
			self.options.serialize_interactive.then(|| common::realm_guard(self, &ctx.realm));
		let outcome = match &guard {
			Some(guard) => {
				let _serialized = guard.lock().await;

				self.remediate_interactive(resource, &ctx, strategy, remediation, rejected, true).await
			},
			None =>
				self.remediate_interactive(resource, &ctx, strategy, remediation, rejected, false)
					.await,
		};

		if let Some(guard) = guard {
			common::release_realm_guard(self, &ctx.realm, guard);
		}

		outcome
	}

	/// Runs click-through or login, then mints, stores, and presents a fresh token.
	///
	/// When `waited` is set the caller held the realm guard, so a token stored by the previous
	/// holder is tried first. A rejected token falls through to the prompt.
	async fn remediate_interactive<H>(
		&self,
		resource: &mut ExternalResource<H>,
		ctx: &AuthContext,
		strategy: AccessStrategy,
		remediation: Remediation,
		rejected: Option<&AccessToken>,
		waited: bool,
	) -> Result<NegotiationOutcome>
	where
		H: ResourceHandle,
	{
		let reusable = if waited && strategy == AccessStrategy::Optimistic {
			self.reusable_token(ctx, rejected).await?
		} else {
			None
		};

		if let Some(token) = reusable {
			self.metrics.record_cached_token();

			if self.fetch(resource, Some(&token)).await?.is_success() {
				return Ok(NegotiationOutcome::from_resource(resource));
			}
		}

		if remediation == Remediation::ClickThrough {
			self.metrics.record_click_through();
			common::run_step(NegotiationStep::ClickThrough, ctx, self.collaborators.click_through(ctx))
				.await?;
		} else {
			self.metrics.record_login();
			common::run_step(NegotiationStep::Login, ctx, self.collaborators.login(ctx)).await?;
		}

		let token = common::run_step(
			NegotiationStep::GetAccessToken,
			ctx,
			self.collaborators.get_access_token(ctx),
		)
		.await?;

		common::run_step(
			NegotiationStep::StoreAccessToken,
			ctx,
			self.collaborators.store_access_token(ctx, token.clone()),
		)
		.await?;
		self.fetch(resource, Some(&token)).await?;

		Ok(NegotiationOutcome::from_resource(resource))
	}

	/// Looks up the stored token, dropping it when it carries the `rejected` secret.
	pub(crate) async fn reusable_token(
		&self,
		ctx: &AuthContext,
		rejected: Option<&AccessToken>,
	) -> Result<Option<AccessToken>> {
		let stored = common::run_step(
			NegotiationStep::GetStoredAccessToken,
			ctx,
			self.collaborators.get_stored_access_token(ctx),
		)
		.await?;

		Ok(stored.filter(|token| !rejected.is_some_and(|rejected| rejected.same_secret(token))))
	}

	pub(crate) async fn fetch<H>(
		&self,
		resource: &mut ExternalResource<H>,
		token: Option<&AccessToken>,
	) -> Result<ResourceStatus>
	where
		H: ResourceHandle,
	{
		obs::trace_step(NegotiationStep::Fetch, resource.id());

		resource.fetch(token).await
	}
}
