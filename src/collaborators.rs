//! Collaborator contracts injected into the negotiation engine.
//!
//! The engine never renders UI, mints tokens, or persists anything itself. Everything outside
//! the state machine is delegated to one [`AuthCollaborators`] object handed to
//! [`AccessBroker`](crate::flows::AccessBroker) once, plus a [`ResourceResponseHandler`] that
//! post-processes each loaded resource.
//!
//! Most callers only need to implement the interactive half ([`AuthPrompter`]) and pair it with
//! a token store via [`StoreBackedCollaborators`].

// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	error::CollaboratorError,
	resource::{AuthContext, ExternalResource, ResourceHandle, ResourceStatus},
	store::AccessTokenStore,
};

/// Boxed future returned by collaborator calls.
pub type CollaboratorFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, CollaboratorError>> + 'a + Send>>;

/// Capability object bundling every substitution point of a negotiation.
pub trait AuthCollaborators
where
	Self: Send + Sync,
{
	/// Runs the click-through acknowledgement advertised by the resource.
	fn click_through<'a>(&'a self, ctx: &'a AuthContext) -> CollaboratorFuture<'a, ()>;

	/// Runs the full login for the resource.
	fn login<'a>(&'a self, ctx: &'a AuthContext) -> CollaboratorFuture<'a, ()>;

	/// Mints a token once click-through or login has succeeded.
	fn get_access_token<'a>(&'a self, ctx: &'a AuthContext) -> CollaboratorFuture<'a, AccessToken>;

	/// Persists a freshly minted token.
	fn store_access_token<'a>(
		&'a self,
		ctx: &'a AuthContext,
		token: AccessToken,
	) -> CollaboratorFuture<'a, ()>;

	/// Looks up a previously stored token for the resource.
	fn get_stored_access_token<'a>(
		&'a self,
		ctx: &'a AuthContext,
	) -> CollaboratorFuture<'a, Option<AccessToken>>;
}

/// Interactive half of [`AuthCollaborators`]: the steps that involve the user or the token
/// service.
pub trait AuthPrompter
where
	Self: Send + Sync,
{
	/// Runs the click-through acknowledgement advertised by the resource.
	fn click_through<'a>(&'a self, ctx: &'a AuthContext) -> CollaboratorFuture<'a, ()>;

	/// Runs the full login for the resource.
	fn login<'a>(&'a self, ctx: &'a AuthContext) -> CollaboratorFuture<'a, ()>;

	/// Mints a token once click-through or login has succeeded.
	fn get_access_token<'a>(&'a self, ctx: &'a AuthContext) -> CollaboratorFuture<'a, AccessToken>;
}

/// [`AuthCollaborators`] built from an [`AuthPrompter`] and an [`AccessTokenStore`] keyed by the
/// resource realm.
pub struct StoreBackedCollaborators<P>
where
	P: ?Sized + AuthPrompter,
{
	/// Interactive steps.
	pub prompter: Arc<P>,
	/// Token persistence.
	pub store: Arc<dyn AccessTokenStore>,
}
impl<P> StoreBackedCollaborators<P>
where
	P: ?Sized + AuthPrompter,
{
	/// Pairs a prompter with a store.
	pub fn new(prompter: Arc<P>, store: Arc<dyn AccessTokenStore>) -> Self {
		Self { prompter, store }
	}
}
impl<P> Clone for StoreBackedCollaborators<P>
where
	P: ?Sized + AuthPrompter,
{
	fn clone(&self) -> Self {
		Self { prompter: self.prompter.clone(), store: self.store.clone() }
	}
}
impl<P> Debug for StoreBackedCollaborators<P>
where
	P: ?Sized + AuthPrompter,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("StoreBackedCollaborators(..)")
	}
}
impl<P> AuthCollaborators for StoreBackedCollaborators<P>
where
	P: ?Sized + AuthPrompter,
{
	fn click_through<'a>(&'a self, ctx: &'a AuthContext) -> CollaboratorFuture<'a, ()> {
		self.prompter.click_through(ctx)
	}

	fn login<'a>(&'a self, ctx: &'a AuthContext) -> CollaboratorFuture<'a, ()> {
		self.prompter.login(ctx)
	}

	fn get_access_token<'a>(&'a self, ctx: &'a AuthContext) -> CollaboratorFuture<'a, AccessToken> {
		self.prompter.get_access_token(ctx)
	}

	fn store_access_token<'a>(
		&'a self,
		ctx: &'a AuthContext,
		token: AccessToken,
	) -> CollaboratorFuture<'a, ()> {
		Box::pin(async move {
			self.store.put(ctx.realm.clone(), token).await.map_err(CollaboratorError::from)
		})
	}

	fn get_stored_access_token<'a>(
		&'a self,
		ctx: &'a AuthContext,
	) -> CollaboratorFuture<'a, Option<AccessToken>> {
		Box::pin(async move { self.store.get(&ctx.realm).await.map_err(CollaboratorError::from) })
	}
}

/// Post-processor invoked once on the final resource of every load.
pub trait ResourceResponseHandler<H>
where
	Self: Send + Sync,
	H: ResourceHandle,
{
	/// Value returned to the caller alongside the negotiation outcome.
	type Output: Send;

	/// Inspects the negotiated resource (e.g. to show a degraded-content notice).
	fn handle_resource_response<'a>(
		&'a self,
		resource: &'a ExternalResource<H>,
	) -> CollaboratorFuture<'a, Self::Output>;
}

/// Post-processor that reports the final fetch status.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReportStatus;
impl<H> ResourceResponseHandler<H> for ReportStatus
where
	H: ResourceHandle,
{
	type Output = ResourceStatus;

	fn handle_resource_response<'a>(
		&'a self,
		resource: &'a ExternalResource<H>,
	) -> CollaboratorFuture<'a, ResourceStatus> {
		let status = resource.status();

		Box::pin(async move { Ok(status) })
	}
}
