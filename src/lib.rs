//! Access-control negotiation for IIIF resources: cached-token reuse, click-through and login
//! remediation, and concurrent batch loading behind injectable collaborators.

#![deny(clippy::all, missing_docs)]
#![warn(unused_crate_dependencies)]

pub mod auth;
pub mod collaborators;
pub mod error;
pub mod flows;
pub mod obs;
pub mod resource;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Recording test doubles shared by unit and integration tests; enabled via `cfg(test)` or
	//! the `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{AccessToken, AuthService, Realm, ServiceProfile},
		collaborators::{AuthCollaborators, CollaboratorFuture, ResourceResponseHandler},
		error::{CollaboratorError, TransportError},
		obs::NegotiationStep,
		resource::{AuthContext, ExternalResource, ResourceFuture, ResourceHandle, ResourceStatus},
		store::{AccessTokenStore, MemoryStore},
	};

	/// One observed call into a resource handle, collaborator, or response handler.
	#[derive(Clone, Debug, PartialEq, Eq)]
	pub enum Call {
		/// Resource fetch, with the presented token secret.
		Fetch {
			/// Resource identifier.
			resource: Url,
			/// Presented token secret, if any.
			token: Option<String>,
		},
		/// Cached token lookup.
		GetStoredAccessToken {
			/// Resource identifier.
			resource: Url,
		},
		/// Click-through acknowledgement.
		ClickThrough {
			/// Resource identifier.
			resource: Url,
		},
		/// Interactive login.
		Login {
			/// Resource identifier.
			resource: Url,
		},
		/// Token minting.
		GetAccessToken {
			/// Resource identifier.
			resource: Url,
		},
		/// Token persistence, with the stored secret.
		StoreAccessToken {
			/// Resource identifier.
			resource: Url,
			/// Stored token secret.
			token: String,
		},
		/// Post-processing of the final resource.
		HandleResourceResponse {
			/// Resource identifier.
			resource: Url,
		},
	}
	impl Call {
		/// Negotiation step this call belongs to.
		pub fn step(&self) -> NegotiationStep {
			match self {
				Call::Fetch { .. } => NegotiationStep::Fetch,
				Call::GetStoredAccessToken { .. } => NegotiationStep::GetStoredAccessToken,
				Call::ClickThrough { .. } => NegotiationStep::ClickThrough,
				Call::Login { .. } => NegotiationStep::Login,
				Call::GetAccessToken { .. } => NegotiationStep::GetAccessToken,
				Call::StoreAccessToken { .. } => NegotiationStep::StoreAccessToken,
				Call::HandleResourceResponse { .. } => NegotiationStep::HandleResourceResponse,
			}
		}

		/// Resource the call was made for.
		pub fn resource(&self) -> &Url {
			match self {
				Call::Fetch { resource, .. }
				| Call::GetStoredAccessToken { resource }
				| Call::ClickThrough { resource }
				| Call::Login { resource }
				| Call::GetAccessToken { resource }
				| Call::StoreAccessToken { resource, .. }
				| Call::HandleResourceResponse { resource } => resource,
			}
		}
	}

	/// Shared, ordered record of calls; clones append to the same log.
	#[derive(Clone, Debug, Default)]
	pub struct CallLog(Arc<Mutex<Vec<Call>>>);
	impl CallLog {
		/// Appends a call.
		pub fn push(&self, call: Call) {
			self.0.lock().push(call);
		}

		/// Snapshot of every call so far.
		pub fn calls(&self) -> Vec<Call> {
			self.0.lock().clone()
		}

		/// Steps of every call so far, in order.
		pub fn steps(&self) -> Vec<NegotiationStep> {
			self.0.lock().iter().map(Call::step).collect()
		}

		/// Number of calls for one step.
		pub fn count(&self, step: NegotiationStep) -> usize {
			self.0.lock().iter().filter(|call| call.step() == step).count()
		}

		/// Steps recorded for one resource, in order.
		pub fn steps_for(&self, resource: &str) -> Vec<NegotiationStep> {
			self.0
				.lock()
				.iter()
				.filter(|call| call.resource().as_str() == resource)
				.map(Call::step)
				.collect()
		}

		/// Token secrets presented by every fetch, in order.
		pub fn fetch_tokens(&self) -> Vec<Option<String>> {
			self.0
				.lock()
				.iter()
				.filter_map(|call| match call {
					Call::Fetch { token, .. } => Some(token.clone()),
					_ => None,
				})
				.collect()
		}

		/// Forgets every recorded call.
		pub fn clear(&self) {
			self.0.lock().clear();
		}
	}

	/// Scripted [`ResourceHandle`] that logs every fetch.
	///
	/// Open resources always answer 200. Protected resources answer their anonymous status to
	/// token-less fetches, 200 to the accepted secret, and 401 to any other token.
	#[derive(Clone, Debug)]
	pub struct MockResource {
		id: Url,
		log: CallLog,
		access_controlled: bool,
		anonymous_status: ResourceStatus,
		accepted: Option<String>,
		click_through: Option<AuthService>,
		login: Option<AuthService>,
		realm: Option<Realm>,
		failing: bool,
	}
	impl MockResource {
		/// A resource without access control.
		pub fn open(id: &str, log: &CallLog) -> Self {
			Self {
				id: Url::parse(id).expect("Mock resource identifier should be a valid URL."),
				log: log.clone(),
				access_controlled: false,
				anonymous_status: ResourceStatus::Success,
				accepted: None,
				click_through: None,
				login: None,
				realm: None,
				failing: false,
			}
		}

		/// An access-controlled resource answering 401 anonymously and advertising a login
		/// service on its origin.
		pub fn protected(id: &str, log: &CallLog) -> Self {
			let mut resource = Self::open(id, log);
			let login = resource.id.join("/auth/login").expect("Login URL should resolve.");

			resource.access_controlled = true;
			resource.anonymous_status = ResourceStatus::Unauthorized;
			resource.login = Some(AuthService::new(login, ServiceProfile::Login));

			resource
		}

		/// Overrides the status returned to token-less fetches.
		pub fn with_status(mut self, status: ResourceStatus) -> Self {
			self.anonymous_status = status;

			self
		}

		/// Advertises a click-through service.
		pub fn with_click_through(mut self) -> Self {
			let id = self.id.join("/auth/clickthrough").expect("Click-through URL should resolve.");

			self.click_through = Some(
				AuthService::new(id, ServiceProfile::ClickThrough)
					.with_label("Terms of use")
					.with_confirm_label("Accept"),
			);

			self
		}

		/// Accepts tokens carrying `secret`.
		pub fn accepting(mut self, secret: &str) -> Self {
			self.accepted = Some(secret.to_owned());

			self
		}

		/// Places the resource in `realm` instead of its origin's realm.
		pub fn in_realm(mut self, realm: &str) -> Self {
			self.realm = Some(Realm::new(realm).expect("Mock realm should be valid."));

			self
		}

		/// Fails every fetch with a network error.
		pub fn failing(mut self) -> Self {
			self.failing = true;

			self
		}

		fn respond(&self, token: Option<&AccessToken>) -> ResourceStatus {
			if !self.access_controlled {
				return ResourceStatus::Success;
			}

			match (token, &self.accepted) {
				(None, _) => self.anonymous_status,
				(Some(token), Some(accepted)) if token.expose() == accepted => ResourceStatus::Success,
				(Some(_), _) => ResourceStatus::Unauthorized,
			}
		}
	}
	impl ResourceHandle for MockResource {
		fn id(&self) -> &Url {
			&self.id
		}

		fn realm(&self) -> Realm {
			self.realm.clone().unwrap_or_else(|| Realm::from_url(&self.id))
		}

		fn fetch<'a>(
			&'a mut self,
			token: Option<&'a AccessToken>,
		) -> ResourceFuture<'a, ResourceStatus> {
			self.log.push(Call::Fetch {
				resource: self.id.clone(),
				token: token.map(|token| token.expose().to_owned()),
			});

			let result = if self.failing {
				Err(TransportError::network(std::io::Error::other("connection reset by peer")))
			} else {
				Ok(self.respond(token))
			};

			Box::pin(async move { result })
		}

		fn is_access_controlled(&self) -> bool {
			self.access_controlled
		}

		fn click_through_service(&self) -> Option<&AuthService> {
			self.click_through.as_ref()
		}

		fn login_service(&self) -> Option<&AuthService> {
			self.login.as_ref()
		}
	}

	/// [`AuthCollaborators`] that log every call, mint one fixed secret, and persist tokens in a
	/// [`MemoryStore`] keyed by realm.
	#[derive(Clone, Debug)]
	pub struct RecordingCollaborators {
		log: CallLog,
		store: MemoryStore,
		minted: String,
		click_through_minted: Option<String>,
		click_through_failure: Option<String>,
		login_failure: Option<String>,
	}
	impl RecordingCollaborators {
		/// Collaborators minting `minted` after every successful interactive step.
		pub fn new(log: &CallLog, minted: &str) -> Self {
			Self {
				log: log.clone(),
				store: MemoryStore::default(),
				minted: minted.to_owned(),
				click_through_minted: None,
				click_through_failure: None,
				login_failure: None,
			}
		}

		/// Makes every login fail as cancelled by the user.
		pub fn failing_login(mut self, reason: &str) -> Self {
			self.login_failure = Some(reason.to_owned());

			self
		}

		/// Makes every click-through fail as declined by the user.
		pub fn failing_click_through(mut self, reason: &str) -> Self {
			self.click_through_failure = Some(reason.to_owned());

			self
		}

		/// Mints `secret` instead for resources that advertise a click-through service.
		pub fn minting_after_click_through(mut self, secret: &str) -> Self {
			self.click_through_minted = Some(secret.to_owned());

			self
		}

		/// Backing token store.
		pub fn store(&self) -> &MemoryStore {
			&self.store
		}

		/// Stores `secret` for the realm of `resource` without logging a call.
		pub async fn seed(&self, resource: &str, secret: &str) {
			let id = Url::parse(resource).expect("Seeded resource should be a valid URL.");

			self.store
				.put(Realm::from_url(&id), AccessToken::new(secret))
				.await
				.expect("Seeding the memory store should succeed.");
		}

		/// Secret stored for the realm of `resource`, if any.
		pub async fn stored(&self, resource: &str) -> Option<String> {
			let id = Url::parse(resource).expect("Resource should be a valid URL.");

			self.store
				.get(&Realm::from_url(&id))
				.await
				.expect("Reading the memory store should succeed.")
				.map(|token| token.expose().to_owned())
		}
	}
	impl AuthCollaborators for RecordingCollaborators {
		fn click_through<'a>(&'a self, ctx: &'a AuthContext) -> CollaboratorFuture<'a, ()> {
			self.log.push(Call::ClickThrough { resource: ctx.resource.clone() });

			let result = match &self.click_through_failure {
				Some(reason) => Err(CollaboratorError::Cancelled { reason: reason.clone() }),
				None => Ok(()),
			};

			Box::pin(async move { result })
		}

		fn login<'a>(&'a self, ctx: &'a AuthContext) -> CollaboratorFuture<'a, ()> {
			self.log.push(Call::Login { resource: ctx.resource.clone() });

			let result = match &self.login_failure {
				Some(reason) => Err(CollaboratorError::Cancelled { reason: reason.clone() }),
				None => Ok(()),
			};

			Box::pin(async move { result })
		}

		fn get_access_token<'a>(&'a self, ctx: &'a AuthContext) -> CollaboratorFuture<'a, AccessToken> {
			self.log.push(Call::GetAccessToken { resource: ctx.resource.clone() });

			let secret = match (&ctx.click_through_service, &self.click_through_minted) {
				(Some(_), Some(secret)) => secret,
				_ => &self.minted,
			};
			let token = AccessToken::new(secret.clone());

			Box::pin(async move { Ok(token) })
		}

		fn store_access_token<'a>(
			&'a self,
			ctx: &'a AuthContext,
			token: AccessToken,
		) -> CollaboratorFuture<'a, ()> {
			self.log.push(Call::StoreAccessToken {
				resource: ctx.resource.clone(),
				token: token.expose().to_owned(),
			});

			Box::pin(async move {
				self.store.put(ctx.realm.clone(), token).await.map_err(CollaboratorError::from)
			})
		}

		fn get_stored_access_token<'a>(
			&'a self,
			ctx: &'a AuthContext,
		) -> CollaboratorFuture<'a, Option<AccessToken>> {
			self.log.push(Call::GetStoredAccessToken { resource: ctx.resource.clone() });

			Box::pin(async move { self.store.get(&ctx.realm).await.map_err(CollaboratorError::from) })
		}
	}

	/// [`ResourceResponseHandler`] that logs each call and returns the final status.
	#[derive(Clone, Debug)]
	pub struct RecordingResponseHandler {
		log: CallLog,
	}
	impl RecordingResponseHandler {
		/// Handler appending to `log`.
		pub fn new(log: &CallLog) -> Self {
			Self { log: log.clone() }
		}
	}
	impl<H> ResourceResponseHandler<H> for RecordingResponseHandler
	where
		H: ResourceHandle,
	{
		type Output = ResourceStatus;

		fn handle_resource_response<'a>(
			&'a self,
			resource: &'a ExternalResource<H>,
		) -> CollaboratorFuture<'a, ResourceStatus> {
			self.log.push(Call::HandleResourceResponse { resource: resource.id().clone() });

			let status = resource.status();

			Box::pin(async move { Ok(status) })
		}
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use url;
#[cfg(test)] use color_eyre as _;
