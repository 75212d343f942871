//! Loads a small manifest's worth of image services concurrently: one open, one behind a
//! click-through, one behind a login. The prompter accepts everything and tokens land in the
//! in-memory store, so a second pass reuses them without prompting.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use url::Url;
// self
use iiif_access::{
	auth::{AccessToken, AuthService, ServiceProfile},
	collaborators::{AuthPrompter, CollaboratorFuture, ReportStatus, StoreBackedCollaborators},
	error::TransportError,
	flows::{AccessBroker, LoadOptions},
	resource::{AuthContext, ExternalResource, ResourceFuture, ResourceHandle, ResourceStatus},
	store::{AccessTokenStore, MemoryStore},
};

const SECRET: &str = "demo-token";

/// Image service whose server-side behavior is simulated in process.
struct ImageService {
	id: Url,
	click_through: Option<AuthService>,
	login: Option<AuthService>,
}
impl ImageService {
	fn new(id: &str, profile: Option<ServiceProfile>) -> Result<Self> {
		let id = Url::parse(id)?;
		let service = match profile {
			Some(profile) => Some(
				AuthService::new(id.join("/auth")?, profile).with_label("Sign in to view this image"),
			),
			None => None,
		};
		let (click_through, login) = match service {
			Some(service) if service.profile == ServiceProfile::ClickThrough =>
				(Some(service), None),
			service => (None, service),
		};

		Ok(Self { id, click_through, login })
	}
}
impl ResourceHandle for ImageService {
	fn id(&self) -> &Url {
		&self.id
	}

	fn fetch<'a>(
		&'a mut self,
		token: Option<&'a AccessToken>,
	) -> ResourceFuture<'a, ResourceStatus> {
		let protected = self.is_access_controlled();

		Box::pin(async move {
			let status = match token {
				_ if !protected => ResourceStatus::Success,
				Some(token) if token.expose() == SECRET => ResourceStatus::Success,
				_ => ResourceStatus::Unauthorized,
			};

			Ok::<_, TransportError>(status)
		})
	}

	fn is_access_controlled(&self) -> bool {
		self.click_through.is_some() || self.login.is_some()
	}

	fn click_through_service(&self) -> Option<&AuthService> {
		self.click_through.as_ref()
	}

	fn login_service(&self) -> Option<&AuthService> {
		self.login.as_ref()
	}
}

/// Accepts every prompt, printing what a viewer would show.
struct ConsolePrompter;
impl AuthPrompter for ConsolePrompter {
	fn click_through<'a>(&'a self, ctx: &'a AuthContext) -> CollaboratorFuture<'a, ()> {
		println!("Accepting terms for {}.", ctx.resource);

		Box::pin(async { Ok(()) })
	}

	fn login<'a>(&'a self, ctx: &'a AuthContext) -> CollaboratorFuture<'a, ()> {
		println!("Logging in to {} for {}.", ctx.realm, ctx.resource);

		Box::pin(async { Ok(()) })
	}

	fn get_access_token<'a>(&'a self, _ctx: &'a AuthContext) -> CollaboratorFuture<'a, AccessToken> {
		Box::pin(async { Ok(AccessToken::new(SECRET)) })
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let store: Arc<dyn AccessTokenStore> = Arc::new(MemoryStore::default());
	let collaborators = StoreBackedCollaborators::new(Arc::new(ConsolePrompter), store);
	let broker = AccessBroker::new(Arc::new(collaborators))
		.with_options(LoadOptions::default().with_serialize_interactive(true));
	let mut resources = vec![
		ExternalResource::new(ImageService::new(
			"https://open.example.org/iiif/plate-1/info.json",
			None,
		)?),
		ExternalResource::new(ImageService::new(
			"https://terms.example.org/iiif/plate-2/info.json",
			Some(ServiceProfile::ClickThrough),
		)?),
		ExternalResource::new(ImageService::new(
			"https://archive.example.org/iiif/plate-3/info.json",
			Some(ServiceProfile::Login),
		)?),
	];

	for pass in 1..=2 {
		let report = broker.load_external_resources(&mut resources, &ReportStatus).await;

		for (resource, result) in resources.iter().zip(report.results) {
			let loaded = result?;

			println!(
				"Pass {pass}: {} -> {:?} (status {}).",
				resource.id(),
				loaded.outcome,
				loaded.response
			);
		}
	}

	println!(
		"Logins: {}, click-throughs: {}, cached token hits: {}.",
		broker.metrics.logins(),
		broker.metrics.click_throughs(),
		broker.metrics.cached_token_hits()
	);

	Ok(())
}
