// self
use iiif_access::{
	_preludet::*,
	flows::{AccessBroker, AccessStrategy, LoadOptions, NegotiationOutcome},
	obs::NegotiationStep,
	resource::{ExternalResource, NegotiationState, ResourceStatus},
};

const ITEM: &str = "https://images.example.org/iiif/item-1/info.json";

fn pessimistic_broker(
	collaborators: &RecordingCollaborators,
) -> AccessBroker<RecordingCollaborators> {
	let options = LoadOptions::from_json(r#"{ "pessimisticAccessControl": true }"#)
		.expect("Options JSON should parse.");

	assert_eq!(options.strategy(), AccessStrategy::Pessimistic);

	AccessBroker::new(Arc::new(collaborators.clone())).with_options(options)
}

#[tokio::test]
async fn login_sequence_runs_in_order() {
	let log = CallLog::default();
	let collaborators = RecordingCollaborators::new(&log, "minted");
	let handler = RecordingResponseHandler::new(&log);
	let mut resource = ExternalResource::new(MockResource::protected(ITEM, &log).accepting("minted"));
	let loaded = pessimistic_broker(&collaborators)
		.load_external_resource(&mut resource, &handler)
		.await
		.expect("Login should unlock.");

	assert_eq!(loaded.outcome, NegotiationOutcome::Authorized);
	assert_eq!(loaded.response, ResourceStatus::Success);
	assert_eq!(
		log.steps(),
		vec![
			NegotiationStep::Fetch,
			NegotiationStep::Login,
			NegotiationStep::GetAccessToken,
			NegotiationStep::StoreAccessToken,
			NegotiationStep::Fetch,
			NegotiationStep::HandleResourceResponse,
		]
	);
	assert_eq!(log.fetch_tokens(), vec![None, Some("minted".to_owned())]);
	assert_eq!(resource.state(), NegotiationState::Remediated);
}

#[tokio::test]
async fn cached_tokens_are_never_consulted() {
	let log = CallLog::default();
	let collaborators = RecordingCollaborators::new(&log, "fresh");
	let handler = RecordingResponseHandler::new(&log);
	let broker = pessimistic_broker(&collaborators);
	let mut resource = ExternalResource::new(MockResource::protected(ITEM, &log).accepting("fresh"));

	collaborators.seed(ITEM, "cached").await;

	let loaded = broker
		.load_external_resource(&mut resource, &handler)
		.await
		.expect("Login should unlock.");

	assert_eq!(loaded.outcome, NegotiationOutcome::Authorized);
	assert_eq!(log.count(NegotiationStep::GetStoredAccessToken), 0);
	assert_eq!(log.count(NegotiationStep::Login), 1);
	assert_eq!(collaborators.stored(ITEM).await.as_deref(), Some("fresh"));
	assert_eq!(broker.metrics.cached_token_hits(), 0);
}

#[tokio::test]
async fn redirects_are_remediated_instead_of_deferred() {
	let log = CallLog::default();
	let collaborators = RecordingCollaborators::new(&log, "minted");
	let handler = RecordingResponseHandler::new(&log);
	let broker = pessimistic_broker(&collaborators);
	let mut resource = ExternalResource::new(
		MockResource::protected(ITEM, &log)
			.with_status(ResourceStatus::TemporaryRedirect)
			.with_click_through()
			.accepting("minted"),
	);
	let loaded = broker
		.load_external_resource(&mut resource, &handler)
		.await
		.expect("Click-through should unlock.");

	assert_eq!(loaded.outcome, NegotiationOutcome::Authorized);
	assert_eq!(log.count(NegotiationStep::ClickThrough), 1);
	assert_eq!(log.count(NegotiationStep::Login), 0);
	assert_eq!(broker.metrics.deferrals(), 0);
}

#[tokio::test]
async fn open_resource_runs_the_handler_once() {
	let log = CallLog::default();
	let collaborators = RecordingCollaborators::new(&log, "minted");
	let handler = RecordingResponseHandler::new(&log);
	let mut resource = ExternalResource::new(MockResource::open(ITEM, &log));
	let loaded = pessimistic_broker(&collaborators)
		.load_external_resource(&mut resource, &handler)
		.await
		.expect("Open resource should load.");

	assert_eq!(loaded.outcome, NegotiationOutcome::Unrestricted);
	assert_eq!(log.steps(), vec![NegotiationStep::Fetch, NegotiationStep::HandleResourceResponse]);
}
