//! Concurrent loading over a collection of caller-owned resources.
//!
//! Every resource is loaded with the same collaborators and options. Loads run concurrently on
//! the calling task, so two access-controlled resources from different realms may prompt at the
//! same time; enable [`LoadOptions::serialize_interactive`](crate::flows::LoadOptions) to queue
//! prompts within a realm. The batch resolves once every load has settled, and one failure never
//! cancels the others. Loads have no built-in timeout: a collaborator that never settles stalls
//! the batch.

// crates.io
use futures::future;
// self
use crate::{
	_prelude::*,
	collaborators::{AuthCollaborators, ResourceResponseHandler},
	flows::{AccessBroker, LoadedResource},
	obs::NegotiationSpan,
	resource::{ExternalResource, ResourceHandle},
};

/// Per-resource results of a batch, in input order.
#[derive(Debug)]
pub struct BatchReport<O> {
	/// One entry per input resource.
	pub results: Vec<Result<LoadedResource<O>>>,
}
impl<O> BatchReport<O> {
	/// Number of resources in the batch.
	pub fn len(&self) -> usize {
		self.results.len()
	}

	/// Returns `true` for an empty batch.
	pub fn is_empty(&self) -> bool {
		self.results.is_empty()
	}

	/// Returns `true` if every load resolved without error.
	pub fn is_complete(&self) -> bool {
		self.results.iter().all(Result::is_ok)
	}

	/// Iterates over failed loads with their input index.
	pub fn failures(&self) -> impl Iterator<Item = (usize, &Error)> {
		self.results.iter().enumerate().filter_map(|(idx, result)| result.as_ref().err().map(|err| (idx, err)))
	}
}

impl<A> AccessBroker<A>
where
	A: ?Sized + AuthCollaborators,
{
	/// Loads every resource concurrently and reports each result in input order.
	///
	/// Resources are mutated in place; the caller keeps ownership of the slice.
	pub async fn load_external_resources<H, R>(
		&self,
		resources: &mut [ExternalResource<H>],
		handler: &R,
	) -> BatchReport<R::Output>
	where
		H: ResourceHandle,
		R: ?Sized + ResourceResponseHandler<H>,
	{
		let span = NegotiationSpan::batch(self.options.strategy(), resources.len());
		let loads =
			resources.iter_mut().map(|resource| self.load_external_resource(resource, handler));
		let results = span.instrument(future::join_all(loads)).await;

		BatchReport { results }
	}
}
