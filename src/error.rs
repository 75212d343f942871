//! Engine-level error types shared across negotiation flows, collaborators, and stores.

// self
use crate::{_prelude::*, obs::NegotiationStep};

/// Engine-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical engine error exposed by public APIs.
///
/// Denial is not an error: a resource that stays unauthorized after negotiation resolves with
/// [`NegotiationOutcome::Denied`](crate::flows::NegotiationOutcome::Denied).
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// The resource handle could not complete a fetch.
	#[error("Fetching {resource} failed.")]
	Fetch {
		/// Identifier of the resource being fetched.
		resource: Url,
		/// Transport failure reported by the handle.
		#[source]
		source: TransportError,
	},
	/// A collaborator rejected or failed one negotiation step.
	#[error("The {step} step failed for {resource}.")]
	Collaborator {
		/// Negotiation step that invoked the collaborator.
		step: NegotiationStep,
		/// Identifier of the resource under negotiation.
		resource: Url,
		/// Failure reported by the collaborator.
		#[source]
		source: CollaboratorError,
	},
}

/// Configuration failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Load options could not be parsed from JSON.
	#[error("Load options are malformed.")]
	OptionsParse {
		/// Structured parsing failure, including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Transport-level failures reported by [`ResourceHandle::fetch`](crate::resource::ResourceHandle::fetch).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while fetching the resource.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while fetching the resource.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}
}

/// Failures reported by [`AuthCollaborators`](crate::collaborators::AuthCollaborators) and
/// [`ResourceResponseHandler`](crate::collaborators::ResourceResponseHandler) implementations.
#[derive(Debug, ThisError)]
pub enum CollaboratorError {
	/// The user dismissed an interactive step (login window closed, terms declined).
	#[error("Interactive step was cancelled: {reason}.")]
	Cancelled {
		/// Collaborator-supplied reason string.
		reason: String,
	},
	/// The authentication service refused the request.
	#[error("Authentication service rejected the request: {reason}.")]
	Rejected {
		/// Collaborator-supplied reason string.
		reason: String,
	},
	/// Token store failure.
	#[error(transparent)]
	Storage(#[from] crate::store::StoreError),
	/// Any other collaborator failure.
	#[error("Collaborator failed.")]
	Other {
		/// Underlying failure.
		#[source]
		source: BoxError,
	},
}
impl CollaboratorError {
	/// Wraps an arbitrary collaborator failure.
	pub fn other(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Other { source: Box::new(src) }
	}
}
