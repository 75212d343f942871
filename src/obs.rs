//! Optional observability helpers for negotiation flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit spans named `iiif_access.negotiation` with the
//!   `strategy` and `stage` fields, plus a `debug` event for every collaborator step.
//! - Enable `metrics` to increment `iiif_access_negotiation_total` for every
//!   attempt/success/failure (labeled by `strategy` + `outcome`) and
//!   `iiif_access_remediation_total` for every remediation (labeled by `strategy` +
//!   `remediation`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Collaborator-facing steps of a negotiation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NegotiationStep {
	/// Resource fetch through the handle.
	Fetch,
	/// Cached token lookup.
	GetStoredAccessToken,
	/// Click-through acknowledgement.
	ClickThrough,
	/// Interactive login.
	Login,
	/// Token minting.
	GetAccessToken,
	/// Token persistence.
	StoreAccessToken,
	/// Post-processing of the final resource.
	HandleResourceResponse,
}
impl NegotiationStep {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			NegotiationStep::Fetch => "fetch",
			NegotiationStep::GetStoredAccessToken => "get_stored_access_token",
			NegotiationStep::ClickThrough => "click_through",
			NegotiationStep::Login => "login",
			NegotiationStep::GetAccessToken => "get_access_token",
			NegotiationStep::StoreAccessToken => "store_access_token",
			NegotiationStep::HandleResourceResponse => "handle_resource_response",
		}
	}
}
impl Display for NegotiationStep {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a loader.
	Attempt,
	/// The load resolved (authorized, unrestricted, deferred, or denied).
	Success,
	/// A fetch or collaborator failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
