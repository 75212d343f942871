// self
use crate::{_prelude::*, flows::AccessStrategy, obs::NegotiationStep};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by negotiation flows.
#[derive(Clone, Debug)]
pub struct NegotiationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl NegotiationSpan {
	/// Creates a span for one resource, tagged with the strategy + stage.
	pub fn new(strategy: AccessStrategy, stage: &'static str, resource: &Url) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"iiif_access.negotiation",
				strategy = strategy.as_str(),
				stage,
				resource = %resource,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (strategy, stage, resource);

			Self {}
		}
	}

	/// Creates a span covering a batch of resources.
	pub fn batch(strategy: AccessStrategy, resources: usize) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"iiif_access.negotiation",
				strategy = strategy.as_str(),
				stage = "load_external_resources",
				resources,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (strategy, resources);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event when a negotiation step starts.
pub fn trace_step(step: NegotiationStep, resource: &Url) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(step = step.as_str(), resource = %resource, "negotiation step");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (step, resource);
	}
}
