// self
use crate::{
	flows::{AccessStrategy, Remediation},
	obs::FlowOutcome,
};

/// Records a load outcome via the global metrics recorder (when enabled).
pub fn record_negotiation(strategy: AccessStrategy, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"iiif_access_negotiation_total",
			"strategy" => strategy.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (strategy, outcome);
	}
}

/// Records the remediation chosen for an access-controlled resource (when enabled).
pub fn record_remediation(strategy: AccessStrategy, remediation: Remediation) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"iiif_access_remediation_total",
			"strategy" => strategy.as_str(),
			"remediation" => remediation.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (strategy, remediation);
	}
}
