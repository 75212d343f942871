//! Per-broker negotiation counters, available without the `metrics` feature.

// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for negotiation outcomes.
#[derive(Debug, Default)]
pub struct NegotiationMetrics {
	attempts: AtomicU64,
	cached_token_hits: AtomicU64,
	click_throughs: AtomicU64,
	logins: AtomicU64,
	deferrals: AtomicU64,
	failures: AtomicU64,
}
impl NegotiationMetrics {
	/// Returns the number of loads started.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of fetches presented with a cached token.
	pub fn cached_token_hits(&self) -> u64 {
		self.cached_token_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of click-through acknowledgements started.
	pub fn click_throughs(&self) -> u64 {
		self.click_throughs.load(Ordering::Relaxed)
	}

	/// Returns the number of logins started.
	pub fn logins(&self) -> u64 {
		self.logins.load(Ordering::Relaxed)
	}

	/// Returns the number of redirects deferred to the caller.
	pub fn deferrals(&self) -> u64 {
		self.deferrals.load(Ordering::Relaxed)
	}

	/// Returns the number of loads that ended with an error.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_cached_token(&self) {
		self.cached_token_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_click_through(&self) {
		self.click_throughs.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_login(&self) {
		self.logins.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_deferral(&self) {
		self.deferrals.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn counters_start_at_zero_and_count_independently() {
		let metrics = NegotiationMetrics::default();

		metrics.record_attempt();
		metrics.record_attempt();
		metrics.record_login();
		metrics.record_failure();

		assert_eq!(metrics.attempts(), 2);
		assert_eq!(metrics.logins(), 1);
		assert_eq!(metrics.failures(), 1);
		assert_eq!(metrics.click_throughs(), 0);
		assert_eq!(metrics.cached_token_hits(), 0);
		assert_eq!(metrics.deferrals(), 0);
	}
}
