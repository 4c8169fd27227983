// self
use crate::obs::{CacheState, FlowOutcome};

/// Records an acquisition outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("oauth2_app_cache_acquire_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

/// Records a cache decision via the global metrics recorder (when enabled).
pub fn record_cache_state(state: CacheState) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("oauth2_app_cache_lookup_total", "state" => state.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = state;
	}
}
