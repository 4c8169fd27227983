//! Optional observability helpers for token acquisition.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to run every acquisition inside an `oauth2_app_cache.acquire` span (with
//!   `client_id` and `tenant` fields) and to emit `debug` events per cache decision (`cache`
//!   field) and per write that evicts superseded tokens (`evicted` field).
//! - Enable `metrics` to increment `oauth2_app_cache_acquire_total{outcome}` for every
//!   attempt/success/failure and `oauth2_app_cache_lookup_total{state}` for every cache decision.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to `acquire_token`.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
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

/// What the cache answered for one acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheState {
	/// A single valid entity was returned.
	Hit,
	/// A single entity matched but was inside the renewal window.
	Expired,
	/// Nothing matched.
	Miss,
	/// The cache was not consulted (`skip_cache` or claims).
	Skipped,
	/// More than one entity matched.
	Ambiguous,
}
impl CacheState {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheState::Hit => "hit",
			CacheState::Expired => "expired",
			CacheState::Miss => "miss",
			CacheState::Skipped => "skipped",
			CacheState::Ambiguous => "ambiguous",
		}
	}
}
impl Display for CacheState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Reports a cache decision to every enabled backend.
pub fn observe_cache_state(state: CacheState) {
	record_cache_state(state);
	trace_cache_state(state);
}
