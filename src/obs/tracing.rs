// self
use crate::{_prelude::*, obs::CacheState};

/// Drives one acquisition inside an `oauth2_app_cache.acquire` span tagged with the client and
/// tenant it acquires for.
///
/// Without the `tracing` feature the future is awaited as is.
pub async fn in_acquire_span<F>(client_id: &str, tenant: &str, acquisition: F) -> F::Output
where
	F: Future,
{
	#[cfg(feature = "tracing")]
	{
		use tracing::Instrument;

		acquisition
			.instrument(tracing::info_span!("oauth2_app_cache.acquire", client_id, tenant))
			.await
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (client_id, tenant);

		acquisition.await
	}
}

/// Emits a `debug` event describing a cache decision (when enabled).
pub fn trace_cache_state(state: CacheState) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(cache = state.as_str(), "Cache lookup resolved.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = state;
	}
}

/// Emits a `debug` event when a fresh token evicted older overlapping ones.
pub fn trace_superseded_tokens(evicted: usize) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(evicted, "Fresh token superseded cached tokens.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = evicted;
	}
}
