//! Injectable time sources so expiry decisions stay testable without the wall clock.

// self
use crate::_prelude::*;

/// Source of the current instant consulted by expiry checks and entity construction.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current UTC instant.
	fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time as reported by the operating system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually driven clock for tests and simulations.
#[derive(Debug)]
pub struct FixedClock(Mutex<OffsetDateTime>);
impl FixedClock {
	/// Creates a clock frozen at `instant`.
	pub fn new(instant: OffsetDateTime) -> Self {
		Self(Mutex::new(instant))
	}

	/// Moves the clock to `instant`.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}

	/// Moves the clock forward by `delta`.
	pub fn advance(&self, delta: Duration) {
		let mut guard = self.0.lock();

		*guard = guard.saturating_add(delta);
	}
}
impl Clock for FixedClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn fixed_clock_moves_only_when_told() {
		let clock = FixedClock::new(macros::datetime!(2025-03-01 08:00 UTC));

		assert_eq!(clock.now(), macros::datetime!(2025-03-01 08:00 UTC));

		clock.advance(Duration::minutes(90));

		assert_eq!(clock.now(), macros::datetime!(2025-03-01 09:30 UTC));

		clock.set(macros::datetime!(2024-12-31 23:59 UTC));

		assert_eq!(clock.now(), macros::datetime!(2024-12-31 23:59 UTC));
	}

	#[test]
	fn system_clock_tracks_utc_now() {
		let before = OffsetDateTime::now_utc();
		let observed = SystemClock.now();

		assert!(observed >= before);
		assert!(observed - before < Duration::minutes(1));
	}
}
