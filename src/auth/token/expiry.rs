//! Expiry evaluation with a forward-looking safety offset.

// self
use crate::{_prelude::*, clock::Clock};

/// Default margin subtracted from a token's lifetime before it is considered unusable.
pub const DEFAULT_TOKEN_RENEWAL_OFFSET: Duration = Duration::seconds(300);

/// Returns `true` once `clock.now() + safety_offset` reaches `expires_on`.
///
/// The boundary counts as expired so a token is never handed out when it would lapse within
/// the offset window.
pub fn is_token_expired<C>(expires_on: OffsetDateTime, safety_offset: Duration, clock: &C) -> bool
where
	C: ?Sized + Clock,
{
	clock.now().saturating_add(safety_offset) >= expires_on
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::clock::FixedClock;

	#[test]
	fn future_tokens_beyond_offset_are_valid() {
		let clock = FixedClock::new(macros::datetime!(2025-06-01 12:00 UTC));

		assert!(!is_token_expired(
			macros::datetime!(2025-06-01 13:00 UTC),
			DEFAULT_TOKEN_RENEWAL_OFFSET,
			&clock,
		));
		assert!(!is_token_expired(
			macros::datetime!(2025-06-01 12:05:01 UTC),
			DEFAULT_TOKEN_RENEWAL_OFFSET,
			&clock,
		));
	}

	#[test]
	fn boundary_and_past_tokens_are_expired() {
		let clock = FixedClock::new(macros::datetime!(2025-06-01 12:00 UTC));

		assert!(is_token_expired(
			macros::datetime!(2025-06-01 12:05 UTC),
			DEFAULT_TOKEN_RENEWAL_OFFSET,
			&clock,
		));
		assert!(is_token_expired(
			macros::datetime!(2025-06-01 12:04 UTC),
			DEFAULT_TOKEN_RENEWAL_OFFSET,
			&clock,
		));
		assert!(is_token_expired(macros::datetime!(2025-06-01 11:00 UTC), Duration::ZERO, &clock));
		assert!(is_token_expired(macros::datetime!(2025-06-01 12:00 UTC), Duration::ZERO, &clock));
	}

	#[test]
	fn offset_follows_the_clock() {
		let clock = FixedClock::new(macros::datetime!(2025-06-01 12:00 UTC));
		let expires_on = macros::datetime!(2025-06-01 12:30 UTC);

		assert!(!is_token_expired(expires_on, Duration::minutes(10), &clock));

		clock.advance(Duration::minutes(20));

		assert!(is_token_expired(expires_on, Duration::minutes(10), &clock));
	}
}
