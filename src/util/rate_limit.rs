//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Unauthenticated GitHub search allows roughly ten requests a minute
pub const SNIPPET_FETCH_RATE_LIMIT: u32 = 10;

/// Create a rate limiter allowing `requests_per_minute`, bursting up to the same amount
pub fn create_limiter_per_minute(requests_per_minute: u32) -> Arc<Limiter> {
    let quota = Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_matches_quota() {
        let limiter = create_limiter_per_minute(3);
        assert!((0..3).all(|_| limiter.check().is_ok()));
        assert!(limiter.check().is_err());
    }

    #[test]
    fn zero_quota_still_allows_one() {
        let limiter = create_limiter_per_minute(0);
        assert!(limiter.check().is_ok());
    }
}
