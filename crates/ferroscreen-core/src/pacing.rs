//! Call pacing primitives.
//!
//! [`Pacer`] enforces the minimum spacing between any two dispatched calls.
//! [`CallBudget`] tracks the provider's longer allowance (the free tier grants
//! 25 calls a day) so an exhausted budget is answered locally instead of
//! spending a request on a guaranteed quota notice. The budget is a leaky
//! bucket: the full allowance is available up front and spent calls come back
//! one at a time, evenly spread over the day.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::middleware::NoOpMiddleware;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Returned when a wait for the next slot is interrupted by cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Spacing gate holding the instant of the last permitted dispatch.
#[derive(Debug, Default)]
pub struct Pacer {
    last_dispatch: Option<Instant>,
}

impl Pacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until `min_interval` has passed since the previous recorded dispatch.
    /// Returns how long it slept. The first turn never waits.
    ///
    /// Nothing is recorded; a caller that goes on to dispatch calls
    /// [`Pacer::record_dispatch`].
    pub async fn wait_turn(
        &self,
        min_interval: Duration,
        cancel: &CancellationToken,
    ) -> Result<Duration, Cancelled> {
        if cancel.is_cancelled() {
            return Err(Cancelled);
        }

        let started = Instant::now();
        if let Some(ready_at) = self.last_dispatch.map(|last| last + min_interval) {
            if ready_at > started {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(Cancelled),
                    _ = sleep_until(ready_at) => {}
                }
            }
        }

        Ok(Instant::now() - started)
    }

    pub fn record_dispatch(&mut self) {
        self.last_dispatch = Some(Instant::now());
    }

    #[cfg(test)]
    const fn last_dispatch(&self) -> Option<Instant> {
        self.last_dispatch
    }
}

type DirectRateLimiter<C> =
    RateLimiter<NotKeyed, InMemoryState, C, NoOpMiddleware<<C as Clock>::Instant>>;

/// Daily allowance of `limit` calls.
///
/// Up to `limit` calls pass immediately; after that one call is refilled every
/// `24h / limit` (57.6 minutes for 25 a day).
pub struct CallBudget<C: Clock = DefaultClock> {
    limiter: DirectRateLimiter<C>,
    clock: C,
    limit: u32,
}

impl CallBudget {
    pub fn per_day(limit: u32) -> Self {
        Self::with_clock(limit, DefaultClock::default())
    }
}

impl<C: Clock> CallBudget<C> {
    fn with_clock(limit: u32, clock: C) -> Self {
        Self {
            limiter: RateLimiter::direct_with_clock(daily_quota(limit), &clock),
            clock,
            limit: limit.max(1),
        }
    }

    /// Consumes one call from the allowance, or reports how long until one frees up.
    pub fn try_consume(&self) -> Result<(), Duration> {
        self.limiter
            .check()
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }

    pub const fn limit(&self) -> u32 {
        self.limit
    }
}

impl<C: Clock> std::fmt::Debug for CallBudget<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallBudget")
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

fn daily_quota(limit: u32) -> Quota {
    let burst = NonZeroU32::new(limit.max(1)).unwrap_or(NonZeroU32::MIN);
    let seconds_per_cell = (DAY.as_secs_f64() / f64::from(burst.get())).max(0.001);

    Quota::with_period(Duration::from_secs_f64(seconds_per_cell))
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}
