//! Question countdown timer.
//!
//! At most one interval exists. Starting replaces the running one, so a new
//! question can never leave a stale timer ticking alongside it.

use std::{future, time::Duration};

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Period of a countdown tick.
pub const TICK: Duration = Duration::from_secs(1);

/// A restartable 1-second ticker.
#[derive(Debug)]
pub struct Countdown {
    period: Duration,
    interval: Option<Interval>,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Countdown {
    /// Stopped countdown with a 1-second period.
    pub fn new() -> Self {
        Self::with_period(TICK)
    }

    /// Stopped countdown with a custom period.
    pub fn with_period(period: Duration) -> Self {
        Self { period, interval: None }
    }

    /// Start ticking; the first tick is one period from now. Any running
    /// interval is dropped.
    pub fn start(&mut self) {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    /// Stop ticking.
    pub fn stop(&mut self) {
        self.interval = None;
    }

    /// Whether an interval is running.
    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Wait for the next tick. Pends forever while stopped. Cancel-safe.
    pub async fn tick(&mut self) {
        match &mut self.interval {
            Some(interval) => {
                interval.tick().await;
            },
            None => future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::timeout;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let mut countdown = Countdown::new();
        countdown.start();

        let started = Instant::now();
        countdown.tick().await;
        countdown.tick().await;
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_countdown_never_ticks() {
        let mut countdown = Countdown::new();
        assert!(timeout(Duration::from_secs(60), countdown.tick()).await.is_err());

        countdown.start();
        countdown.stop();
        assert!(!countdown.is_running());
        assert!(timeout(Duration::from_secs(60), countdown.tick()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_resets_phase() {
        let mut countdown = Countdown::new();
        countdown.start();
        tokio::time::advance(Duration::from_millis(900)).await;

        countdown.start();
        let restarted = Instant::now();
        countdown.tick().await;
        assert_eq!(restarted.elapsed(), Duration::from_secs(1));
    }
}
