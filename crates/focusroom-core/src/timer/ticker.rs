//! Periodic tick source for a running countdown.

use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};

/// Wraps a tokio interval that exists only while the countdown runs.
///
/// `arm` and `disarm` are both idempotent and need no runtime; the interval
/// itself is created on the first poll of [`Ticker::tick`]. While disarmed,
/// `tick` never resolves, so it can sit in a `select!` next to other sources.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    armed: bool,
    interval: Option<Interval>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            armed: false,
            interval: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
        self.interval = None;
    }

    pub async fn tick(&mut self) {
        if !self.armed {
            return std::future::pending::<()>().await;
        }
        let period = self.period;
        let interval = self.interval.get_or_insert_with(|| {
            let mut interval = tokio::time::interval(period);
            // Skipped ticks are fine: remaining time comes from the deadline.
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });
        interval.tick().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm_without_runtime() {
        let mut ticker = Ticker::new(Duration::from_millis(250));
        ticker.arm();
        assert!(ticker.is_armed());
        ticker.disarm();
        assert!(!ticker.is_armed());
    }

    #[tokio::test]
    async fn arm_and_disarm_are_idempotent() {
        let mut ticker = Ticker::new(Duration::from_millis(10));
        assert!(!ticker.is_armed());
        ticker.arm();
        ticker.arm();
        assert!(ticker.is_armed());
        ticker.tick().await;
        ticker.disarm();
        ticker.disarm();
        assert!(!ticker.is_armed());
    }

    #[tokio::test]
    async fn disarmed_ticker_never_fires() {
        let mut ticker = Ticker::new(Duration::from_millis(1));
        let fired = tokio::time::timeout(Duration::from_millis(30), ticker.tick()).await;
        assert!(fired.is_err());
    }
}
