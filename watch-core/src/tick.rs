//! Millisecond clock of the graphics library.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_time::{Duration, Ticker};

/// Monotonic millisecond counter, advanced only by [`TickSource`]
#[derive(Debug, Default)]
pub struct TickCounter(AtomicU32);

impl TickCounter {
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    pub fn advance(&self, ms: u32) {
        self.0.fetch_add(ms, Ordering::Relaxed);
    }

    pub fn now_ms(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }

    /// Time since start, in the form the slint platform expects
    pub fn elapsed(&self) -> core::time::Duration {
        core::time::Duration::from_millis(u64::from(self.now_ms()))
    }
}

/// Advances a [`TickCounter`] by `period` every `period`
pub struct TickSource<'a> {
    counter: &'a TickCounter,
    period: Duration,
}

impl<'a> TickSource<'a> {
    pub fn new(counter: &'a TickCounter, period: Duration) -> Self {
        Self { counter, period }
    }

    fn period_ms(&self) -> u32 {
        u32::try_from(self.period.as_millis()).unwrap_or(u32::MAX)
    }

    pub async fn run(&self) -> ! {
        let mut ticker = Ticker::every(self.period);
        let step = self.period_ms();
        loop {
            ticker.next().await;
            self.counter.advance(step);
        }
    }
}
