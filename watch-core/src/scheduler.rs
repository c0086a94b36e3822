//! Periodic driver of the graphics library.
//!
//! Every iteration locks the GUI state, lets it do its pending work, unlocks
//! and sleeps for as long as the GUI asked, within [`DelayBounds`].

use embassy_sync::{blocking_mutex::raw::RawMutex, mutex::Mutex};
use embassy_time::{Duration, Timer};
use log::trace;

/// Work the scheduler runs under the GUI lock
#[allow(async_fn_in_trait)]
pub trait WorkProcessor {
    /// Runs timers, input and rendering. Returns the delay until the next
    /// scheduled work, `None` when nothing is scheduled.
    async fn process(&mut self) -> Option<Duration>;
}

/// Inclusive range the scheduler sleeps within
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayBounds {
    pub min: Duration,
    pub max: Duration,
}

impl DelayBounds {
    pub const fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// `max(min, min(max, requested))`, nothing scheduled sleeps for `max`
    pub fn clamp(&self, requested: Option<Duration>) -> Duration {
        match requested {
            Some(delay) => delay.max(self.min).min(self.max),
            None => self.max,
        }
    }
}

pub struct RenderScheduler<'a, M: RawMutex, W> {
    gui: &'a Mutex<M, W>,
    bounds: DelayBounds,
}

impl<'a, M: RawMutex, W: WorkProcessor> RenderScheduler<'a, M, W> {
    pub fn new(gui: &'a Mutex<M, W>, bounds: DelayBounds) -> Self {
        Self { gui, bounds }
    }

    /// One locked pass over the GUI. The lock is released before the delay
    /// is returned.
    pub async fn step(&self) -> Duration {
        let requested = {
            let mut gui = self.gui.lock().await;
            gui.process().await
        };
        let delay = self.bounds.clamp(requested);
        trace!("render requested {requested:?}, sleeping {delay:?}");
        delay
    }

    pub async fn run(&self) -> ! {
        loop {
            let delay = self.step().await;
            Timer::after(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RENDER_DELAY_BOUNDS;
    use embassy_futures::{block_on, poll_once};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use proptest::prelude::*;

    struct Scripted {
        replies: Vec<Option<Duration>>,
        calls: usize,
    }

    impl WorkProcessor for Scripted {
        async fn process(&mut self) -> Option<Duration> {
            let reply = self.replies[self.calls];
            self.calls += 1;
            reply
        }
    }

    fn scripted(replies: &[Option<Duration>]) -> Mutex<NoopRawMutex, Scripted> {
        Mutex::new(Scripted {
            replies: replies.to_vec(),
            calls: 0,
        })
    }

    #[test]
    fn test_requested_delays_are_clamped() {
        let gui = scripted(&[
            Some(Duration::from_millis(0)),
            Some(Duration::from_millis(10_000)),
            None,
            Some(Duration::from_millis(33)),
        ]);
        let scheduler = RenderScheduler::new(&gui, RENDER_DELAY_BOUNDS);

        assert_eq!(block_on(scheduler.step()), Duration::from_millis(1));
        assert_eq!(block_on(scheduler.step()), Duration::from_millis(500));
        assert_eq!(block_on(scheduler.step()), Duration::from_millis(500));
        assert_eq!(block_on(scheduler.step()), Duration::from_millis(33));
    }

    #[test]
    fn test_step_releases_the_lock() {
        let gui = scripted(&[None]);
        let scheduler = RenderScheduler::new(&gui, RENDER_DELAY_BOUNDS);

        block_on(scheduler.step());

        let guard = gui.try_lock().expect("lock still held after step");
        assert_eq!(guard.calls, 1);
    }

    #[test]
    fn test_step_waits_for_a_held_lock() {
        let gui = scripted(&[None]);
        let scheduler = RenderScheduler::new(&gui, RENDER_DELAY_BOUNDS);

        let guard = gui.try_lock().unwrap();
        let mut step = core::pin::pin!(scheduler.step());
        assert!(poll_once(step.as_mut()).is_pending());
        drop(guard);

        assert_eq!(block_on(step), Duration::from_millis(500));
    }

    proptest! {
        #[test]
        fn clamped_delay_stays_within_bounds(ms in 0u64..100_000) {
            let delay = RENDER_DELAY_BOUNDS.clamp(Some(Duration::from_millis(ms)));
            prop_assert!(delay >= RENDER_DELAY_BOUNDS.min);
            prop_assert!(delay <= RENDER_DELAY_BOUNDS.max);
            if (1..=500).contains(&ms) {
                prop_assert_eq!(delay, Duration::from_millis(ms));
            }
        }
    }
}
