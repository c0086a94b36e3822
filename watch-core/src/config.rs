//! Build-time tuning of the pipeline

use embassy_time::Duration;

use crate::scheduler::DelayBounds;

/// Period of the monotonic tick feeding the graphics library clock
pub const TICK_PERIOD: Duration = Duration::from_millis(2);

/// The render scheduler never sleeps shorter or longer than this
pub const RENDER_DELAY_BOUNDS: DelayBounds =
    DelayBounds::new(Duration::from_millis(1), Duration::from_millis(500));

/// PMU status is refreshed at least this often without interrupts
pub const POWER_POLL_PERIOD: Duration = Duration::from_millis(1000);

/// Pending PMU interrupt notifications, further ones are dropped
pub const POWER_EVENT_QUEUE_DEPTH: usize = 5;

/// Each draw buffer holds `height / BUFFER_ROWS_DIVISOR` full-width rows
pub const BUFFER_ROWS_DIVISOR: u16 = 4;

/// Number of draw buffers cycling between render and transfer
pub const DRAW_BUFFER_COUNT: usize = 2;
