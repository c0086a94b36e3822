use embassy_sync::{blocking_mutex::raw::NoopRawMutex, mutex::Mutex};
use watch_core::{config::RENDER_DELAY_BOUNDS, scheduler::RenderScheduler};

use crate::gui::Gui;

/// Drives slint: timers, input and rendering under the GUI lock, then sleeps
/// until the next scheduled work
#[embassy_executor::task]
pub async fn render_task(gui: &'static Mutex<NoopRawMutex, Gui>) {
    RenderScheduler::new(gui, RENDER_DELAY_BOUNDS).run().await
}
