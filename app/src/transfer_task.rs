use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use watch_core::{flush::TransferWorker, frame_pool::FramePool};

use crate::hardware::AmoledDisplay;

/// Pushes flushed bands and scan direction changes to the panel
#[embassy_executor::task]
pub async fn transfer_task(
    pool: &'static FramePool<CriticalSectionRawMutex>,
    display: AmoledDisplay,
) {
    TransferWorker::new(pool, display).run().await
}
