use alloc::rc::Rc;
use log::info;
use slint::{
    platform::{software_renderer::MinimalSoftwareWindow, Platform, WindowAdapter},
    PlatformError,
};
use watch_core::tick::TickCounter;

pub struct Backend {
    window: Rc<MinimalSoftwareWindow>,
    ticks: &'static TickCounter,
}

impl Backend {
    pub fn new(window: Rc<MinimalSoftwareWindow>, ticks: &'static TickCounter) -> Self {
        Self { window, ticks }
    }
}

impl Platform for Backend {
    fn create_window_adapter(&self) -> Result<Rc<dyn WindowAdapter>, PlatformError> {
        let window = self.window.clone();
        info!("Creating window adapter");
        Ok(window)
    }

    /// Slint timers and animations run on the tick counter, not on the
    /// hardware timer
    fn duration_since_start(&self) -> core::time::Duration {
        self.ticks.elapsed()
    }
}
