//! Watch UI state driven by the render scheduler.
//!
//! Everything here runs under the GUI lock: slint timers, the rotate
//! request, the latest PMU status, touch input and rendering.

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::Cell;

use drivers::axp2101::PmuStatus;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use embassy_time::Duration;
use log::{info, warn};
use slint::{
    platform::{software_renderer::MinimalSoftwareWindow, PointerEventButton, WindowEvent},
    LogicalPosition, PhysicalSize,
};
use slint_generated::AppWindow;
use watch_core::{
    flush::FlushAdapter,
    geometry::Area,
    pixel::Bgra8888,
    rotation::Orientation,
    scheduler::WorkProcessor,
    touch::{PointerEvent, PointerTracker, TouchSampler},
};

use crate::hardware::{Touchpad, DISPLAY_HEIGHT, DISPLAY_WIDTH};

pub struct Gui {
    window: Rc<MinimalSoftwareWindow>,
    app_window: AppWindow,
    /// Full logical frame, kept between renders so only dirty pixels change
    frame: Vec<Bgra8888>,
    flush: FlushAdapter<'static, CriticalSectionRawMutex>,
    touch: TouchSampler<Touchpad>,
    pointer: PointerTracker,
    orientation: Orientation,
    rotate_requested: Rc<Cell<bool>>,
    power_status: &'static Signal<CriticalSectionRawMutex, PmuStatus>,
}

impl Gui {
    pub fn new(
        window: Rc<MinimalSoftwareWindow>,
        app_window: AppWindow,
        flush: FlushAdapter<'static, CriticalSectionRawMutex>,
        touch: TouchSampler<Touchpad>,
        power_status: &'static Signal<CriticalSectionRawMutex, PmuStatus>,
    ) -> Self {
        let rotate_requested = Rc::new(Cell::new(false));
        let request = rotate_requested.clone();
        app_window.on_rotate_clicked(move || request.set(true));

        // same pixel count in every orientation
        let pixels = usize::from(DISPLAY_WIDTH) * usize::from(DISPLAY_HEIGHT);

        Self {
            window,
            app_window,
            frame: vec![Bgra8888::default(); pixels],
            flush,
            touch,
            pointer: PointerTracker::new(),
            orientation: Orientation::default(),
            rotate_requested,
            power_status,
        }
    }

    /// Switches the screen to `orientation`. The panel transform is queued
    /// behind the frames already flushed, the next render repaints the whole
    /// resized window.
    pub async fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
        self.flush.transform(orientation.panel_transform()).await;

        let (width, height) = self.orientation.logical_size(DISPLAY_WIDTH, DISPLAY_HEIGHT);
        self.flush.set_frame_size(width, height);
        self.window.set_size(PhysicalSize::new(width.into(), height.into()));
        self.app_window
            .set_orientation_text(slint::format!("{}°", self.orientation.degrees()));
        info!("Rotated to {}°", self.orientation.degrees());
    }

    fn show_status(&self, status: &PmuStatus) {
        let battery = match status.battery_percent {
            Some(percent) if status.battery_connected => slint::format!("{percent}%"),
            _ => slint::format!("No battery"),
        };
        self.app_window.set_battery_text(battery);
        self.app_window.set_charger_text(slint::format!(
            "{} / {} mV",
            status.charger,
            status.battery_mv
        ));
        self.app_window
            .set_temperature_text(slint::format!("{:.1}°C", status.temperature));
        self.app_window.set_charging(status.is_charging());
    }

    async fn dispatch_touch(&mut self) {
        let sample = self.touch.poll().await;
        let Some(event) = self
            .pointer
            .update(sample, self.orientation, DISPLAY_WIDTH, DISPLAY_HEIGHT)
        else {
            return;
        };

        let button = PointerEventButton::Left;
        let event = match event {
            PointerEvent::Pressed { x, y } => WindowEvent::PointerPressed {
                position: position(x, y),
                button,
            },
            PointerEvent::Moved { x, y } => WindowEvent::PointerMoved {
                position: position(x, y),
            },
            PointerEvent::Released { x, y } => WindowEvent::PointerReleased {
                position: position(x, y),
                button,
            },
        };
        if let Err(e) = self.window.try_dispatch_event(event) {
            warn!("Event dispatch failed: {e:?}");
        }
    }

    /// Renders if slint has pending changes and flushes the dirty region
    async fn render(&mut self) {
        let (width, height) = self.flush.frame_size();
        let stride = usize::from(width);
        let frame = &mut self.frame[..stride * usize::from(height)];

        let mut dirty = None;
        self.window.draw_if_needed(|renderer| {
            let region = renderer.render(frame, stride);
            let origin = region.bounding_box_origin();
            let size = region.bounding_box_size();
            dirty = Area::from_origin_size(
                to_u16(origin.x),
                to_u16(origin.y),
                to_u16(size.width),
                to_u16(size.height),
            );
        });

        if let Some(area) = dirty {
            if let Err(e) = self.flush.flush(&self.frame, stride, area).await {
                warn!("Flush of {area:?} failed: {e:?}");
            }
        }
    }
}

impl WorkProcessor for Gui {
    async fn process(&mut self) -> Option<Duration> {
        slint::platform::update_timers_and_animations();

        if self.rotate_requested.take() {
            self.set_orientation(self.orientation.next()).await;
        }
        if let Some(status) = self.power_status.try_take() {
            self.show_status(&status);
        }
        self.dispatch_touch().await;
        self.render().await;

        if self.window.has_active_animations() {
            return Some(Duration::from_millis(0));
        }
        slint::platform::duration_until_next_timer_update()
            .map(|next| Duration::from_millis(next.as_millis().min(u32::MAX.into()) as u64))
    }
}

fn position(x: u16, y: u16) -> LogicalPosition {
    LogicalPosition::new(f32::from(x), f32::from(y))
}

/// Out of range values become 0, an empty size drops the area
fn to_u16<T: TryInto<u16>>(value: T) -> u16 {
    value.try_into().unwrap_or(0)
}
