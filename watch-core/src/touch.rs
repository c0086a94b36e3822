//! Touch input: one sample per render pass, turned into pointer events.

use drivers::ft5x06::{asynch::Ft5x06Async, TouchError};
use embedded_hal_async::i2c::I2c;
use log::warn;

use crate::rotation::Orientation;

/// State of the panel at one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchSample {
    Pressed { x: u16, y: u16 },
    Released,
}

/// First contact of the last sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchCoordinates {
    pub x: u16,
    pub y: u16,
    pub count: u8,
}

/// Touch controller as seen by the sampler
#[allow(async_fn_in_trait)]
pub trait TouchController {
    type Error: core::fmt::Debug;

    /// Reads the controller state over the bus
    async fn sample(&mut self) -> Result<(), Self::Error>;

    /// Coordinates captured by the last successful [`TouchController::sample`]
    fn coordinates(&self) -> TouchCoordinates;
}

impl<I2C: I2c> TouchController for Ft5x06Async<I2C> {
    type Error = TouchError;

    async fn sample(&mut self) -> Result<(), TouchError> {
        Ft5x06Async::sample(self).await
    }

    fn coordinates(&self) -> TouchCoordinates {
        let data = self.touch_data();
        let point = data.first().unwrap_or_default();
        TouchCoordinates {
            x: point.x,
            y: point.y,
            count: data.count,
        }
    }
}

pub struct TouchSampler<T> {
    controller: T,
}

impl<T: TouchController> TouchSampler<T> {
    pub fn new(controller: T) -> Self {
        Self { controller }
    }

    /// Raw panel coordinates of the current contact. A failed read is
    /// logged and counts as released.
    pub async fn poll(&mut self) -> TouchSample {
        if let Err(e) = self.controller.sample().await {
            warn!("touch sample failed: {e:?}");
            return TouchSample::Released;
        }
        let coordinates = self.controller.coordinates();
        if coordinates.count > 0 {
            TouchSample::Pressed {
                x: coordinates.x,
                y: coordinates.y,
            }
        } else {
            TouchSample::Released
        }
    }
}

/// Pointer transition derived from consecutive samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Pressed { x: u16, y: u16 },
    Moved { x: u16, y: u16 },
    /// Released where the contact was last seen
    Released { x: u16, y: u16 },
}

/// Turns samples into press / move / release events in logical coordinates
#[derive(Debug, Default)]
pub struct PointerTracker {
    last: Option<(u16, u16)>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self) -> bool {
        self.last.is_some()
    }

    /// Maps `sample` from a `width` x `height` panel through `orientation`
    /// and reports what changed since the previous sample.
    pub fn update(
        &mut self,
        sample: TouchSample,
        orientation: Orientation,
        width: u16,
        height: u16,
    ) -> Option<PointerEvent> {
        match sample {
            TouchSample::Pressed { x, y } => {
                let (x, y) = orientation.map_touch_point(x, y, width, height);
                match self.last.replace((x, y)) {
                    None => Some(PointerEvent::Pressed { x, y }),
                    Some(previous) if previous != (x, y) => Some(PointerEvent::Moved { x, y }),
                    Some(_) => None,
                }
            }
            TouchSample::Released => self
                .last
                .take()
                .map(|(x, y)| PointerEvent::Released { x, y }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    struct FakeTouch {
        script: Vec<Result<TouchCoordinates, ()>>,
        current: TouchCoordinates,
    }

    impl TouchController for FakeTouch {
        type Error = ();

        async fn sample(&mut self) -> Result<(), ()> {
            match self.script.remove(0) {
                Ok(coordinates) => {
                    self.current = coordinates;
                    Ok(())
                }
                Err(()) => Err(()),
            }
        }

        fn coordinates(&self) -> TouchCoordinates {
            self.current
        }
    }

    fn sampler(script: Vec<Result<TouchCoordinates, ()>>) -> TouchSampler<FakeTouch> {
        TouchSampler::new(FakeTouch {
            script,
            current: TouchCoordinates::default(),
        })
    }

    #[test]
    fn test_contact_is_pressed_at_its_coordinates() {
        let mut sampler = sampler(vec![Ok(TouchCoordinates {
            x: 120,
            y: 200,
            count: 1,
        })]);

        assert_eq!(
            block_on(sampler.poll()),
            TouchSample::Pressed { x: 120, y: 200 }
        );
    }

    #[test]
    fn test_no_contact_is_released() {
        let mut sampler = sampler(vec![Ok(TouchCoordinates {
            x: 120,
            y: 200,
            count: 0,
        })]);

        assert_eq!(block_on(sampler.poll()), TouchSample::Released);
    }

    #[test]
    fn test_failed_sample_is_released() {
        let mut sampler = sampler(vec![
            Ok(TouchCoordinates {
                x: 1,
                y: 2,
                count: 1,
            }),
            Err(()),
        ]);

        block_on(sampler.poll());
        assert_eq!(block_on(sampler.poll()), TouchSample::Released);
    }

    #[test]
    fn test_tracker_press_move_release() {
        let mut tracker = PointerTracker::new();
        let o = Orientation::Deg0;

        assert_eq!(tracker.update(TouchSample::Released, o, 368, 448), None);
        assert_eq!(
            tracker.update(TouchSample::Pressed { x: 10, y: 20 }, o, 368, 448),
            Some(PointerEvent::Pressed { x: 10, y: 20 })
        );
        assert_eq!(
            tracker.update(TouchSample::Pressed { x: 10, y: 20 }, o, 368, 448),
            None
        );
        assert_eq!(
            tracker.update(TouchSample::Pressed { x: 12, y: 25 }, o, 368, 448),
            Some(PointerEvent::Moved { x: 12, y: 25 })
        );
        assert!(tracker.is_pressed());
        assert_eq!(
            tracker.update(TouchSample::Released, o, 368, 448),
            Some(PointerEvent::Released { x: 12, y: 25 })
        );
        assert!(!tracker.is_pressed());
    }

    #[test]
    fn test_tracker_maps_through_orientation() {
        let mut tracker = PointerTracker::new();

        assert_eq!(
            tracker.update(
                TouchSample::Pressed { x: 10, y: 20 },
                Orientation::Deg90,
                368,
                448
            ),
            Some(PointerEvent::Pressed { x: 427, y: 10 })
        );
    }
}
