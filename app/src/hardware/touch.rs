//! Touchpad hardware initialization module
//!
//! This module handles the initialization of the FT5x06 capacitive touch
//! controller via I2C interface. The controller is polled once per render
//! pass, so its interrupt line stays unused.

use drivers::ft5x06::asynch::Ft5x06Async;
use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use esp_hal::i2c::master::I2c;
use esp_hal::Async;
use log::info;
use watch_core::touch::TouchSampler;

/// Type alias for the FT5x06 touchpad driver instance
pub type Touchpad = Ft5x06Async<I2cDevice<'static, CriticalSectionRawMutex, I2c<'static, Async>>>;

/// Initializes the FT5x06 touchpad and wraps it in a sampler.
///
/// The driver writes the controller configuration sequence and logs the chip
/// and firmware identifiers.
///
/// # Panics
///
/// Panics if the controller does not respond.
pub async fn initialize_touchpad(
    i2c_device: I2cDevice<'static, CriticalSectionRawMutex, I2c<'static, Async>>,
) -> TouchSampler<Touchpad> {
    let mut touchpad = Ft5x06Async::new(i2c_device);
    touchpad.init().await.expect("Failed to initialize touchpad");
    info!("Touchpad ready");

    TouchSampler::new(touchpad)
}
