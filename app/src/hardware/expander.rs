//! IO expander power sequence
//!
//! The TCA9554 drives the reset lines of the display and the touch controller.
//! Both stay in reset until [`power_up_peripherals`] pulses them.

use drivers::tca9554::{Direction, Tca9554Async, TCA9554_ADDRESS};
use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Timer;
use esp_hal::i2c::master::I2c;
use esp_hal::Async;
use log::info;

/// Expander pins wired to the peripheral reset lines
const RESET_PINS: u8 = 0b0000_0111;

/// Time the reset lines are held low
const RESET_HOLD_MS: u64 = 200;

/// Pulses the peripheral reset lines low, then releases them.
///
/// # Panics
///
/// Panics if the expander does not respond.
pub async fn power_up_peripherals(
    i2c_device: I2cDevice<'static, CriticalSectionRawMutex, I2c<'static, Async>>,
) {
    let mut expander = Tca9554Async::new(i2c_device, TCA9554_ADDRESS);
    expander
        .set_direction(RESET_PINS, Direction::Output)
        .await
        .expect("Failed to configure expander pins");
    expander
        .set_level(RESET_PINS, false)
        .await
        .expect("Failed to pull reset lines low");
    Timer::after_millis(RESET_HOLD_MS).await;
    expander
        .set_level(RESET_PINS, true)
        .await
        .expect("Failed to release reset lines");
    info!("Peripheral reset released");
}
