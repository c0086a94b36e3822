//! Hardware initialization modules
//!
//! This module provides organized initialization functions for all hardware
//! components of the ESP32-S3 AMOLED watch board:
//!
//! - **Expander**: TCA9554 IO expander holding the peripheral reset lines
//! - **Display**: SH8601 AMOLED controller via quad SPI with DMA
//! - **Touchpad**: FT5x06 capacitive touch controller via I2C
//! - **PMU**: AXP2101 power management IC via I2C

pub mod display;
pub mod expander;
pub mod pmu;
pub mod touch;

pub use display::{initialize_display, AmoledDisplay, DISPLAY_HEIGHT, DISPLAY_WIDTH};
pub use expander::power_up_peripherals;
pub use pmu::{initialize_pmu, Pmu};
pub use touch::{initialize_touchpad, Touchpad};
