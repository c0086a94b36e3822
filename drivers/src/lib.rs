#![no_std]
//! Chip drivers for the Waveshare ESP32-S3 Touch AMOLED 1.8" watch board
//!
//! All drivers are async and talk through `embedded-hal-async` traits so the
//! board crate can share one I2C bus between them.

extern crate alloc;

/// AXP2101 power management IC driver.
pub mod axp2101;

/// FT5x06 capacitive touch controller driver.
pub mod ft5x06;

/// Register access shared by the I2C drivers.
pub mod register;

/// SH8601 AMOLED panel driver.
pub mod sh8601;

/// TCA9554 I2C IO expander driver.
pub mod tca9554;

#[cfg(test)]
mod mock;

#[cfg(test)]
mod tests {
    use crate::axp2101::{
        BatteryDirection, ChargerStatus, IrqFlags, PmuStatus, Rail,
    };
    use alloc::format;

    fn status() -> PmuStatus {
        PmuStatus {
            irq: IrqFlags::empty(),
            temperature: 31.5,
            direction: BatteryDirection::Charging,
            vbus_in: true,
            vbus_good: true,
            charger: ChargerStatus::ConstantVoltage,
            battery_connected: true,
            battery_mv: 4012,
            vbus_mv: 5021,
            system_mv: 3318,
            battery_percent: Some(64),
        }
    }

    #[test]
    fn test_pmu_status_display() {
        assert_eq!(
            format!("{}", status()),
            "temp 31.50°C, charging YES, discharge NO, standby NO, vbus in YES, vbus good YES, \
             charger: constant voltage, batt 4012 mV, vbus 5021 mV, sys 3318 mV, battery 64%"
        );
    }

    #[test]
    fn test_pmu_status_display_without_battery() {
        let status = PmuStatus {
            battery_connected: false,
            battery_percent: None,
            battery_mv: 0,
            direction: BatteryDirection::Standby,
            ..status()
        };
        assert!(format!("{status}").ends_with("sys 3318 mV"));
        assert!(format!("{status}").contains("standby YES"));
    }

    #[test]
    fn test_rail_display() {
        assert_eq!(format!("{}", Rail::Dc1), "DC1");
        assert_eq!(format!("{}", Rail::Cpusldo), "CPUSLDO");
        assert_eq!(format!("{}", Rail::Dldo2), "DLDO2");
        assert_eq!(format!("{:<7}|", Rail::Aldo1), "ALDO1  |");
    }
}
