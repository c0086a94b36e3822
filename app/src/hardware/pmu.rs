//! Power Management Unit (PMU) hardware initialization module
//!
//! This module handles the initialization and configuration of the AXP2101
//! power management IC via I2C interface.

use drivers::axp2101::asynch::Axp2101Async;
use drivers::axp2101::{AdcChannels, ChargeTargetVoltage, IrqFlags, Rail};
use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use esp_hal::i2c::master::I2c;
use esp_hal::Async;
use log::info;

/// Output voltages of the rails the board uses, in millivolts
const RAIL_PLAN: [(Rail, u16); 8] = [
    // ESP32-S3 core supply
    (Rail::Dc3, 3300),
    // external 3.3V supply
    (Rail::Dc1, 3300),
    (Rail::Aldo1, 1800),
    (Rail::Aldo2, 2800),
    (Rail::Aldo3, 3300),
    (Rail::Aldo4, 3000),
    // AMOLED supply
    (Rail::Bldo1, 3300),
    (Rail::Bldo2, 3300),
];

/// Precharge current in milliamperes
const PMU_PRECHARGE_CURRENT: u16 = 50;

/// Constant charge current in milliamperes
const PMU_CONSTANT_CHARGE_CURRENT: u16 = 200;

/// Charge termination current in milliamperes
const PMU_TERMINATION_CURRENT: u16 = 25;

/// Type alias for the AXP2101 PMU driver instance
pub type Pmu = Axp2101Async<I2cDevice<'static, CriticalSectionRawMutex, I2c<'static, Async>>>;

/// Initializes and configures the AXP2101 power management unit.
///
/// This function:
/// - switches off the rails the board leaves unconnected
/// - programs and enables the rails in [`RAIL_PLAN`]
/// - enables the voltage and temperature measurements
/// - disables the TS pin measurement, the board has no battery thermistor
/// - enables battery, VBUS, power key and charge interrupts
/// - configures the charger
///
/// # Charging Configuration
///
/// - **Target voltage**: 4.1V
/// - **Precharge current**: 50mA
/// - **Constant charge current**: 200mA
/// - **Termination current**: 25mA
///
/// # Panics
///
/// Panics if any initialization or configuration step fails.
pub async fn initialize_pmu(
    i2c_device: I2cDevice<'static, CriticalSectionRawMutex, I2c<'static, Async>>,
) -> Pmu {
    let mut pmu = Axp2101Async::new(i2c_device);
    pmu.init().await.expect("Failed to initialize AXP2101");

    for rail in Rail::ALL {
        if !RAIL_PLAN.iter().any(|(planned, _)| *planned == rail) {
            pmu.disable_rail(rail).await.expect("disable_rail failed");
        }
    }
    for (rail, millivolt) in RAIL_PLAN {
        pmu.set_rail_voltage(rail, millivolt)
            .await
            .expect("set_rail_voltage failed");
        pmu.enable_rail(rail).await.expect("enable_rail failed");
    }

    for rail in Rail::ALL {
        let enabled = pmu
            .is_rail_enabled(rail)
            .await
            .expect("is_rail_enabled failed");
        let voltage = pmu.rail_voltage(rail).await.expect("rail_voltage failed");
        info!(
            "{rail:<7}: {}   Voltage: {} mV",
            if enabled { "+" } else { "-" },
            voltage.unwrap_or(0)
        );
    }

    pmu.enable_adc_channels(
        AdcChannels::BATTERY_VOLTAGE
            | AdcChannels::VBUS_VOLTAGE
            | AdcChannels::SYSTEM_VOLTAGE
            | AdcChannels::DIE_TEMPERATURE,
    )
    .await
    .expect("enable_adc_channels failed");
    pmu.disable_ts_pin_measure()
        .await
        .expect("disable_ts_pin_measure failed");

    pmu.disable_irq(IrqFlags::all())
        .await
        .expect("disable_irq failed");
    pmu.clear_irq_status()
        .await
        .expect("clear_irq_status failed");
    pmu.enable_irq(
        IrqFlags::BAT_INSERT
            | IrqFlags::BAT_REMOVE
            | IrqFlags::VBUS_INSERT
            | IrqFlags::VBUS_REMOVE
            | IrqFlags::PKEY_SHORT
            | IrqFlags::PKEY_LONG
            | IrqFlags::BAT_CHG_DONE
            | IrqFlags::BAT_CHG_START,
    )
    .await
    .expect("enable_irq failed");

    pmu.set_precharge_current(PMU_PRECHARGE_CURRENT)
        .await
        .expect("set_precharge_current failed");
    pmu.set_charge_current(PMU_CONSTANT_CHARGE_CURRENT)
        .await
        .expect("set_charge_current failed");
    pmu.set_termination_current(PMU_TERMINATION_CURRENT)
        .await
        .expect("set_termination_current failed");
    pmu.set_charge_target_voltage(ChargeTargetVoltage::Volt4V1)
        .await
        .expect("set_charge_target_voltage failed");

    info!(
        "IRQ enabled: {:?}",
        pmu.irq_enabled().await.expect("irq_enabled failed")
    );

    match pmu.battery_percent().await.expect("battery_percent failed") {
        Some(percent) => info!("Battery: {percent}%"),
        None => info!("Battery: not connected"),
    }

    pmu
}
