use super::*;
use crate::register::RegisterDevice;
use embedded_hal_async::i2c::I2c;
use log::{debug, info};

/// <https://github.com/lewisxhe/XPowersLib/blob/master/src/XPowersAXP2101.tpp>
///
/// AXP2101 power management IC driver.
/// Covers the output rails, the charger, the measurement ADC and the
/// interrupt registers used by the watch.
#[derive(Debug)]
pub struct Axp2101Async<I2C> {
    dev: RegisterDevice<I2C>,
}

impl<I2C> Axp2101Async<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C) -> Self {
        Self {
            dev: RegisterDevice::new(i2c, AXP2101_ADDRESS),
        }
    }

    /// Checks that an AXP2101 answers on the bus
    pub async fn init(&mut self) -> Result<(), PmuError> {
        let id = self.chip_id().await?;
        if id != CHIP_ID {
            return Err(PmuError::UnknownChip(id));
        }
        info!("AXP2101 found at 0x{:02X}", self.dev.adr);
        Ok(())
    }

    pub async fn chip_id(&mut self) -> Result<u8, PmuError> {
        Ok(self.dev.read_register(REG_IC_TYPE).await?)
    }

    pub async fn enable_rail(&mut self, rail: Rail) -> Result<(), PmuError> {
        let (reg, bit) = rail.enable_bit();
        Ok(self.dev.set_register_bit(reg, bit).await?)
    }

    pub async fn disable_rail(&mut self, rail: Rail) -> Result<(), PmuError> {
        let (reg, bit) = rail.enable_bit();
        Ok(self.dev.clear_register_bit(reg, bit).await?)
    }

    pub async fn is_rail_enabled(&mut self, rail: Rail) -> Result<bool, PmuError> {
        let (reg, bit) = rail.enable_bit();
        Ok(self.dev.get_register_bit(reg, bit).await?)
    }

    /// Programs the rail's output voltage. Values outside the rail's table
    /// are rejected before the bus is touched.
    pub async fn set_rail_voltage(&mut self, rail: Rail, millivolt: u16) -> Result<(), PmuError> {
        let code = rail.encode_voltage(millivolt)?;
        let (reg, mask) = rail.voltage_register();
        debug!("{rail} -> {millivolt} mV (code {code})");
        Ok(self.dev.update_register(reg, mask, code).await?)
    }

    /// Configured rail voltage, `None` when the register holds a reserved code
    pub async fn rail_voltage(&mut self, rail: Rail) -> Result<Option<u16>, PmuError> {
        let (reg, mask) = rail.voltage_register();
        let code = self.dev.read_register(reg).await? & mask;
        Ok(rail.decode_voltage(code))
    }

    pub async fn enable_adc_channels(&mut self, channels: AdcChannels) -> Result<(), PmuError> {
        let bits = channels.bits();
        Ok(self
            .dev
            .update_register(REG_ADC_CHANNEL_CTRL, bits, bits)
            .await?)
    }

    pub async fn disable_adc_channels(&mut self, channels: AdcChannels) -> Result<(), PmuError> {
        Ok(self
            .dev
            .update_register(REG_ADC_CHANNEL_CTRL, channels.bits(), 0)
            .await?)
    }

    /// Boards without a battery thermistor must turn the TS pin measurement
    /// off, otherwise the charger refuses to charge.
    pub async fn disable_ts_pin_measure(&mut self) -> Result<(), PmuError> {
        self.dev.update_register(REG_TS_PIN_CTRL, 0x1F, 0x10).await?;
        self.disable_adc_channels(AdcChannels::TS_PIN).await
    }

    pub async fn enable_irq(&mut self, flags: IrqFlags) -> Result<(), PmuError> {
        let enabled = self.irq_enabled().await?;
        self.write_irq_enable(enabled | flags).await
    }

    pub async fn disable_irq(&mut self, flags: IrqFlags) -> Result<(), PmuError> {
        let enabled = self.irq_enabled().await?;
        self.write_irq_enable(enabled - flags).await
    }

    pub async fn irq_enabled(&mut self) -> Result<IrqFlags, PmuError> {
        let mut buffer = [0u8; 3];
        self.dev
            .read_registers(REG_IRQ_ENABLE, &mut buffer)
            .await?;
        Ok(IrqFlags::from_registers(buffer))
    }

    async fn write_irq_enable(&mut self, flags: IrqFlags) -> Result<(), PmuError> {
        Ok(self
            .dev
            .write_registers(REG_IRQ_ENABLE, &flags.to_registers())
            .await?)
    }

    pub async fn irq_status(&mut self) -> Result<IrqFlags, PmuError> {
        let mut buffer = [0u8; 3];
        self.dev
            .read_registers(REG_IRQ_STATUS, &mut buffer)
            .await?;
        Ok(IrqFlags::from_registers(buffer))
    }

    /// Status bits are write-one-to-clear
    pub async fn clear_irq_status(&mut self) -> Result<(), PmuError> {
        Ok(self
            .dev
            .write_registers(REG_IRQ_STATUS, &[0xFF; 3])
            .await?)
    }

    pub async fn set_precharge_current(&mut self, milliampere: u16) -> Result<(), PmuError> {
        let code = fine_current_code(milliampere)?;
        Ok(self
            .dev
            .update_register(REG_PRECHARGE_CURRENT, 0x0F, code)
            .await?)
    }

    pub async fn set_charge_current(&mut self, milliampere: u16) -> Result<(), PmuError> {
        let code = charge_current_code(milliampere)?;
        Ok(self
            .dev
            .update_register(REG_CHARGE_CURRENT, 0x1F, code)
            .await?)
    }

    pub async fn set_termination_current(&mut self, milliampere: u16) -> Result<(), PmuError> {
        let code = fine_current_code(milliampere)?;
        Ok(self
            .dev
            .update_register(REG_TERMINATION_CURRENT, 0x0F, code)
            .await?)
    }

    pub async fn set_charge_target_voltage(
        &mut self,
        voltage: ChargeTargetVoltage,
    ) -> Result<(), PmuError> {
        Ok(self
            .dev
            .update_register(REG_CHARGE_VOLTAGE, 0x07, voltage.into())
            .await?)
    }

    pub async fn is_vbus_good(&mut self) -> Result<bool, PmuError> {
        Ok(self.dev.get_register_bit(REG_STATUS1, 5).await?)
    }

    pub async fn is_battery_connected(&mut self) -> Result<bool, PmuError> {
        Ok(self.dev.get_register_bit(REG_STATUS1, 3).await?)
    }

    pub async fn is_vbus_in(&mut self) -> Result<bool, PmuError> {
        let status2 = self.dev.read_register(REG_STATUS2).await?;
        Ok(status2 & 0x08 == 0 && self.is_vbus_good().await?)
    }

    pub async fn battery_direction(&mut self) -> Result<BatteryDirection, PmuError> {
        let status2 = self.dev.read_register(REG_STATUS2).await?;
        Ok(direction_from_status(status2))
    }

    pub async fn charger_status(&mut self) -> Result<ChargerStatus, PmuError> {
        let status2 = self.dev.read_register(REG_STATUS2).await?;
        Ok(charger_from_status(status2))
    }

    /// Battery voltage in mV, 0 without a battery
    pub async fn battery_voltage(&mut self) -> Result<u16, PmuError> {
        if !self.is_battery_connected().await? {
            return Ok(0);
        }
        Ok(self.dev.read_h5_l8(REG_ADC_BATTERY).await?)
    }

    /// VBUS voltage in mV, 0 without external power
    pub async fn vbus_voltage(&mut self) -> Result<u16, PmuError> {
        if !self.is_vbus_in().await? {
            return Ok(0);
        }
        Ok(self.dev.read_h6_l8(REG_ADC_VBUS).await?)
    }

    pub async fn system_voltage(&mut self) -> Result<u16, PmuError> {
        Ok(self.dev.read_h6_l8(REG_ADC_SYSTEM).await?)
    }

    /// Die temperature in °C
    pub async fn temperature(&mut self) -> Result<f32, PmuError> {
        let raw = self.dev.read_h6_l8(REG_ADC_DIE_TEMP).await?;
        Ok(die_temperature(raw))
    }

    /// Fuel gauge estimate, `None` without a battery
    pub async fn battery_percent(&mut self) -> Result<Option<u8>, PmuError> {
        if !self.is_battery_connected().await? {
            return Ok(None);
        }
        Ok(Some(self.dev.read_register(REG_BATTERY_PERCENT).await?))
    }

    /// Takes a full status snapshot and acknowledges the pending interrupts.
    ///
    /// The interrupt status is read first and cleared last so flags raised
    /// while the snapshot is taken stay latched for the next poll.
    pub async fn poll_status(&mut self) -> Result<PmuStatus, PmuError> {
        let irq = self.irq_status().await?;

        let mut status = [0u8; 2];
        self.dev.read_registers(REG_STATUS1, &mut status).await?;
        let [status1, status2] = status;
        let vbus_good = status1 & 0x20 != 0;
        let battery_connected = status1 & 0x08 != 0;
        let vbus_in = vbus_good && status2 & 0x08 == 0;

        let temperature = self.temperature().await?;
        let battery_mv = if battery_connected {
            self.dev.read_h5_l8(REG_ADC_BATTERY).await?
        } else {
            0
        };
        let vbus_mv = if vbus_in {
            self.dev.read_h6_l8(REG_ADC_VBUS).await?
        } else {
            0
        };
        let system_mv = self.system_voltage().await?;
        let battery_percent = if battery_connected {
            Some(self.dev.read_register(REG_BATTERY_PERCENT).await?)
        } else {
            None
        };

        self.clear_irq_status().await?;

        Ok(PmuStatus {
            irq,
            temperature,
            direction: direction_from_status(status2),
            vbus_in,
            vbus_good,
            charger: charger_from_status(status2),
            battery_connected,
            battery_mv,
            vbus_mv,
            system_mv,
            battery_percent,
        })
    }
}

fn direction_from_status(status2: u8) -> BatteryDirection {
    BatteryDirection::try_from((status2 >> 5) & 0x03).unwrap_or(BatteryDirection::Standby)
}

fn charger_from_status(status2: u8) -> ChargerStatus {
    ChargerStatus::try_from(status2 & 0x07).unwrap_or(ChargerStatus::NotCharging)
}
