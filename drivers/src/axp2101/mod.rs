use core::fmt::{self, Display, Formatter};

use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::register::BusError;

/// I2C address of the AXP2101
pub const AXP2101_ADDRESS: u8 = 0x34;
pub(crate) const CHIP_ID: u8 = 0x4A;

pub(crate) const REG_STATUS1: u8 = 0x00;
pub(crate) const REG_STATUS2: u8 = 0x01;
pub(crate) const REG_IC_TYPE: u8 = 0x03;
pub(crate) const REG_ADC_CHANNEL_CTRL: u8 = 0x30;
pub(crate) const REG_ADC_BATTERY: u8 = 0x34;
pub(crate) const REG_ADC_VBUS: u8 = 0x38;
pub(crate) const REG_ADC_SYSTEM: u8 = 0x3A;
pub(crate) const REG_ADC_DIE_TEMP: u8 = 0x3C;
pub(crate) const REG_IRQ_ENABLE: u8 = 0x40;
pub(crate) const REG_IRQ_STATUS: u8 = 0x48;
pub(crate) const REG_TS_PIN_CTRL: u8 = 0x50;
pub(crate) const REG_PRECHARGE_CURRENT: u8 = 0x61;
pub(crate) const REG_CHARGE_CURRENT: u8 = 0x62;
pub(crate) const REG_TERMINATION_CURRENT: u8 = 0x63;
pub(crate) const REG_CHARGE_VOLTAGE: u8 = 0x64;
pub(crate) const REG_DC_ONOFF: u8 = 0x80;
pub(crate) const REG_LDO_ONOFF0: u8 = 0x90;
pub(crate) const REG_LDO_ONOFF1: u8 = 0x91;
pub(crate) const REG_BATTERY_PERCENT: u8 = 0xA4;

pub(crate) const CHARGE_CURRENT_FINE_STEP: u16 = 25;
pub(crate) const CHARGE_CURRENT_FINE_MAX: u16 = 200;
pub(crate) const CHARGE_CURRENT_COARSE_STEP: u16 = 100;
pub(crate) const CHARGE_CURRENT_MAX: u16 = 1000;

/// Errors that can occur when interacting with the AXP2101
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PmuError {
    /// Chip id register did not hold the AXP2101 id
    UnknownChip(u8),
    /// Requested rail voltage is outside the rail's range or not on a step
    InvalidVoltage(Rail, u16),
    /// Requested charger current is not representable
    InvalidCurrent(u16),
    Bus(BusError),
}

impl From<BusError> for PmuError {
    fn from(e: BusError) -> Self {
        PmuError::Bus(e)
    }
}

/// Switchable output rails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rail {
    Dc1,
    Dc2,
    Dc3,
    Dc4,
    Dc5,
    Aldo1,
    Aldo2,
    Aldo3,
    Aldo4,
    Bldo1,
    Bldo2,
    Cpusldo,
    Dldo1,
    Dldo2,
}

/// One linear segment of a rail's voltage code table
#[derive(Debug, Clone, Copy)]
pub(crate) struct VoltageRange {
    pub min: u16,
    pub max: u16,
    pub step: u16,
    pub first_code: u8,
}

impl VoltageRange {
    const fn new(min: u16, max: u16, step: u16, first_code: u8) -> Self {
        Self {
            min,
            max,
            step,
            first_code,
        }
    }

    const fn last_code(&self) -> u8 {
        self.first_code + ((self.max - self.min) / self.step) as u8
    }
}

const DC1_RANGES: &[VoltageRange] = &[VoltageRange::new(1500, 3400, 100, 0)];
const DC2_RANGES: &[VoltageRange] = &[
    VoltageRange::new(500, 1200, 10, 0),
    VoltageRange::new(1220, 1540, 20, 71),
];
const DC3_RANGES: &[VoltageRange] = &[
    VoltageRange::new(500, 1200, 10, 0),
    VoltageRange::new(1220, 1540, 20, 71),
    VoltageRange::new(1600, 3400, 100, 88),
];
const DC4_RANGES: &[VoltageRange] = &[
    VoltageRange::new(500, 1200, 10, 0),
    VoltageRange::new(1220, 1840, 20, 71),
];
const DC5_RANGES: &[VoltageRange] = &[VoltageRange::new(1400, 3700, 100, 0)];
const LDO_RANGES: &[VoltageRange] = &[VoltageRange::new(500, 3500, 100, 0)];
const DLDO1_RANGES: &[VoltageRange] = &[VoltageRange::new(500, 3400, 100, 0)];
const LOW_LDO_RANGES: &[VoltageRange] = &[VoltageRange::new(500, 1400, 50, 0)];

impl Rail {
    pub const ALL: [Rail; 14] = [
        Rail::Dc1,
        Rail::Dc2,
        Rail::Dc3,
        Rail::Dc4,
        Rail::Dc5,
        Rail::Aldo1,
        Rail::Aldo2,
        Rail::Aldo3,
        Rail::Aldo4,
        Rail::Bldo1,
        Rail::Bldo2,
        Rail::Cpusldo,
        Rail::Dldo1,
        Rail::Dldo2,
    ];

    /// Register and bit of the rail's on/off switch
    pub(crate) const fn enable_bit(self) -> (u8, u8) {
        match self {
            Rail::Dc1 => (REG_DC_ONOFF, 0),
            Rail::Dc2 => (REG_DC_ONOFF, 1),
            Rail::Dc3 => (REG_DC_ONOFF, 2),
            Rail::Dc4 => (REG_DC_ONOFF, 3),
            Rail::Dc5 => (REG_DC_ONOFF, 4),
            Rail::Aldo1 => (REG_LDO_ONOFF0, 0),
            Rail::Aldo2 => (REG_LDO_ONOFF0, 1),
            Rail::Aldo3 => (REG_LDO_ONOFF0, 2),
            Rail::Aldo4 => (REG_LDO_ONOFF0, 3),
            Rail::Bldo1 => (REG_LDO_ONOFF0, 4),
            Rail::Bldo2 => (REG_LDO_ONOFF0, 5),
            Rail::Cpusldo => (REG_LDO_ONOFF0, 6),
            Rail::Dldo1 => (REG_LDO_ONOFF0, 7),
            Rail::Dldo2 => (REG_LDO_ONOFF1, 0),
        }
    }

    /// Voltage register and the mask of its code bits
    pub(crate) const fn voltage_register(self) -> (u8, u8) {
        match self {
            Rail::Dc1 => (0x82, 0x1F),
            Rail::Dc2 => (0x83, 0x7F),
            Rail::Dc3 => (0x84, 0x7F),
            Rail::Dc4 => (0x85, 0x7F),
            Rail::Dc5 => (0x86, 0x1F),
            Rail::Aldo1 => (0x92, 0x1F),
            Rail::Aldo2 => (0x93, 0x1F),
            Rail::Aldo3 => (0x94, 0x1F),
            Rail::Aldo4 => (0x95, 0x1F),
            Rail::Bldo1 => (0x96, 0x1F),
            Rail::Bldo2 => (0x97, 0x1F),
            Rail::Cpusldo => (0x98, 0x1F),
            Rail::Dldo1 => (0x99, 0x1F),
            Rail::Dldo2 => (0x9A, 0x1F),
        }
    }

    pub(crate) const fn voltage_ranges(self) -> &'static [VoltageRange] {
        match self {
            Rail::Dc1 => DC1_RANGES,
            Rail::Dc2 => DC2_RANGES,
            Rail::Dc3 => DC3_RANGES,
            Rail::Dc4 => DC4_RANGES,
            Rail::Dc5 => DC5_RANGES,
            Rail::Aldo1 | Rail::Aldo2 | Rail::Aldo3 | Rail::Aldo4 => LDO_RANGES,
            Rail::Bldo1 | Rail::Bldo2 => LDO_RANGES,
            Rail::Dldo1 => DLDO1_RANGES,
            Rail::Cpusldo | Rail::Dldo2 => LOW_LDO_RANGES,
        }
    }

    /// Register code for `millivolt`
    pub fn encode_voltage(self, millivolt: u16) -> Result<u8, PmuError> {
        self.voltage_ranges()
            .iter()
            .find(|r| (r.min..=r.max).contains(&millivolt))
            .filter(|r| (millivolt - r.min) % r.step == 0)
            .map(|r| r.first_code + ((millivolt - r.min) / r.step) as u8)
            .ok_or(PmuError::InvalidVoltage(self, millivolt))
    }

    /// Millivolts for a register code, `None` for reserved codes
    pub fn decode_voltage(self, code: u8) -> Option<u16> {
        self.voltage_ranges()
            .iter()
            .find(|r| (r.first_code..=r.last_code()).contains(&code))
            .map(|r| r.min + u16::from(code - r.first_code) * r.step)
    }
}

impl Display for Rail {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let name = match self {
            Rail::Dc1 => "DC1",
            Rail::Dc2 => "DC2",
            Rail::Dc3 => "DC3",
            Rail::Dc4 => "DC4",
            Rail::Dc5 => "DC5",
            Rail::Aldo1 => "ALDO1",
            Rail::Aldo2 => "ALDO2",
            Rail::Aldo3 => "ALDO3",
            Rail::Aldo4 => "ALDO4",
            Rail::Bldo1 => "BLDO1",
            Rail::Bldo2 => "BLDO2",
            Rail::Cpusldo => "CPUSLDO",
            Rail::Dldo1 => "DLDO1",
            Rail::Dldo2 => "DLDO2",
        };
        f.pad(name)
    }
}

bitflags! {
    /// Interrupt sources, bit `n` lives in register `0x40 + n / 8` (enable)
    /// and `0x48 + n / 8` (status)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IrqFlags: u32 {
        const BAT_NOR_UNDER_TEMP = 1 << 0;
        const BAT_NOR_OVER_TEMP = 1 << 1;
        const BAT_CHG_UNDER_TEMP = 1 << 2;
        const BAT_CHG_OVER_TEMP = 1 << 3;
        const GAUGE_NEW_SOC = 1 << 4;
        const WDT_TIMEOUT = 1 << 5;
        const WARNING_LEVEL1 = 1 << 6;
        const WARNING_LEVEL2 = 1 << 7;
        const PKEY_POSITIVE = 1 << 8;
        const PKEY_NEGATIVE = 1 << 9;
        const PKEY_LONG = 1 << 10;
        const PKEY_SHORT = 1 << 11;
        const BAT_REMOVE = 1 << 12;
        const BAT_INSERT = 1 << 13;
        const VBUS_REMOVE = 1 << 14;
        const VBUS_INSERT = 1 << 15;
        const BAT_OVER_VOLTAGE = 1 << 16;
        const CHARGER_TIMER = 1 << 17;
        const DIE_OVER_TEMP = 1 << 18;
        const BAT_CHG_START = 1 << 19;
        const BAT_CHG_DONE = 1 << 20;
        const BATFET_OVER_CURRENT = 1 << 21;
        const LDO_OVER_CURRENT = 1 << 22;
        const WDT_EXPIRE = 1 << 23;
    }
}

impl IrqFlags {
    pub(crate) fn from_registers(bytes: [u8; 3]) -> Self {
        IrqFlags::from_bits_truncate(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]))
    }

    pub(crate) fn to_registers(self) -> [u8; 3] {
        let bytes = self.bits().to_le_bytes();
        [bytes[0], bytes[1], bytes[2]]
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IrqFlags {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "IrqFlags({=u32:#x})", self.bits());
    }
}

bitflags! {
    /// Channels of the measurement ADC
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AdcChannels: u8 {
        const BATTERY_VOLTAGE = 1 << 0;
        const TS_PIN = 1 << 1;
        const VBUS_VOLTAGE = 1 << 2;
        const SYSTEM_VOLTAGE = 1 << 3;
        const DIE_TEMPERATURE = 1 << 4;
    }
}

/// Charger state machine position (STATUS2 bits 2:0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargerStatus {
    Trickle = 0,
    PreCharge = 1,
    ConstantCurrent = 2,
    ConstantVoltage = 3,
    Done = 4,
    NotCharging = 5,
}

impl Display for ChargerStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ChargerStatus::Trickle => write!(f, "tri_charge"),
            ChargerStatus::PreCharge => write!(f, "pre_charge"),
            ChargerStatus::ConstantCurrent => write!(f, "constant charge"),
            ChargerStatus::ConstantVoltage => write!(f, "constant voltage"),
            ChargerStatus::Done => write!(f, "charge done"),
            ChargerStatus::NotCharging => write!(f, "not charge"),
        }
    }
}

/// Battery current direction (STATUS2 bits 6:5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatteryDirection {
    Standby = 0,
    Charging = 1,
    Discharging = 2,
}

/// Charge termination voltage
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargeTargetVoltage {
    Volt4V0 = 1,
    Volt4V1 = 2,
    Volt4V2 = 3,
    Volt4V35 = 4,
    Volt4V4 = 5,
}

/// Code for the precharge and termination current registers (25 mA steps, 0..=200 mA)
pub(crate) fn fine_current_code(milliampere: u16) -> Result<u8, PmuError> {
    if milliampere > CHARGE_CURRENT_FINE_MAX || milliampere % CHARGE_CURRENT_FINE_STEP != 0 {
        return Err(PmuError::InvalidCurrent(milliampere));
    }
    Ok((milliampere / CHARGE_CURRENT_FINE_STEP) as u8)
}

/// Code for the constant charge current register: 25 mA steps up to
/// 200 mA, 100 mA steps above
pub(crate) fn charge_current_code(milliampere: u16) -> Result<u8, PmuError> {
    if milliampere <= CHARGE_CURRENT_FINE_MAX {
        return fine_current_code(milliampere);
    }
    let above = milliampere - CHARGE_CURRENT_FINE_MAX;
    if milliampere > CHARGE_CURRENT_MAX || above % CHARGE_CURRENT_COARSE_STEP != 0 {
        return Err(PmuError::InvalidCurrent(milliampere));
    }
    Ok((CHARGE_CURRENT_FINE_MAX / CHARGE_CURRENT_FINE_STEP) as u8
        + (above / CHARGE_CURRENT_COARSE_STEP) as u8)
}

/// Die temperature in °C from the raw ADC reading
pub(crate) fn die_temperature(raw: u16) -> f32 {
    let celsius = 22.0 + (7274.0 - f32::from(raw)) / 20.0;
    libm::roundf(celsius * 100.0) / 100.0
}

/// One snapshot of the PMU state, taken by the power worker on every cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PmuStatus {
    /// Interrupt flags pending when the snapshot was taken
    pub irq: IrqFlags,
    pub temperature: f32,
    pub direction: BatteryDirection,
    pub vbus_in: bool,
    pub vbus_good: bool,
    pub charger: ChargerStatus,
    pub battery_connected: bool,
    pub battery_mv: u16,
    pub vbus_mv: u16,
    pub system_mv: u16,
    pub battery_percent: Option<u8>,
}

impl PmuStatus {
    pub fn is_charging(&self) -> bool {
        self.direction == BatteryDirection::Charging
    }

    pub fn is_discharging(&self) -> bool {
        self.direction == BatteryDirection::Discharging
    }

    pub fn is_standby(&self) -> bool {
        self.direction == BatteryDirection::Standby
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "YES"
    } else {
        "NO"
    }
}

impl Display for PmuStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "temp {:.2}°C, charging {}, discharge {}, standby {}, vbus in {}, vbus good {}, charger: {}, batt {} mV, vbus {} mV, sys {} mV",
            self.temperature,
            yes_no(self.is_charging()),
            yes_no(self.is_discharging()),
            yes_no(self.is_standby()),
            yes_no(self.vbus_in),
            yes_no(self.vbus_good),
            self.charger,
            self.battery_mv,
            self.vbus_mv,
            self.system_mv,
        )?;
        if let Some(percent) = self.battery_percent {
            write!(f, ", battery {percent}%")?;
        }
        Ok(())
    }
}

pub mod asynch;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_dc3_voltage_ranges() {
        assert_eq!(Rail::Dc3.encode_voltage(500), Ok(0));
        assert_eq!(Rail::Dc3.encode_voltage(1200), Ok(70));
        assert_eq!(Rail::Dc3.encode_voltage(1220), Ok(71));
        assert_eq!(Rail::Dc3.encode_voltage(1540), Ok(87));
        assert_eq!(Rail::Dc3.encode_voltage(1600), Ok(88));
        assert_eq!(Rail::Dc3.encode_voltage(3300), Ok(105));
        assert_eq!(Rail::Dc3.decode_voltage(105), Some(3300));
        assert_eq!(Rail::Dc3.decode_voltage(71), Some(1220));
        assert_eq!(Rail::Dc3.decode_voltage(106), Some(3400));
        assert_eq!(Rail::Dc3.decode_voltage(107), None);
    }

    #[test]
    fn test_voltage_outside_range_or_step_is_rejected() {
        assert_eq!(
            Rail::Dc3.encode_voltage(1210),
            Err(PmuError::InvalidVoltage(Rail::Dc3, 1210))
        );
        assert_eq!(
            Rail::Dc1.encode_voltage(1400),
            Err(PmuError::InvalidVoltage(Rail::Dc1, 1400))
        );
        assert_eq!(
            Rail::Aldo1.encode_voltage(1850),
            Err(PmuError::InvalidVoltage(Rail::Aldo1, 1850))
        );
    }

    #[test]
    fn test_ldo_voltage_codes() {
        assert_eq!(Rail::Aldo1.encode_voltage(1800), Ok(13));
        assert_eq!(Rail::Bldo2.encode_voltage(3300), Ok(28));
        assert_eq!(Rail::Cpusldo.encode_voltage(1400), Ok(18));
        assert_eq!(Rail::Dldo2.decode_voltage(2), Some(600));
    }

    #[test]
    fn test_every_rail_code_roundtrips_at_range_edges() {
        for rail in Rail::ALL {
            for range in rail.voltage_ranges() {
                for mv in [range.min, range.max] {
                    let code = rail.encode_voltage(mv).unwrap();
                    assert_eq!(rail.decode_voltage(code), Some(mv), "{rail} {mv}");
                }
            }
        }
    }

    #[test]
    fn test_charge_current_codes() {
        assert_eq!(charge_current_code(0), Ok(0));
        assert_eq!(charge_current_code(100), Ok(4));
        assert_eq!(charge_current_code(200), Ok(8));
        assert_eq!(charge_current_code(300), Ok(9));
        assert_eq!(charge_current_code(1000), Ok(16));
        assert_eq!(charge_current_code(250), Err(PmuError::InvalidCurrent(250)));
        assert_eq!(charge_current_code(1100), Err(PmuError::InvalidCurrent(1100)));
        assert_eq!(fine_current_code(50), Ok(2));
        assert_eq!(fine_current_code(30), Err(PmuError::InvalidCurrent(30)));
    }

    #[test]
    fn test_irq_register_layout() {
        let flags = IrqFlags::WARNING_LEVEL2 | IrqFlags::VBUS_INSERT | IrqFlags::BAT_CHG_DONE;
        assert_eq!(flags.to_registers(), [0x80, 0x80, 0x10]);
        assert_eq!(IrqFlags::from_registers([0x80, 0x80, 0x10]), flags);
    }

    #[test]
    fn test_die_temperature_conversion() {
        assert_eq!(die_temperature(7274), 22.0);
        assert_eq!(die_temperature(7074), 32.0);
    }

    #[test]
    fn test_charger_status_display() {
        assert_eq!(ChargerStatus::Trickle.to_string(), "tri_charge");
        assert_eq!(ChargerStatus::ConstantCurrent.to_string(), "constant charge");
        assert_eq!(ChargerStatus::NotCharging.to_string(), "not charge");
        assert_eq!(ChargerStatus::try_from(4), Ok(ChargerStatus::Done));
        assert!(ChargerStatus::try_from(6).is_err());
    }
}
