// https://github.com/espressif/esp-bsp/tree/master/components/lcd_touch/esp_lcd_touch_ft5x06
use crate::register::BusError;

pub const FT5X06_ADDRESS: u8 = 0x38;

/// Number of simultaneous points the controller reports
pub const MAX_TOUCH_POINTS: usize = 5;

/// Number of bytes for a single touch point
pub const RAW_TOUCH_POINT_LEN: usize = 6;

pub(crate) const REG_TD_STATUS: u8 = 0x02;
pub(crate) const REG_TOUCH1_XH: u8 = 0x03;
pub(crate) const REG_CHIP_ID: u8 = 0xA3;
pub(crate) const REG_FIRMWARE_ID: u8 = 0xA6;

/// Threshold and filter registers written by [`asynch::Ft5x06Async::init`]
pub(crate) const INIT_SEQUENCE: [(u8, u8); 9] = [
    // valid touching detect threshold
    (0x80, 70),
    // valid touching peak detect threshold
    (0x81, 60),
    // touch focus threshold
    (0x82, 16),
    // diff limit
    (0x83, 60),
    // diff limit for the panel edge
    (0x84, 10),
    // difference filter
    (0x85, 20),
    // active mode report rate
    (0x87, 2),
    // monitor mode report rate
    (0x88, 12),
    // time to enter monitor mode, in seconds
    (0x89, 40),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TouchError {
    Bus(BusError),
}

impl From<BusError> for TouchError {
    fn from(e: BusError) -> Self {
        TouchError::Bus(e)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchPoint {
    pub x: u16,
    pub y: u16,
}

impl TouchPoint {
    /// Decodes the 12-bit coordinates of one raw point record
    pub(crate) fn from_raw(raw: &[u8]) -> Self {
        Self {
            x: (u16::from(raw[0] & 0x0F) << 8) | u16::from(raw[1]),
            y: (u16::from(raw[2] & 0x0F) << 8) | u16::from(raw[3]),
        }
    }
}

/// Points reported by the last [`asynch::Ft5x06Async::sample`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchData {
    pub count: u8,
    pub points: [TouchPoint; MAX_TOUCH_POINTS],
}

impl TouchData {
    pub fn first(&self) -> Option<TouchPoint> {
        (self.count > 0).then_some(self.points[0])
    }

    pub fn points(&self) -> &[TouchPoint] {
        &self.points[..usize::from(self.count)]
    }
}

/// Decodes TD_STATUS into a point count. Values above
/// [`MAX_TOUCH_POINTS`] show up while the controller is busy and count as
/// no touch.
pub(crate) fn touch_count(td_status: u8) -> u8 {
    let count = td_status & 0x0F;
    if usize::from(count) > MAX_TOUCH_POINTS {
        0
    } else {
        count
    }
}

pub mod asynch;
