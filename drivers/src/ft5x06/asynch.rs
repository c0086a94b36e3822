use super::*;
use crate::register::RegisterDevice;
use embedded_hal_async::i2c::I2c;
use log::{debug, info};

#[derive(Debug)]
pub struct Ft5x06Async<I2C> {
    dev: RegisterDevice<I2C>,
    data: TouchData,
}

impl<I2C> Ft5x06Async<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C) -> Self {
        Self {
            dev: RegisterDevice::new(i2c, FT5X06_ADDRESS),
            data: TouchData::default(),
        }
    }

    /// Writes the detection thresholds and report rates
    pub async fn init(&mut self) -> Result<(), TouchError> {
        for (reg, value) in INIT_SEQUENCE {
            self.dev.write_register(reg, value).await?;
        }
        let chip_id = self.chip_id().await?;
        let firmware = self.firmware_version().await?;
        info!("FT5x06 chip id 0x{chip_id:02X}, firmware 0x{firmware:02X}");
        Ok(())
    }

    pub async fn chip_id(&mut self) -> Result<u8, TouchError> {
        Ok(self.dev.read_register(REG_CHIP_ID).await?)
    }

    pub async fn firmware_version(&mut self) -> Result<u8, TouchError> {
        Ok(self.dev.read_register(REG_FIRMWARE_ID).await?)
    }

    /// Reads the current touch state from the controller.
    ///
    /// On error the previous sample is discarded so a stale press is never
    /// reported again.
    pub async fn sample(&mut self) -> Result<(), TouchError> {
        self.data = TouchData::default();

        let count = touch_count(self.dev.read_register(REG_TD_STATUS).await?);
        if count == 0 {
            return Ok(());
        }

        let mut raw = [0u8; RAW_TOUCH_POINT_LEN * MAX_TOUCH_POINTS];
        let len = RAW_TOUCH_POINT_LEN * usize::from(count);
        self.dev
            .read_registers(REG_TOUCH1_XH, &mut raw[..len])
            .await?;

        let mut data = TouchData {
            count,
            ..TouchData::default()
        };
        for (point, chunk) in data
            .points
            .iter_mut()
            .zip(raw[..len].chunks_exact(RAW_TOUCH_POINT_LEN))
        {
            *point = TouchPoint::from_raw(chunk);
        }
        debug!("touch {count} point(s), first {:?}", data.points[0]);
        self.data = data;
        Ok(())
    }

    /// Points of the last sample
    pub fn touch_data(&self) -> &TouchData {
        &self.data
    }
}
