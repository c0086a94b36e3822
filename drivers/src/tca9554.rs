// https://www.ti.com/lit/ds/symlink/tca9554.pdf
use crate::register::{BusError, RegisterDevice};
use embedded_hal_async::i2c::I2c;

/// Address with A2..A0 tied low
pub const TCA9554_ADDRESS: u8 = 0x20;

const REG_INPUT: u8 = 0x00;
const REG_OUTPUT: u8 = 0x01;
const REG_CONFIG: u8 = 0x03;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Input,
    Output,
}

/// 8-bit I2C port expander
#[derive(Debug)]
pub struct Tca9554Async<I2C> {
    dev: RegisterDevice<I2C>,
}

impl<I2C> Tca9554Async<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C, adr: u8) -> Self {
        Self {
            dev: RegisterDevice::new(i2c, adr),
        }
    }

    /// Configures the pins selected by `mask`. A cleared config bit is an output.
    pub async fn set_direction(&mut self, mask: u8, direction: Direction) -> Result<(), BusError> {
        let value = match direction {
            Direction::Input => mask,
            Direction::Output => 0,
        };
        self.dev.update_register(REG_CONFIG, mask, value).await
    }

    /// Drives the output pins selected by `mask`
    pub async fn set_level(&mut self, mask: u8, high: bool) -> Result<(), BusError> {
        let value = if high { mask } else { 0 };
        self.dev.update_register(REG_OUTPUT, mask, value).await
    }

    /// Input port levels
    pub async fn levels(&mut self) -> Result<u8, BusError> {
        self.dev.read_register(REG_INPUT).await
    }

    pub fn release(self) -> I2C {
        self.dev.release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockI2c;
    use embassy_futures::block_on;

    #[test]
    fn test_power_sequence_pins() {
        let mut i2c = MockI2c::new(TCA9554_ADDRESS);
        // power-on defaults: all inputs, outputs latched high
        i2c.registers[REG_OUTPUT as usize] = 0xFF;
        i2c.registers[REG_CONFIG as usize] = 0xFF;
        let mut expander = Tca9554Async::new(&mut i2c, TCA9554_ADDRESS);

        block_on(expander.set_direction(0b111, Direction::Output)).unwrap();
        block_on(expander.set_level(0b111, false)).unwrap();
        block_on(expander.set_level(0b111, true)).unwrap();

        assert_eq!(i2c.registers[REG_CONFIG as usize], 0xF8);
        assert_eq!(i2c.writes_to(REG_OUTPUT), [0xF8, 0xFF]);
    }

    #[test]
    fn test_wrong_address_is_bus_error() {
        let mut i2c = MockI2c::new(TCA9554_ADDRESS);
        let mut expander = Tca9554Async::new(&mut i2c, 0x21);

        assert!(block_on(expander.levels()).is_err());
    }
}
