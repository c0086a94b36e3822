//! Register-level access shared by the I2C chip drivers.
//!
//! Every bus transaction is bounded by [`TRANSACTION_TIMEOUT`]. A register
//! read is two transactions: the register address is written first and the
//! data is read back in a second transaction. If the first one fails the read
//! stops there.

use embassy_time::{with_timeout, Duration, TimeoutError};
use embedded_hal::i2c::{Error, ErrorKind};
use embedded_hal_async::i2c::{I2c, Operation};
use log::error;

/// Upper bound for a single bus transaction
pub const TRANSACTION_TIMEOUT: Duration = Duration::from_millis(1000);

/// Failure of a register transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// The bus reported an error (NACK, arbitration loss, ...)
    Transfer(ErrorKind),
    /// The transaction did not finish within [`TRANSACTION_TIMEOUT`]
    Timeout,
}

#[derive(Debug)]
pub struct RegisterDevice<I2C> {
    i2c: I2C,
    pub(crate) adr: u8,
}

impl<I2C> RegisterDevice<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C, adr: u8) -> Self {
        Self { i2c, adr }
    }

    /// Releases the underlying bus
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Reads `buffer.len()` consecutive registers starting at `reg`.
    ///
    /// An empty buffer is a no-op and touches no bus.
    pub async fn read_registers(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), BusError> {
        if buffer.is_empty() {
            return Ok(());
        }
        let adr = self.adr;

        let result = with_timeout(TRANSACTION_TIMEOUT, self.i2c.write(adr, &[reg])).await;
        check(result).inspect_err(|e| {
            error!("I2C 0x{adr:02X}: register 0x{reg:02X} address phase failed: {e:?}");
        })?;

        let result = with_timeout(TRANSACTION_TIMEOUT, self.i2c.read(adr, buffer)).await;
        check(result).inspect_err(|e| {
            error!("I2C 0x{adr:02X}: register 0x{reg:02X} read failed: {e:?}");
        })
    }

    /// Writes `data` to consecutive registers starting at `reg` in one transaction.
    pub async fn write_registers(&mut self, reg: u8, data: &[u8]) -> Result<(), BusError> {
        let adr = self.adr;
        let mut operations = [Operation::Write(&[reg]), Operation::Write(data)];

        let result = with_timeout(
            TRANSACTION_TIMEOUT,
            self.i2c.transaction(adr, &mut operations),
        )
        .await;
        check(result).inspect_err(|e| {
            error!("I2C 0x{adr:02X}: register 0x{reg:02X} write failed: {e:?}");
        })
    }

    /// Addresses the device without payload, used to probe for presence.
    pub async fn probe(&mut self) -> Result<(), BusError> {
        let adr = self.adr;
        check(with_timeout(TRANSACTION_TIMEOUT, self.i2c.write(adr, &[])).await)
    }

    pub async fn read_register(&mut self, reg: u8) -> Result<u8, BusError> {
        let mut buffer = [0u8; 1];
        self.read_registers(reg, &mut buffer).await?;
        Ok(buffer[0])
    }

    pub async fn write_register(&mut self, reg: u8, value: u8) -> Result<(), BusError> {
        self.write_registers(reg, &[value]).await
    }

    /// Read-modify-write of the bits selected by `mask`
    pub async fn update_register(&mut self, reg: u8, mask: u8, value: u8) -> Result<(), BusError> {
        let current = self.read_register(reg).await?;
        let next = (current & !mask) | (value & mask);
        if next != current {
            self.write_register(reg, next).await?;
        }
        Ok(())
    }

    pub async fn set_register_bit(&mut self, reg: u8, bit: u8) -> Result<(), BusError> {
        self.update_register(reg, 1 << bit, 1 << bit).await
    }

    pub async fn clear_register_bit(&mut self, reg: u8, bit: u8) -> Result<(), BusError> {
        self.update_register(reg, 1 << bit, 0).await
    }

    pub async fn get_register_bit(&mut self, reg: u8, bit: u8) -> Result<bool, BusError> {
        let value = self.read_register(reg).await?;
        Ok(value & (1 << bit) != 0)
    }

    /// Reads a 13-bit value split as 5 high bits in `reg` and 8 low bits in `reg + 1`.
    pub async fn read_h5_l8(&mut self, reg: u8) -> Result<u16, BusError> {
        let mut buffer = [0u8; 2];
        self.read_registers(reg, &mut buffer).await?;
        Ok((u16::from(buffer[0] & 0x1F) << 8) | u16::from(buffer[1]))
    }

    /// Reads a 14-bit value split as 6 high bits in `reg` and 8 low bits in `reg + 1`.
    pub async fn read_h6_l8(&mut self, reg: u8) -> Result<u16, BusError> {
        let mut buffer = [0u8; 2];
        self.read_registers(reg, &mut buffer).await?;
        Ok((u16::from(buffer[0] & 0x3F) << 8) | u16::from(buffer[1]))
    }
}

fn check<E: Error>(result: Result<Result<(), E>, TimeoutError>) -> Result<(), BusError> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(BusError::Transfer(e.kind())),
        Err(TimeoutError) => Err(BusError::Timeout),
    }
}
