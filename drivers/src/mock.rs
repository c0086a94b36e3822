//! Register-file I2C device used by the driver tests.

use alloc::vec::Vec;
use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource};
use embedded_hal_async::i2c::{I2c, Operation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Write(Vec<u8>),
    Read(usize),
    WriteRead(Vec<u8>, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError(pub ErrorKind);

impl embedded_hal::i2c::Error for MockError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Emulates a device with 256 byte-wide registers and an auto-incrementing
/// register pointer: the first written byte selects the register, further
/// written bytes are stored from there, reads continue from the pointer.
pub struct MockI2c {
    pub address: u8,
    pub registers: [u8; 256],
    pub log: Vec<Transaction>,
    /// Index of the transaction that fails with `ErrorKind::Other`
    pub fail_transaction: Option<usize>,
    pointer: u8,
}

impl MockI2c {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            registers: [0; 256],
            log: Vec::new(),
            fail_transaction: None,
            pointer: 0,
        }
    }

    /// Register values written by the transactions in the log, in order
    pub fn writes_to(&self, reg: u8) -> Vec<u8> {
        self.log
            .iter()
            .filter_map(|t| match t {
                Transaction::Write(bytes) if bytes.len() > 1 && bytes[0] == reg => Some(bytes[1]),
                _ => None,
            })
            .collect()
    }
}

impl ErrorType for MockI2c {
    type Error = MockError;
}

impl I2c for MockI2c {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.address {
            return Err(MockError(ErrorKind::NoAcknowledge(
                NoAcknowledgeSource::Address,
            )));
        }

        let mut written = Vec::new();
        let mut read = 0;
        for operation in operations.iter() {
            match operation {
                Operation::Write(bytes) => written.extend_from_slice(bytes),
                Operation::Read(buffer) => read += buffer.len(),
            }
        }
        let index = self.log.len();
        self.log.push(match (written.is_empty(), read) {
            (_, 0) => Transaction::Write(written.clone()),
            (true, n) => Transaction::Read(n),
            (false, n) => Transaction::WriteRead(written.clone(), n),
        });
        if self.fail_transaction == Some(index) {
            return Err(MockError(ErrorKind::Other));
        }

        let mut first_write = true;
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    for &byte in bytes.iter() {
                        if first_write {
                            self.pointer = byte;
                            first_write = false;
                        } else {
                            self.registers[self.pointer as usize] = byte;
                            self.pointer = self.pointer.wrapping_add(1);
                        }
                    }
                }
                Operation::Read(buffer) => {
                    for byte in buffer.iter_mut() {
                        *byte = self.registers[self.pointer as usize];
                        self.pointer = self.pointer.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}
