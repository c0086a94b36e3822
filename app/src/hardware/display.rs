//! Display hardware initialization module
//!
//! This module drives the SH8601 AMOLED controller over a quad SPI bus with
//! DMA. Every transfer starts with an opcode byte and a 24-bit address that
//! carries the panel command:
//!
//! - `0x02` + command + parameters, all on one data line
//! - `0x32` + RAMWR/RAMWRC + pixel data, pixel data on four data lines

use drivers::sh8601::{
    qspi_address, QspiInterface, Sh8601, CMD_RAMWR, CMD_RAMWRC, QSPI_CMD_OPCODE,
    QSPI_PIXEL_OPCODE,
};
use embassy_time::Delay;
use esp_hal::dma::{DmaRxBuf, DmaTxBuf};
use esp_hal::dma_buffers;
use esp_hal::peripherals::{DMA_CH0, GPIO11, GPIO12, GPIO4, GPIO5, GPIO6, GPIO7, SPI2};
use esp_hal::spi::master::{Address, Command, Config as SpiConfig, DataMode, Spi, SpiDmaBus};
use esp_hal::spi::{Error as SpiError, Mode};
use esp_hal::time::Rate;
use esp_hal::Blocking;
use log::info;

/// Native panel resolution
pub const DISPLAY_WIDTH: u16 = 368;
pub const DISPLAY_HEIGHT: u16 = 448;

/// Largest single DMA transfer of the ESP32-S3 SPI peripheral
const DMA_CHUNK_SIZE: usize = 32 * 1023;

/// Type alias for the SH8601 display instance on the QSPI bus
pub type AmoledDisplay = Sh8601<QspiBus, Delay>;

/// Quad SPI transport of the SH8601. Chip select is driven by the SPI
/// peripheral around every transfer.
pub struct QspiBus {
    bus: SpiDmaBus<'static, Blocking>,
}

impl QspiBus {
    fn write(
        &mut self,
        opcode: u8,
        cmd: u8,
        data_mode: DataMode,
        data: &[u8],
    ) -> Result<(), SpiError> {
        self.bus.half_duplex_write(
            data_mode,
            Command::_8Bit(opcode.into(), DataMode::Single),
            Address::_24Bit(qspi_address(cmd), DataMode::Single),
            0,
            data,
        )
    }
}

impl QspiInterface for QspiBus {
    type Error = SpiError;

    async fn write_command(&mut self, cmd: u8, params: &[u8]) -> Result<(), SpiError> {
        self.write(QSPI_CMD_OPCODE, cmd, DataMode::Single, params)
    }

    async fn write_pixels(&mut self, data: &[u8]) -> Result<(), SpiError> {
        let mut cmd = CMD_RAMWR;
        for chunk in data.chunks(DMA_CHUNK_SIZE) {
            self.write(QSPI_PIXEL_OPCODE, cmd, DataMode::Quad, chunk)?;
            cmd = CMD_RAMWRC;
        }
        Ok(())
    }
}

/// Initializes the SH8601 display on the quad SPI bus.
///
/// This function configures:
/// - SPI2 in half duplex mode with four data lines at 40MHz
/// - a DMA channel and transfer buffers sized for one DMA chunk
/// - the panel pixel format and power-on sequence
///
/// The panel reset line sits on the IO expander and must be released before
/// this is called. The scan direction is left to the first transform the
/// GUI queues.
///
/// # Arguments
///
/// * `cs` - GPIO pin for chip select
/// * `sck` - GPIO pin for the SPI clock
/// * `d0`..`d3` - GPIO pins of the four data lines
/// * `spi` - SPI2 peripheral instance
/// * `dma` - DMA channel 0 for pixel transfers
///
/// # Panics
///
/// Panics if the bus or the panel fails to initialize.
#[allow(clippy::too_many_arguments)]
pub async fn initialize_display(
    cs: GPIO12<'static>,
    sck: GPIO11<'static>,
    d0: GPIO4<'static>,
    d1: GPIO5<'static>,
    d2: GPIO6<'static>,
    d3: GPIO7<'static>,
    spi: SPI2<'static>,
    dma: DMA_CH0<'static>,
) -> AmoledDisplay {
    let spi_dma = Spi::new(
        spi,
        SpiConfig::default()
            .with_frequency(Rate::from_mhz(40))
            .with_mode(Mode::_0),
    )
    .expect("Failed to configure SPI")
    .with_sck(sck)
    .with_cs(cs)
    .with_sio0(d0)
    .with_sio1(d1)
    .with_sio2(d2)
    .with_sio3(d3)
    .with_dma(dma);

    #[allow(clippy::manual_div_ceil)]
    let (rx_buffer, rx_descriptors, tx_buffer, tx_descriptors) = dma_buffers!(4, DMA_CHUNK_SIZE);
    let dma_rx_buf =
        DmaRxBuf::new(rx_descriptors, rx_buffer).expect("Failed to create DMA RX buffer");
    let dma_tx_buf =
        DmaTxBuf::new(tx_descriptors, tx_buffer).expect("Failed to create DMA TX buffer");

    let bus = QspiBus {
        bus: SpiDmaBus::new(spi_dma, dma_rx_buf, dma_tx_buf),
    };

    let mut display = Sh8601::new(bus, Delay, DISPLAY_WIDTH, DISPLAY_HEIGHT);
    display.init().await.expect("Failed to initialize display");
    info!("Display {DISPLAY_WIDTH}x{DISPLAY_HEIGHT} ready");

    display
}
