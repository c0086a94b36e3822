use bitflags::bitflags;
use embedded_hal_async::delay::DelayNs;
use log::info;

// Waveshare ESP32-S3 Touch AMOLED 1.8" (SH8601, 368x448)
// https://github.com/espressif/esp-iot-solution/tree/master/components/display/lcd/esp_lcd_sh8601

/// QSPI opcode for register writes, data on one line
pub const QSPI_CMD_OPCODE: u8 = 0x02;
/// QSPI opcode for pixel writes, data on four lines
pub const QSPI_PIXEL_OPCODE: u8 = 0x32;

/// 24-bit address phase carrying a panel command
pub const fn qspi_address(cmd: u8) -> u32 {
    (cmd as u32) << 8
}

pub(crate) const CMD_SLEEP_OUT: u8 = 0x11;
pub(crate) const CMD_DISPLAY_OFF: u8 = 0x28;
pub(crate) const CMD_DISPLAY_ON: u8 = 0x29;
pub(crate) const CMD_CASET: u8 = 0x2A;
pub(crate) const CMD_RASET: u8 = 0x2B;
/// Memory write, starts a pixel stream at the window origin
pub const CMD_RAMWR: u8 = 0x2C;
/// Memory write continue, appends to the running pixel stream
pub const CMD_RAMWRC: u8 = 0x3C;
pub(crate) const CMD_MADCTL: u8 = 0x36;
pub(crate) const CMD_COLMOD: u8 = 0x3A;
pub(crate) const CMD_BRIGHTNESS: u8 = 0x51;

/// RGB888 on the wire
pub(crate) const COLMOD_RGB888: u8 = 0x77;

/// Bytes per pixel on the wire
pub const BYTES_PER_PIXEL: usize = 3;

// Define a structure for the LCD command
struct LcdCommand<'a> {
    /// Command address/opcode
    addr: u8,
    /// Command parameters
    params: &'a [u8],
    /// Settle time after the command
    delay_ms: u32,
}

/// Vendor initialization sequence for the 368x448 module
const AMOLED_INIT_CMDS: &[LcdCommand] = &[
    LcdCommand {
        addr: CMD_SLEEP_OUT,
        params: &[],
        delay_ms: 120,
    },
    LcdCommand {
        addr: 0x44,
        params: &[0x01, 0xD1],
        // tear scanline
        delay_ms: 0,
    },
    LcdCommand {
        addr: 0x35,
        params: &[0x00],
        // set Tearing Effect Line on
        delay_ms: 0,
    },
    LcdCommand {
        addr: 0x53,
        params: &[0x20],
        //Write CTRL display
        delay_ms: 10,
    },
    LcdCommand {
        addr: CMD_CASET,
        params: &[0x00, 0x00, 0x01, 0x6F],
        delay_ms: 0,
    },
    LcdCommand {
        addr: CMD_RASET,
        params: &[0x00, 0x00, 0x01, 0xBF],
        delay_ms: 0,
    },
    LcdCommand {
        addr: CMD_BRIGHTNESS,
        params: &[0x00],
        delay_ms: 10,
    },
    LcdCommand {
        addr: CMD_DISPLAY_ON,
        params: &[],
        delay_ms: 10,
    },
    LcdCommand {
        addr: CMD_BRIGHTNESS,
        params: &[0xFF],
        delay_ms: 0,
    },
];

bitflags! {
    /// Memory data access control
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Madctl: u8 {
        const MIRROR_Y = 0x80;
        const MIRROR_X = 0x40;
        const SWAP_XY = 0x20;
        const BGR = 0x08;
    }
}

/// Command transport of the panel
#[allow(async_fn_in_trait)]
pub trait QspiInterface {
    type Error;

    /// Sends `cmd` with its parameters on a single data line
    async fn write_command(&mut self, cmd: u8, params: &[u8]) -> Result<(), Self::Error>;

    /// Streams pixel data into the current window on four data lines. The
    /// first transfer carries [`CMD_RAMWR`], further chunks [`CMD_RAMWRC`].
    async fn write_pixels(&mut self, data: &[u8]) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelError<E> {
    Interface(E),
    /// Window is empty or leaves the panel
    OutOfBounds,
    /// Pixel data does not match the window
    DataLength { expected: usize, actual: usize },
}

/// SH8601 AMOLED driver
/// Supports:
/// - 24-bit RGB888 color
/// - QSPI interface
/// - rotation through MADCTL
pub struct Sh8601<DI, DELAY> {
    interface: DI,
    delay: DELAY,
    width: u16,
    height: u16,
    madctl: Madctl,
}

impl<DI, DELAY> Sh8601<DI, DELAY>
where
    DI: QspiInterface,
    DELAY: DelayNs,
{
    pub fn new(interface: DI, delay: DELAY, width: u16, height: u16) -> Self {
        Self {
            interface,
            delay,
            width,
            height,
            madctl: Madctl::empty(),
        }
    }

    async fn command(&mut self, cmd: u8, params: &[u8]) -> Result<(), PanelError<DI::Error>> {
        self.interface
            .write_command(cmd, params)
            .await
            .map_err(PanelError::Interface)
    }

    /// Sets pixel format and addressing mode, then runs the vendor sequence
    pub async fn init(&mut self) -> Result<(), PanelError<DI::Error>> {
        self.command(CMD_MADCTL, &[self.madctl.bits()]).await?;
        self.command(CMD_COLMOD, &[COLMOD_RGB888]).await?;

        for cmd in AMOLED_INIT_CMDS {
            self.command(cmd.addr, cmd.params).await?;
            if cmd.delay_ms > 0 {
                self.delay.delay_ms(cmd.delay_ms).await;
            }
        }
        info!("SH8601 initialized {}x{}", self.width, self.height);
        Ok(())
    }

    /// Swaps and mirrors the scan direction
    pub async fn set_orientation(
        &mut self,
        swap_xy: bool,
        mirror_x: bool,
        mirror_y: bool,
    ) -> Result<(), PanelError<DI::Error>> {
        let mut madctl = self.madctl & Madctl::BGR;
        madctl.set(Madctl::SWAP_XY, swap_xy);
        madctl.set(Madctl::MIRROR_X, mirror_x);
        madctl.set(Madctl::MIRROR_Y, mirror_y);
        self.command(CMD_MADCTL, &[madctl.bits()]).await?;
        self.madctl = madctl;
        Ok(())
    }

    pub fn madctl(&self) -> Madctl {
        self.madctl
    }

    /// Pixel extent of the current scan direction
    pub fn size(&self) -> (u16, u16) {
        if self.madctl.contains(Madctl::SWAP_XY) {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// Writes RGB888 `data` into the window `[x_start, x_end) x [y_start, y_end)`
    pub async fn draw_bitmap(
        &mut self,
        x_start: u16,
        y_start: u16,
        x_end: u16,
        y_end: u16,
        data: &[u8],
    ) -> Result<(), PanelError<DI::Error>> {
        let (width, height) = self.size();
        if x_start >= x_end || y_start >= y_end || x_end > width || y_end > height {
            return Err(PanelError::OutOfBounds);
        }
        let expected =
            usize::from(x_end - x_start) * usize::from(y_end - y_start) * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(PanelError::DataLength {
                expected,
                actual: data.len(),
            });
        }

        let [xs_hi, xs_lo] = x_start.to_be_bytes();
        let [xe_hi, xe_lo] = (x_end - 1).to_be_bytes();
        self.command(CMD_CASET, &[xs_hi, xs_lo, xe_hi, xe_lo]).await?;
        let [ys_hi, ys_lo] = y_start.to_be_bytes();
        let [ye_hi, ye_lo] = (y_end - 1).to_be_bytes();
        self.command(CMD_RASET, &[ys_hi, ys_lo, ye_hi, ye_lo]).await?;

        self.interface
            .write_pixels(data)
            .await
            .map_err(PanelError::Interface)
    }

    pub async fn set_brightness(&mut self, level: u8) -> Result<(), PanelError<DI::Error>> {
        self.command(CMD_BRIGHTNESS, &[level]).await
    }

    pub async fn set_display_on(&mut self, on: bool) -> Result<(), PanelError<DI::Error>> {
        let cmd = if on { CMD_DISPLAY_ON } else { CMD_DISPLAY_OFF };
        self.command(cmd, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{vec, vec::Vec};
    use embassy_futures::block_on;

    #[derive(Debug, PartialEq)]
    enum Write {
        Command(u8, Vec<u8>),
        Pixels(usize),
    }

    #[derive(Default)]
    struct RecordingBus {
        log: Vec<Write>,
    }

    impl QspiInterface for &mut RecordingBus {
        type Error = ();

        async fn write_command(&mut self, cmd: u8, params: &[u8]) -> Result<(), ()> {
            self.log.push(Write::Command(cmd, params.to_vec()));
            Ok(())
        }

        async fn write_pixels(&mut self, data: &[u8]) -> Result<(), ()> {
            self.log.push(Write::Pixels(data.len()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingDelay {
        total_ns: u64,
    }

    impl DelayNs for &mut CountingDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.total_ns += u64::from(ns);
        }
    }

    #[test]
    fn test_init_sequence() {
        let mut bus = RecordingBus::default();
        let mut delay = CountingDelay::default();
        let mut panel = Sh8601::new(&mut bus, &mut delay, 368, 448);

        block_on(panel.init()).unwrap();

        assert_eq!(bus.log[0], Write::Command(CMD_MADCTL, vec![0x00]));
        assert_eq!(bus.log[1], Write::Command(CMD_COLMOD, vec![COLMOD_RGB888]));
        assert_eq!(bus.log[2], Write::Command(CMD_SLEEP_OUT, vec![]));
        assert_eq!(bus.log.last(), Some(&Write::Command(CMD_BRIGHTNESS, vec![0xFF])));
        assert_eq!(bus.log.len(), 2 + AMOLED_INIT_CMDS.len());
        assert_eq!(delay.total_ns, 150_000_000);
    }

    #[test]
    fn test_draw_bitmap_window_is_inclusive_on_the_wire() {
        let mut bus = RecordingBus::default();
        let mut delay = CountingDelay::default();
        let mut panel = Sh8601::new(&mut bus, &mut delay, 368, 448);
        let data = vec![0u8; 4 * 2 * BYTES_PER_PIXEL];

        block_on(panel.draw_bitmap(10, 300, 14, 302, &data)).unwrap();

        assert_eq!(
            bus.log,
            [
                Write::Command(CMD_CASET, vec![0x00, 10, 0x00, 13]),
                Write::Command(CMD_RASET, vec![0x01, 0x2C, 0x01, 0x2D]),
                Write::Pixels(24),
            ]
        );
    }

    #[test]
    fn test_draw_bitmap_rejects_bad_window() {
        let mut bus = RecordingBus::default();
        let mut delay = CountingDelay::default();
        let mut panel = Sh8601::new(&mut bus, &mut delay, 368, 448);

        let result = block_on(panel.draw_bitmap(0, 0, 369, 2, &[]));
        assert_eq!(result, Err(PanelError::OutOfBounds));
        let result = block_on(panel.draw_bitmap(4, 4, 4, 6, &[]));
        assert_eq!(result, Err(PanelError::OutOfBounds));
        let result = block_on(panel.draw_bitmap(0, 0, 2, 2, &[0; 3]));
        assert_eq!(
            result,
            Err(PanelError::DataLength {
                expected: 12,
                actual: 3
            })
        );
        assert!(bus.log.is_empty());
    }

    #[test]
    fn test_orientation_swaps_extent() {
        let mut bus = RecordingBus::default();
        let mut delay = CountingDelay::default();
        let mut panel = Sh8601::new(&mut bus, &mut delay, 368, 448);

        block_on(panel.set_orientation(true, true, true)).unwrap();
        assert_eq!(panel.size(), (448, 368));
        assert_eq!(
            panel.madctl(),
            Madctl::SWAP_XY | Madctl::MIRROR_X | Madctl::MIRROR_Y
        );
        let data = vec![0u8; 448 * 2 * BYTES_PER_PIXEL];
        block_on(panel.draw_bitmap(0, 366, 448, 368, &data)).unwrap();

        block_on(panel.set_orientation(false, true, false)).unwrap();
        assert_eq!(panel.size(), (368, 448));
        assert_eq!(bus.log.first(), Some(&Write::Command(CMD_MADCTL, vec![0xE0])));
        assert_eq!(bus.log.last(), Some(&Write::Command(CMD_MADCTL, vec![0x40])));
    }

    #[test]
    fn test_qspi_framing() {
        assert_eq!(qspi_address(CMD_RAMWR), 0x002C00);
        assert_eq!(qspi_address(CMD_MADCTL), 0x003600);
    }
}
