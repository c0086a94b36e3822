//! Flush path between the renderer and the panel.
//!
//! [`FlushAdapter`] runs under the GUI lock: it aligns the dirty region,
//! copies it into free draw buffers and queues them. [`TransferWorker`] runs
//! in its own task, pushes queued buffers to the panel and returns them to
//! the pool. It never touches the GUI lock.

use core::fmt::Debug;

use drivers::sh8601::{PanelError, QspiInterface, Sh8601};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use log::{error, trace};

use crate::{
    frame_pool::{FrameBuffer, FramePool},
    geometry::Area,
    pixel::Bgra8888,
    rotation::PanelTransform,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushError {
    /// Region does not fit into a draw buffer
    BufferTooSmall,
    /// Region reaches outside the rendered frame
    OutOfFrame,
}

/// Packed pixels for `area`, on their way to the panel
#[derive(Debug)]
pub struct FlushRequest {
    pub area: Area,
    pub buffer: FrameBuffer,
}

/// Work item for the transfer worker. Both kinds share one FIFO so a scan
/// direction change lands between the frames rendered before and after it.
#[derive(Debug)]
pub enum PanelCommand {
    Flush(FlushRequest),
    Transform(PanelTransform),
}

/// Pixel sink of the display
#[allow(async_fn_in_trait)]
pub trait PanelTransfer {
    type Error: Debug;

    /// Writes wire-format `data` into `[x_start, x_end) x [y_start, y_end)`
    async fn draw_bitmap(
        &mut self,
        x_start: u16,
        y_start: u16,
        x_end: u16,
        y_end: u16,
        data: &[u8],
    ) -> Result<(), Self::Error>;

    async fn apply_transform(&mut self, transform: PanelTransform) -> Result<(), Self::Error>;
}

impl<DI, DELAY> PanelTransfer for Sh8601<DI, DELAY>
where
    DI: QspiInterface,
    DI::Error: Debug,
    DELAY: DelayNs,
{
    type Error = PanelError<DI::Error>;

    async fn draw_bitmap(
        &mut self,
        x_start: u16,
        y_start: u16,
        x_end: u16,
        y_end: u16,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        Sh8601::draw_bitmap(self, x_start, y_start, x_end, y_end, data).await
    }

    async fn apply_transform(&mut self, transform: PanelTransform) -> Result<(), Self::Error> {
        self.set_orientation(transform.swap_xy, transform.mirror_x, transform.mirror_y)
            .await
    }
}

pub struct FlushAdapter<'a, M: RawMutex> {
    pool: &'a FramePool<M>,
    width: u16,
    height: u16,
}

impl<'a, M: RawMutex> FlushAdapter<'a, M> {
    /// Adapter for a logical frame of `width` x `height` pixels
    pub fn new(pool: &'a FramePool<M>, width: u16, height: u16) -> Self {
        Self {
            pool,
            width,
            height,
        }
    }

    /// Follows a rotation of the logical frame
    pub fn set_frame_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    pub fn frame_size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Queues the dirty region of `frame` for transfer and returns the number
    /// of bands queued.
    ///
    /// The region is rounded to pixel pairs and clipped to the frame, then
    /// split into bands of even height that fit a draw buffer. Waits for a
    /// free buffer per band. An empty region queues nothing.
    pub async fn flush(
        &mut self,
        frame: &[Bgra8888],
        stride: usize,
        dirty: Area,
    ) -> Result<usize, FlushError> {
        // rounding would grow an empty area into a pixel pair
        if dirty.is_empty() {
            return Ok(0);
        }
        let Some(area) = dirty.rounded().clipped(self.width, self.height) else {
            return Ok(0);
        };
        let rows = self.pool.capacity_pixels() / area.width() as usize;
        if rows < 2 {
            return Err(FlushError::BufferTooSmall);
        }
        let rows = u16::try_from(rows).unwrap_or(u16::MAX);

        let mut queued = 0;
        for band in area.bands(rows) {
            let mut buffer = self.pool.acquire().await;
            match buffer.load_region(frame, stride, &band) {
                Ok(pixels) => buffer.pack(pixels),
                Err(e) => {
                    self.pool.release(buffer);
                    return Err(e);
                }
            }
            trace!("flush {band:?}");
            self.pool.submit(FlushRequest { area: band, buffer }).await;
            queued += 1;
        }
        Ok(queued)
    }

    /// Queues a scan direction change for the panel
    pub async fn transform(&self, transform: PanelTransform) {
        self.pool.submit_transform(transform).await;
    }
}

/// Drains the command FIFO into the panel
pub struct TransferWorker<'a, M: RawMutex, P> {
    pool: &'a FramePool<M>,
    panel: P,
}

impl<'a, M: RawMutex, P: PanelTransfer> TransferWorker<'a, M, P> {
    pub fn new(pool: &'a FramePool<M>, panel: P) -> Self {
        Self { pool, panel }
    }

    /// Executes the next queued command. A flushed buffer goes back to the
    /// pool whether the transfer succeeded or not.
    pub async fn process_next(&mut self) -> Result<(), P::Error> {
        match self.pool.next_command().await {
            PanelCommand::Flush(FlushRequest { area, buffer }) => {
                let result = self
                    .panel
                    .draw_bitmap(
                        area.x1,
                        area.y1,
                        area.x2 + 1,
                        area.y2 + 1,
                        buffer.wire_data(),
                    )
                    .await;
                self.pool.release(buffer);
                result
            }
            PanelCommand::Transform(transform) => self.panel.apply_transform(transform).await,
        }
    }

    pub async fn run(&mut self) -> ! {
        loop {
            if let Err(e) = self.process_next().await {
                error!("panel transfer failed: {e:?}");
            }
        }
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::Orientation;
    use embassy_futures::{block_on, poll_once};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[derive(Debug, PartialEq)]
    enum Drawn {
        Bitmap {
            window: (u16, u16, u16, u16),
            data: Vec<u8>,
        },
        Transform(PanelTransform),
    }

    #[derive(Default)]
    struct RecordingPanel {
        drawn: Vec<Drawn>,
        fail: bool,
    }

    impl PanelTransfer for RecordingPanel {
        type Error = ();

        async fn draw_bitmap(
            &mut self,
            x_start: u16,
            y_start: u16,
            x_end: u16,
            y_end: u16,
            data: &[u8],
        ) -> Result<(), ()> {
            self.drawn.push(Drawn::Bitmap {
                window: (x_start, y_start, x_end, y_end),
                data: data.to_vec(),
            });
            if self.fail {
                Err(())
            } else {
                Ok(())
            }
        }

        async fn apply_transform(&mut self, transform: PanelTransform) -> Result<(), ()> {
            self.drawn.push(Drawn::Transform(transform));
            Ok(())
        }
    }

    const W: u16 = 16;
    const H: u16 = 16;

    fn solid_frame(color: Bgra8888) -> Vec<Bgra8888> {
        vec![color; usize::from(W) * usize::from(H)]
    }

    #[test]
    fn test_flush_rounds_then_transfers_with_exclusive_ends() {
        let pool = FramePool::<NoopRawMutex>::allocate(64).unwrap();
        let mut adapter = FlushAdapter::new(&pool, W, H);
        let mut worker = TransferWorker::new(&pool, RecordingPanel::default());
        let frame = solid_frame(Bgra8888::rgb(1, 2, 3));

        let queued = block_on(adapter.flush(&frame, W.into(), Area::new(3, 5, 6, 6))).unwrap();
        assert_eq!(queued, 1);
        assert_eq!(pool.available(), 1);

        block_on(worker.process_next()).unwrap();

        // (3,5)-(6,6) rounds to (2,4)-(7,7): 6 x 4 pixels
        let expected: Vec<u8> = [1, 2, 3].repeat(24);
        assert_eq!(
            worker.panel().drawn,
            [Drawn::Bitmap {
                window: (2, 4, 8, 8),
                data: expected,
            }]
        );
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_empty_region_issues_no_transfer() {
        let pool = FramePool::<NoopRawMutex>::allocate(64).unwrap();
        let mut adapter = FlushAdapter::new(&pool, W, H);
        let frame = solid_frame(Bgra8888::default());

        let queued = block_on(adapter.flush(&frame, W.into(), Area::new(5, 5, 4, 4))).unwrap();
        let outside = block_on(adapter.flush(&frame, W.into(), Area::new(20, 0, 30, 3))).unwrap();

        assert_eq!((queued, outside), (0, 0));
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_inverted_area_on_odd_edge_stays_empty() {
        let pool = FramePool::<NoopRawMutex>::allocate(64).unwrap();
        let mut adapter = FlushAdapter::new(&pool, W, H);
        let mut worker = TransferWorker::new(&pool, RecordingPanel::default());
        let frame = solid_frame(Bgra8888::rgb(7, 7, 7));

        // x2 == x1 - 1 with odd x1 would round to the 2x2 area (4,4)-(5,5)
        for dirty in [Area::new(5, 5, 4, 4), Area::new(5, 2, 4, 9), Area::new(2, 7, 9, 6)] {
            assert_eq!(block_on(adapter.flush(&frame, W.into(), dirty)), Ok(0));
        }

        assert_eq!(pool.available(), 2);
        assert!(poll_once(worker.process_next()).is_pending());
        assert!(worker.panel().drawn.is_empty());
    }

    #[test]
    fn test_tall_region_is_split_into_even_bands() {
        // 16 x 16 frame, buffers of 3 full rows -> bands of 2 rows
        let pool = FramePool::<NoopRawMutex>::allocate(48).unwrap();
        let mut adapter = FlushAdapter::new(&pool, W, H);
        let mut worker = TransferWorker::new(&pool, RecordingPanel::default());
        let frame = solid_frame(Bgra8888::rgb(9, 9, 9));

        let mut flush = core::pin::pin!(adapter.flush(&frame, W.into(), Area::new(0, 0, 15, 5)));
        // two bands fit the two buffers, the third waits for a completion
        assert!(poll_once(flush.as_mut()).is_pending());
        block_on(worker.process_next()).unwrap();
        assert_eq!(block_on(flush).unwrap(), 3);
        block_on(worker.process_next()).unwrap();
        block_on(worker.process_next()).unwrap();

        let windows: Vec<_> = worker
            .panel()
            .drawn
            .iter()
            .map(|d| match d {
                Drawn::Bitmap { window, .. } => *window,
                Drawn::Transform(_) => unreachable!(),
            })
            .collect();
        assert_eq!(windows, [(0, 0, 16, 2), (0, 2, 16, 4), (0, 4, 16, 6)]);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_region_wider_than_buffer_is_rejected() {
        let pool = FramePool::<NoopRawMutex>::allocate(16).unwrap();
        let mut adapter = FlushAdapter::new(&pool, W, H);
        let frame = solid_frame(Bgra8888::default());

        let result = block_on(adapter.flush(&frame, W.into(), Area::new(0, 0, 15, 1)));

        assert_eq!(result, Err(FlushError::BufferTooSmall));
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_failed_transfer_still_releases_buffer() {
        let pool = FramePool::<NoopRawMutex>::allocate(64).unwrap();
        let mut adapter = FlushAdapter::new(&pool, W, H);
        let panel = RecordingPanel {
            fail: true,
            ..RecordingPanel::default()
        };
        let mut worker = TransferWorker::new(&pool, panel);
        let frame = solid_frame(Bgra8888::default());

        block_on(adapter.flush(&frame, W.into(), Area::new(0, 0, 1, 1))).unwrap();
        assert!(block_on(worker.process_next()).is_err());

        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_transform_is_ordered_with_flushes() {
        let pool = FramePool::<NoopRawMutex>::allocate(64).unwrap();
        let mut adapter = FlushAdapter::new(&pool, W, H);
        let mut worker = TransferWorker::new(&pool, RecordingPanel::default());
        let frame = solid_frame(Bgra8888::default());
        let transform = Orientation::Deg270.panel_transform();

        block_on(adapter.flush(&frame, W.into(), Area::new(0, 0, 1, 1))).unwrap();
        block_on(adapter.transform(transform));
        block_on(worker.process_next()).unwrap();
        block_on(adapter.flush(&frame, W.into(), Area::new(2, 2, 3, 3))).unwrap();
        block_on(worker.process_next()).unwrap();
        block_on(worker.process_next()).unwrap();

        let drawn = &worker.panel().drawn;
        assert!(matches!(drawn[0], Drawn::Bitmap { window: (0, 0, 2, 2), .. }));
        assert_eq!(drawn[1], Drawn::Transform(transform));
        assert!(matches!(drawn[2], Drawn::Bitmap { window: (2, 2, 4, 4), .. }));
    }

    #[derive(Default)]
    struct WireLog {
        commands: Vec<(u8, Vec<u8>)>,
        pixels: usize,
    }

    impl QspiInterface for &mut WireLog {
        type Error = ();

        async fn write_command(&mut self, cmd: u8, params: &[u8]) -> Result<(), ()> {
            self.commands.push((cmd, params.to_vec()));
            Ok(())
        }

        async fn write_pixels(&mut self, data: &[u8]) -> Result<(), ()> {
            self.pixels += data.len();
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    #[test]
    fn test_rotated_panel_accepts_the_swapped_window() {
        let mut wire = WireLog::default();
        let mut panel = Sh8601::new(&mut wire, NoDelay, 368, 448);
        let transform = Orientation::Deg90.panel_transform();

        block_on(PanelTransfer::apply_transform(&mut panel, transform)).unwrap();
        assert_eq!(panel.size(), (448, 368));

        let data = [0u8; 448 * 2 * 3];
        block_on(PanelTransfer::draw_bitmap(&mut panel, 0, 366, 448, 368, &data)).unwrap();
        assert_eq!(
            block_on(PanelTransfer::draw_bitmap(&mut panel, 0, 367, 448, 369, &data)),
            Err(PanelError::OutOfBounds)
        );

        drop(panel);
        assert_eq!(wire.pixels, data.len());
    }
}
