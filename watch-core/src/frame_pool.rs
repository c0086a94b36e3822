//! The two draw buffers and the queues they travel through.
//!
//! A buffer is always owned by exactly one side: the free queue, the flush
//! adapter filling it, or the command queue / transfer worker while it is
//! in flight. Handing it back is a non-blocking send.

use alloc::{boxed::Box, vec::Vec};

use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Channel};
use log::{debug, warn};

use crate::{
    config::DRAW_BUFFER_COUNT,
    flush::{FlushError, FlushRequest, PanelCommand},
    geometry::Area,
    pixel::{pack_rgb888_in_place, Bgra8888, SOURCE_BYTES_PER_PIXEL, WIRE_BYTES_PER_PIXEL},
    rotation::PanelTransform,
};

/// Draw buffer could not be allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError {
    pub bytes: usize,
}

/// Byte buffer for `capacity_pixels` rendered pixels
#[derive(Debug)]
pub struct FrameBuffer {
    data: Box<[u8]>,
    wire_len: usize,
}

impl FrameBuffer {
    pub fn try_new(capacity_pixels: usize) -> Result<Self, AllocError> {
        let bytes = capacity_pixels * SOURCE_BYTES_PER_PIXEL;
        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|_| AllocError { bytes })?;
        data.resize(bytes, 0);
        Ok(Self {
            data: data.into_boxed_slice(),
            wire_len: 0,
        })
    }

    pub fn capacity_pixels(&self) -> usize {
        self.data.len() / SOURCE_BYTES_PER_PIXEL
    }

    /// Copies `area` out of a frame of `stride` pixels per row, row after
    /// row, and returns the number of pixels loaded.
    pub fn load_region(
        &mut self,
        frame: &[Bgra8888],
        stride: usize,
        area: &Area,
    ) -> Result<usize, FlushError> {
        let pixels = area.pixel_count();
        if pixels > self.capacity_pixels() {
            return Err(FlushError::BufferTooSmall);
        }
        if pixels == 0 {
            self.wire_len = 0;
            return Ok(0);
        }
        let last = usize::from(area.y2) * stride + usize::from(area.x2);
        if usize::from(area.x2) >= stride || last >= frame.len() {
            return Err(FlushError::OutOfFrame);
        }

        let row_len = area.width() as usize;
        let rows = self
            .data
            .chunks_exact_mut(row_len * SOURCE_BYTES_PER_PIXEL);
        for (y, row) in (usize::from(area.y1)..=usize::from(area.y2)).zip(rows) {
            let start = y * stride + usize::from(area.x1);
            for (dst, pixel) in row
                .chunks_exact_mut(SOURCE_BYTES_PER_PIXEL)
                .zip(&frame[start..start + row_len])
            {
                dst.copy_from_slice(&pixel.to_bytes());
            }
        }
        self.wire_len = 0;
        Ok(pixels)
    }

    /// Converts the first `pixels` loaded pixels to the wire format
    pub fn pack(&mut self, pixels: usize) {
        self.wire_len = pack_rgb888_in_place(&mut self.data, pixels).len();
    }

    /// Packed bytes ready for the panel
    pub fn wire_data(&self) -> &[u8] {
        &self.data[..self.wire_len]
    }

    pub fn wire_pixels(&self) -> usize {
        self.wire_len / WIRE_BYTES_PER_PIXEL
    }
}

/// Free buffers plus the FIFO of commands for the transfer worker
pub struct FramePool<M: RawMutex> {
    free: Channel<M, FrameBuffer, DRAW_BUFFER_COUNT>,
    commands: Channel<M, PanelCommand, DRAW_BUFFER_COUNT>,
    capacity_pixels: usize,
}

impl<M: RawMutex> FramePool<M> {
    /// Allocates all draw buffers, each for `capacity_pixels` pixels
    pub fn allocate(capacity_pixels: usize) -> Result<Self, AllocError> {
        let pool = Self {
            free: Channel::new(),
            commands: Channel::new(),
            capacity_pixels,
        };
        for _ in 0..DRAW_BUFFER_COUNT {
            let buffer = FrameBuffer::try_new(capacity_pixels)?;
            // cannot fail, the queue holds exactly DRAW_BUFFER_COUNT
            let _ = pool.free.try_send(buffer);
        }
        debug!(
            "allocated {} draw buffers of {} pixels",
            DRAW_BUFFER_COUNT, capacity_pixels
        );
        Ok(pool)
    }

    pub fn capacity_pixels(&self) -> usize {
        self.capacity_pixels
    }

    /// Number of buffers nobody is using right now
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Waits until a buffer is free and takes it
    pub async fn acquire(&self) -> FrameBuffer {
        self.free.receive().await
    }

    /// Hands a buffer back. Never blocks, safe from the completion path.
    pub fn release(&self, buffer: FrameBuffer) {
        if self.free.try_send(buffer).is_err() {
            warn!("draw buffer released twice, dropping it");
        }
    }

    pub async fn submit(&self, request: FlushRequest) {
        self.commands.send(PanelCommand::Flush(request)).await;
    }

    /// Queues a scan direction change behind the flushes already queued
    pub async fn submit_transform(&self, transform: PanelTransform) {
        self.commands.send(PanelCommand::Transform(transform)).await;
    }

    pub async fn next_command(&self) -> PanelCommand {
        self.commands.receive().await
    }
}
