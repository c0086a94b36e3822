//! PMU interrupt bridge.
//!
//! The GPIO interrupt handler only pushes a [`PowerEvent`] into a bounded
//! queue. The [`PowerEventWorker`] task waits on that queue with a timeout,
//! polls the PMU over I2C and publishes the status for the UI.

use core::fmt::Debug;

use drivers::axp2101::{asynch::Axp2101Async, PmuError, PmuStatus};
use embassy_sync::{
    blocking_mutex::raw::RawMutex,
    channel::{Channel, Receiver, Sender},
    signal::Signal,
};
use embassy_time::{with_timeout, Duration};
use embedded_hal_async::i2c::I2c;
use log::{debug, info, warn};

use crate::config::POWER_EVENT_QUEUE_DEPTH;

/// Falling edge seen on the PMU interrupt line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerEvent {
    pub gpio: u8,
}

pub type PowerEventQueue<M> = Channel<M, PowerEvent, POWER_EVENT_QUEUE_DEPTH>;

/// Interrupt-side handle of the queue
pub struct IrqNotifier<'a, M: RawMutex> {
    sender: Sender<'a, M, PowerEvent, POWER_EVENT_QUEUE_DEPTH>,
    gpio: u8,
}

impl<'a, M: RawMutex> IrqNotifier<'a, M> {
    pub fn new(queue: &'a PowerEventQueue<M>, gpio: u8) -> Self {
        Self {
            sender: queue.sender(),
            gpio,
        }
    }

    /// Queues an event without blocking. Returns `false` if the queue was
    /// full and the event was dropped.
    pub fn notify(&self) -> bool {
        self.sender.try_send(PowerEvent { gpio: self.gpio }).is_ok()
    }
}

/// PMU as seen by the worker
#[allow(async_fn_in_trait)]
pub trait PmuMonitor {
    type Error: Debug;

    /// Reads a status snapshot and acknowledges pending interrupts
    async fn poll_status(&mut self) -> Result<PmuStatus, Self::Error>;
}

impl<I2C: I2c> PmuMonitor for Axp2101Async<I2C> {
    type Error = PmuError;

    async fn poll_status(&mut self) -> Result<PmuStatus, PmuError> {
        Axp2101Async::poll_status(self).await
    }
}

/// What ended the wait of a worker cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleTrigger {
    /// `events` queued interrupts were consumed
    Interrupt { events: usize },
    /// The poll period passed without an interrupt
    Timer,
}

pub struct PowerEventWorker<'a, M: RawMutex, P> {
    events: Receiver<'a, M, PowerEvent, POWER_EVENT_QUEUE_DEPTH>,
    pmu: P,
    period: Duration,
    status: &'a Signal<M, PmuStatus>,
    last: Option<PmuStatus>,
}

impl<'a, M: RawMutex, P: PmuMonitor> PowerEventWorker<'a, M, P> {
    pub fn new(
        queue: &'a PowerEventQueue<M>,
        pmu: P,
        period: Duration,
        status: &'a Signal<M, PmuStatus>,
    ) -> Self {
        Self {
            events: queue.receiver(),
            pmu,
            period,
            status,
            last: None,
        }
    }

    /// Last status read successfully
    pub fn last_status(&self) -> Option<&PmuStatus> {
        self.last.as_ref()
    }

    /// Waits up to one period for an interrupt, coalesces whatever else is
    /// queued, then polls the PMU. The poll runs on every cycle, interrupt
    /// or not. A failed poll keeps the previous status.
    pub async fn cycle(&mut self) -> CycleTrigger {
        let trigger = match with_timeout(self.period, self.events.receive()).await {
            Ok(event) => {
                let mut events = 1;
                while self.events.try_receive().is_ok() {
                    events += 1;
                }
                debug!("PMU interrupt on GPIO{} ({events} queued)", event.gpio);
                CycleTrigger::Interrupt { events }
            }
            Err(_) => CycleTrigger::Timer,
        };

        match self.pmu.poll_status().await {
            Ok(status) => {
                if !status.irq.is_empty() {
                    info!("PMU irq {:?}", status.irq);
                }
                info!("{status}");
                self.last = Some(status);
                self.status.signal(status);
            }
            Err(e) => warn!("PMU poll failed: {e:?}"),
        }
        trigger
    }

    pub async fn run(&mut self) -> ! {
        loop {
            self.cycle().await;
        }
    }
}
