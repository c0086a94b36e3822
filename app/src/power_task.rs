//! PMU interrupt line and the task that services it.
//!
//! The GPIO handler only acknowledges the pin and queues an event. All I2C
//! traffic happens in [`power_task`].

use core::cell::RefCell;

use critical_section::Mutex;
use drivers::axp2101::PmuStatus;
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel, signal::Signal,
};
use esp_hal::gpio::{Event, Input, InputConfig, Io, Pull};
use esp_hal::handler;
use esp_hal::peripherals::GPIO16;
use watch_core::{
    config::POWER_POLL_PERIOD,
    power::{IrqNotifier, PowerEventQueue, PowerEventWorker},
};

use crate::hardware::Pmu;

/// GPIO wired to the AXP2101 IRQ output
const PMU_IRQ_GPIO: u8 = 16;

/// Interrupts waiting for the power task
pub static POWER_EVENTS: PowerEventQueue<CriticalSectionRawMutex> = Channel::new();

static PMU_IRQ_PIN: Mutex<RefCell<Option<Input<'static>>>> = Mutex::new(RefCell::new(None));

/// Routes falling edges of the PMU IRQ line into [`POWER_EVENTS`]
pub fn listen_pmu_irq(io: &mut Io<'_>, pin: GPIO16<'static>) {
    io.set_interrupt_handler(pmu_irq_handler);

    // the AXP2101 IRQ output is open drain
    let mut pin = Input::new(pin, InputConfig::default().with_pull(Pull::Up));
    critical_section::with(|cs| {
        pin.listen(Event::FallingEdge);
        PMU_IRQ_PIN.borrow_ref_mut(cs).replace(pin);
    });
}

#[handler]
fn pmu_irq_handler() {
    critical_section::with(|cs| {
        let mut pin = PMU_IRQ_PIN.borrow_ref_mut(cs);
        let Some(pin) = pin.as_mut() else {
            return;
        };
        if pin.is_interrupt_set() {
            pin.clear_interrupt();
            // a full queue already guarantees a poll, the event can go
            IrqNotifier::new(&POWER_EVENTS, PMU_IRQ_GPIO).notify();
        }
    });
}

#[embassy_executor::task]
pub async fn power_task(pmu: Pmu, status: &'static Signal<CriticalSectionRawMutex, PmuStatus>) {
    PowerEventWorker::new(&POWER_EVENTS, pmu, POWER_POLL_PERIOD, status)
        .run()
        .await
}
