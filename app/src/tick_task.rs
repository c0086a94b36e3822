use watch_core::{
    config::TICK_PERIOD,
    tick::{TickCounter, TickSource},
};

#[embassy_executor::task]
pub async fn tick_task(counter: &'static TickCounter) {
    TickSource::new(counter, TICK_PERIOD).run().await
}
