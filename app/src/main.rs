#![no_std]
#![no_main]

use alloc::boxed::Box;
use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use esp_alloc::psram_allocator;
use esp_backtrace as _;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::Io;
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::time::Rate;
use esp_hal::Async;
use esp_hal_embassy::main;
use drivers::axp2101::PmuStatus;
use log::{info, LevelFilter};
use slint::platform::software_renderer::{MinimalSoftwareWindow, RepaintBufferType};
use slint::ComponentHandle;
use slint_generated::AppWindow;
use static_cell::StaticCell;
use watch_core::config::{BUFFER_ROWS_DIVISOR, DRAW_BUFFER_COUNT};
use watch_core::flush::FlushAdapter;
use watch_core::frame_pool::FramePool;
use watch_core::rotation::Orientation;
use watch_core::tick::TickCounter;

use gui::Gui;
use hardware::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use power_task::{listen_pmu_irq, power_task};
use render_task::render_task;
use slint_backend::Backend;
use tick_task::tick_task;
use transfer_task::transfer_task;

extern crate alloc;

mod gui;
mod hardware;
mod power_task;
mod render_task;
mod slint_backend;
mod tick_task;
mod transfer_task;

esp_bootloader_esp_idf::esp_app_desc!();

#[main]
async fn main(spawner: Spawner) {
    esp_println::logger::init_logger(LevelFilter::Info);

    // Initialize peripherals
    let peripherals = esp_hal::init(esp_hal::Config::default().with_cpu_clock(CpuClock::_240MHz));

    esp_alloc::heap_allocator!(size: 72 * 1024);

    let timg0 = esp_hal::timer::timg::TimerGroup::new(peripherals.TIMG0);
    esp_hal_embassy::init(timg0.timer0);
    info!("Embassy initialized!");

    // The frame and the draw buffers live in PSRAM
    psram_allocator!(peripherals.PSRAM, esp_hal::psram);

    // Initialize the shared I2C bus
    let i2c = I2c::new(
        peripherals.I2C0,
        I2cConfig::default().with_frequency(Rate::from_khz(400)),
    )
    .expect("Failed to configure I2C")
    .with_sda(peripherals.GPIO15)
    .with_scl(peripherals.GPIO14)
    .into_async();

    static I2C_BUS: StaticCell<Mutex<CriticalSectionRawMutex, I2c<'static, Async>>> =
        StaticCell::new();
    let i2c_bus = I2C_BUS.init(Mutex::new(i2c));

    // Release display and touch from reset before talking to them
    hardware::power_up_peripherals(I2cDevice::new(i2c_bus)).await;

    let display = hardware::initialize_display(
        peripherals.GPIO12,
        peripherals.GPIO11,
        peripherals.GPIO4,
        peripherals.GPIO5,
        peripherals.GPIO6,
        peripherals.GPIO7,
        peripherals.SPI2,
        peripherals.DMA_CH0,
    )
    .await;
    let touch = hardware::initialize_touchpad(I2cDevice::new(i2c_bus)).await;
    let pmu = hardware::initialize_pmu(I2cDevice::new(i2c_bus)).await;

    let mut io = Io::new(peripherals.IO_MUX);
    listen_pmu_irq(&mut io, peripherals.GPIO16);

    // Latest PMU status, published by the power task for the UI
    static POWER_STATUS: StaticCell<Signal<CriticalSectionRawMutex, PmuStatus>> =
        StaticCell::new();
    let power_status: &'static Signal<CriticalSectionRawMutex, PmuStatus> =
        POWER_STATUS.init(Signal::new());

    // Millisecond clock of slint
    static TICKS: StaticCell<TickCounter> = StaticCell::new();
    let ticks: &'static TickCounter = TICKS.init(TickCounter::new());

    // Set the platform for Slint
    let window = MinimalSoftwareWindow::new(RepaintBufferType::ReusedBuffer);
    let backend = Box::new(Backend::new(window.clone(), ticks));
    slint::platform::set_platform(backend).expect("set_platform failed");

    // Initialize UI
    let app_window = AppWindow::new().expect("UI init failed");
    app_window.show().expect("UI show failed");

    static FRAME_POOL: StaticCell<FramePool<CriticalSectionRawMutex>> = StaticCell::new();
    let capacity = usize::from(DISPLAY_WIDTH) * usize::from(DISPLAY_HEIGHT / BUFFER_ROWS_DIVISOR);
    let pool: &'static FramePool<CriticalSectionRawMutex> = FRAME_POOL
        .init(FramePool::allocate(capacity).expect("Failed to allocate draw buffers"));
    info!("Draw buffers: {DRAW_BUFFER_COUNT} x {capacity} pixels");

    let state = Gui::new(
        window,
        app_window,
        FlushAdapter::new(pool, DISPLAY_WIDTH, DISPLAY_HEIGHT),
        touch,
        power_status,
    );
    static GUI: StaticCell<Mutex<NoopRawMutex, Gui>> = StaticCell::new();
    let gui: &'static Mutex<NoopRawMutex, Gui> = GUI.init(Mutex::new(state));

    // TASK: move flushed bands to the panel
    spawner.spawn(transfer_task(pool, display)).ok();

    // Size the window and the panel scan direction for the start orientation
    gui.lock().await.set_orientation(Orientation::default()).await;

    // TASK: advance the slint clock
    spawner.spawn(tick_task(ticks)).ok();

    // TASK: service PMU interrupts and poll its status
    spawner.spawn(power_task(pmu, power_status)).ok();

    // TASK: run the gui render loop
    spawner.spawn(render_task(gui)).ok();
}
