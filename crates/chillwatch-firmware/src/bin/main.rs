#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use core::convert::Infallible;

use chillwatch_core::Monitor;
use chillwatch_core::app_state::{AppError, AppRunState, AppState};
use chillwatch_firmware::{config, hardware, network, server};
use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::peripherals::Peripherals;
use esp_hal::timer::timg::TimerGroup;
use log::{error, info};

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[allow(
    clippy::large_stack_frames,
    reason = "the request and response buffers live in the server future"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Wi-Fi needs a heap
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    let mut state = AppState::new();
    let Err(e) = run(spawner, peripherals, &mut state).await;

    state.transition(AppRunState::Error);
    error!("Fatal: {}", e);

    // Nothing to retry without new configuration; wait for a reset.
    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}

async fn run(
    spawner: Spawner,
    peripherals: Peripherals,
    state: &mut AppState,
) -> Result<Infallible, AppError> {
    let config = config::load()?;

    state.transition(AppRunState::WifiConnecting);
    let network = network::bring_up(
        &spawner,
        peripherals.WIFI,
        &config.internet,
        &config.network,
    )
    .await?;
    state.wifi_connected(network.address);

    let hardware =
        hardware::init_sensor_hardware(peripherals.GPIO6, peripherals.GPIO7, peripherals.GPIO8)?;
    let mut monitor = Monitor::bind(
        hardware.bus,
        &config.units,
        &config.sensors,
        hardware.fridge_door,
        hardware.freezer_door,
    )?;
    state.transition(AppRunState::SensorsBound);

    state.transition(AppRunState::Serving);
    info!(
        "Listening on http://{}:{}",
        network.address,
        server::HTTP_PORT
    );
    server::serve_forever(network.stack, &mut monitor).await
}
