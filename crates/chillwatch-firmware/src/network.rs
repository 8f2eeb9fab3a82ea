//! Wi-Fi station bring-up and the embassy-net stack

use alloc::string::String;

use chillwatch_core::app_state::AppError;
use chillwatch_core::config::{InternetConfig, NetworkConfig};
use embassy_executor::Spawner;
use embassy_futures::select::{Either, select};
use embassy_net::{
    Config as NetConfig, DhcpConfig, Ipv4Address, Ipv4Cidr, Runner, Stack, StackResources,
    StaticConfigV4,
};
use embassy_time::{Duration, Timer};
use esp_hal::{peripherals::WIFI, rng::Rng};
use esp_radio::{
    Controller as RadioController,
    wifi::{self, ClientConfig, ModeConfig, WifiController, WifiDevice},
};
use log::info;
use static_cell::StaticCell;

/// How long to wait for DHCP (or the static config) after association.
pub const CONFIG_UP_TIMEOUT_SECS: u32 = 30;

static RADIO_CONTROLLER: StaticCell<RadioController<'static>> = StaticCell::new();
static NET_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();

/// A connected station. Dropping it tears the link down.
pub struct Network {
    pub stack: Stack<'static>,
    pub address: Ipv4Address,
    _controller: WifiController<'static>,
}

fn net_config(network: &NetworkConfig) -> NetConfig {
    match network {
        NetworkConfig::Dhcp => NetConfig::dhcpv4(DhcpConfig::default()),
        NetworkConfig::Static(ip) => NetConfig::ipv4_static(StaticConfigV4 {
            address: Ipv4Cidr::new(ip.address, ip.prefix_len),
            gateway: Some(ip.gateway),
            dns_servers: Default::default(),
        }),
    }
}

/// Associate with the configured network and wait for an IPv4 address.
pub async fn bring_up(
    spawner: &Spawner,
    wifi_peripheral: WIFI<'static>,
    internet: &InternetConfig<'_>,
    network: &NetworkConfig,
) -> Result<Network, AppError> {
    let radio = esp_radio::init().map_err(|e| AppError::wifi("radio init", e))?;
    let radio = RADIO_CONTROLLER.init(radio);

    let (mut controller, interfaces) = wifi::new(radio, wifi_peripheral, Default::default())
        .map_err(|e| AppError::wifi("driver init", e))?;
    let device: WifiDevice<'static> = interfaces.sta;

    let rng = Rng::new();
    let seed = (u64::from(rng.random()) << 32) | u64::from(rng.random());

    let resources = NET_RESOURCES.init(StackResources::new());
    let (stack, runner) = embassy_net::new(device, net_config(network), resources, seed);
    spawner
        .spawn(net_task(runner))
        .map_err(|e| AppError::wifi("net task spawn", e))?;

    let client = ModeConfig::Client(
        ClientConfig::default()
            .with_ssid(String::from(internet.ssid))
            .with_password(String::from(internet.password)),
    );
    controller
        .set_config(&client)
        .map_err(|e| AppError::wifi("set_config", e))?;
    controller
        .start_async()
        .await
        .map_err(|e| AppError::wifi("start", e))?;

    info!(
        "Connecting to Wi-Fi SSID=\"{}\" ({})",
        internet.ssid,
        if network.is_static() { "static IPv4" } else { "DHCP" }
    );
    controller
        .connect_async()
        .await
        .map_err(|e| AppError::wifi("connect", e))?;

    let timeout = Timer::after(Duration::from_secs(CONFIG_UP_TIMEOUT_SECS.into()));
    if let Either::Second(()) = select(stack.wait_config_up(), timeout).await {
        return Err(AppError::NetworkTimeout(CONFIG_UP_TIMEOUT_SECS));
    }

    let address = stack
        .config_v4()
        .map(|cfg| cfg.address.address())
        .ok_or(AppError::NetworkTimeout(CONFIG_UP_TIMEOUT_SECS))?;

    Ok(Network {
        stack,
        address,
        _controller: controller,
    })
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await;
}
