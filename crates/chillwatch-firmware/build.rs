//! Embeds the Wi-Fi credentials at build time.
//!
//! `WIFI_SSID` and `WIFI_PASSWORD` come from the environment or from a `.env`
//! file in this crate or any parent directory.

const REQUIRED: [&str; 2] = ["WIFI_SSID", "WIFI_PASSWORD"];

fn main() {
    if let Ok(path) = dotenvy::dotenv() {
        println!("cargo:rerun-if-changed={}", path.display());
    }

    for key in REQUIRED {
        println!("cargo:rerun-if-env-changed={key}");
        match std::env::var(key) {
            Ok(value) => println!("cargo:rustc-env={key}={value}"),
            Err(_) => panic!("{key} must be set in the environment or in a .env file"),
        }
    }

    println!("cargo:rustc-link-arg=-Tlinkall.x");
}
