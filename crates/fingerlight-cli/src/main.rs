//! `fingerlight`: light an LED strip in a color keyed to the finger on the sensor.

mod console;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fingerlight_biometric::{AnySensor, R30xSensor};
use fingerlight_core::DeviceConfig;
use fingerlight_engine::Device;
use fingerlight_hardware::devices::AnyStrip;
use fingerlight_hardware::mock::MockSensor;
use fingerlight_hardware::terminal::TerminalStrip;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fingerlight", version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port of the fingerprint sensor (overrides config)
    #[arg(short, long)]
    port: Option<String>,

    /// Number of pixels on the strip (overrides config)
    #[arg(short = 'n', long)]
    pixel_count: Option<usize>,

    /// Log level or filter directive (overrides config; RUST_LOG wins)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Use the keyboard-driven mock sensor even if a port is configured
    #[arg(long, default_value_t = false)]
    mock: bool,
}

impl Args {
    fn apply(&self, config: &mut DeviceConfig) {
        if let Some(port) = &self.port {
            config.sensor.port = Some(port.clone());
        }
        if let Some(count) = self.pixel_count {
            config.strip.pixel_count = count;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // stdout belongs to the strip preview
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_sensor(config: &DeviceConfig, force_mock: bool) -> Result<AnySensor> {
    match &config.sensor.port {
        Some(port) if !force_mock => {
            info!("Opening fingerprint sensor on {}", port);
            let sensor = R30xSensor::open(&config.sensor)
                .with_context(|| format!("opening sensor port {port}"))?;
            Ok(sensor.into())
        }
        _ => {
            let (sensor, handle) = MockSensor::new();
            tokio::spawn(console::run(handle));
            Ok(sensor.into())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = DeviceConfig::load(args.config.as_deref()).context("loading configuration")?;
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;

    init_logging(&config.logging.level);
    info!("fingerlight {}", fingerlight_core::VERSION);

    let sensor = open_sensor(&config, args.mock)?;
    let strip = AnyStrip::from(TerminalStrip::stdout());

    let mut device = Device::start(sensor, strip, &config)
        .await
        .context("starting device")?;

    tokio::select! {
        () = device.run_control_loop() => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("waiting for Ctrl-C")?;
            info!("Shutdown signal received");
        }
    }

    device.log_stats();
    let report = device.shutdown()?;
    info!("Rendered {} frames", report.frames);
    Ok(())
}
