// in-crate modules
mod config;

// in-crate imports
use config::*;

// the driver
use veml7700::{I2cBus, InterruptStatus, RegisterBus, Veml7700};

// my libraries
use xdg_dirs::{dirs, xdg_location_of, xdg_user_dir};

// STD
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::{fs, thread, time};

// 3rd party libraries
use anyhow::Context;
use clap::{Parser, Subcommand, command};
use embedded_hal::i2c::I2c;
use ftdi_embedded_hal as hal;
use log::{info, warn};

const CONFIG_PATH: &str = "veml7700/config.ron";

const DEFAULT_CONFIG: &str = r#"
(
adapter: (
    vendor_id: 0x0403,
    product_id: 0x6014,
),
sensor: (
    sensitivity: X1,
    integration_time: Ms100,
    persistence: One,
    interrupt: false,
    high_threshold: None,
    low_threshold: None,
),
poll_interval_ms: 1000,
)
"#;

#[derive(Debug, Subcommand, PartialEq)]
enum Command {
    #[command(
        about = "(default) Reset and configure the sensor, then periodically print lux and threshold interrupts."
    )]
    Run,

    #[command(about = "Reset the sensor and apply the configured settings once.")]
    Apply,

    #[command(
        about = "Print the current sensor settings and readings without changing the configuration."
    )]
    Status,

    #[command(
        about = "Check configuration file syntax and print out the settings that will be applied to the sensor."
    )]
    Check,

    #[command(about = "Generate a default config file")]
    GenConfig,
}

#[derive(Debug, Parser, PartialEq)]
#[command(
    about = "A tool to configure and read a VEML7700 ambient light sensor over an FTDI USB to I2C adapter",
    version
)]
struct Args {
    #[arg(
        global = true,
        short,
        long = "config",
        help = format!("Path to configuration file. Defaults to `{CONFIG_PATH}` under the user's config directory."),
    )]
    config_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Args {
    /// Get the config path, and verify the file exists. This is the either the path passed as an arg, or from the XDG directory if not specified.
    ///
    /// This returns error if the path does not exist.
    fn get_config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config_path {
            Some(path) => path
                .canonicalize()
                .with_context(|| format!("Could not open config file `{0}`", path.display())),
            None => xdg_location_of(&dirs::CONFIG, CONFIG_PATH)
                .with_context(|| "Could not open config file"),
        }
    }
}

/// Load the configuration based on arguments.
/// Uses the file supplied to the CLI, or in the default location if not specified, or the default config if there is no file.
fn get_config(args: &Args) -> anyhow::Result<Config> {
    match args.get_config_path() {
        Ok(path) => {
            info!("Reading config from {path}", path = path.display());
            Config::read_from_file(path)
        }
        Err(err) => {
            warn!("Config file not found in any standard locations, using default configuration.");
            warn!("  Config search error: {err}");
            Config::from_str(DEFAULT_CONFIG)
        }
    }
}

/// Open the FTDI adapter and hand back its I2C port wrapped as a register bus.
fn open_bus(adapter: AdapterConfig) -> anyhow::Result<I2cBus<impl I2c>> {
    let device = ftdi::find_by_vid_pid(adapter.vendor_id, adapter.product_id)
        .interface(ftdi::Interface::A)
        .open()
        .with_context(|| {
            format!(
                "Could not open FTDI adapter {0:04x}:{1:04x}",
                adapter.vendor_id, adapter.product_id
            )
        })?;
    let i2c = hal::FtHal::init_default(device)?.i2c()?;

    Ok(I2cBus::new(i2c))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    log::debug!("args = {args:?}");

    // process commands
    match args.command {
        // Primary behaviour: configure the sensor, then read it forever
        None | Some(Command::Run) => main_loop(&args),

        Some(Command::Apply) => apply(&args),

        Some(Command::Status) => status(&args),

        // Test config file: make sure it exists, can be read, and can be parsed
        Some(Command::Check) => check_config(&args),

        // Generate config file: if the file does not already exist, write
        Some(Command::GenConfig) => gen_config_file(&args),
    }
}

/// Verify the config file: Make sure it can be found at the expected location (passed through CLI or using XDG config location), and parses properly.
fn check_config(args: &Args) -> anyhow::Result<()> {
    // Try to _find_ the config file
    let path = args
        .get_config_path()
        .with_context(|| "Failed to find config file")?;

    // Try to _parse_ the config file
    println!("Attempting to load config from `{0}`", path.display());
    let config = Config::read_from_file(path).with_context(|| "Failed to parse configuration")?;

    println!("Successfully read config: {config:#?}");

    let sensor = &config.sensor;
    println!("\nSettings that will be applied to the sensor:");
    println!("  sensitivity:      {0}", sensor.sensitivity);
    println!("  integration time: {0}", sensor.integration_time);
    println!("  persistence:      {0}", sensor.persistence);
    println!("  interrupt:        {0}", sensor.interrupt);
    match (sensor.high_threshold, sensor.low_threshold) {
        (Some(high), Some(low)) if low > high => {
            println!("  WARNING: low threshold {low} is above high threshold {high}")
        }
        _ => { /* nothing to flag */ }
    }

    Ok(())
}

/// Generate a default configuration file, at the expected location based on args or environment variables.
fn gen_config_file(args: &Args) -> anyhow::Result<()> {
    // CLI arg path, or default from environment
    let path = args
        .config_path
        .clone()
        .map_or_else(|| xdg_user_dir(&dirs::CONFIG, CONFIG_PATH), Ok)
        .with_context(|| "Could not determine location for config file")?;

    // Create parent directory path if applicable
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!(
                "Failed to create parent directory of the new config file {0}",
                path.display()
            )
        })?;
    }

    // Create the new file and write the default contents
    let mut file = File::create_new(&path)
        .with_context(|| format!("Failed to create new config file {0}", path.display()))?;

    write!(file, "{}", DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write the new config file {0}", path.display()))?;

    info!("Wrote default configuration to {0}", path.display());
    Ok(())
}

/// Reset the sensor to its baseline and apply the configured settings.
fn configure<B: RegisterBus>(bus: B, config: &Config) -> anyhow::Result<Veml7700<B>> {
    let mut sensor = Veml7700::from_bus(bus).with_context(|| "Failed to reset the sensor")?;
    config
        .sensor
        .apply_to(&mut sensor)
        .with_context(|| "Failed to apply sensor settings")?;

    Ok(sensor)
}

fn apply(args: &Args) -> anyhow::Result<()> {
    let config = get_config(args)?;
    let bus = open_bus(config.adapter)?;
    configure(bus, &config)?;

    Ok(())
}

/// Print every setting and reading. Attaches without `begin` so the configuration is left alone.
fn status(args: &Args) -> anyhow::Result<()> {
    let config = get_config(args)?;
    let bus = open_bus(config.adapter)?;
    print_status(&mut Veml7700::attach(bus))
}

fn print_status<B: RegisterBus>(sensor: &mut Veml7700<B>) -> anyhow::Result<()> {
    if !sensor.is_connected() {
        anyhow::bail!("VEML7700 not responding at I2C address {:#04x}", veml7700::I2C_ADDR);
    }

    println!("shut down:        {0}", sensor.get_shutdown()?);
    println!("interrupt enable: {0}", sensor.get_interrupt_enabled()?);
    println!("persistence:      {0}", sensor.persistence_protect_str());
    println!("integration time: {0}", sensor.integration_time_str());
    println!("sensitivity:      {0}", sensor.sensitivity_mode_str());
    println!("high threshold:   {0}", sensor.get_high_threshold()?);
    println!("low threshold:    {0}", sensor.get_low_threshold()?);
    println!("ambient (ALS):    {0}", sensor.get_ambient_light()?);
    println!("white:            {0}", sensor.get_white_level()?);
    println!("lux:              {0:.4}", sensor.get_lux()?);
    // reading the status clears it
    println!("interrupt status: {0}", sensor.get_interrupt_status()?);

    Ok(())
}

/// Default daemon behaviour: Read config file, configure the sensor, then read lux and threshold crossings forever.
fn main_loop(args: &Args) -> anyhow::Result<()> {
    // Read in configuration, or load default configuration
    let config = get_config(args)?;
    info!("Loaded configuration: {config:?}");

    // Connect to the sensor
    let bus = open_bus(config.adapter)?;
    let mut sensor = configure(bus, &config)?;

    // No point polling faster than the sensor integrates
    let integration_ms = config.sensor.integration_time.millis().unwrap_or(0) as u64;
    let period = time::Duration::from_millis(config.poll_interval_ms.max(integration_ms));

    // Drop any crossing left over from before the thresholds were set
    sensor.clear_interrupt_status()?;

    loop {
        match sensor.get_lux() {
            Ok(lux) => info!("lux={lux:.2}"),
            Err(e) => warn!("failed to read lux: {e}"),
        }

        if config.sensor.interrupt {
            match sensor.get_interrupt_status() {
                Ok(InterruptStatus::None) => {}
                Ok(status) => info!("threshold interrupt: {status}"),
                Err(e) => warn!("failed to read interrupt status: {e}"),
            }
        }

        thread::sleep(period);
    }
}
