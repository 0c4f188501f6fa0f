// src/main.rs
//! roadscan-gps - probe and soak-test a serial GPS receiver

use anyhow::Context;
use clap::{Parser, Subcommand};
use roadscan_gps::{
    gps::{transport, ConnectionState, Position, ReplayTransport, SerialTransport, Transport},
    FixQuality, GpsConfig, GpsHandler,
};
use std::{collections::BTreeMap, path::PathBuf, time::Duration};

#[derive(Parser, Debug)]
#[command(name = "roadscan-gps", version, about = "Serial GPS positioning for road damage detection")]
struct Cli {
    /// Serial port (overrides config and GPS_PORT)
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// Baud rate (overrides config and GPS_BAUD)
    #[arg(short, long, global = true)]
    baud: Option<u32>,

    /// Read timeout in seconds (overrides config and GPS_TIMEOUT)
    #[arg(short, long, global = true)]
    timeout: Option<f64>,

    /// Play back an NMEA log file instead of opening a device
    #[arg(long, global = true, value_name = "FILE")]
    replay: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available serial ports
    Ports,
    /// Print raw NMEA lines, then handler diagnostics and one position
    Probe {
        #[arg(short, long, default_value_t = 10)]
        count: usize,
    },
    /// Poll positions repeatedly and summarise fix quality
    Watch {
        #[arg(short, long, default_value_t = 20)]
        reads: usize,
        #[arg(short, long, default_value_t = 500)]
        interval_ms: u64,
    },
    /// Show the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        save: bool,
    },
}

/// Either a real device or a recorded log
enum Source {
    Serial(SerialTransport),
    Replay(ReplayTransport),
}

impl Transport for Source {
    fn open(&mut self) -> roadscan_gps::Result<()> {
        match self {
            Source::Serial(t) => t.open(),
            Source::Replay(t) => t.open(),
        }
    }

    async fn read_line(&mut self, timeout: Duration) -> roadscan_gps::Result<Option<String>> {
        match self {
            Source::Serial(t) => t.read_line(timeout).await,
            Source::Replay(t) => t.read_line(timeout).await,
        }
    }

    fn close(&mut self) {
        match self {
            Source::Serial(t) => t.close(),
            Source::Replay(t) => t.close(),
        }
    }

    fn state(&self) -> ConnectionState {
        match self {
            Source::Serial(t) => t.state(),
            Source::Replay(t) => t.state(),
        }
    }

    fn port(&self) -> &str {
        match self {
            Source::Serial(t) => t.port(),
            Source::Replay(t) => t.port(),
        }
    }

    fn baud_rate(&self) -> u32 {
        match self {
            Source::Serial(t) => t.baud_rate(),
            Source::Replay(t) => t.baud_rate(),
        }
    }
}

impl Cli {
    fn config(&self) -> anyhow::Result<GpsConfig> {
        let mut config = GpsConfig::load().context("Failed to load configuration")?;
        if let Some(port) = &self.port {
            config.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.baud = baud;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        config.validate()?;
        Ok(config)
    }

    fn source(&self, config: &GpsConfig) -> anyhow::Result<Source> {
        match &self.replay {
            Some(path) => {
                let replay = ReplayTransport::from_file(path)
                    .with_context(|| format!("Failed to read NMEA log {}", path.display()))?;
                Ok(Source::Replay(replay))
            }
            None => Ok(Source::Serial(SerialTransport::new(config.port.clone(), config.baud))),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Ports => list_ports(),
        Command::Probe { count } => {
            let config = cli.config()?;
            probe(&cli, &config, *count).await
        }
        Command::Watch { reads, interval_ms } => {
            let config = cli.config()?;
            let handler = GpsHandler::new(cli.source(&config)?, config.policy()?)?;
            watch(handler, *reads, Duration::from_millis(*interval_ms)).await
        }
        Command::Config { save } => {
            let config = cli.config()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            if *save {
                config.save()?;
                println!("Saved to {}", GpsConfig::get_config_path()?.display());
            }
            Ok(())
        }
    }
}

fn list_ports() -> anyhow::Result<()> {
    let ports = transport::list_ports().context("Failed to list serial ports")?;

    if ports.is_empty() {
        println!("No serial ports found.");
    } else {
        println!("Available serial ports:");
        for (name, kind) in ports {
            println!("  {} - {}", name, kind);
        }
    }
    Ok(())
}

async fn probe(cli: &Cli, config: &GpsConfig, count: usize) -> anyhow::Result<()> {
    let mut source = cli.source(config)?;
    let timeout = config.policy()?.read_timeout;
    println!(
        "Probing {} @ {} baud, printing up to {} NMEA lines",
        source.port(),
        source.baud_rate(),
        count
    );

    match source.open() {
        Ok(()) => {
            let mut printed = 0;
            // Bounded so a silent or garbled port still finishes
            for _ in 0..count * 4 + 5 {
                if printed >= count {
                    break;
                }
                match source.read_line(timeout).await {
                    Ok(Some(line)) if line.starts_with('$') => {
                        printed += 1;
                        println!("[{}] {}", printed, line);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        println!("Read failed: {}", e);
                        break;
                    }
                }
            }
            if printed == 0 {
                println!("No NMEA sentences seen. Check the port and baud rate.");
            }
            source.close();
        }
        Err(e) => println!("Failed to open {}: {}", source.port(), e),
    }

    let mut handler = GpsHandler::new(cli.source(config)?, config.policy()?)?;
    println!("\nHandler diagnostics:");
    println!("{}", serde_json::to_string_pretty(&handler.get_diagnostics())?);

    let position = handler.get_coordinates().await;
    println!("\nImmediate position: {}", describe(&position));
    handler.close();
    Ok(())
}

async fn watch<T: Transport>(mut handler: GpsHandler<T>, reads: usize, interval: Duration) -> anyhow::Result<()> {
    if !handler.is_connected() {
        println!("Not connected to {}; continuing, each read retries once", handler.transport().port());
    }
    println!(
        "Reading {} positions, worst case {:.1}s per read\n",
        reads,
        handler.policy().worst_case_wait().as_secs_f64()
    );

    let mut quality_counts: BTreeMap<u8, usize> = BTreeMap::new();
    let mut positions: Vec<(f64, f64)> = Vec::new();

    for i in 1..=reads {
        let position = handler.get_coordinates().await;
        if let (Some(lat), Some(lon)) = (position.latitude, position.longitude) {
            *quality_counts.entry(position.gps_quality).or_default() += 1;
            positions.push((lat, lon));
        }
        println!("[{:3}] {}", i, describe(&position));

        if i < reads {
            tokio::time::sleep(interval).await;
        }
    }

    let valid = positions.len();
    println!("\nTotal reads: {}", reads);
    println!("With position: {}", valid);
    if reads > 0 {
        println!("Fix rate: {:.1}%", valid as f64 / reads as f64 * 100.0);
    }

    if !quality_counts.is_empty() {
        println!("\nQuality distribution:");
        for (quality, count) in &quality_counts {
            let label = FixQuality::from_u8(*quality).map_or("Unknown", FixQuality::description);
            println!("  {:12}: {:3} ({:5.1}%)", label, count, *count as f64 / valid as f64 * 100.0);
        }
    }

    if positions.len() > 1 {
        let (lat_min, lat_max) = bounds(positions.iter().map(|p| p.0));
        let (lon_min, lon_max) = bounds(positions.iter().map(|p| p.1));
        let metres_per_degree = 111_320.0;
        let mid_lat = ((lat_min + lat_max) / 2.0).to_radians();
        println!("\nPosition spread (movement or noise):");
        println!("  Latitude:  {:.8}° ({:.2} m)", lat_max - lat_min, (lat_max - lat_min) * metres_per_degree);
        println!(
            "  Longitude: {:.8}° ({:.2} m)",
            lon_max - lon_min,
            (lon_max - lon_min) * metres_per_degree * mid_lat.cos()
        );
    }

    println!("\nDiagnostics:");
    println!("{}", serde_json::to_string_pretty(&handler.get_diagnostics())?);
    handler.close();
    Ok(())
}

fn describe(position: &Position) -> String {
    if !position.has_coordinates() {
        return "No fix".to_string();
    }
    let quality = FixQuality::from_u8(position.gps_quality).map_or("Unknown", FixQuality::description);
    format!(
        "{}, {} | {} | {}",
        Position::format_coordinate(position.latitude).trim(),
        Position::format_coordinate(position.longitude).trim(),
        quality,
        position.gps_timestamp.as_deref().unwrap_or("--:--:--")
    )
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}
