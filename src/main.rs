/*
 * This file is part of ms-platform.
 *
 * Copyright (C) 2025 ms-platform contributors
 *
 * ms-platform is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * ms-platform is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with ms-platform. If not, see <https://www.gnu.org/licenses/>.
 */


use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use ms_platform::bus::BindOutcome;
use ms_platform::chassis::{FanInfo, PsuInfo};
use ms_platform::config::{config_path, load_config_from};
use ms_platform::logger;
use ms_platform::{Chassis, Device, LedColor, PlatformError};

#[derive(Parser)]
#[command(name = "ms-platformctl")]
#[command(version)]
#[command(about = "Inspect and drive the chassis fans and power supplies")]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (defaults to $MS_PLATFORM_CONFIG or /etc/ms-platform/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every fan and PSU
    Status {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    #[command(subcommand, about = "Chassis fan trays")]
    Fan(FanCommands),

    #[command(subcommand, about = "Power supplies")]
    Psu(PsuCommands),
}

#[derive(Subcommand)]
enum FanCommands {
    /// List chassis and PSU fans
    List,
    /// Set the tray PWM for a chassis fan (index 0-9)
    SetSpeed { index: usize, percent: u8 },
    /// Set the tray LED for a chassis fan (green, red, off)
    SetLed { index: usize, color: LedColor },
}

#[derive(Subcommand)]
enum PsuCommands {
    /// List power supplies with telemetry
    List,
    /// Bind the PMBus driver for a PSU (index 0-1)
    Bind { index: usize },
}

impl Commands {
    fn writes_hardware(&self) -> bool {
        matches!(
            self,
            Commands::Fan(FanCommands::SetSpeed { .. })
                | Commands::Fan(FanCommands::SetLed { .. })
                | Commands::Psu(PsuCommands::Bind { .. })
        )
    }
}

fn require_root(euid: libc::uid_t) -> Result<(), PlatformError> {
    if euid != 0 {
        return Err(PlatformError::PermissionDenied(
            "this command writes CPLD and i2c sysfs files and must be run as root".into(),
        ));
    }
    Ok(())
}

fn print_fan(index: &str, fan: &FanInfo) {
    println!(
        "{:<6} {:<10} present={:<5} dir={:<7} speed={:>3}% led={:<5} model={} serial={}",
        index,
        fan.name,
        fan.presence,
        fan.direction.to_string(),
        fan.speed,
        fan.led.to_string(),
        fan.model,
        fan.serial
    );
}

fn print_psu(index: usize, psu: &PsuInfo) {
    println!(
        "{:<6} {:<10} present={:<5} power_ok={:<5} {:.3}V {:.3}A {:.3}W model={} serial={}",
        index, psu.name, psu.presence, psu.status, psu.voltage, psu.current, psu.power, psu.model, psu.serial
    );
}

fn list_fans(chassis: &Chassis) {
    let snapshot = chassis.snapshot();
    for (i, fan) in snapshot.fans.iter().enumerate() {
        print_fan(&i.to_string(), fan);
    }
    for (p, psu) in snapshot.psus.iter().enumerate() {
        for (f, fan) in psu.fans.iter().enumerate() {
            print_fan(&format!("p{}.{}", p, f), fan);
        }
    }
}

fn list_psus(chassis: &Chassis) {
    for (i, psu) in chassis.snapshot().psus.iter().enumerate() {
        print_psu(i, psu);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let path = cli.config.clone().unwrap_or_else(config_path);
    let config = load_config_from(&path)
        .with_context(|| format!("loading config from {}", path.display()))?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    logger::init_logging(level);
    debug!("config {:?} from {}", config, path.display());

    if cli.command.writes_hardware() {
        require_root(unsafe { libc::geteuid() })?;
    }

    let chassis = Chassis::from_config(&config)?;

    match cli.command {
        Commands::Status { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&chassis.snapshot())?);
            } else {
                list_fans(&chassis);
                list_psus(&chassis);
            }
        }
        Commands::Fan(FanCommands::List) => list_fans(&chassis),
        Commands::Fan(FanCommands::SetSpeed { index, percent }) => {
            let fan = chassis
                .fan(index)
                .ok_or_else(|| anyhow!("no chassis fan at index {}", index))?;
            if !fan.set_speed(percent) {
                bail!("failed to set {} to {}%", fan.name(), percent);
            }
            info!("{} set to {}%", fan.name(), percent);
        }
        Commands::Fan(FanCommands::SetLed { index, color }) => {
            let fan = chassis
                .fan(index)
                .ok_or_else(|| anyhow!("no chassis fan at index {}", index))?;
            if !fan.set_status_led(color) {
                bail!("failed to set {} LED to {}", fan.name(), color);
            }
            info!("{} LED set to {}", fan.name(), color);
        }
        Commands::Psu(PsuCommands::List) => list_psus(&chassis),
        Commands::Psu(PsuCommands::Bind { index }) => {
            let psu = chassis
                .psu(index)
                .ok_or_else(|| anyhow!("no PSU at index {}", index))?;
            match psu.bind()? {
                BindOutcome::AlreadyBound => println!("PSU {} already bound at {}", index, psu.hwmon_dir()),
                BindOutcome::Bound => println!("PSU {} bound, expecting {}", index, psu.hwmon_dir()),
                BindOutcome::Skipped => println!("PSU {} not bound", index),
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    run(Cli::parse())
}
