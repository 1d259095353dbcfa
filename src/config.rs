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

//! Runtime configuration
//!
//! A small JSON file selecting the sysfs root, the log level and whether
//! PSU telemetry reads may rebind the PMBus driver. The hardware tables are
//! compiled in and cannot be overridden here.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use platform_error::{PlatformError, Result};
use serde::Deserialize;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "MS_PLATFORM_CONFIG";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn default_sysfs_root() -> PathBuf {
    PathBuf::from("/")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_auto_bind() -> bool {
    true
}

/// Runtime knobs. Hardware tables are compiled in and not configurable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    /// Directory standing in for `/`; only changed for chroots and tests
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Rebind a missing PSU PMBus driver before reading telemetry
    #[serde(default = "default_auto_bind")]
    pub auto_bind_hwmon: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            sysfs_root: default_sysfs_root(),
            log_level: default_log_level(),
            auto_bind_hwmon: default_auto_bind(),
        }
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(p) = env::var(CONFIG_ENV) {
        return PathBuf::from(p);
    }
    PathBuf::from("/etc/ms-platform/config.json")
}

pub fn validate_config(cfg: &PlatformConfig) -> Result<()> {
    if !cfg.sysfs_root.is_absolute() {
        return Err(PlatformError::invalid_config(
            "sysfs_root",
            format!("{} is not an absolute path", cfg.sysfs_root.display()),
        ));
    }
    if !LOG_LEVELS.contains(&cfg.log_level.to_ascii_lowercase().as_str()) {
        return Err(PlatformError::invalid_config(
            "log_level",
            format!("{:?} is not one of {}", cfg.log_level, LOG_LEVELS.join(", ")),
        ));
    }
    Ok(())
}

/// Load and validate the config at `path`; a missing file yields defaults
pub fn load_config_from(path: &Path) -> Result<PlatformConfig> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(PlatformConfig::default()),
        Err(source) => {
            return Err(PlatformError::FileRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let cfg: PlatformConfig = serde_json::from_str(&data)?;
    validate_config(&cfg)?;
    Ok(cfg)
}

pub fn load_config() -> Result<PlatformConfig> {
    load_config_from(&config_path())
}
