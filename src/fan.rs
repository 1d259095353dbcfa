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

//! Chassis and PSU fan accessors
//!
//! One [`FanSensor`] type covers both fan variants. Chassis fans sit in
//! hot-swap trays driven by the fan CPLD; PSU fans are only observable
//! through the PSU's PMBus hwmon node and accept no commands.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use platform_error::{PlatformError, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::constants::{fan, led, paths, psu, NOT_AVAILABLE};
use crate::helper::{read_parsed, SysfsHelper};
use crate::hwmon;
use crate::tables::{self, FanEntry, FanSlot, FANS_PER_TRAY};
use crate::Device;

/// Byte ranges of the tray EEPROM holding the model and serial strings.
/// The EEPROM format is not validated before slicing.
const FAN_EEPROM_MODEL: Range<usize> = 45..59;
const FAN_EEPROM_SERIAL: Range<usize> = 26..44;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FanDirection {
    Intake,
    Exhaust,
    Unknown,
}

impl fmt::Display for FanDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FanDirection::Intake => write!(f, "intake"),
            FanDirection::Exhaust => write!(f, "exhaust"),
            FanDirection::Unknown => write!(f, "{}", NOT_AVAILABLE),
        }
    }
}

impl FanDirection {
    /// Classify airflow from a PSU FRU product name (`DPS-1100FB` is intake,
    /// `DPS-1100AB` exhaust)
    pub fn from_product_name(name: &str) -> Self {
        if name.contains(psu::INTAKE_MARKER) {
            FanDirection::Intake
        } else if name.contains(psu::EXHAUST_MARKER) {
            FanDirection::Exhaust
        } else {
            FanDirection::Unknown
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LedColor {
    Green,
    Amber,
    Red,
    Off,
}

impl fmt::Display for LedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LedColor::Green => "green",
            LedColor::Amber => "amber",
            LedColor::Red => "red",
            LedColor::Off => "off",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for LedColor {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" => Ok(LedColor::Green),
            "amber" => Ok(LedColor::Amber),
            "red" => Ok(LedColor::Red),
            "off" => Ok(LedColor::Off),
            other => Err(PlatformError::not_supported(format!("LED color {:?}", other))),
        }
    }
}

impl LedColor {
    /// Fan CPLD command byte; amber has none
    pub fn command(self) -> Option<&'static str> {
        match self {
            LedColor::Green => Some(led::GREEN_CMD),
            LedColor::Red => Some(led::RED_CMD),
            LedColor::Off => Some(led::OFF_CMD),
            LedColor::Amber => None,
        }
    }

    /// Decode an LED register value; anything unrecognised reads as off
    pub fn from_register(raw: &str) -> Self {
        match raw {
            led::GREEN_CMD => LedColor::Green,
            led::RED_CMD => LedColor::Red,
            _ => LedColor::Off,
        }
    }
}

/// Full-scale RPM for a chassis fan.
///
/// Reproduces the hardware calibration table: only intake trays distinguish
/// the two rotor positions, exhaust trays use the front constant for both.
pub fn max_rpm(direction: FanDirection, slot: FanSlot) -> f64 {
    match (direction, slot) {
        (FanDirection::Intake, FanSlot::Front) => fan::REAR_MAX_RPM,
        (FanDirection::Intake, FanSlot::Rear) => fan::FRONT_MAX_RPM,
        (_, FanSlot::Front) => fan::FRONT_MAX_RPM,
        (_, FanSlot::Rear) => fan::FRONT_MAX_RPM,
    }
}

/// Percent of full speed, truncated and clamped to 0..=100
pub fn rpm_to_percent(rpm: f64, max_rpm: f64) -> u8 {
    if !rpm.is_finite() || rpm <= 0.0 || max_rpm <= 0.0 {
        return 0;
    }
    (rpm / max_rpm * 100.0).min(100.0) as u8
}

/// Percent (0..=100) to the CPLD PWM register string, e.g. 50 -> `0x80`
pub fn percent_to_pwm(percent: u8) -> Option<String> {
    if percent > 100 {
        return None;
    }
    let pwm = (f64::from(percent) / 100.0 * fan::MAX_PWM).round() as u8;
    Some(format!("{:#x}", pwm))
}

fn eeprom_field(raw: &[u8], range: Range<usize>) -> Option<String> {
    let end = range.end.min(raw.len());
    let start = range.start.min(end);
    let text = String::from_utf8_lossy(&raw[start..end]);
    let text = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FanKind {
    /// Fan in a chassis tray, keyed into the static fan table
    Chassis { entry: &'static FanEntry },
    /// Fan built into a PSU; its direction was resolved when the PSU was
    /// constructed
    PsuEmbedded {
        psu_index: usize,
        fan_index: usize,
        direction: FanDirection,
        hwmon_dir: String,
    },
}

#[derive(Debug, Clone)]
pub struct FanSensor {
    kind: FanKind,
    helper: SysfsHelper,
}

impl FanSensor {
    /// Fan at `position` (0 front, 1 rear) of chassis tray `tray_index`
    pub fn chassis(helper: SysfsHelper, tray_index: usize, position: usize) -> Result<Self> {
        if position >= FANS_PER_TRAY {
            return Err(PlatformError::UnknownIndex { kind: "fan position", index: position });
        }
        let entry = tables::fan_entry(tray_index * FANS_PER_TRAY + position)?;
        Ok(Self {
            kind: FanKind::Chassis { entry },
            helper,
        })
    }

    pub fn psu_embedded(
        helper: SysfsHelper,
        psu_index: usize,
        fan_index: usize,
        direction: FanDirection,
        hwmon_dir: String,
    ) -> Self {
        Self {
            kind: FanKind::PsuEmbedded {
                psu_index,
                fan_index,
                direction,
                hwmon_dir,
            },
            helper,
        }
    }

    fn cpld_path(file: &str) -> String {
        format!("{}/{}", paths::FAN_CPLD_DIR, file)
    }

    fn read_cpld(&self, file: &str) -> Option<String> {
        self.helper.read_one_line_file(Self::cpld_path(file))
    }

    fn write_cpld(&self, file: &str, value: &str) -> bool {
        let ok = self.helper.write_file(Self::cpld_path(file), value);
        if ok {
            info!(fan = %self.name(), file, value, "fan register written");
        } else {
            warn!(fan = %self.name(), file, value, "fan register write failed");
        }
        ok
    }

    pub fn direction(&self) -> FanDirection {
        match &self.kind {
            FanKind::PsuEmbedded { direction, .. } => *direction,
            // Only an exact exhaust value means exhaust; an unreadable
            // register reads as intake
            FanKind::Chassis { entry, .. } => {
                let raw = self.read_cpld(&fan::direction_file(entry.tray));
                if raw.as_deref() == Some(fan::register::DIRECTION_EXHAUST) {
                    FanDirection::Exhaust
                } else {
                    FanDirection::Intake
                }
            }
        }
    }

    /// Current speed as a percentage of full scale
    pub fn speed(&self) -> u8 {
        match &self.kind {
            FanKind::Chassis { entry, .. } => {
                let rpm = match self.read_cpld(&fan::input_file(entry.channel)) {
                    Some(raw) => match raw.parse::<f64>() {
                        Ok(rpm) => rpm,
                        Err(_) => {
                            warn!(fan = entry.name, raw = %raw, "unparsable tach reading");
                            return 0;
                        }
                    },
                    None => return 0,
                };
                rpm_to_percent(rpm, max_rpm(self.direction(), entry.slot))
            }
            FanKind::PsuEmbedded { fan_index, hwmon_dir, .. } => {
                match self.read_psu_fan_rpm(hwmon_dir, *fan_index) {
                    Ok(rpm) => rpm_to_percent(rpm, fan::PSU_FAN_MAX_RPM),
                    Err(e) => {
                        debug!("{}", e);
                        0
                    }
                }
            }
        }
    }

    fn read_psu_fan_rpm(&self, hwmon_dir: &str, fan_index: usize) -> Result<f64> {
        let root = self.helper.resolve(hwmon_dir);
        let dir = hwmon::find_dir_containing(&root, "name", psu::PMBUS_DRIVER)
            .ok_or_else(|| PlatformError::FileNotFound(root.clone()))?;
        let input = dir.join(fan::input_file((fan_index + 1) as u8));
        read_parsed::<f64, _>(&input)
    }

    /// Target speed readback is not available on this hardware
    pub fn target_speed(&self) -> Option<u8> {
        None
    }

    pub fn speed_tolerance(&self) -> u8 {
        fan::SPEED_TOLERANCE
    }

    /// Drive the tray PWM; PSU fans cannot be commanded
    pub fn set_speed(&self, percent: u8) -> bool {
        let entry = match &self.kind {
            FanKind::Chassis { entry, .. } => entry,
            FanKind::PsuEmbedded { .. } => return false,
        };
        match percent_to_pwm(percent) {
            Some(value) => self.write_cpld(&fan::pwm_file(entry.tray), &value),
            None => {
                warn!(fan = entry.name, percent, "speed out of range");
                false
            }
        }
    }

    pub fn set_status_led(&self, color: LedColor) -> bool {
        let entry = match &self.kind {
            FanKind::Chassis { entry, .. } => entry,
            FanKind::PsuEmbedded { .. } => return false,
        };
        match color.command() {
            Some(cmd) => self.write_cpld(&fan::led_file(entry.tray), cmd),
            None => {
                debug!(fan = entry.name, %color, "LED color not supported");
                false
            }
        }
    }

    pub fn status_led(&self) -> LedColor {
        match &self.kind {
            FanKind::PsuEmbedded { .. } => LedColor::Off,
            FanKind::Chassis { entry, .. } => self
                .read_cpld(&fan::led_file(entry.tray))
                .map(|raw| LedColor::from_register(&raw))
                .unwrap_or(LedColor::Off),
        }
    }

    fn eeprom_field(&self, range: Range<usize>) -> String {
        match &self.kind {
            FanKind::PsuEmbedded { .. } => NOT_AVAILABLE.to_string(),
            FanKind::Chassis { entry, .. } => self
                .helper
                .read_eeprom_sysfs(paths::fan_eeprom_dir(entry.i2c_bus), paths::EEPROM_FILE)
                .and_then(|raw| eeprom_field(&raw, range))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }
}

impl Device for FanSensor {
    fn name(&self) -> String {
        match &self.kind {
            FanKind::Chassis { entry, .. } => entry.name.to_string(),
            FanKind::PsuEmbedded { psu_index, fan_index, .. } => {
                format!("PSU-{} FAN-{}", psu_index + 1, fan_index + 1)
            }
        }
    }

    fn presence(&self) -> bool {
        match &self.kind {
            FanKind::PsuEmbedded { .. } => true,
            FanKind::Chassis { entry, .. } => {
                self.read_cpld(&fan::present_file(entry.tray)).as_deref()
                    == Some(fan::register::PRESENT)
            }
        }
    }

    fn model(&self) -> String {
        self.eeprom_field(FAN_EEPROM_MODEL)
    }

    fn serial(&self) -> String {
        self.eeprom_field(FAN_EEPROM_SERIAL)
    }

    fn status(&self) -> bool {
        self.presence() && self.speed() > 0
    }
}
