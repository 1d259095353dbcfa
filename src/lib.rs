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


//! ms-platform - Fan and PSU sensors for the ms switch platform
//!
//! This library reads fan trays and power supplies through the CPLD and
//! EEPROM files exported under sysfs, binds the PSU PMBus driver on demand,
//! and reports PSU telemetry from hwmon.

pub mod bus;
pub mod chassis;
pub mod config;
pub mod constants;
pub mod fan;
pub mod fru;
pub mod helper;
pub mod hwmon;
pub mod logger;
pub mod psu;
pub mod tables;

#[cfg(test)]
mod test_utils;

pub use chassis::{Chassis, ChassisSnapshot};
pub use config::PlatformConfig;
pub use fan::{FanDirection, FanSensor, LedColor};
pub use platform_error::{PlatformError, Result};
pub use psu::PsuSensor;

/// Identity and health common to every field-replaceable unit
pub trait Device {
    fn name(&self) -> String;
    /// Whether the unit is physically seated
    fn presence(&self) -> bool;
    fn model(&self) -> String;
    fn serial(&self) -> String;
    /// Operational status; for a PSU this is the power-good bit
    fn status(&self) -> bool;
}
