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

//! PSU accessors
//!
//! Presence and power-good come from the system CPLD, electrical telemetry
//! from the PSU's PMBus hwmon node, identity from its FRU EEPROM. The
//! airflow of the built-in fan is read from the FRU product name once, at
//! construction.

use std::sync::Arc;

use platform_error::Result;
use tracing::{debug, warn};

use crate::bus::{BindOutcome, BusControl, HwmonBinding};
use crate::constants::{paths, psu, units, NOT_AVAILABLE};
use crate::fan::{FanDirection, FanSensor, LedColor};
use crate::fru;
use crate::helper::{read_parsed, SysfsHelper};
use crate::hwmon;
use crate::tables::{self, PsuEntry};
use crate::Device;

/// An electrical reading published by the PMBus driver
#[derive(Debug, Clone, Copy, PartialEq)]
struct Telemetry {
    /// hwmon attribute family, `in`, `curr` or `power`
    kind: &'static str,
    /// content of the matching `*_label` file
    label: &'static str,
    divisor: f64,
}

const VOLTAGE: Telemetry = Telemetry {
    kind: "in",
    label: psu::VOLTAGE_LABEL,
    divisor: units::VOLTAGE_DIVISOR,
};

const CURRENT: Telemetry = Telemetry {
    kind: "curr",
    label: psu::CURRENT_LABEL,
    divisor: units::CURRENT_DIVISOR,
};

const POWER: Telemetry = Telemetry {
    kind: "power",
    label: psu::POWER_LABEL,
    divisor: units::POWER_DIVISOR,
};

pub struct PsuSensor {
    index: usize,
    entry: &'static PsuEntry,
    helper: SysfsHelper,
    bus: Arc<dyn BusControl>,
    auto_bind: bool,
    binding: HwmonBinding,
    eeprom_dir: String,
    fans: Vec<FanSensor>,
}

impl std::fmt::Debug for PsuSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PsuSensor")
            .field("index", &self.index)
            .field("name", &self.entry.name)
            .field("hwmon", &self.binding.hwmon_dir)
            .field("fans", &self.fans.len())
            .finish()
    }
}

impl PsuSensor {
    pub fn new(helper: SysfsHelper, bus: Arc<dyn BusControl>, index: usize) -> Result<Self> {
        let entry = tables::psu_entry(index)?;
        let binding = HwmonBinding {
            bus: entry.i2c_bus,
            address: entry.pmbus_reg,
            driver: psu::PMBUS_DRIVER,
            hwmon_dir: paths::psu_hwmon_dir(entry.i2c_bus, entry.pmbus_reg),
        };
        let eeprom_dir = paths::psu_eeprom_dir(entry.i2c_bus, entry.eeprom_reg);

        let direction = Self::read_fan_direction(&helper, &eeprom_dir);
        debug!(psu = entry.name, %direction, "PSU fan airflow");
        let fans = (0..entry.fan_count)
            .map(|fan_index| {
                FanSensor::psu_embedded(
                    helper.clone(),
                    index,
                    fan_index,
                    direction,
                    binding.hwmon_dir.clone(),
                )
            })
            .collect();

        Ok(Self {
            index,
            entry,
            helper,
            bus,
            auto_bind: true,
            binding,
            eeprom_dir,
            fans,
        })
    }

    /// Enable or disable rebinding a missing PMBus driver
    pub fn with_auto_bind(mut self, auto_bind: bool) -> Self {
        self.auto_bind = auto_bind;
        self
    }

    fn read_fan_direction(helper: &SysfsHelper, eeprom_dir: &str) -> FanDirection {
        let blob = helper.read_eeprom_sysfs(eeprom_dir, paths::EEPROM_FILE);
        fru::fru_decode_product_name(blob.as_deref())
            .map(|name| FanDirection::from_product_name(&name))
            .unwrap_or(FanDirection::Unknown)
    }

    pub fn fans(&self) -> &[FanSensor] {
        &self.fans
    }

    pub fn hwmon_dir(&self) -> &str {
        &self.binding.hwmon_dir
    }

    /// Bind the PMBus driver when the PSU was powered after boot
    pub fn ensure_hwmon_bound(&self) -> Result<BindOutcome> {
        self.binding
            .ensure_bound(&self.helper, self.bus.as_ref(), self.auto_bind)
    }

    /// Bind the PMBus driver regardless of the auto-bind setting
    pub fn bind(&self) -> Result<BindOutcome> {
        self.binding.ensure_bound(&self.helper, self.bus.as_ref(), true)
    }

    fn read_telemetry(&self, telemetry: Telemetry) -> f64 {
        if !self.status() {
            return 0.0;
        }
        if let Err(e) = self.ensure_hwmon_bound() {
            warn!(psu = self.entry.name, "{}", e);
        }

        let root = self.helper.resolve(&self.binding.hwmon_dir);
        let Some(input) = hwmon::find_sibling_by_label(&root, telemetry.kind, telemetry.label)
        else {
            debug!(psu = self.entry.name, label = telemetry.label, "no hwmon attribute");
            return 0.0;
        };
        match read_parsed::<f64, _>(&input) {
            Ok(raw) => raw / telemetry.divisor,
            Err(e) => {
                debug!("{}", e);
                0.0
            }
        }
    }

    /// Output voltage in volts
    pub fn voltage(&self) -> f64 {
        self.read_telemetry(VOLTAGE)
    }

    /// Output current in amperes
    pub fn current(&self) -> f64 {
        self.read_telemetry(CURRENT)
    }

    /// Output power in watts
    pub fn power(&self) -> f64 {
        self.read_telemetry(POWER)
    }

    pub fn powergood_status(&self) -> bool {
        self.status()
    }

    /// The PSU LED is driven by the PSU itself
    pub fn set_status_led(&self, _color: LedColor) -> bool {
        false
    }

    pub fn status_led(&self) -> LedColor {
        LedColor::Off
    }

    fn read_cpld(&self, file: &str) -> Option<String> {
        self.helper
            .read_one_line_file(format!("{}/{}", paths::PSU_CPLD_DIR, file))
    }

    fn read_fru(&self) -> Option<Vec<u8>> {
        self.helper
            .read_eeprom_sysfs(&self.eeprom_dir, paths::EEPROM_FILE)
    }
}

impl Device for PsuSensor {
    fn name(&self) -> String {
        self.entry.name.to_string()
    }

    fn presence(&self) -> bool {
        self.read_cpld(&psu::present_file(self.entry.slot)).as_deref() == Some(psu::PRESENT_BIT)
    }

    fn model(&self) -> String {
        fru::fru_decode_product_model(self.read_fru().as_deref())
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    fn serial(&self) -> String {
        fru::fru_decode_product_serial(self.read_fru().as_deref())
            .filter(|serial| !serial.trim().is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    fn status(&self) -> bool {
        self.read_cpld(&psu::status_file(self.entry.slot)).as_deref() == Some(psu::POWER_OK_BIT)
    }
}
