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

//! Static hardware tables
//!
//! Logical fan and PSU indices map to the CPLD register numbers, I2C buses and
//! PMBus addresses of one board. The tables are built once and never change
//! for the lifetime of the process; every sysfs path is a pure function of an
//! index and these records.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use platform_error::{PlatformError, Result};
use serde::Serialize;

/// Number of fan positions per chassis tray
pub const FANS_PER_TRAY: usize = 2;

/// Which end of a tray a fan rotor sits at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FanSlot {
    Front,
    Rear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanEntry {
    pub name: &'static str,
    /// Tray number used by the presence, PWM, direction and LED registers
    pub tray: u8,
    /// Tachometer channel, `fan{channel}_input`
    pub channel: u8,
    /// Mux channel of the tray EEPROM
    pub i2c_bus: u32,
    pub slot: FanSlot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsuEntry {
    pub name: &'static str,
    /// Suffix of the CPLD presence/status files, `psu_{slot}_present`
    pub slot: &'static str,
    pub i2c_bus: u32,
    /// PMBus address, hex digits without prefix
    pub pmbus_reg: &'static str,
    /// FRU EEPROM address, hex digits without prefix
    pub eeprom_reg: &'static str,
    /// Number of fans built into the PSU
    pub fan_count: usize,
}

fn fan(name: &'static str, tray: u8, channel: u8, i2c_bus: u32, slot: FanSlot) -> FanEntry {
    FanEntry { name, tray, channel, i2c_bus, slot }
}

lazy_static! {
    /// Chassis fans, keyed by `tray_index * FANS_PER_TRAY + position`
    pub static ref FAN_MAPPING: BTreeMap<usize, FanEntry> = {
        use FanSlot::{Front, Rear};
        let entries = [
            fan("FAN-1F", 5, 9, 6, Front),
            fan("FAN-1R", 5, 10, 6, Rear),
            fan("FAN-2F", 4, 7, 5, Front),
            fan("FAN-2R", 4, 8, 5, Rear),
            fan("FAN-3F", 3, 5, 4, Front),
            fan("FAN-3R", 3, 6, 4, Rear),
            fan("FAN-4F", 2, 3, 3, Front),
            fan("FAN-4R", 2, 4, 3, Rear),
            fan("FAN-5F", 1, 1, 2, Front),
            fan("FAN-5R", 1, 2, 2, Rear),
        ];
        entries.into_iter().enumerate().collect()
    };

    pub static ref PSU_INFO_MAPPING: BTreeMap<usize, PsuEntry> = {
        let entries = [
            PsuEntry {
                name: "PSU-1",
                slot: "r",
                i2c_bus: 76,
                pmbus_reg: "59",
                eeprom_reg: "51",
                fan_count: 1,
            },
            PsuEntry {
                name: "PSU-2",
                slot: "l",
                i2c_bus: 75,
                pmbus_reg: "58",
                eeprom_reg: "50",
                fan_count: 1,
            },
        ];
        entries.into_iter().enumerate().collect()
    };
}

pub fn num_fans() -> usize {
    FAN_MAPPING.len()
}

pub fn num_fan_trays() -> usize {
    FAN_MAPPING.len() / FANS_PER_TRAY
}

pub fn num_psus() -> usize {
    PSU_INFO_MAPPING.len()
}

pub fn fan_entry(index: usize) -> Result<&'static FanEntry> {
    FAN_MAPPING
        .get(&index)
        .ok_or(PlatformError::UnknownIndex { kind: "fan", index })
}

pub fn psu_entry(index: usize) -> Result<&'static PsuEntry> {
    PSU_INFO_MAPPING
        .get(&index)
        .ok_or(PlatformError::UnknownIndex { kind: "psu", index })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_table_is_dense() {
        assert_eq!(num_fans(), 10);
        assert_eq!(num_fan_trays(), 5);
        for (i, key) in FAN_MAPPING.keys().enumerate() {
            assert_eq!(i, *key);
        }
    }

    #[test]
    fn test_fan_slots_alternate() {
        for (index, entry) in FAN_MAPPING.iter() {
            let expected = if index % FANS_PER_TRAY == 0 { FanSlot::Front } else { FanSlot::Rear };
            assert_eq!(entry.slot, expected, "{}", entry.name);
        }
    }

    #[test]
    fn test_trays_share_registers() {
        let front = fan_entry(2).unwrap();
        let rear = fan_entry(3).unwrap();
        assert_eq!(front.tray, rear.tray);
        assert_eq!(front.i2c_bus, rear.i2c_bus);
        assert_ne!(front.channel, rear.channel);
    }

    #[test]
    fn test_unknown_index() {
        assert!(matches!(
            fan_entry(10),
            Err(PlatformError::UnknownIndex { kind: "fan", index: 10 })
        ));
        assert!(psu_entry(2).is_err());
        assert_eq!(psu_entry(1).unwrap().slot, "l");
    }
}
