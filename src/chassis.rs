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

//! Chassis inventory
//!
//! Owns every fan and PSU accessor of the board, in table order, and renders
//! point-in-time snapshots for the CLI.

use std::sync::Arc;

use platform_error::Result;
use serde::Serialize;
use tracing::info;

use crate::bus::{BusControl, SysfsBus};
use crate::config::PlatformConfig;
use crate::fan::{FanDirection, FanSensor, LedColor};
use crate::helper::SysfsHelper;
use crate::psu::PsuSensor;
use crate::tables::{self, FANS_PER_TRAY};
use crate::Device;

#[derive(Debug, Clone, Serialize)]
pub struct FanInfo {
    pub name: String,
    pub presence: bool,
    pub status: bool,
    pub direction: FanDirection,
    pub speed: u8,
    pub target_speed: Option<u8>,
    pub speed_tolerance: u8,
    pub led: LedColor,
    pub model: String,
    pub serial: String,
}

impl From<&FanSensor> for FanInfo {
    fn from(fan: &FanSensor) -> Self {
        let speed = fan.speed();
        let presence = fan.presence();
        Self {
            name: fan.name(),
            presence,
            // Device::status from the readings above, so the fields agree
            status: presence && speed > 0,
            direction: fan.direction(),
            speed,
            target_speed: fan.target_speed(),
            speed_tolerance: fan.speed_tolerance(),
            led: fan.status_led(),
            model: fan.model(),
            serial: fan.serial(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PsuInfo {
    pub name: String,
    pub presence: bool,
    pub status: bool,
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    pub led: LedColor,
    pub model: String,
    pub serial: String,
    pub fans: Vec<FanInfo>,
}

impl From<&PsuSensor> for PsuInfo {
    fn from(psu: &PsuSensor) -> Self {
        Self {
            name: psu.name(),
            presence: psu.presence(),
            status: psu.status(),
            voltage: psu.voltage(),
            current: psu.current(),
            power: psu.power(),
            led: psu.status_led(),
            model: psu.model(),
            serial: psu.serial(),
            fans: psu.fans().iter().map(FanInfo::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChassisSnapshot {
    pub fans: Vec<FanInfo>,
    pub psus: Vec<PsuInfo>,
}

#[derive(Debug)]
pub struct Chassis {
    fans: Vec<FanSensor>,
    psus: Vec<PsuSensor>,
}

impl Chassis {
    pub fn new(helper: SysfsHelper, bus: Arc<dyn BusControl>, auto_bind: bool) -> Result<Self> {
        let mut fans = Vec::with_capacity(tables::num_fans());
        for tray in 0..tables::num_fan_trays() {
            for position in 0..FANS_PER_TRAY {
                fans.push(FanSensor::chassis(helper.clone(), tray, position)?);
            }
        }

        let psus = (0..tables::num_psus())
            .map(|index| {
                PsuSensor::new(helper.clone(), Arc::clone(&bus), index)
                    .map(|psu| psu.with_auto_bind(auto_bind))
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            root = %helper.root().display(),
            fans = fans.len(),
            psus = psus.len(),
            "chassis initialised"
        );
        Ok(Self { fans, psus })
    }

    /// Chassis backed by the real I2C bus under the configured sysfs root
    pub fn from_config(config: &PlatformConfig) -> Result<Self> {
        let helper = SysfsHelper::new(&config.sysfs_root);
        let bus: Arc<dyn BusControl> = Arc::new(SysfsBus::new(helper.clone()));
        Self::new(helper, bus, config.auto_bind_hwmon)
    }

    pub fn fans(&self) -> &[FanSensor] {
        &self.fans
    }

    pub fn psus(&self) -> &[PsuSensor] {
        &self.psus
    }

    pub fn fan(&self, index: usize) -> Option<&FanSensor> {
        self.fans.get(index)
    }

    pub fn psu(&self, index: usize) -> Option<&PsuSensor> {
        self.psus.get(index)
    }

    /// Chassis fans followed by PSU fans
    pub fn all_fans(&self) -> impl Iterator<Item = &FanSensor> {
        self.fans
            .iter()
            .chain(self.psus.iter().flat_map(|psu| psu.fans().iter()))
    }

    pub fn snapshot(&self) -> ChassisSnapshot {
        ChassisSnapshot {
            fans: self.fans.iter().map(FanInfo::from).collect(),
            psus: self.psus.iter().map(PsuInfo::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MockBusControl;
    use crate::test_utils::FakeSysfs;

    fn chassis(sysfs: &FakeSysfs) -> Chassis {
        Chassis::new(sysfs.helper(), Arc::new(MockBusControl::new()), false).unwrap()
    }

    #[test]
    fn test_inventory_counts() {
        let sysfs = FakeSysfs::new();
        let c = chassis(&sysfs);
        assert_eq!(c.fans().len(), 10);
        assert_eq!(c.psus().len(), 2);
        assert_eq!(c.all_fans().count(), 12);
        assert_eq!(c.fan(9).unwrap().name(), "FAN-5R");
        assert!(c.fan(10).is_none());
        assert_eq!(c.psu(1).unwrap().name(), "PSU-2");
    }

    #[test]
    fn test_all_fans_order() {
        let sysfs = FakeSysfs::new();
        let names: Vec<String> = chassis(&sysfs).all_fans().map(|f| f.name()).collect();
        assert_eq!(names.first().map(String::as_str), Some("FAN-1F"));
        assert_eq!(&names[10..], ["PSU-1 FAN-1", "PSU-2 FAN-1"]);
    }

    #[test]
    fn test_snapshot_of_empty_tree() {
        let sysfs = FakeSysfs::new();
        let snap = chassis(&sysfs).snapshot();
        assert!(snap.fans.iter().all(|f| !f.presence && f.speed == 0 && f.model == "N/A"));
        assert!(snap.psus.iter().all(|p| !p.presence && p.voltage == 0.0));
        assert!(snap.psus.iter().all(|p| p.fans[0].direction == FanDirection::Unknown));
    }

    #[test]
    fn test_fan_info_status_matches_device() {
        let sysfs = FakeSysfs::new();
        sysfs.fan_cpld("fan4_present", "0x0");
        sysfs.fan_cpld("fan7_input", "9000");
        let c = chassis(&sysfs);

        for fan in c.fans() {
            assert_eq!(FanInfo::from(fan).status, fan.status(), "{}", fan.name());
        }
        assert!(FanInfo::from(c.fan(2).unwrap()).status);
        assert!(!FanInfo::from(c.fan(3).unwrap()).status);
    }

    #[test]
    fn test_snapshot_serializes() {
        let sysfs = FakeSysfs::new();
        sysfs.fan_cpld("fan5_present", "0x0");
        sysfs.fan_cpld("fan5_dir", "0x1");
        sysfs.fan_cpld("fan9_input", "12450");
        sysfs.fan_cpld("fan5_led", "0x1");

        let snap = chassis(&sysfs).snapshot();
        let json = serde_json::to_value(&snap).unwrap();
        let fan = &json["fans"][0];
        assert_eq!(fan["name"], "FAN-1F");
        assert_eq!(fan["presence"], true);
        assert_eq!(fan["status"], true);
        assert_eq!(fan["direction"], "intake");
        assert_eq!(fan["speed"], 50);
        assert_eq!(fan["target_speed"], serde_json::Value::Null);
        assert_eq!(fan["led"], "green");
    }
}
