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

//! I2C device binding
//!
//! A PSU that was unpowered at boot never gets its PMBus driver bound, so its
//! hwmon directory is missing. Binding is recovered through the adapter's
//! `delete_device` / `new_device` control files. This mutates kernel state
//! shared by every process on the host; the operation is idempotent but not
//! atomic.

use platform_error::{PlatformError, Result};
use tracing::{debug, info, warn};

use crate::constants::paths;
use crate::helper::SysfsHelper;

/// Control surface of an I2C adapter
#[cfg_attr(test, mockall::automock)]
pub trait BusControl: Send + Sync {
    /// Unbind the client at `address` (hex digits, no prefix)
    fn delete_device(&self, bus: u32, address: &str) -> Result<()>;
    /// Instantiate `driver` at `address` (hex digits, no prefix)
    fn new_device(&self, bus: u32, driver: &str, address: &str) -> Result<()>;
}

/// [`BusControl`] backed by `/sys/bus/i2c/devices/i2c-N/{new,delete}_device`
#[derive(Debug, Clone, Default)]
pub struct SysfsBus {
    helper: SysfsHelper,
}

impl SysfsBus {
    pub fn new(helper: SysfsHelper) -> Self {
        Self { helper }
    }

    fn write_control(&self, bus: u32, file: &str, address: &str, value: &str) -> Result<()> {
        let path = format!("{}/{}", paths::i2c_adapter_dir(bus), file);
        self.helper
            .try_write_file(&path, value)
            .map_err(|e| PlatformError::DeviceBind {
                bus,
                address: format!("0x{}", address),
                reason: e.to_string(),
            })
    }
}

impl BusControl for SysfsBus {
    fn delete_device(&self, bus: u32, address: &str) -> Result<()> {
        self.write_control(bus, paths::DELETE_DEVICE_FILE, address, &format!("0x{}", address))
    }

    fn new_device(&self, bus: u32, driver: &str, address: &str) -> Result<()> {
        let value = format!("{} 0x{}", driver, address);
        self.write_control(bus, paths::NEW_DEVICE_FILE, address, &value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// hwmon directory already present, nothing written
    AlreadyBound,
    /// delete/create sequence issued
    Bound,
    /// hwmon directory missing but binding is disabled by configuration
    Skipped,
}

/// Where a PMBus hwmon driver lives and how to instantiate it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HwmonBinding {
    pub bus: u32,
    pub address: &'static str,
    pub driver: &'static str,
    /// Kernel path of the `hwmon` directory the driver creates
    pub hwmon_dir: String,
}

impl HwmonBinding {
    pub fn is_bound(&self, helper: &SysfsHelper) -> bool {
        helper.exists(&self.hwmon_dir)
    }

    /// Bind the driver if its hwmon directory is missing
    pub fn ensure_bound(
        &self,
        helper: &SysfsHelper,
        bus: &dyn BusControl,
        allow_bind: bool,
    ) -> Result<BindOutcome> {
        if self.is_bound(helper) {
            return Ok(BindOutcome::AlreadyBound);
        }
        if !allow_bind {
            debug!(hwmon = %self.hwmon_dir, "hwmon missing, auto-bind disabled");
            return Ok(BindOutcome::Skipped);
        }

        info!(
            bus = self.bus,
            address = self.address,
            driver = self.driver,
            "hwmon missing, rebinding PMBus driver"
        );
        // Deleting an absent client fails; ignore it
        if let Err(e) = bus.delete_device(self.bus, self.address) {
            debug!("{}", e);
        }
        bus.new_device(self.bus, self.driver, self.address)
            .map_err(|e| {
                warn!("{}", e);
                e
            })?;
        Ok(BindOutcome::Bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use std::fs;
    use tempfile::TempDir;

    fn binding() -> HwmonBinding {
        HwmonBinding {
            bus: 76,
            address: "59",
            driver: "dps1100",
            hwmon_dir: paths::psu_hwmon_dir(76, "59"),
        }
    }

    #[test]
    fn test_already_bound_is_noop() {
        let dir = TempDir::new().unwrap();
        let helper = SysfsHelper::new(dir.path());
        fs::create_dir_all(helper.resolve(binding().hwmon_dir)).unwrap();

        let mut bus = MockBusControl::new();
        bus.expect_delete_device().never();
        bus.expect_new_device().never();

        let outcome = binding().ensure_bound(&helper, &bus, true).unwrap();
        assert_eq!(outcome, BindOutcome::AlreadyBound);
    }

    #[test]
    fn test_missing_hwmon_deletes_then_creates() {
        let dir = TempDir::new().unwrap();
        let helper = SysfsHelper::new(dir.path());

        let mut seq = Sequence::new();
        let mut bus = MockBusControl::new();
        bus.expect_delete_device()
            .with(eq(76), eq("59"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(PlatformError::not_supported("no such client")));
        bus.expect_new_device()
            .with(eq(76), eq("dps1100"), eq("59"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));

        let outcome = binding().ensure_bound(&helper, &bus, true).unwrap();
        assert_eq!(outcome, BindOutcome::Bound);
    }

    #[test]
    fn test_create_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let helper = SysfsHelper::new(dir.path());

        let mut bus = MockBusControl::new();
        bus.expect_delete_device().returning(|_, _| Ok(()));
        bus.expect_new_device()
            .returning(|_, _, _| Err(PlatformError::not_supported("busy")));

        assert!(binding().ensure_bound(&helper, &bus, true).is_err());
    }

    #[test]
    fn test_binding_disabled() {
        let dir = TempDir::new().unwrap();
        let helper = SysfsHelper::new(dir.path());
        let mut bus = MockBusControl::new();
        bus.expect_new_device().never();

        let outcome = binding().ensure_bound(&helper, &bus, false).unwrap();
        assert_eq!(outcome, BindOutcome::Skipped);
    }

    #[test]
    fn test_sysfs_bus_writes_control_files() {
        let dir = TempDir::new().unwrap();
        let helper = SysfsHelper::new(dir.path());
        let adapter = helper.resolve(paths::i2c_adapter_dir(75));
        fs::create_dir_all(&adapter).unwrap();

        let bus = SysfsBus::new(helper);
        bus.delete_device(75, "58").unwrap();
        bus.new_device(75, "dps1100", "58").unwrap();

        assert_eq!(fs::read_to_string(adapter.join("delete_device")).unwrap(), "0x58");
        assert_eq!(fs::read_to_string(adapter.join("new_device")).unwrap(), "dps1100 0x58");
    }

    #[test]
    fn test_sysfs_bus_missing_adapter() {
        let dir = TempDir::new().unwrap();
        let bus = SysfsBus::new(SysfsHelper::new(dir.path()));
        let err = bus.new_device(99, "dps1100", "58").unwrap_err();
        assert!(matches!(err, PlatformError::DeviceBind { bus: 99, .. }));
    }
}
