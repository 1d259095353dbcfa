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

//! Hardware constants for the MS-series fan and PSU accessors
//!
//! Every path template, register encoding and calibration value lives here.
//! Path templates are absolute; `SysfsHelper` re-roots them at runtime.

/// Sysfs path templates
pub mod paths {
    /// Chassis fan CPLD driver directory
    pub const FAN_CPLD_DIR: &str = "/sys/bus/i2c/drivers/fancpld/138-000d";

    /// PSU presence / power-good CPLD driver directory
    pub const PSU_CPLD_DIR: &str = "/sys/bus/i2c/drivers/syscpld/70-000d";

    /// Fan tray EEPROM behind the i2c-138 mux, `{bus}` is the tray's mux channel
    pub fn fan_eeprom_dir(bus: u32) -> String {
        format!("/sys/bus/i2c/devices/i2c-138/i2c-{0}/{0}-0050", bus)
    }

    /// PMBus hwmon directory for a PSU
    pub fn psu_hwmon_dir(bus: u32, pmbus_reg: &str) -> String {
        format!("/sys/bus/i2c/devices/i2c-{0}/{0}-00{1}/hwmon", bus, pmbus_reg)
    }

    /// PSU FRU EEPROM device directory
    pub fn psu_eeprom_dir(bus: u32, eeprom_reg: &str) -> String {
        format!("/sys/bus/i2c/devices/i2c-{0}/{0}-00{1}", bus, eeprom_reg)
    }

    /// Directory holding `new_device` / `delete_device` for an I2C adapter
    pub fn i2c_adapter_dir(bus: u32) -> String {
        format!("/sys/bus/i2c/devices/i2c-{}", bus)
    }

    pub const EEPROM_FILE: &str = "eeprom";
    pub const NEW_DEVICE_FILE: &str = "new_device";
    pub const DELETE_DEVICE_FILE: &str = "delete_device";
}

/// Chassis and PSU fan values
pub mod fan {
    /// Max tach reading for the calibration column labelled "front"
    pub const FRONT_MAX_RPM: f64 = 29700.0;
    /// Max tach reading for the calibration column labelled "rear"
    pub const REAR_MAX_RPM: f64 = 24900.0;
    /// Max tach reading of the fan inside a PSU
    pub const PSU_FAN_MAX_RPM: f64 = 30000.0;

    pub const MAX_PWM: f64 = 255.0;

    /// Percent of variance from target speed considered tolerable
    pub const SPEED_TOLERANCE: u8 = 10;

    pub fn present_file(tray: u8) -> String {
        format!("fan{}_present", tray)
    }

    pub fn pwm_file(tray: u8) -> String {
        format!("fan{}_pwm", tray)
    }

    pub fn input_file(channel: u8) -> String {
        format!("fan{}_input", channel)
    }

    pub fn direction_file(tray: u8) -> String {
        format!("fan{}_dir", tray)
    }

    pub fn led_file(tray: u8) -> String {
        format!("fan{}_led", tray)
    }

    /// Register values on the fan CPLD
    pub mod register {
        /// `fan{tray}_present` value of an installed tray
        pub const PRESENT: &str = "0x0";
        /// `fan{tray}_dir` value of an exhaust (front-to-back) tray
        pub const DIRECTION_EXHAUST: &str = "0x0";
    }
}

/// PSU values
pub mod psu {
    /// `psu_{slot}_present` value of an installed PSU
    pub const PRESENT_BIT: &str = "0x0";
    /// `psu_{slot}_status` value when output power is good
    pub const POWER_OK_BIT: &str = "0x1";

    /// Kernel driver bound to the PSU's PMBus address; also the text found
    /// in the hwmon `name` file
    pub const PMBUS_DRIVER: &str = "dps1100";

    /// FRU product-name suffixes that encode airflow
    pub const INTAKE_MARKER: &str = "FB";
    pub const EXHAUST_MARKER: &str = "AB";

    pub const VOLTAGE_LABEL: &str = "vout1";
    pub const CURRENT_LABEL: &str = "iout1";
    pub const POWER_LABEL: &str = "pout1";

    pub fn present_file(slot: &str) -> String {
        format!("psu_{}_present", slot)
    }

    pub fn status_file(slot: &str) -> String {
        format!("psu_{}_status", slot)
    }
}

/// LED command bytes shared by the fan CPLD
pub mod led {
    pub const GREEN_CMD: &str = "0x1";
    pub const RED_CMD: &str = "0x2";
    pub const OFF_CMD: &str = "0x3";
}

/// hwmon unit divisors
pub mod units {
    /// power*_input is in microwatts
    pub const POWER_DIVISOR: f64 = 1_000_000.0;
    /// in*_input is in millivolts
    pub const VOLTAGE_DIVISOR: f64 = 1000.0;
    /// curr*_input is in milliamps
    pub const CURRENT_DIVISOR: f64 = 1000.0;
}

/// Sentinel reported for unreadable or unsupported string fields
pub const NOT_AVAILABLE: &str = "N/A";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_psu_paths() {
        assert_eq!(
            paths::psu_hwmon_dir(76, "59"),
            "/sys/bus/i2c/devices/i2c-76/76-0059/hwmon"
        );
        assert_eq!(
            paths::psu_eeprom_dir(75, "50"),
            "/sys/bus/i2c/devices/i2c-75/75-0050"
        );
    }

    #[test]
    fn test_fan_paths() {
        assert_eq!(
            paths::fan_eeprom_dir(6),
            "/sys/bus/i2c/devices/i2c-138/i2c-6/6-0050"
        );
        assert_eq!(fan::present_file(5), "fan5_present");
        assert_eq!(fan::input_file(10), "fan10_input");
        assert_eq!(psu::status_file("l"), "psu_l_status");
    }
}
