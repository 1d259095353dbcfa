/*
 * Test utilities and fixtures for ms-platform
 *
 * Builds throwaway sysfs trees so the accessors can be exercised against
 * the same paths the kernel exposes.
 */

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::constants::paths;
use crate::fru::test_image;
use crate::helper::SysfsHelper;

/// A fake sysfs rooted in a temporary directory
pub struct FakeSysfs {
    dir: TempDir,
}

impl FakeSysfs {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp sysfs root");
        fs::create_dir_all(dir.path().join(paths::FAN_CPLD_DIR.trim_start_matches('/')))
            .expect("create fan cpld dir");
        fs::create_dir_all(dir.path().join(paths::PSU_CPLD_DIR.trim_start_matches('/')))
            .expect("create psu cpld dir");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn helper(&self) -> SysfsHelper {
        SysfsHelper::new(self.dir.path())
    }

    /// Write `contents` at kernel path `path`, creating parents
    pub fn write<C: AsRef<[u8]>>(&self, path: &str, contents: C) {
        let full = self.helper().resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(full, contents).expect("write fake attribute");
    }

    pub fn remove(&self, path: &str) {
        let full = self.helper().resolve(path);
        if full.is_dir() {
            let _ = fs::remove_dir_all(full);
        } else {
            let _ = fs::remove_file(full);
        }
    }

    pub fn fan_cpld(&self, file: &str, value: &str) {
        self.write(&format!("{}/{}", paths::FAN_CPLD_DIR, file), format!("{}\n", value));
    }

    pub fn read_fan_cpld(&self, file: &str) -> Option<String> {
        self.helper()
            .read_one_line_file(format!("{}/{}", paths::FAN_CPLD_DIR, file))
    }

    pub fn psu_cpld(&self, file: &str, value: &str) {
        self.write(&format!("{}/{}", paths::PSU_CPLD_DIR, file), format!("{}\n", value));
    }

    /// Install a FRU image whose product name is `product_name`
    pub fn psu_eeprom(&self, bus: u32, reg: &str, product_name: &str, model: &str, serial: &str) {
        let image = test_image::build(&["DELTA", product_name, model, "S0", serial, ""]);
        self.write(
            &format!("{}/{}", paths::psu_eeprom_dir(bus, reg), paths::EEPROM_FILE),
            image,
        );
    }

    /// Create a bound PMBus hwmon node with the usual dps1100 attributes
    pub fn psu_hwmon(&self, bus: u32, reg: &str, vout_mv: i64, iout_ma: i64, pout_uw: i64, fan_rpm: i64) {
        let dir = format!("{}/hwmon2", paths::psu_hwmon_dir(bus, reg));
        let attrs = [
            ("name", "dps1100".to_string()),
            ("in1_label", "vin".to_string()),
            ("in1_input", "230000".to_string()),
            ("in2_label", "vout1".to_string()),
            ("in2_input", vout_mv.to_string()),
            ("curr1_label", "iin".to_string()),
            ("curr1_input", "1200".to_string()),
            ("curr2_label", "iout1".to_string()),
            ("curr2_input", iout_ma.to_string()),
            ("power1_label", "pin".to_string()),
            ("power1_input", "200000000".to_string()),
            ("power2_label", "pout1".to_string()),
            ("power2_input", pout_uw.to_string()),
            ("fan1_input", fan_rpm.to_string()),
        ];
        for (file, value) in attrs {
            self.write(&format!("{}/{}", dir, file), format!("{}\n", value));
        }
    }
}
