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

//! Platform I/O helper
//!
//! Thin wrappers over sysfs reads and writes. Every path handed to
//! [`SysfsHelper`] is the absolute path the kernel exposes (for example
//! `/sys/bus/i2c/drivers/fancpld/138-000d/fan1_pwm`); the helper re-roots it
//! under its configured root so the same code runs against a fake tree in
//! tests. The `Option`/`bool` methods never fail: errors are logged at debug
//! level and collapse to `None`/`false`.

use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use platform_error::{PlatformError, Result};
use tracing::{debug, trace};

/// Read a file and trim surrounding whitespace
pub fn read_trimmed<P: AsRef<Path>>(p: P) -> Result<String> {
    let path = p.as_ref();
    let mut s = String::new();
    fs::File::open(path)
        .and_then(|mut f| f.read_to_string(&mut s))
        .map_err(|source| PlatformError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(s.trim().to_string())
}

/// Read the first line of a file, trimmed
pub fn read_first_line<P: AsRef<Path>>(p: P) -> Result<String> {
    let text = read_trimmed(p)?;
    Ok(text.lines().next().unwrap_or("").trim().to_string())
}

/// Read a file and parse its trimmed content
pub fn read_parsed<T: FromStr, P: AsRef<Path>>(p: P) -> Result<T> {
    let path = p.as_ref();
    let raw = read_trimmed(path)?;
    raw.parse::<T>()
        .map_err(|_| PlatformError::parse(path, raw))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysfsHelper {
    root: PathBuf,
}

impl Default for SysfsHelper {
    fn default() -> Self {
        Self::new("/")
    }
}

impl SysfsHelper {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a kernel path onto the configured root
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let relative: PathBuf = path
            .as_ref()
            .components()
            .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
            .collect();
        self.root.join(relative)
    }

    pub fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        self.resolve(path).exists()
    }

    /// First line of the file, or `None` when it cannot be read
    pub fn read_one_line_file<P: AsRef<Path>>(&self, path: P) -> Option<String> {
        let resolved = self.resolve(path);
        match read_first_line(&resolved) {
            Ok(line) => {
                trace!(path = %resolved.display(), value = %line, "read");
                Some(line)
            }
            Err(e) => {
                debug!("{}", e);
                None
            }
        }
    }

    /// Whole file content, trimmed, or `None` when it cannot be read
    pub fn read_txt_file<P: AsRef<Path>>(&self, path: P) -> Option<String> {
        let resolved = self.resolve(path);
        read_trimmed(&resolved)
            .map_err(|e| debug!("{}", e))
            .ok()
    }

    /// Write `value` to a sysfs attribute; `true` on success
    pub fn write_file<P: AsRef<Path>>(&self, path: P, value: &str) -> bool {
        match self.try_write_file(path, value) {
            Ok(()) => true,
            Err(e) => {
                debug!("{}", e);
                false
            }
        }
    }

    pub fn try_write_file<P: AsRef<Path>>(&self, path: P, value: &str) -> Result<()> {
        let resolved = self.resolve(path);
        fs::write(&resolved, value).map_err(|source| PlatformError::FileWrite {
            path: resolved.clone(),
            source,
        })?;
        trace!(path = %resolved.display(), value, "wrote");
        Ok(())
    }

    /// Raw bytes of `dir/name`, used for FRU EEPROM blobs
    pub fn read_eeprom_sysfs<P: AsRef<Path>>(&self, dir: P, name: &str) -> Option<Vec<u8>> {
        let resolved = self.resolve(dir.as_ref().join(name));
        match fs::read(&resolved) {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            Ok(_) => {
                debug!(path = %resolved.display(), "empty eeprom");
                None
            }
            Err(source) => {
                let err = PlatformError::FileRead {
                    path: resolved,
                    source,
                };
                debug!("{}", err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_root() -> (TempDir, SysfsHelper) {
        let dir = TempDir::new().unwrap();
        let helper = SysfsHelper::new(dir.path());
        (dir, helper)
    }

    #[test]
    fn test_resolve_strips_root() {
        let helper = SysfsHelper::new("/tmp/fake");
        assert_eq!(
            helper.resolve("/sys/bus/i2c/devices"),
            PathBuf::from("/tmp/fake/sys/bus/i2c/devices")
        );
        assert_eq!(
            SysfsHelper::default().resolve("/sys/class/hwmon"),
            PathBuf::from("/sys/class/hwmon")
        );
    }

    #[test]
    fn test_read_one_line_file() {
        let (dir, helper) = fake_root();
        fs::create_dir_all(dir.path().join("sys")).unwrap();
        fs::write(dir.path().join("sys/fan1_dir"), "0x0\nignored\n").unwrap();

        assert_eq!(helper.read_one_line_file("/sys/fan1_dir"), Some("0x0".to_string()));
        assert_eq!(helper.read_one_line_file("/sys/missing"), None);
    }

    #[test]
    fn test_read_txt_file_trims() {
        let (dir, helper) = fake_root();
        fs::write(dir.path().join("in1_input"), "  12000\n").unwrap();
        assert_eq!(helper.read_txt_file("/in1_input"), Some("12000".to_string()));
    }

    #[test]
    fn test_write_file() {
        let (dir, helper) = fake_root();
        assert!(helper.write_file("/fan1_pwm", "0x80"));
        assert_eq!(fs::read_to_string(dir.path().join("fan1_pwm")).unwrap(), "0x80");
        assert!(!helper.write_file("/no/such/dir/fan1_pwm", "0x80"));
    }

    #[test]
    fn test_read_eeprom_sysfs() {
        let (dir, helper) = fake_root();
        fs::create_dir_all(dir.path().join("dev")).unwrap();
        fs::write(dir.path().join("dev/eeprom"), [0x01u8, 0x00, 0xff]).unwrap();

        assert_eq!(helper.read_eeprom_sysfs("/dev", "eeprom"), Some(vec![0x01, 0x00, 0xff]));
        assert_eq!(helper.read_eeprom_sysfs("/nope", "eeprom"), None);

        fs::write(dir.path().join("dev/empty"), b"").unwrap();
        assert_eq!(helper.read_eeprom_sysfs("/dev", "empty"), None);
    }

    #[test]
    fn test_read_parsed() {
        let (dir, _helper) = fake_root();
        let path = dir.path().join("fan9_input");
        fs::write(&path, "14850\n").unwrap();
        assert_eq!(read_parsed::<u32, _>(&path).unwrap(), 14850);

        fs::write(&path, "abc").unwrap();
        assert!(matches!(read_parsed::<u32, _>(&path), Err(PlatformError::Parse { .. })));
    }
}
