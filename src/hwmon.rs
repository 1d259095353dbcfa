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

//! hwmon directory discovery
//!
//! PMBus drivers publish their attributes under a `hwmon/hwmonN` directory
//! whose number is only known after the driver binds. Attributes are found by
//! walking that tree for a file whose name has a given prefix and whose
//! content contains a marker (a `name` file holding the driver name, an
//! `inN_label` file holding `vout1`, ...). Symlinked directories are not
//! followed, so the `device` and `subsystem` links cannot cause cycles.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::helper::read_trimmed;

/// All ASCII digits of a file name, in order (`in3_label` -> `3`)
pub fn digits_of(fname: &str) -> String {
    fname.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn sorted_entries(dir: &Path) -> Vec<fs::DirEntry> {
    let mut entries: Vec<fs::DirEntry> = match fs::read_dir(dir) {
        Ok(it) => it.flatten().collect(),
        Err(_) => return Vec::new(),
    };
    entries.sort_by_key(|e| e.file_name());
    entries
}

/// Walk `root` top-down and return the first file whose name starts with
/// `file_prefix` and whose content contains `marker`
pub fn find_file_containing(root: &Path, file_prefix: &str, marker: &str) -> Option<PathBuf> {
    let entries = sorted_entries(root);
    let mut subdirs = Vec::new();

    for entry in entries {
        let is_real_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_real_dir {
            subdirs.push(entry.path());
            continue;
        }
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(file_prefix) {
            continue;
        }
        let path = entry.path();
        if let Ok(content) = read_trimmed(&path) {
            if content.contains(marker) {
                trace!(path = %path.display(), marker, "marker found");
                return Some(path);
            }
        }
    }

    subdirs
        .iter()
        .find_map(|dir| find_file_containing(dir, file_prefix, marker))
}

/// Directory holding the first file matched by [`find_file_containing`]
pub fn find_dir_containing(root: &Path, file_prefix: &str, marker: &str) -> Option<PathBuf> {
    find_file_containing(root, file_prefix, marker)
        .and_then(|file| file.parent().map(Path::to_path_buf))
}

/// Locate the `{kind}N_input` attribute whose `{kind}N_label` sibling
/// contains `label`, searching everything below `root`
pub fn find_sibling_by_label(root: &Path, kind: &str, label: &str) -> Option<PathBuf> {
    let label_path = find_file_containing(root, kind, label)?;
    let dir = label_path.parent()?;
    let fname = label_path.file_name()?.to_string_lossy().to_string();
    let number = digits_of(&fname);
    if number.is_empty() {
        return None;
    }
    Some(dir.join(format!("{}{}_input", kind, number)))
}
