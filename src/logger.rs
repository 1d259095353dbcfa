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


//! Logging setup for the CLI and for library consumers that want it.
//!
//! Output goes to stderr so `status --json` stays machine readable.

use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured level
pub const LOG_ENV: &str = "RUST_LOG";

fn build_filter(level: &str) -> EnvFilter {
    match std::env::var(LOG_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new(level),
    }
}

/// Install the global subscriber. Safe to call more than once; later
/// calls leave the first subscriber in place.
pub fn init_logging(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_env_filter(build_filter(level))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    #[serial]
    fn test_init_logging_twice() {
        init_logging("debug");
        init_logging("info");
        tracing::info!("logger initialised twice without panicking");
    }

    #[test]
    #[serial]
    fn test_env_overrides_level() {
        std::env::set_var(LOG_ENV, "warn");
        let filter = build_filter("trace");
        std::env::remove_var(LOG_ENV);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));

        let filter = build_filter("debug");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }
}
