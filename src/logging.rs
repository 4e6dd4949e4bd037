// Edge FTU: congestion-reactive forwarding table updates for edge routers
// Copyright (C) 2023 The edge-ftu developers
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Logger initialization shared by all binaries.

use clap::ValueEnum;
use log::{LevelFilter, SetLoggerError};

/// Verbosity of the log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
pub enum LogLevel {
    /// Only errors
    Error,
    /// Errors and warnings. Actions sent to the routers are logged on this level.
    #[value(alias = "warn")]
    Warning,
    /// Also log the congested links.
    Info,
    /// Also log counter discontinuities.
    Debug,
    /// Log everything, including each executed command.
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Initialize the timed logger with the given level. Filters in `RUST_LOG` take precedence.
pub fn init(level: LogLevel) -> Result<(), SetLoggerError> {
    let mut builder = pretty_env_logger::formatted_timed_builder();
    builder.filter_level(level.into());
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.try_init()
}
