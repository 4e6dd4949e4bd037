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

//! Record of every tick, optionally appended to a file as JSON lines.

use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use serde::Serialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{
    command::{Ack, CommandError},
    types::{Action, Link},
};

use super::RuntimeError;

/// Summary of a single tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    /// Index of the tick, starting at 0.
    pub tick: u64,
    /// Time at which the tick started (RFC 3339)
    pub time: String,
    /// Seconds since the loop started
    pub elapsed_secs: f64,
    /// All congested links
    pub congested: Vec<Link>,
    /// All actions, together with their outcome
    pub actions: Vec<ActionRecord>,
}

/// An action and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    /// The action
    pub action: Action,
    /// Its outcome
    pub outcome: Outcome,
}

/// Outcome of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The action was only logged.
    DryRun,
    /// The router acknowledged the action.
    Ok {
        /// Response of the router
        response: String,
    },
    /// The action failed.
    Failed {
        /// Reason of the failure
        reason: String,
    },
}

impl Outcome {
    /// Returns `true` if the action failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}

impl From<Result<Ack, CommandError>> for Outcome {
    fn from(result: Result<Ack, CommandError>) -> Self {
        match result {
            Ok(ack) => Outcome::Ok {
                response: ack.response,
            },
            Err(e) => Outcome::Failed { reason: e.reason },
        }
    }
}

/// Current time formatted as RFC 3339, in local time if the offset is known.
pub(crate) fn now() -> String {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .format(&Rfc3339)
        .unwrap_or_default()
}

/// File to which the reports are appended, one JSON object per line.
#[derive(Debug)]
pub struct EventLog {
    /// Path of the file
    path: PathBuf,
    /// The opened file
    file: File,
}

impl EventLog {
    /// Open the file at `path` for appending, creating it if necessary.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a report.
    pub fn write(&mut self, report: &TickReport) -> Result<(), RuntimeError> {
        let mut line = serde_json::to_vec(report)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.flush()?;
        Ok(())
    }
}
