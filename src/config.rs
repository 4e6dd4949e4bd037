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

//! The deployment document (`conf.json`), written by the experiment driver and read by the
//! monitor.

use std::{fs, net::IpAddr, path::Path, str::FromStr, time::Duration};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    registry::{AffectedPaths, PathRegistry},
    topology::{Topology, TopologyDescription, TopologyError},
    types::Pair,
};

/// Description of the deployment: which switches to monitor, all edge routers and computers, and
/// the paths between them.
///
/// ```json
/// {
///   "switches": ["s1", "s2"],
///   "routers": ["10.0.0.1"],
///   "computers": ["10.0.0.3"],
///   "affected_paths": { "s1,2": [["10.0.0.1", "10.0.0.3"]] }
/// }
/// ```
///
/// Instead of (or in addition to) `affected_paths`, the document may contain the `topology` (see
/// [`TopologyDescription`]), from which the paths are computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Names of all switches whose counters are monitored.
    pub switches: Vec<String>,
    /// Addresses of all edge routers.
    pub routers: Vec<IpAddr>,
    /// Addresses of all edge computers.
    pub computers: Vec<IpAddr>,
    /// Precomputed paths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_paths: Option<AffectedPaths>,
    /// Topology of the network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<TopologyDescription>,
}

impl Deployment {
    /// Read and validate the document stored at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("Reading the deployment from {}", path.display());
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e))?;
        content.parse()
    }

    /// Write the document to `path` (pretty-printed).
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::Io(path.display().to_string(), e))
    }

    /// Check that the deployment is complete.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.switches.is_empty() {
            return Err(ConfigError::Empty("switches"));
        }
        if self.routers.is_empty() {
            return Err(ConfigError::Empty("routers"));
        }
        if self.computers.is_empty() {
            return Err(ConfigError::Empty("computers"));
        }
        if let Some(dup) = self.switches.iter().duplicates().next() {
            return Err(ConfigError::Duplicate(dup.clone()));
        }
        if let Some(dup) = self.routers.iter().chain(&self.computers).duplicates().next() {
            return Err(ConfigError::Duplicate(dup.to_string()));
        }
        if self.affected_paths.is_none() && self.topology.is_none() {
            return Err(ConfigError::MissingPaths);
        }
        Ok(())
    }

    /// All pairs of the deployment, one for every router and every computer.
    pub fn pairs(&self) -> Vec<Pair> {
        self.routers
            .iter()
            .cartesian_product(self.computers.iter())
            .map(|(r, c)| Pair::new(*r, *c))
            .collect()
    }

    /// Create the path registry. If the document contains the topology, paths are computed from
    /// there. Otherwise, they are taken from `affected_paths`.
    pub fn path_registry(&self) -> Result<PathRegistry, ConfigError> {
        if let Some(desc) = self.topology.as_ref() {
            log::debug!("Computing the paths from the topology");
            let topo = Topology::new(desc)?;
            Ok(PathRegistry::build(&topo, self.pairs())?)
        } else if let Some(paths) = self.affected_paths.as_ref() {
            Ok(PathRegistry::from_affected_paths(self.pairs(), paths))
        } else {
            Err(ConfigError::MissingPaths)
        }
    }
}

impl FromStr for Deployment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let deployment: Self = serde_json::from_str(s)?;
        deployment.validate()?;
        Ok(deployment)
    }
}

/// Input of the path derivation: the deployment together with the topology, all on the top
/// level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSetup {
    /// Names of all switches whose counters are monitored. If empty, all nodes of the topology
    /// that are not hosts are used.
    #[serde(default)]
    pub switches: Vec<String>,
    /// Addresses of all edge routers.
    pub routers: Vec<IpAddr>,
    /// Addresses of all edge computers.
    pub computers: Vec<IpAddr>,
    /// The topology
    #[serde(flatten)]
    pub topology: TopologyDescription,
}

impl PathSetup {
    /// Read the setup stored at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Compute all paths and generate the deployment document with `affected_paths`.
    pub fn derive(&self) -> Result<Deployment, ConfigError> {
        let topo = Topology::new(&self.topology)?;
        let switches = if self.switches.is_empty() {
            topo.switches()
        } else {
            self.switches.clone()
        };
        let mut deployment = Deployment {
            switches,
            routers: self.routers.clone(),
            computers: self.computers.clone(),
            affected_paths: Some(AffectedPaths::new()),
            topology: None,
        };
        deployment.validate()?;
        let registry = PathRegistry::build(&topo, deployment.pairs())?;
        deployment.affected_paths = Some(registry.affected_paths());
        Ok(deployment)
    }
}

/// Convert the command-line argument `--<name>` (in seconds) into a duration. The value must be
/// positive, representable as a duration, and at least one nanosecond long.
pub fn parse_seconds(name: &str, secs: f64) -> Result<Duration, ConfigError> {
    match Duration::try_from_secs_f64(secs) {
        Ok(d) if secs > 0.0 && !d.is_zero() => Ok(d),
        _ => Err(ConfigError::InvalidArgument(format!(
            "--{name} must be a positive number of seconds, but is {secs}"
        ))),
    }
}

/// Errors in the configuration. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Cannot read or write a file.
    #[error("Cannot access {0}: {1}")]
    Io(String, std::io::Error),
    /// Malformed JSON document.
    #[error("Malformed document: {0}")]
    Json(#[from] serde_json::Error),
    /// A required list is empty.
    #[error("No {0} configured")]
    Empty(&'static str),
    /// A switch or host appears twice.
    #[error("{0} is configured multiple times")]
    Duplicate(String),
    /// A link key cannot be parsed.
    #[error("Invalid link {0:?}: expected `<node>,<port>`")]
    InvalidLink(String),
    /// Neither the topology nor the paths are given.
    #[error("Either `topology` or `affected_paths` must be present")]
    MissingPaths,
    /// A command-line argument is out of range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Cannot compute the paths.
    #[error("{0}")]
    Topology(#[from] TopologyError),
}
