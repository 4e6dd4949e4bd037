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

//! Basic data types shared by all components: links, pairs, and the actions performed on pairs.

use std::{fmt::Display, net::IpAddr, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// A directed link, identified by the node from which it leaves and the output port on that node.
///
/// The textual representation is `<node>,<port>`, e.g., `s1,2`. This is the representation used
/// as key in the configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Link {
    /// Node from which the link leaves (usually a switch).
    pub node: String,
    /// Output port on `node`.
    pub port: u32,
}

impl Link {
    /// Create a new link.
    pub fn new(node: impl Into<String>, port: u32) -> Self {
        Self {
            node: node.into(),
            port,
        }
    }
}

impl Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.node, self.port)
    }
}

impl FromStr for Link {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (node, port) = s
            .rsplit_once(',')
            .ok_or_else(|| ConfigError::InvalidLink(s.to_string()))?;
        let node = node.trim();
        if node.is_empty() {
            return Err(ConfigError::InvalidLink(s.to_string()));
        }
        let port = port
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidLink(s.to_string()))?;
        Ok(Self::new(node, port))
    }
}

impl TryFrom<String> for Link {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Link> for String {
    fn from(value: Link) -> Self {
        value.to_string()
    }
}

/// A destination relationship between an edge router and an edge computer. The pair is ordered by
/// the router address first, and by the computer address second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pair {
    /// Address of the edge router
    pub router: IpAddr,
    /// Address of the edge computer
    pub computer: IpAddr,
}

impl Pair {
    /// Create a new pair.
    pub fn new(router: impl Into<IpAddr>, computer: impl Into<IpAddr>) -> Self {
        Self {
            router: router.into(),
            computer: computer.into(),
        }
    }
}

impl Display for Pair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.router, self.computer)
    }
}

/// Whether the computer of a pair is currently used by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PairState {
    /// The computer is a destination in the forwarding table of the router.
    #[default]
    Enabled,
    /// The computer was removed from the forwarding table of the router.
    Disabled,
}

impl PairState {
    /// Returns `true` if the pair is enabled.
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled)
    }
}

/// Operation performed on a pair. `Disable` sorts before `Enable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Remove the computer from the forwarding table of the router.
    Disable,
    /// Add the computer back to the forwarding table of the router.
    Enable,
}

impl Operation {
    /// The state of a pair after applying the operation.
    pub fn target_state(&self) -> PairState {
        match self {
            Operation::Disable => PairState::Disabled,
            Operation::Enable => PairState::Enabled,
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Disable => f.write_str("disable"),
            Operation::Enable => f.write_str("enable"),
        }
    }
}

/// An operation to perform on a specific pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Action {
    /// The operation. This is the first field, such that the natural order puts all `Disable`
    /// actions before all `Enable` actions.
    pub operation: Operation,
    /// The affected pair
    pub pair: Pair,
}

impl Action {
    /// Create an action that disables the pair.
    pub fn disable(pair: Pair) -> Self {
        Self {
            operation: Operation::Disable,
            pair,
        }
    }

    /// Create an action that enables the pair.
    pub fn enable(pair: Pair) -> Self {
        Self {
            operation: Operation::Enable,
            pair,
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.operation {
            Operation::Disable => write!(
                f,
                "disabling destination {} on router {}",
                self.pair.computer, self.pair.router
            ),
            Operation::Enable => write!(
                f,
                "enabling destination {} on router {}",
                self.pair.computer, self.pair.router
            ),
        }
    }
}
