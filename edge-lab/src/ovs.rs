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

//! Module for reading port statistics of Open vSwitch bridges.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::cmd::{CmdError, Executable};

/// Default name of the `ovs-ofctl` program.
pub const OVS_OFCTL: &str = "ovs-ofctl";
/// Default target of a bridge, where `{}` is replaced by the name of the switch.
pub const DEFAULT_TARGET: &str = "unix:/var/run/openvswitch/{}.mgmt";

lazy_static! {
    static ref RX_RE: Regex =
        Regex::new(r"^\s*port\s+(\S+):\s*rx\s+pkts=(\d+|\?),\s*bytes=(\d+|\?)").unwrap();
    static ref TX_RE: Regex = Regex::new(r"^\s*tx\s+pkts=(\d+|\?),\s*bytes=(\d+|\?)").unwrap();
}

/// Cumulative counters of a single port. Counters that the switch reports as unavailable (`?`)
/// are stored as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PortStats {
    /// Number of received packets
    pub rx_packets: u64,
    /// Number of received bytes
    pub rx_bytes: u64,
    /// Number of transmitted packets
    pub tx_packets: u64,
    /// Number of transmitted bytes
    pub tx_bytes: u64,
}

/// Handle to a single Open vSwitch bridge, queried using `ovs-ofctl`.
#[derive(Debug, Clone)]
pub struct OvsSwitch {
    /// Name of the switch (as used in the topology)
    name: String,
    /// Target passed to `ovs-ofctl` to reach the bridge.
    target: String,
    /// The `ovs-ofctl` executable.
    ofctl: Executable,
}

impl OvsSwitch {
    /// Create a handle for the switch `name`, reachable on its Mininet management socket.
    pub fn new(name: impl Into<String>, ofctl: Executable) -> Self {
        let name = name.into();
        let target = DEFAULT_TARGET.replace("{}", &name);
        Self {
            name,
            target,
            ofctl,
        }
    }

    /// Create a handle for the switch `name`, where the target is generated from `pattern` by
    /// replacing `{}` with the name of the switch. A `pattern` without `{}` is used as it is.
    pub fn with_target_pattern(name: impl Into<String>, pattern: &str, ofctl: Executable) -> Self {
        let name = name.into();
        let target = pattern.replace("{}", &name);
        Self {
            name,
            target,
            ofctl,
        }
    }

    /// Get the name of the switch.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the target used to reach the bridge.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Get the statistics of all numbered ports of the switch. The `LOCAL` port is ignored.
    pub async fn dump_ports(&self) -> Result<BTreeMap<u32, PortStats>, OvsError> {
        log::trace!("[{}] dump ports on {}", self.name, self.target);
        let stdout = self
            .ofctl
            .execute_cmd_stdout(&["dump-ports", self.target.as_str()])
            .await?;
        parse_dump_ports(&stdout)
    }
}

/// Parse the output of `ovs-ofctl dump-ports`. Each port spans (at least) two lines, the first
/// one containing the received counters, and the second one the transmitted counters:
///
/// ```text
/// OFPST_PORT reply (xid=0x2): 2 ports
///   port LOCAL: rx pkts=0, bytes=0, drop=0, errs=0, frame=0, over=0, crc=0
///            tx pkts=0, bytes=0, drop=0, errs=0, coll=0
///   port  1: rx pkts=8, bytes=648, drop=0, errs=0, frame=0, over=0, crc=0
///            tx pkts=25, bytes=2346, drop=0, errs=0, coll=0
/// ```
pub fn parse_dump_ports(output: &str) -> Result<BTreeMap<u32, PortStats>, OvsError> {
    let mut result = BTreeMap::new();
    // port that is currently parsed. `None` means that the port is ignored.
    let mut current: Option<(u32, PortStats)> = None;
    let mut in_port = false;

    for line in output.lines() {
        if let Some(caps) = RX_RE.captures(line) {
            if let Some((port, stats)) = current.take() {
                result.insert(port, stats);
            }
            in_port = true;
            let port = caps[1].trim_matches('"');
            current = match port.parse::<u32>() {
                Ok(port) => Some((
                    port,
                    PortStats {
                        rx_packets: parse_counter(&caps[2])?,
                        rx_bytes: parse_counter(&caps[3])?,
                        ..Default::default()
                    },
                )),
                Err(_) => {
                    log::trace!("Ignore port {port}");
                    None
                }
            };
        } else if let Some(caps) = TX_RE.captures(line) {
            if !in_port {
                return Err(OvsError::Parse(format!("unexpected tx line: {line}")));
            }
            if let Some((_, stats)) = current.as_mut() {
                stats.tx_packets = parse_counter(&caps[1])?;
                stats.tx_bytes = parse_counter(&caps[2])?;
            }
        }
    }

    if let Some((port, stats)) = current.take() {
        result.insert(port, stats);
    }

    Ok(result)
}

/// Parse a single counter value, where `?` denotes an unavailable counter.
fn parse_counter(s: &str) -> Result<u64, OvsError> {
    if s == "?" {
        Ok(0)
    } else {
        s.parse()
            .map_err(|_| OvsError::Parse(format!("invalid counter: {s}")))
    }
}

/// Error while reading the counters of a switch.
#[derive(Debug, Error)]
pub enum OvsError {
    /// Error while executing `ovs-ofctl`
    #[error("{0}")]
    Cmd(#[from] CmdError),
    /// Cannot parse the output of `ovs-ofctl`.
    #[error("Cannot parse the output of `ovs-ofctl dump-ports`: {0}")]
    Parse(String),
}
