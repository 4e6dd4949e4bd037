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

//! Periodic sampling of the link counters, and detection of congested links.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt::Debug,
    time::Duration,
};

use async_trait::async_trait;
use edge_lab::{ovs::OvsError, OvsSwitch, PortStats};
use serde::Serialize;
use thiserror::Error;
use tokio::time::timeout;

use crate::types::Link;

/// Default timeout for reading the counters of a single switch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Cumulative counters of a link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Counters {
    /// Number of bytes sent over the link
    pub bytes: u64,
    /// Number of packets sent over the link
    pub packets: u64,
}

impl Counters {
    /// Create new counters.
    pub fn new(bytes: u64, packets: u64) -> Self {
        Self { bytes, packets }
    }
}

impl From<PortStats> for Counters {
    /// The load of a link is the number of bytes transmitted on the output port.
    fn from(stats: PortStats) -> Self {
        Self {
            bytes: stats.tx_bytes,
            packets: stats.tx_packets,
        }
    }
}

/// Difference of the counters of a link between two samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Delta {
    /// Number of bytes sent since the last sample
    pub bytes: u64,
    /// Number of packets sent since the last sample
    pub packets: u64,
}

/// Something that reports the cumulative counters of all ports of a switch.
#[async_trait]
pub trait CounterSource: Send + Sync + Debug {
    /// Name of the switch. Links are identified by this name and the port number.
    fn name(&self) -> &str;

    /// Read the current counters of all ports.
    async fn read_counters(&self) -> Result<BTreeMap<u32, Counters>, CounterError>;
}

#[async_trait]
impl CounterSource for OvsSwitch {
    fn name(&self) -> &str {
        OvsSwitch::name(self)
    }

    async fn read_counters(&self) -> Result<BTreeMap<u32, Counters>, CounterError> {
        Ok(self
            .dump_ports()
            .await?
            .into_iter()
            .map(|(port, stats)| (port, stats.into()))
            .collect())
    }
}

/// Sampler that keeps the previous reading of every link.
#[derive(Debug)]
pub struct LinkCounterSampler {
    /// One source per monitored switch
    sources: Vec<Box<dyn CounterSource>>,
    /// Previous reading of every link seen so far.
    previous: HashMap<Link, Counters>,
    /// Timeout for reading a single switch
    timeout: Duration,
}

impl LinkCounterSampler {
    /// Create a new sampler for the given switches.
    pub fn new(sources: Vec<Box<dyn CounterSource>>) -> Self {
        Self {
            sources,
            previous: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Change the timeout for reading the counters of a single switch.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Names of all monitored switches.
    pub fn switches(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.name())
    }

    /// Get the previous reading of a link.
    pub fn previous(&self, link: &Link) -> Option<Counters> {
        self.previous.get(link).copied()
    }

    /// Read the counters of all switches and compute the deltas since the last sample.
    ///
    /// A switch that cannot be read does not contribute any delta in this tick, and its previous
    /// readings are kept. All other switches are sampled normally.
    pub async fn sample(&mut self) -> BTreeMap<Link, Delta> {
        let mut readings = BTreeMap::new();
        for source in self.sources.iter() {
            let name = source.name();
            match timeout(self.timeout, source.read_counters()).await {
                Ok(Ok(counters)) => readings.extend(
                    counters
                        .into_iter()
                        .map(|(port, c)| (Link::new(name, port), c)),
                ),
                Ok(Err(e)) => log::warn!("[{name}] Cannot read the counters: {e}"),
                Err(_) => log::warn!(
                    "[{name}] Cannot read the counters: no response within {:?}",
                    self.timeout
                ),
            }
        }
        self.update(readings)
    }

    /// Compute the deltas of the `readings` and store them as the new baseline.
    ///
    /// The first reading of a link yields a delta of zero. If either counter decreases (the
    /// counter was reset or wrapped around), the delta is zero as well, and the new reading is
    /// accepted as baseline.
    pub fn update(&mut self, readings: BTreeMap<Link, Counters>) -> BTreeMap<Link, Delta> {
        readings
            .into_iter()
            .map(|(link, current)| {
                let delta = match self.previous.insert(link.clone(), current) {
                    None => Delta::default(),
                    Some(prev) if current.bytes < prev.bytes || current.packets < prev.packets => {
                        log::debug!(
                            "[{link}] Counter discontinuity ({} bytes -> {} bytes)",
                            prev.bytes,
                            current.bytes
                        );
                        Delta::default()
                    }
                    Some(prev) => Delta {
                        bytes: current.bytes - prev.bytes,
                        packets: current.packets - prev.packets,
                    },
                };
                (link, delta)
            })
            .collect()
    }
}

/// Get all links whose byte delta is strictly larger than `threshold` (in bytes per interval).
pub fn congested_links(deltas: &BTreeMap<Link, Delta>, threshold: f64) -> BTreeSet<Link> {
    deltas
        .iter()
        .filter(|(_, delta)| delta.bytes as f64 > threshold)
        .map(|(link, _)| link.clone())
        .collect()
}

/// Convert a threshold in bits per second into bytes per sampling interval.
pub fn threshold_bytes(bits_per_second: f64, interval: Duration) -> f64 {
    bits_per_second / 8.0 * interval.as_secs_f64()
}

/// Error while reading the counters of a switch.
#[derive(Debug, Error)]
pub enum CounterError {
    /// Error while querying Open vSwitch
    #[error("{0}")]
    Ovs(#[from] OvsError),
    /// The counters are not available.
    #[error("Counters unavailable: {0}")]
    Unavailable(String),
}
