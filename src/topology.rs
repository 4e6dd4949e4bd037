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

//! Graph of the emulated network, used to derive the path of every (router, computer) pair.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    net::IpAddr,
};

use itertools::Itertools;
use petgraph::{algo::astar, graph::NodeIndex, Directed, Graph};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Link, Pair};

/// A physical link between two nodes, as written in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDescription {
    /// First endpoint
    pub a: String,
    /// Port on `a` that connects to `b`.
    pub a_port: u32,
    /// Second endpoint
    pub b: String,
    /// Port on `b` that connects to `a`.
    pub b_port: u32,
}

/// Description of the topology: the address of every host (routers, computers, and clients), and
/// all links between nodes. Nodes that are not a host are switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyDescription {
    /// Hosts, by name.
    #[serde(default)]
    pub hosts: BTreeMap<String, IpAddr>,
    /// All bidirectional links.
    #[serde(default)]
    pub links: Vec<LinkDescription>,
}

/// Directed graph of the network. Every physical link is represented by two directed edges, whose
/// weight is the output port on the source node.
#[derive(Debug, Clone)]
pub struct Topology {
    /// The graph, where node weights are the node names
    graph: Graph<String, u32, Directed>,
    /// Index of every node by name
    nodes: HashMap<String, NodeIndex>,
    /// Index of every host by address
    hosts: HashMap<IpAddr, NodeIndex>,
}

impl Topology {
    /// Build the graph from its description. Nodes are added in the order in which they first
    /// appear (hosts first, sorted by name), which makes path computation deterministic.
    pub fn new(desc: &TopologyDescription) -> Result<Self, TopologyError> {
        let mut topo = Self {
            graph: Graph::new(),
            nodes: HashMap::new(),
            hosts: HashMap::new(),
        };

        for (name, addr) in desc.hosts.iter() {
            let idx = topo.node(name);
            if topo.hosts.insert(*addr, idx).is_some() {
                return Err(TopologyError::DuplicateAddress(*addr));
            }
        }

        for link in desc.links.iter() {
            if link.a == link.b {
                return Err(TopologyError::SelfLoop(link.a.clone()));
            }
            let a = topo.node(&link.a);
            let b = topo.node(&link.b);
            topo.graph.add_edge(a, b, link.a_port);
            topo.graph.add_edge(b, a, link.b_port);
        }

        Ok(topo)
    }

    /// Get the index of a node, creating it if it does not exist yet.
    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(idx) = self.nodes.get(name) {
            return *idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), idx);
        idx
    }

    /// Get the name of the host with the given address.
    pub fn host_name(&self, addr: IpAddr) -> Option<&str> {
        self.hosts.get(&addr).map(|idx| self.graph[*idx].as_str())
    }

    /// Get the names of all nodes that are no hosts (i.e., all switches), sorted by name.
    pub fn switches(&self) -> Vec<String> {
        let hosts: HashSet<&NodeIndex> = self.hosts.values().collect();
        self.graph
            .node_indices()
            .filter(|idx| !hosts.contains(idx))
            .map(|idx| self.graph[idx].clone())
            .sorted()
            .collect()
    }

    /// Compute the shortest path (by hop count) from the router to the computer of `pair`, and
    /// return the outgoing link of every hop along that path.
    pub fn shortest_path(&self, pair: Pair) -> Result<Vec<Link>, TopologyError> {
        let src = *self
            .hosts
            .get(&pair.router)
            .ok_or(TopologyError::UnknownHost(pair.router))?;
        let dst = *self
            .hosts
            .get(&pair.computer)
            .ok_or(TopologyError::UnknownHost(pair.computer))?;

        let (_, path) = astar(&self.graph, src, |n| n == dst, |_| 1u32, |_| 0)
            .ok_or(TopologyError::Unreachable(pair))?;

        path.iter()
            .tuple_windows()
            .map(|(u, v)| -> Result<Link, TopologyError> {
                let edge = self
                    .graph
                    .find_edge(*u, *v)
                    .ok_or(TopologyError::Unreachable(pair))?;
                Ok(Link::new(self.graph[*u].clone(), self.graph[edge]))
            })
            .collect()
    }
}

/// Error while computing paths in the topology.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// The address is not assigned to any host.
    #[error("No host has the address {0}")]
    UnknownHost(IpAddr),
    /// Two hosts share the same address.
    #[error("Multiple hosts have the address {0}")]
    DuplicateAddress(IpAddr),
    /// A link connects a node to itself.
    #[error("Link from {0} to itself")]
    SelfLoop(String),
    /// The computer cannot be reached from the router.
    #[error("{} is unreachable from {}", .0.computer, .0.router)]
    Unreachable(Pair),
}
