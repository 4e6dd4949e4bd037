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

//! Static mapping between links and the (router, computer) pairs whose path traverses them.

use std::{
    collections::{BTreeMap, BTreeSet},
    net::IpAddr,
};

use itertools::Itertools;
use lazy_static::lazy_static;

use crate::{
    topology::{Topology, TopologyError},
    types::{Link, Pair},
};

/// Precomputed paths as stored in the configuration: every link maps to the list of
/// `[source, destination]` addresses whose traffic traverses that link.
pub type AffectedPaths = BTreeMap<Link, Vec<(IpAddr, IpAddr)>>;

lazy_static! {
    /// Answer for links that are not on any path.
    static ref NO_PAIRS: BTreeSet<Pair> = BTreeSet::new();
}

/// Mapping from every link to the set of pairs that traverse it, and vice versa. The registry is
/// built once and never changed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathRegistry {
    /// All pairs, including those whose path does not traverse any monitored link.
    pairs: BTreeSet<Pair>,
    /// Pairs that traverse a link.
    links: BTreeMap<Link, BTreeSet<Pair>>,
    /// Links traversed by a pair.
    paths: BTreeMap<Pair, BTreeSet<Link>>,
}

impl PathRegistry {
    /// Compute the shortest path of every pair in the topology, and record every link on it.
    ///
    /// Fails if any router or computer is not part of the topology, or if a computer cannot be
    /// reached from a router.
    pub fn build(
        topo: &Topology,
        pairs: impl IntoIterator<Item = Pair>,
    ) -> Result<Self, TopologyError> {
        let mut registry = Self::default();
        for pair in pairs {
            let path = topo.shortest_path(pair)?;
            log::trace!("[{}] path: {}", pair, path.iter().join(" "));
            registry.insert(pair, path);
        }
        Ok(registry)
    }

    /// Load the registry from precomputed paths. Only entries from one of the `pairs`' routers to
    /// one of its computers are considered; all other entries are ignored. In particular,
    /// entries in the reverse direction (computer to router) are skipped on purpose: only the
    /// path towards the computer decides whether the router should use it.
    pub fn from_affected_paths(
        pairs: impl IntoIterator<Item = Pair>,
        affected_paths: &AffectedPaths,
    ) -> Self {
        let mut registry = Self::default();
        for pair in pairs {
            registry.insert(pair, std::iter::empty());
        }
        for (link, endpoints) in affected_paths.iter() {
            for (src, dst) in endpoints.iter() {
                let pair = Pair::new(*src, *dst);
                if registry.pairs.contains(&pair) {
                    registry.insert(pair, [link.clone()]);
                } else {
                    log::trace!("[{link}] ignore path from {src} to {dst}");
                }
            }
        }
        registry
    }

    /// Register `pair` and all links on its path.
    fn insert(&mut self, pair: Pair, path: impl IntoIterator<Item = Link>) {
        self.pairs.insert(pair);
        let links = self.paths.entry(pair).or_default();
        for link in path {
            self.links.entry(link.clone()).or_default().insert(pair);
            links.insert(link);
        }
    }

    /// Get all links on the path of `pair`. Returns `None` if the pair is not registered.
    pub fn links_for_pair(&self, pair: &Pair) -> Option<&BTreeSet<Link>> {
        self.paths.get(pair)
    }

    /// Get all pairs whose path traverses `link`. The set is empty for unknown links.
    pub fn pairs_for_link(&self, link: &Link) -> &BTreeSet<Pair> {
        self.links.get(link).unwrap_or(&NO_PAIRS)
    }

    /// Iterate over all pairs, sorted by router and then by computer.
    pub fn pairs(&self) -> impl Iterator<Item = &Pair> {
        self.pairs.iter()
    }

    /// Iterate over all links that are traversed by at least one pair.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.keys()
    }

    /// Number of registered pairs.
    pub fn num_pairs(&self) -> usize {
        self.pairs.len()
    }

    /// Export the registry in the format stored in the configuration.
    pub fn affected_paths(&self) -> AffectedPaths {
        self.links
            .iter()
            .map(|(link, pairs)| {
                (
                    link.clone(),
                    pairs.iter().map(|p| (p.router, p.computer)).collect(),
                )
            })
            .collect()
    }
}
