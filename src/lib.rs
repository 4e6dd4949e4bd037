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

//! # Edge FTU: congestion-reactive forwarding table updates
//!
//! Edge routers distribute requests of clients over a set of edge computers. When a link on the
//! path from an edge router towards an edge computer gets congested, the router should stop
//! sending requests to that computer, until the congestion disappears. This crate implements a
//! controller that does exactly that, by polling the link counters of the switches in the network
//! and by modifying the forwarding tables of the edge routers.
//!
//! ## Structure
//!
//! - The module [`registry`] ([`PathRegistry`]) stores which (router, computer) pairs traverse
//!   which link. It is built once, either by computing shortest paths on the [`topology`], or by
//!   loading the precomputed mapping from the configuration ([`config`]).
//! - The module [`sampler`] ([`LinkCounterSampler`]) reads the cumulative counters of all
//!   switches, computes the deltas since the last tick, and finds the congested links.
//! - The module [`reconciler`] ([`ForwardingReconciler`]) keeps track of which pairs are currently
//!   enabled or disabled, and computes the minimal set of [`Action`]s to reach the desired state.
//! - The module [`command`] sends these actions to the edge routers.
//! - The module [`runtime`] ties everything together in the [`ControlLoop`].
//!
//! All interaction with the testbed itself (running `ovs-ofctl`, or the forwarding table client)
//! is implemented in the separate crate [`edge_lab`].

#![deny(
    missing_docs,
    clippy::missing_docs_in_private_items,
    missing_debug_implementations,
    rust_2018_idioms
)]

pub mod command;
pub mod config;
pub mod logging;
pub mod reconciler;
pub mod registry;
pub mod runtime;
pub mod sampler;
pub mod topology;
pub mod types;
#[cfg(test)]
mod test;

pub use command::{Ack, CommandError, RouterCommandClient};
pub use config::{ConfigError, Deployment};
pub use reconciler::ForwardingReconciler;
pub use registry::PathRegistry;
pub use runtime::{ControlLoop, LoopConfig};
pub use sampler::LinkCounterSampler;
pub use topology::{Topology, TopologyError};
pub use types::{Action, Link, Operation, Pair, PairState};
