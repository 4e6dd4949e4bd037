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

//! This library contains the plumbing to interact with the emulated edge testbed. It never talks
//! to the devices directly, but always goes through the command-line tools that ship with the
//! testbed.
//!
//! # Switches
//!
//! The testbed emulates the network with Open vSwitch bridges (one per switch). The module [`ovs`]
//! reads the cumulative per-port counters of a bridge using `ovs-ofctl dump-ports`. Mininet
//! exposes each bridge on a management socket called `/var/run/openvswitch/<name>.mgmt`, which is
//! the default target of an [`ovs::OvsSwitch`].
//!
//! # Edge Routers
//!
//! Every edge router exposes its forwarding table on a control endpoint (port `6474` by default).
//! The module [`router`] wraps the `forwardingtableclient` executable, which changes or removes a
//! destination (an edge computer, port `10000` by default) from that table. The executable prints
//! a line with `OK` once the command is acknowledged.
//!
//! # Timeouts
//!
//! Every command is executed through an [`cmd::Executable`], which always applies a timeout and
//! kills the child process if it does not terminate in time. This makes sure that a single
//! unresponsive device cannot stall the caller.

pub mod cmd;
pub mod ovs;
pub mod router;

pub use cmd::{CmdError, Executable};
pub use ovs::{OvsError, OvsSwitch, PortStats};
pub use router::{ForwardingTableClient, RouterError, TableAction};

#[cfg(test)]
mod test;
