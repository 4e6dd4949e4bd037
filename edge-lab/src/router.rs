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

//! This module is responsible to change the forwarding tables on edge routers. It wraps the
//! `forwardingtableclient` program, which connects to the forwarding table server of a single edge
//! router.

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

use crate::cmd::{CmdError, Executable};

/// Port on which edge routers expose their forwarding table server.
pub const ROUTER_PORT: u16 = 6474;
/// Port on which edge computers accept lambda requests.
pub const COMPUTER_PORT: u16 = 10000;
/// Token printed by the client after the router has acknowledged a command.
pub const OK_TOKEN: &str = "OK";

/// Action that modifies the forwarding table of an edge router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableAction {
    /// Add the destination, or change its weight.
    Change,
    /// Remove the destination.
    Remove,
}

impl TableAction {
    /// Name of the action as understood by `forwardingtableclient --action`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableAction::Change => "change",
            TableAction::Remove => "remove",
        }
    }
}

impl std::fmt::Display for TableAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client to modify the forwarding tables of edge routers.
#[derive(Debug, Clone)]
pub struct ForwardingTableClient {
    /// The `forwardingtableclient` executable.
    exe: Executable,
    /// Port of the forwarding table server on the edge routers.
    router_port: u16,
    /// Port of the edge computers.
    computer_port: u16,
    /// Lambda whose destinations are modified. `None` uses the default of the client.
    lambda: Option<String>,
    /// Weight for `change` actions. `None` uses the default of the client.
    weight: Option<f32>,
    /// Whether `change` actions install final routes.
    final_route: bool,
}

impl ForwardingTableClient {
    /// Create a new client using the default ports.
    pub fn new(exe: Executable) -> Self {
        Self {
            exe,
            router_port: ROUTER_PORT,
            computer_port: COMPUTER_PORT,
            lambda: None,
            weight: None,
            final_route: false,
        }
    }

    /// Set the port of the forwarding table server on the edge routers.
    pub fn router_port(mut self, port: u16) -> Self {
        self.router_port = port;
        self
    }

    /// Set the port of the edge computers.
    pub fn computer_port(mut self, port: u16) -> Self {
        self.computer_port = port;
        self
    }

    /// Set the lambda name whose destinations are changed.
    pub fn lambda(mut self, lambda: Option<String>) -> Self {
        self.lambda = lambda;
        self
    }

    /// Set the weight used when enabling a destination.
    pub fn weight(mut self, weight: Option<f32>) -> Self {
        self.weight = weight;
        self
    }

    /// Make destinations enabled with `change` final.
    pub fn final_route(mut self, final_route: bool) -> Self {
        self.final_route = final_route;
        self
    }

    /// Endpoint of the forwarding table server of `router`.
    pub fn router_endpoint(&self, router: IpAddr) -> String {
        SocketAddr::new(router, self.router_port).to_string()
    }

    /// Endpoint of `computer` as it appears in the forwarding table.
    pub fn computer_endpoint(&self, computer: IpAddr) -> String {
        SocketAddr::new(computer, self.computer_port).to_string()
    }

    /// Generate the arguments to perform `action` for `computer` on `router`.
    pub fn args(&self, action: TableAction, router: IpAddr, computer: IpAddr) -> Vec<String> {
        let mut args = vec![
            "--action".to_string(),
            action.as_str().to_string(),
            "--server-endpoint".to_string(),
            self.router_endpoint(router),
            "--destination".to_string(),
            self.computer_endpoint(computer),
        ];
        if let Some(lambda) = self.lambda.as_ref() {
            args.push("--lambda".to_string());
            args.push(lambda.clone());
        }
        if action == TableAction::Change {
            if let Some(weight) = self.weight {
                args.push("--weight".to_string());
                args.push(weight.to_string());
            }
            if self.final_route {
                args.push("--final".to_string());
            }
        }
        args
    }

    /// Perform `action` for the destination `computer` on the edge router `router`. The function
    /// returns the line of the response that contains the [`OK_TOKEN`].
    pub async fn execute(
        &self,
        action: TableAction,
        router: IpAddr,
        computer: IpAddr,
    ) -> Result<String, RouterError> {
        log::debug!("[{router}] {action} destination {computer}");
        let stdout = self
            .exe
            .execute_cmd_stdout(self.args(action, router, computer).as_slice())
            .await?;
        match stdout.lines().find(|l| l.contains(OK_TOKEN)) {
            Some(line) => Ok(line.trim().to_string()),
            None => Err(RouterError::InvalidResponse(
                self.router_endpoint(router),
                stdout.trim().to_string(),
            )),
        }
    }

    /// Add the destination `computer` to the table of `router` (or change its weight).
    pub async fn change(&self, router: IpAddr, computer: IpAddr) -> Result<String, RouterError> {
        self.execute(TableAction::Change, router, computer).await
    }

    /// Remove the destination `computer` from the table of `router`.
    pub async fn remove(&self, router: IpAddr, computer: IpAddr) -> Result<String, RouterError> {
        self.execute(TableAction::Remove, router, computer).await
    }

    /// Get the textual dump of all forwarding tables of `router`.
    pub async fn dump(&self, router: IpAddr) -> Result<String, RouterError> {
        let endpoint = self.router_endpoint(router);
        Ok(self
            .exe
            .execute_cmd_stdout(&["--action", "dump", "--server-endpoint", endpoint.as_str()])
            .await?)
    }

    /// Remove all entries from the forwarding tables of `router`.
    pub async fn flush(&self, router: IpAddr) -> Result<(), RouterError> {
        let endpoint = self.router_endpoint(router);
        let stdout = self
            .exe
            .execute_cmd_stdout(&["--action", "flush", "--server-endpoint", endpoint.as_str()])
            .await?;
        if stdout.lines().any(|l| l.contains(OK_TOKEN)) {
            Ok(())
        } else {
            Err(RouterError::InvalidResponse(
                endpoint,
                stdout.trim().to_string(),
            ))
        }
    }
}

/// Error while talking to an edge router.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Error while executing the client.
    #[error("{0}")]
    Cmd(#[from] CmdError),
    /// The router did not acknowledge the command.
    #[error("Invalid response from {0}: {1:?}")]
    InvalidResponse(String, String),
}

impl RouterError {
    /// Returns `true` if the router did not respond in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RouterError::Cmd(e) if e.is_timeout())
    }
}
