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

//! Commands sent to the edge routers to enable or disable a destination.

use std::fmt::Debug;

use async_trait::async_trait;
use edge_lab::ForwardingTableClient;
use serde::Serialize;
use thiserror::Error;

use crate::types::{Action, Operation, Pair};

/// Acknowledgement of an action by the edge router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    /// The affected pair
    pub pair: Pair,
    /// The operation that was performed
    pub operation: Operation,
    /// Response of the router
    pub response: String,
}

/// Client that applies actions on the forwarding table of the edge routers.
#[async_trait]
pub trait RouterCommandClient: Send + Sync + Debug {
    /// Apply a single action. The action is not retried on failure.
    async fn apply(&self, action: &Action) -> Result<Ack, CommandError>;
}

#[async_trait]
impl RouterCommandClient for ForwardingTableClient {
    async fn apply(&self, action: &Action) -> Result<Ack, CommandError> {
        let Pair { router, computer } = action.pair;
        let result = match action.operation {
            Operation::Enable => self.change(router, computer).await,
            Operation::Disable => self.remove(router, computer).await,
        };
        match result {
            Ok(response) => Ok(Ack {
                pair: action.pair,
                operation: action.operation,
                response,
            }),
            Err(e) => Err(CommandError::new(action, e.to_string())),
        }
    }
}

/// An action was not acknowledged by the edge router.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("Cannot {operation} destination {} on router {}: {reason}", .pair.computer, .pair.router)]
pub struct CommandError {
    /// Why the action failed
    pub reason: String,
    /// The affected pair
    pub pair: Pair,
    /// The operation that failed
    pub operation: Operation,
}

impl CommandError {
    /// Create a new error for the given action.
    pub fn new(action: &Action, reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            pair: action.pair,
            operation: action.operation,
        }
    }
}
