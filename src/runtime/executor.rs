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

//! Dispatch of actions to the edge routers.

use std::sync::Arc;

use tokio::task::{spawn, JoinHandle};

use crate::{
    command::{Ack, CommandError, RouterCommandClient},
    types::Action,
};

use super::event_log::{ActionRecord, Outcome};

/// Send all actions to the routers and wait until every one of them has completed (or failed).
/// Each action is logged on warn level before it is sent. In `dry_run` mode, the actions are only
/// logged. If `parallel` is set, all actions are sent concurrently.
pub(super) async fn dispatch(
    client: &Arc<dyn RouterCommandClient>,
    actions: Vec<Action>,
    dry_run: bool,
    parallel: bool,
) -> Vec<ActionRecord> {
    for action in actions.iter() {
        log::warn!("{action}");
    }

    if dry_run {
        return actions
            .into_iter()
            .map(|action| ActionRecord {
                action,
                outcome: Outcome::DryRun,
            })
            .collect();
    }

    let mut records = Vec::with_capacity(actions.len());
    if parallel {
        let jobs: Vec<(Action, JoinHandle<Result<Ack, CommandError>>)> = actions
            .into_iter()
            .map(|action| {
                let client = client.clone();
                (action, spawn(async move { client.apply(&action).await }))
            })
            .collect();
        for (action, job) in jobs {
            let result = match job.await {
                Ok(result) => result,
                Err(e) => Err(CommandError::new(&action, format!("task failed: {e}"))),
            };
            records.push(record(action, result));
        }
    } else {
        for action in actions {
            let result = client.apply(&action).await;
            records.push(record(action, result));
        }
    }
    records
}

/// Log a failed action, and create its record.
fn record(action: Action, result: Result<Ack, CommandError>) -> ActionRecord {
    match result.as_ref() {
        Ok(ack) => log::debug!("[{}] {}: {}", action.pair.router, action, ack.response),
        Err(e) => log::error!("{e}"),
    }
    ActionRecord {
        action,
        outcome: result.into(),
    }
}
