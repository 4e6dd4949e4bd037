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

//! Tests and shared test doubles.

use std::{
    collections::{BTreeMap, VecDeque},
    net::IpAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    command::{Ack, CommandError, RouterCommandClient},
    registry::PathRegistry,
    sampler::{CounterError, CounterSource, Counters},
    types::{Action, Link, Pair},
};

mod config;
mod types;

pub(crate) fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

pub(crate) fn link(s: &str) -> Link {
    s.parse().unwrap()
}

pub(crate) fn pair(router: &str, computer: &str) -> Pair {
    Pair::new(ip(router), ip(computer))
}

pub(crate) const R1: &str = "10.0.0.1";
pub(crate) const R2: &str = "10.0.0.2";
pub(crate) const C1: &str = "10.0.0.3";
pub(crate) const C2: &str = "10.0.0.4";

/// Registry with two routers and two computers:
///
/// - `R1 -> C1` traverses `s1,1` and `s2,3`
/// - `R2 -> C1` traverses `s1,2` and `s2,3`
/// - `R1 -> C2` traverses `s1,1` and `s3,1`
/// - `R2 -> C2` traverses `s1,2` and `s3,1`
pub(crate) fn registry() -> PathRegistry {
    let mut paths = BTreeMap::new();
    for (l, endpoints) in [
        ("s1,1", vec![(R1, C1), (R1, C2)]),
        ("s1,2", vec![(R2, C1), (R2, C2)]),
        ("s2,3", vec![(R1, C1), (R2, C1)]),
        ("s3,1", vec![(R1, C2), (R2, C2)]),
    ] {
        paths.insert(
            link(l),
            endpoints
                .into_iter()
                .map(|(s, d)| (ip(s), ip(d)))
                .collect(),
        );
    }
    let pairs = [pair(R1, C1), pair(R1, C2), pair(R2, C1), pair(R2, C2)];
    PathRegistry::from_affected_paths(pairs, &paths)
}

/// A reading of a scripted switch.
#[derive(Debug, Clone)]
pub(crate) enum Reading {
    /// Return these counters
    Counters(BTreeMap<u32, Counters>),
    /// Fail with this message
    Fail(&'static str),
    /// Do not respond for this long, then return nothing.
    Hang(Duration),
}

/// Switch that returns a scripted sequence of readings. Once the script is exhausted, the last
/// reading is repeated.
#[derive(Debug)]
pub(crate) struct ScriptedSwitch {
    name: String,
    script: Mutex<VecDeque<Reading>>,
    last: Mutex<Option<Reading>>,
}

impl ScriptedSwitch {
    pub(crate) fn new(name: &str, script: impl IntoIterator<Item = Reading>) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(script.into_iter().collect()),
            last: Mutex::new(None),
        }
    }

    /// Switch with a single port whose tx byte counter follows `bytes`.
    pub(crate) fn single_port(name: &str, port: u32, bytes: &[u64]) -> Self {
        Self::new(
            name,
            bytes.iter().map(|b| {
                Reading::Counters(BTreeMap::from([(port, Counters::new(*b, *b / 100))]))
            }),
        )
    }

    pub(crate) fn boxed(self) -> Box<dyn CounterSource> {
        Box::new(self)
    }
}

#[async_trait]
impl CounterSource for ScriptedSwitch {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_counters(&self) -> Result<BTreeMap<u32, Counters>, CounterError> {
        let next = self.script.lock().unwrap().pop_front();
        let reading = match next {
            Some(r) => {
                *self.last.lock().unwrap() = Some(r.clone());
                r
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(Reading::Counters(BTreeMap::new())),
        };
        match reading {
            Reading::Counters(c) => Ok(c),
            Reading::Fail(msg) => Err(CounterError::Unavailable(msg.to_string())),
            Reading::Hang(d) => {
                tokio::time::sleep(d).await;
                Ok(BTreeMap::new())
            }
        }
    }
}

/// Command client that records every action, and fails for the configured pairs.
#[derive(Debug, Default)]
pub(crate) struct RecordingClient {
    pub(crate) applied: Mutex<Vec<Action>>,
    pub(crate) failing: Vec<Pair>,
}

impl RecordingClient {
    pub(crate) fn failing(pairs: impl IntoIterator<Item = Pair>) -> Self {
        Self {
            applied: Mutex::new(Vec::new()),
            failing: pairs.into_iter().collect(),
        }
    }

    pub(crate) fn applied(&self) -> Vec<Action> {
        self.applied.lock().unwrap().clone()
    }
}

#[async_trait]
impl RouterCommandClient for RecordingClient {
    async fn apply(&self, action: &Action) -> Result<Ack, CommandError> {
        self.applied.lock().unwrap().push(*action);
        if self.failing.contains(&action.pair) {
            Err(CommandError::new(action, "connection refused"))
        } else {
            Ok(Ack {
                pair: action.pair,
                operation: action.operation,
                response: "OK".to_string(),
            })
        }
    }
}

/// Share a client with the control loop, while keeping a handle for assertions.
pub(crate) fn shared<C: RouterCommandClient + 'static>(
    client: C,
) -> (Arc<C>, Arc<dyn RouterCommandClient>) {
    let client = Arc::new(client);
    let dyn_client: Arc<dyn RouterCommandClient> = client.clone();
    (client, dyn_client)
}
