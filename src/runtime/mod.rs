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

//! The control loop, which periodically samples the counters, reconciles the forwarding state,
//! and sends the resulting actions to the edge routers.

use std::{future::Future, sync::Arc, time::Duration};

use itertools::Itertools;
use thiserror::Error;
use tokio::{
    select,
    time::{interval, Instant, MissedTickBehavior},
};

use crate::{
    command::RouterCommandClient,
    reconciler::ForwardingReconciler,
    sampler::{congested_links, LinkCounterSampler},
    types::Action,
};

mod event_log;
mod executor;

pub use event_log::{ActionRecord, EventLog, Outcome, TickReport};

/// Shortest interval between two ticks. Shorter (or zero) intervals are raised to this value.
pub const MIN_INTERVAL: Duration = Duration::from_nanos(1);

/// Parameters of the control loop.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopConfig {
    /// Time between the start of two consecutive ticks
    pub interval: Duration,
    /// A link is congested if more than this many bytes were sent in one interval.
    pub threshold_bytes: f64,
    /// Only log the actions, without sending them to the routers.
    pub dry_run: bool,
    /// Send all actions of a tick concurrently.
    pub parallel: bool,
    /// Enable all pairs again before exiting.
    pub restore_on_exit: bool,
    /// Stop after this many ticks.
    pub max_ticks: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            threshold_bytes: 125_000.0,
            dry_run: false,
            parallel: false,
            restore_on_exit: false,
            max_ticks: None,
        }
    }
}

/// The control loop. Ticks never overlap: the next tick only starts once all actions of the
/// current tick have completed.
#[derive(Debug)]
pub struct ControlLoop {
    /// Parameters
    config: LoopConfig,
    /// Sampler for all monitored switches
    sampler: LinkCounterSampler,
    /// Forwarding state
    reconciler: ForwardingReconciler,
    /// Client to send the actions to the routers
    client: Arc<dyn RouterCommandClient>,
    /// Optional log of all ticks with actions
    event_log: Option<EventLog>,
    /// Number of ticks performed
    tick: u64,
    /// Time when the loop was created
    start: Instant,
}

impl ControlLoop {
    /// Create a new control loop.
    pub fn new(
        config: LoopConfig,
        sampler: LinkCounterSampler,
        reconciler: ForwardingReconciler,
        client: Arc<dyn RouterCommandClient>,
    ) -> Self {
        Self {
            config,
            sampler,
            reconciler,
            client,
            event_log: None,
            tick: 0,
            start: Instant::now(),
        }
    }

    /// Append the report of every tick with at least one action to `event_log`.
    pub fn with_event_log(mut self, event_log: EventLog) -> Self {
        self.event_log = Some(event_log);
        self
    }

    /// Get the parameters.
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Get the reconciler.
    pub fn reconciler(&self) -> &ForwardingReconciler {
        &self.reconciler
    }

    /// Number of ticks performed so far.
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Perform a single tick: sample the counters, reconcile the state, and dispatch the actions.
    pub async fn tick(&mut self) -> TickReport {
        let time = event_log::now();
        let elapsed_secs = self.start.elapsed().as_secs_f64();

        let deltas = self.sampler.sample().await;
        let congested = congested_links(&deltas, self.config.threshold_bytes);
        if !congested.is_empty() {
            log::info!("Congested links: {}", congested.iter().join(" "));
        }

        let actions = self.reconciler.reconcile(&congested);
        let records = self.dispatch(actions).await;

        let report = TickReport {
            tick: self.tick,
            time,
            elapsed_secs,
            congested: congested.into_iter().collect(),
            actions: records,
        };
        self.tick += 1;
        self.record(&report);
        report
    }

    /// Enable all pairs that are currently disabled.
    pub async fn restore(&mut self) -> TickReport {
        let time = event_log::now();
        let elapsed_secs = self.start.elapsed().as_secs_f64();
        let actions = self.reconciler.reset();
        if !actions.is_empty() {
            log::info!("Restoring {} destinations", actions.len());
        }
        let report = TickReport {
            tick: self.tick,
            time,
            elapsed_secs,
            congested: Vec::new(),
            actions: self.dispatch(actions).await,
        };
        self.record(&report);
        report
    }

    /// Run the loop until `shutdown` completes or the maximum number of ticks is reached. The
    /// shutdown is only observed between ticks. Returns the number of performed ticks.
    pub async fn run<F>(&mut self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut timer = interval(self.config.interval.max(MIN_INTERVAL));
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if self.config.max_ticks.map_or(false, |max| self.tick >= max) {
                log::info!("Stopping after {} ticks", self.tick);
                break;
            }
            select! {
                biased;
                _ = &mut shutdown => {
                    log::info!("Shutting down after {} ticks", self.tick);
                    break;
                }
                _ = timer.tick() => {}
            }
            self.tick().await;
        }

        if self.config.restore_on_exit {
            self.restore().await;
        }

        self.tick
    }

    /// Dispatch the actions using the configured mode.
    async fn dispatch(&self, actions: Vec<Action>) -> Vec<ActionRecord> {
        if actions.is_empty() {
            return Vec::new();
        }
        executor::dispatch(
            &self.client,
            actions,
            self.config.dry_run,
            self.config.parallel,
        )
        .await
    }

    /// Append the report to the event log, if it contains any action.
    fn record(&mut self, report: &TickReport) {
        if report.actions.is_empty() {
            return;
        }
        if let Some(event_log) = self.event_log.as_mut() {
            if let Err(e) = event_log.write(report) {
                log::error!(
                    "Cannot write to the event log {}: {e}",
                    event_log.path().display()
                );
            }
        }
    }
}

/// Error of the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Cannot write the event log.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Cannot serialize the event log.
    #[error("Cannot serialize the event: {0}")]
    Json(#[from] serde_json::Error),
}
