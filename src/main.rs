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

use std::{error::Error, path::PathBuf, sync::Arc};

use clap::Parser;
use edge_lab::{ovs::DEFAULT_TARGET, Executable, ForwardingTableClient, OvsSwitch};
use itertools::Itertools;

use edge_ftu::{
    config::{parse_seconds, ConfigError},
    logging::{self, LogLevel},
    runtime::EventLog,
    sampler::{threshold_bytes, CounterSource},
    ControlLoop, Deployment, ForwardingReconciler, LinkCounterSampler, LoopConfig,
    RouterCommandClient,
};

/// Monitor the links of the edge network, and remove edge computers from the forwarding tables of
/// the edge routers while the path towards them is congested.
#[derive(Debug, Parser)]
#[clap(version)]
struct Cli {
    /// Deployment document with switches, routers, computers, and paths.
    #[clap(long = "conf", default_value = "conf.json")]
    conf: PathBuf,
    /// Sampling interval in seconds.
    #[clap(long = "interval", default_value = "1")]
    interval: f64,
    /// Link load in bits per second above which a link is congested.
    #[clap(long = "threshold", default_value = "1e6")]
    threshold: f64,
    /// Path to the `forwardingtableclient` executable.
    #[clap(
        long = "forwarding-table-client",
        alias = "forwarding_table_client",
        default_value = "../bin/forwardingtableclient"
    )]
    forwarding_table_client: PathBuf,
    /// Only log the actions, without changing any forwarding table.
    #[clap(long = "dry-run", alias = "dry_run")]
    dry_run: bool,
    /// Log level.
    #[clap(long = "loglevel", value_enum, default_value = "warning")]
    loglevel: LogLevel,
    /// Timeout in seconds for every command sent to a switch or router.
    #[clap(long = "timeout", default_value = "5")]
    timeout: f64,
    /// Port of the forwarding table server on the edge routers.
    #[clap(long = "router-port", default_value_t = edge_lab::router::ROUTER_PORT)]
    router_port: u16,
    /// Port of the edge computers.
    #[clap(long = "computer-port", default_value_t = edge_lab::router::COMPUTER_PORT)]
    computer_port: u16,
    /// Lambda whose destinations are changed.
    #[clap(long = "lambda")]
    lambda: Option<String>,
    /// Weight of re-enabled destinations. Uses the default of the client if not given.
    #[clap(long = "weight")]
    weight: Option<f32>,
    /// Make re-enabled destinations final.
    #[clap(long = "final")]
    final_route: bool,
    /// Send all actions of a tick concurrently.
    #[clap(long = "parallel")]
    parallel: bool,
    /// Append every tick with actions to this file (JSON lines).
    #[clap(long = "event-log")]
    event_log: Option<PathBuf>,
    /// Enable all destinations again before exiting.
    #[clap(long = "restore-on-exit")]
    restore_on_exit: bool,
    /// Stop after this many ticks.
    #[clap(long = "max-ticks")]
    max_ticks: Option<u64>,
    /// Path to the `ovs-ofctl` executable.
    #[clap(long = "ovs-ofctl", default_value = edge_lab::ovs::OVS_OFCTL)]
    ovs_ofctl: PathBuf,
    /// Target to reach a switch, where `{}` is replaced by the switch name.
    #[clap(long = "switch-target", default_value = DEFAULT_TARGET)]
    switch_target: String,
}

impl Cli {
    /// Check that all numeric arguments are in range.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(ConfigError::InvalidArgument(format!(
                "--threshold must be positive, but is {}",
                self.threshold
            )));
        }
        if let Some(weight) = self.weight {
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(ConfigError::InvalidArgument(format!(
                    "--weight must not be negative, but is {weight}"
                )));
            }
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    logging::init(args.loglevel)?;
    args.validate()?;
    let interval = parse_seconds("interval", args.interval)?;
    let timeout = parse_seconds("timeout", args.timeout)?;

    let deployment = Deployment::from_file(&args.conf)?;
    let registry = Arc::new(deployment.path_registry()?);
    log::info!(
        "Monitoring {} switches for {} pairs ({} routers, {} computers)",
        deployment.switches.len(),
        registry.num_pairs(),
        deployment.routers.len(),
        deployment.computers.len(),
    );
    log::debug!("Monitored links: {}", registry.links().join(" "));


    let ofctl = Executable::new(&args.ovs_ofctl).with_timeout(timeout);
    let sources = deployment
        .switches
        .iter()
        .map(|sw| {
            Box::new(OvsSwitch::with_target_pattern(
                sw.as_str(),
                &args.switch_target,
                ofctl.clone(),
            )) as Box<dyn CounterSource>
        })
        .collect();
    let sampler = LinkCounterSampler::new(sources).with_timeout(timeout);

    let client: Arc<dyn RouterCommandClient> = Arc::new(
        ForwardingTableClient::new(
            Executable::new(&args.forwarding_table_client).with_timeout(timeout),
        )
        .router_port(args.router_port)
        .computer_port(args.computer_port)
        .lambda(args.lambda.clone())
        .weight(args.weight)
        .final_route(args.final_route),
    );

    let config = LoopConfig {
        interval,
        threshold_bytes: threshold_bytes(args.threshold, interval),
        dry_run: args.dry_run,
        parallel: args.parallel,
        restore_on_exit: args.restore_on_exit,
        max_ticks: args.max_ticks,
    };
    if config.dry_run {
        log::warn!("Dry run: forwarding tables are not changed");
    }

    let mut control_loop =
        ControlLoop::new(config, sampler, ForwardingReconciler::new(registry), client);
    if let Some(path) = args.event_log.as_ref() {
        control_loop = control_loop.with_event_log(EventLog::open(path)?);
    }

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let ticks = rt.block_on(control_loop.run(shutdown_signal()));
    log::info!("Performed {ticks} ticks");

    Ok(())
}

/// Wait until the process receives SIGINT (Ctrl-C) or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                log::warn!("Cannot listen for SIGTERM: {e}");
                ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    ctrl_c().await;
}

/// Wait for Ctrl-C. If the signal handler cannot be installed, wait forever.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
