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

use std::{error::Error, path::PathBuf};

use clap::Parser;

use edge_ftu::{
    config::PathSetup,
    logging::{self, LogLevel},
};

/// Compute the shortest path from every edge router to every edge computer, and write the
/// deployment document with the links traversed by each path.
#[derive(Debug, Parser)]
#[clap(version)]
struct Cli {
    /// Topology with `hosts`, `links`, `switches`, `routers`, and `computers`.
    #[clap(long = "topology", short = 't')]
    topology: PathBuf,
    /// Where to write the deployment document.
    #[clap(long = "output", short = 'o', default_value = "conf.json")]
    output: PathBuf,
    /// Log level.
    #[clap(long = "loglevel", value_enum, default_value = "warning")]
    loglevel: LogLevel,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    logging::init(args.loglevel)?;

    let setup = PathSetup::from_file(&args.topology)?;
    let deployment = setup.derive()?;
    deployment.write_file(&args.output)?;

    log::info!(
        "Wrote {} links for {} routers and {} computers to {}",
        deployment
            .affected_paths
            .as_ref()
            .map(|p| p.len())
            .unwrap_or_default(),
        deployment.routers.len(),
        deployment.computers.len(),
        args.output.display()
    );

    Ok(())
}
