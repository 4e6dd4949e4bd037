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

use std::time::Duration;

use maplit::btreeset;
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;
use test_log::test;

use super::{ip, link, pair, C1, C2, R1, R2};
use crate::config::{parse_seconds, ConfigError, Deployment, PathSetup};

const CONF: &str = r#"{
    "switches": ["s1", "s2", "s3"],
    "routers": ["10.0.0.1", "10.0.0.2"],
    "computers": ["10.0.0.3", "10.0.0.4"],
    "affected_paths": {
        "s1,1": [["10.0.0.1", "10.0.0.3"], ["10.0.0.1", "10.0.0.4"]],
        "s1,2": [["10.0.0.2", "10.0.0.3"], ["10.0.0.2", "10.0.0.4"]],
        "s2,3": [["10.0.0.1", "10.0.0.3"], ["10.0.0.2", "10.0.0.3"], ["10.0.0.3", "10.0.0.1"]]
    }
}"#;

const TOPOLOGY: &str = r#"{
    "routers": ["10.0.0.1", "10.0.0.2"],
    "computers": ["10.0.0.3"],
    "hosts": {"r1": "10.0.0.1", "r2": "10.0.0.2", "c1": "10.0.0.3"},
    "links": [
        {"a": "r1", "a_port": 0, "b": "s1", "b_port": 1},
        {"a": "r2", "a_port": 0, "b": "s1", "b_port": 2},
        {"a": "s1", "a_port": 3, "b": "s2", "b_port": 1},
        {"a": "s2", "a_port": 2, "b": "c1", "b_port": 0}
    ]
}"#;

#[test]
fn parse_deployment() {
    let d: Deployment = CONF.parse().unwrap();
    assert_eq!(d.switches, vec!["s1", "s2", "s3"]);
    assert_eq!(d.routers, vec![ip(R1), ip(R2)]);
    assert_eq!(
        d.pairs(),
        vec![pair(R1, C1), pair(R1, C2), pair(R2, C1), pair(R2, C2)]
    );
    assert!(d.topology.is_none());

    let registry = d.path_registry().unwrap();
    assert_eq!(registry.num_pairs(), 4);
    assert_eq!(
        registry.pairs_for_link(&link("s2,3")),
        &btreeset! {pair(R1, C1), pair(R2, C1)}
    );
    assert!(registry.pairs_for_link(&link("s3,1")).is_empty());
}

#[test]
fn incomplete_deployment() {
    let mut d: Deployment = CONF.parse().unwrap();
    d.switches.clear();
    assert!(matches!(d.validate(), Err(ConfigError::Empty("switches"))));

    let mut d: Deployment = CONF.parse().unwrap();
    d.computers.clear();
    assert!(matches!(d.validate(), Err(ConfigError::Empty("computers"))));

    let mut d: Deployment = CONF.parse().unwrap();
    d.routers.push(ip(C1));
    assert!(matches!(d.validate(), Err(ConfigError::Duplicate(_))));

    let mut d: Deployment = CONF.parse().unwrap();
    d.affected_paths = None;
    assert!(matches!(d.validate(), Err(ConfigError::MissingPaths)));
    assert!(matches!(d.path_registry(), Err(ConfigError::MissingPaths)));
}

#[test]
fn malformed_deployment() {
    let no_routers = r#"{"switches": ["s1"], "routers": [], "computers": ["10.0.0.3"], "affected_paths": {}}"#;
    assert!(matches!(
        no_routers.parse::<Deployment>(),
        Err(ConfigError::Empty("routers"))
    ));

    let bad_link = r#"{"switches": ["s1"], "routers": ["10.0.0.1"], "computers": ["10.0.0.3"], "affected_paths": {"s1:1": []}}"#;
    assert!(matches!(
        bad_link.parse::<Deployment>(),
        Err(ConfigError::Json(_))
    ));

    let bad_addr = r#"{"switches": ["s1"], "routers": ["r1"], "computers": ["10.0.0.3"], "affected_paths": {}}"#;
    assert!(matches!(
        bad_addr.parse::<Deployment>(),
        Err(ConfigError::Json(_))
    ));

    assert!(matches!(
        Deployment::from_file("/nonexistent/conf.json"),
        Err(ConfigError::Io(_, _))
    ));
}

#[test]
fn topology_is_preferred() {
    let mut d: Deployment = CONF.parse().unwrap();
    let setup: PathSetup = serde_json::from_str(TOPOLOGY).unwrap();
    d.computers = vec![ip(C1)];
    d.topology = Some(setup.topology);

    let registry = d.path_registry().unwrap();
    assert_eq!(
        registry.pairs_for_link(&link("s1,3")),
        &btreeset! {pair(R1, C1), pair(R2, C1)}
    );
    assert!(registry.pairs_for_link(&link("s2,3")).is_empty());
}

#[test]
fn derive_and_write() {
    let setup: PathSetup = serde_json::from_str(TOPOLOGY).unwrap();
    let d = setup.derive().unwrap();
    assert_eq!(d.switches, vec!["s1", "s2"]);
    assert!(d.topology.is_none());

    let file = NamedTempFile::new().unwrap();
    d.write_file(file.path()).unwrap();
    let read = Deployment::from_file(file.path()).unwrap();
    assert_eq!(read, d);

    let registry = read.path_registry().unwrap();
    assert_eq!(
        registry.pairs_for_link(&link("s2,2")),
        &btreeset! {pair(R1, C1), pair(R2, C1)}
    );
    assert_eq!(
        registry.pairs_for_link(&link("r2,0")),
        &btreeset! {pair(R2, C1)}
    );
}

#[test]
fn derive_unreachable() {
    let mut setup: PathSetup = serde_json::from_str(TOPOLOGY).unwrap();
    setup.computers.push(ip(C2));
    setup.topology.hosts.insert("c2".to_string(), ip(C2));
    assert!(matches!(setup.derive(), Err(ConfigError::Topology(_))));
}

#[test]
fn seconds_argument() {
    assert_eq!(parse_seconds("interval", 1.0).unwrap(), Duration::from_secs(1));
    assert_eq!(
        parse_seconds("timeout", 0.25).unwrap(),
        Duration::from_millis(250)
    );
    assert_eq!(parse_seconds("interval", 1e-9).unwrap(), Duration::from_nanos(1));

    // too small to be represented, too large, or not positive.
    for secs in [1e-10, 1e20, 0.0, -1.0, f64::NAN, f64::INFINITY] {
        for name in ["interval", "timeout"] {
            assert!(
                matches!(
                    parse_seconds(name, secs),
                    Err(ConfigError::InvalidArgument(msg)) if msg.starts_with(&format!("--{name} "))
                ),
                "--{name} {secs} should be rejected"
            );
        }
    }
}
