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

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use test_log::test;

use super::{ip, pair, C1, R1, R2};
use crate::{
    config::ConfigError,
    types::{Action, Link, Operation, PairState},
};

#[test]
fn parse_link() {
    assert_eq!("s1,2".parse::<Link>().unwrap(), Link::new("s1", 2));
    assert_eq!(" s12 , 10 ".parse::<Link>().unwrap(), Link::new("s12", 10));
    assert_eq!(Link::new("s3", 4).to_string(), "s3,4");
}

#[test]
fn parse_invalid_link() {
    for key in ["s1", "s1,", ",2", "s1,-1", "s1,two", ""] {
        assert!(
            matches!(key.parse::<Link>(), Err(ConfigError::InvalidLink(k)) if k == key),
            "{key:?} should not be a valid link"
        );
    }
}

#[test]
fn link_as_json_key() {
    let map: BTreeMap<Link, u32> = serde_json::from_str(r#"{"s1,1": 1, "s2,3": 2}"#).unwrap();
    assert_eq!(
        map,
        BTreeMap::from([(Link::new("s1", 1), 1), (Link::new("s2", 3), 2)])
    );
    assert_eq!(
        serde_json::to_string(&map).unwrap(),
        r#"{"s1,1":1,"s2,3":2}"#
    );
    assert!(serde_json::from_str::<BTreeMap<Link, u32>>(r#"{"s1": 1}"#).is_err());
}

#[test]
fn pair_order() {
    let mut pairs = vec![pair(R2, C1), pair(R1, "10.0.0.9"), pair(R1, C1)];
    pairs.sort();
    assert_eq!(pairs, vec![pair(R1, C1), pair(R1, "10.0.0.9"), pair(R2, C1)]);
    assert_eq!(pair(R1, C1).router, ip(R1));
}

#[test]
fn disable_before_enable() {
    assert!(Operation::Disable < Operation::Enable);
    assert!(Action::disable(pair(R2, C1)) < Action::enable(pair(R1, C1)));
    assert_eq!(Operation::Disable.target_state(), PairState::Disabled);
    assert_eq!(Operation::Enable.target_state(), PairState::Enabled);
    assert_eq!(PairState::default(), PairState::Enabled);
}

#[test]
fn action_log_format() {
    assert_eq!(
        Action::disable(pair(R1, C1)).to_string(),
        "disabling destination 10.0.0.3 on router 10.0.0.1"
    );
    assert_eq!(
        Action::enable(pair(R2, C1)).to_string(),
        "enabling destination 10.0.0.3 on router 10.0.0.2"
    );
}
