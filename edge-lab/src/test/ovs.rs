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

use maplit::btreemap;
use pretty_assertions::assert_eq;

use crate::ovs::{parse_dump_ports, OvsError, OvsSwitch, PortStats};
use crate::Executable;

const DUMP_PORTS: &str = "OFPST_PORT reply (xid=0x2): 3 ports
  port LOCAL: rx pkts=0, bytes=0, drop=0, errs=0, frame=0, over=0, crc=0
           tx pkts=0, bytes=0, drop=0, errs=0, coll=0
  port  2: rx pkts=1203, bytes=98522, drop=0, errs=0, frame=0, over=0, crc=0
           tx pkts=4711, bytes=6512994, drop=0, errs=0, coll=0
  port  1: rx pkts=8, bytes=648, drop=0, errs=0, frame=0, over=0, crc=0
           tx pkts=25, bytes=2346, drop=0, errs=0, coll=0
";

const DUMP_PORTS_OF13: &str = "OFPST_PORT reply (OF1.3) (xid=0x2): 2 ports
  port  1: rx pkts=10, bytes=1000, drop=0, errs=0, frame=0, over=0, crc=0
           tx pkts=20, bytes=2000, drop=0, errs=0, coll=0
           duration=176.334s
  port  3: rx pkts=?, bytes=?, drop=?, errs=?, frame=?, over=?, crc=?
           tx pkts=30, bytes=3000, drop=0, errs=0, coll=0
           duration=176.334s
";

#[test]
fn parse_ports() {
    assert_eq!(
        parse_dump_ports(DUMP_PORTS).unwrap(),
        btreemap! {
            1 => PortStats { rx_packets: 8, rx_bytes: 648, tx_packets: 25, tx_bytes: 2346 },
            2 => PortStats { rx_packets: 1203, rx_bytes: 98522, tx_packets: 4711, tx_bytes: 6512994 },
        }
    );
}

#[test]
fn parse_ports_with_duration_and_unknown_values() {
    assert_eq!(
        parse_dump_ports(DUMP_PORTS_OF13).unwrap(),
        btreemap! {
            1 => PortStats { rx_packets: 10, rx_bytes: 1000, tx_packets: 20, tx_bytes: 2000 },
            3 => PortStats { rx_packets: 0, rx_bytes: 0, tx_packets: 30, tx_bytes: 3000 },
        }
    );
}

#[test]
fn parse_empty_reply() {
    assert!(parse_dump_ports("OFPST_PORT reply (xid=0x2): 0 ports\n")
        .unwrap()
        .is_empty());
}

#[test]
fn parse_tx_without_port() {
    assert!(matches!(
        parse_dump_ports("           tx pkts=25, bytes=2346, drop=0, errs=0, coll=0\n"),
        Err(OvsError::Parse(_))
    ));
}

#[test]
fn default_target() {
    let sw = OvsSwitch::new("s3", Executable::new("ovs-ofctl"));
    assert_eq!(sw.target(), "unix:/var/run/openvswitch/s3.mgmt");
    let sw =
        OvsSwitch::with_target_pattern("s3", "tcp:127.0.0.1:66{}", Executable::new("ovs-ofctl"));
    assert_eq!(sw.target(), "tcp:127.0.0.1:66s3");
}

#[tokio::test]
async fn dump_ports_from_program() {
    // the stub prints the canned reply, but only for the expected target.
    let script = format!(
        "[ \"$1\" = dump-ports ] && [ \"$2\" = unix:/var/run/openvswitch/s1.mgmt ] && printf '%s' '{DUMP_PORTS}'"
    );
    let ofctl = Executable::new("sh").with_args(["-c", script.as_str(), "ovs-ofctl"]);
    let sw = OvsSwitch::new("s1", ofctl);
    let ports = sw.dump_ports().await.unwrap();
    assert_eq!(ports.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(ports[&2].tx_bytes, 6512994);
}
