//! Primary interface and address discovery.

use std::fs;
use std::net::{Ipv4Addr, UdpSocket};

pub const FALLBACK_INTERFACE: &str = "eth0";

const ROUTE_TABLE: &str = "/proc/net/route";

/// Interface of the IPv4 default route, from the kernel routing table.
pub fn primary_interface() -> Option<String> {
    let table = fs::read_to_string(ROUTE_TABLE).ok()?;
    default_route_interface(&table)
}

/// Parse `/proc/net/route`: the first row with destination `00000000`.
pub(crate) fn default_route_interface(table: &str) -> Option<String> {
    table
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            Some((cols.next()?, cols.next()?))
        })
        .find(|(_, destination)| *destination == "00000000")
        .map(|(iface, _)| iface.to_string())
}

/// Source address the kernel would pick for outbound traffic.
///
/// Connecting a UDP socket sends nothing; it only selects a route.
pub fn primary_local_ipv4() -> Ipv4Addr {
    let lookup = || -> std::io::Result<Ipv4Addr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect((Ipv4Addr::new(10, 255, 255, 255), 1))?;
        match socket.local_addr()?.ip() {
            std::net::IpAddr::V4(ip) if !ip.is_unspecified() => Ok(ip),
            _ => Ok(Ipv4Addr::LOCALHOST),
        }
    };
    lookup().unwrap_or_else(|e| {
        tracing::debug!(error = %e, "No routable IPv4 address, using loopback");
        Ipv4Addr::LOCALHOST
    })
}
