//! Local host address discovery.
//!
//! Finds the primary outbound addresses and, on Linux, the IPv4 default
//! gateways. Secondary interfaces are not enumerated; list them in
//! `trusted_proxy.static_proxies`.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

/// Always trusted, even when discovery fails.
pub const LOOPBACK: [IpAddr; 2] = [
    IpAddr::V4(Ipv4Addr::LOCALHOST),
    IpAddr::V6(Ipv6Addr::LOCALHOST),
];

// Route lookups only; connecting a UDP socket sends no packets.
const ROUTE_PROBE_V4: &str = "192.0.2.1:9";
const ROUTE_PROBE_V6: &str = "[2001:db8::1]:9";

const ROUTE_TABLE: &str = "/proc/net/route";

/// Loopback plus the host's primary outbound interface addresses.
pub fn local_addresses() -> Vec<IpAddr> {
    let mut addrs = LOOPBACK.to_vec();
    for (bind, target) in [("0.0.0.0:0", ROUTE_PROBE_V4), ("[::]:0", ROUTE_PROBE_V6)] {
        match outbound_address(bind, target) {
            Ok(ip) if !ip.is_unspecified() && !addrs.contains(&ip) => {
                tracing::info!(address = %ip, "Discovered local interface address");
                addrs.push(ip);
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(target = %target, error = %e, "Local address discovery failed"),
        }
    }
    addrs
}

fn outbound_address(bind: &str, target: &str) -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind(bind)?;
    let target: SocketAddr = target
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    socket.connect(target)?;
    Ok(socket.local_addr()?.ip())
}

/// IPv4 default gateways from the kernel route table. Empty where the table
/// cannot be read.
pub fn default_gateways() -> Vec<IpAddr> {
    match std::fs::read_to_string(ROUTE_TABLE) {
        Ok(table) => {
            let gateways: Vec<IpAddr> = parse_default_gateways(&table).into_iter().map(IpAddr::V4).collect();
            for gateway in &gateways {
                tracing::info!(address = %gateway, "Discovered default gateway");
            }
            gateways
        }
        Err(e) => {
            tracing::debug!(path = ROUTE_TABLE, error = %e, "Default gateway discovery unavailable");
            Vec::new()
        }
    }
}

/// Gateways of the default routes in `/proc/net/route` format. Addresses are
/// printed as native-endian hex words.
fn parse_default_gateways(table: &str) -> Vec<Ipv4Addr> {
    let mut gateways = Vec::new();
    for line in table.lines().skip(1) {
        let mut fields = line.split_whitespace().skip(1);
        let (Some(destination), Some(gateway)) = (fields.next(), fields.next()) else {
            continue;
        };
        if destination != "00000000" {
            continue;
        }
        let Ok(raw) = u32::from_str_radix(gateway, 16) else {
            continue;
        };
        let ip = Ipv4Addr::from(raw.to_ne_bytes());
        if !ip.is_unspecified() && !gateways.contains(&ip) {
            gateways.push(ip);
        }
    }
    gateways
}

/// IPv4 addresses among `addrs` that are not loopback.
pub fn subnet_candidates(addrs: &[IpAddr]) -> Vec<Ipv4Addr> {
    addrs
        .iter()
        .filter_map(|ip| match ip {
            IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_unspecified() => Some(*v4),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_always_present() {
        let addrs = local_addresses();
        assert!(addrs.contains(&IpAddr::V4(Ipv4Addr::LOCALHOST)));
        assert!(addrs.contains(&IpAddr::V6(Ipv6Addr::LOCALHOST)));
    }

    #[test]
    fn candidates_skip_loopback_and_v6() {
        let addrs = [
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(Ipv6Addr::LOCALHOST),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10)),
        ];
        assert_eq!(subnet_candidates(&addrs), vec![Ipv4Addr::new(192, 168, 1, 10)]);
    }

    #[test]
    #[cfg(target_endian = "little")]
    fn default_routes_yield_gateways() {
        let table = "\
Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT
eth0\t00000000\t010013AC\t0003\t0\t0\t0\t00000000\t0\t0\t0
eth0\t000013AC\t00000000\t0001\t0\t0\t0\t0000FFFF\t0\t0\t0
wlan0\t00000000\t0101A8C0\t0003\t0\t0\t600\t00000000\t0\t0\t0
";
        assert_eq!(
            parse_default_gateways(table),
            vec![Ipv4Addr::new(172, 19, 0, 1), Ipv4Addr::new(192, 168, 1, 1)]
        );
    }

    #[test]
    fn malformed_route_lines_are_skipped() {
        let table = "Iface\tDestination\tGateway\nlo\t00000000\nbad\t00000000\tzzzz\n";
        assert!(parse_default_gateways(table).is_empty());
    }
}
