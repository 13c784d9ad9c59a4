//! IP network literals.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrError {
    #[error("invalid IP address '{0}'")]
    Address(String),
    #[error("invalid prefix length in '{0}'")]
    Prefix(String),
}

/// An IPv4 or IPv6 network. A bare address is a host-length network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpCidr {
    network: IpAddr,
    prefix_len: u8,
}

impl IpCidr {
    /// Build a network, masking host bits.
    pub fn new(addr: IpAddr, prefix_len: u8) -> Result<Self, CidrError> {
        if prefix_len > max_prefix(addr) {
            return Err(CidrError::Prefix(format!("{addr}/{prefix_len}")));
        }
        Ok(Self {
            network: mask(addr, prefix_len),
            prefix_len,
        })
    }

    /// A single address.
    pub fn host(addr: IpAddr) -> Self {
        Self {
            network: addr,
            prefix_len: max_prefix(addr),
        }
    }

    pub fn network(&self) -> IpAddr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn is_host(&self) -> bool {
        self.prefix_len == max_prefix(self.network)
    }

    /// Whether `ip` lies in this network. IPv4-mapped IPv6 addresses are
    /// compared in their IPv4 form.
    pub fn contains(&self, ip: IpAddr) -> bool {
        let ip = canonical(ip);
        match (self.network, ip) {
            (IpAddr::V4(_), IpAddr::V4(_)) | (IpAddr::V6(_), IpAddr::V6(_)) => {
                mask(ip, self.prefix_len) == self.network
            }
            _ => false,
        }
    }

    /// Every usable host address of an IPv4 network (network and broadcast
    /// excluded for prefixes shorter than /31).
    ///
    /// Addresses are produced lazily. IPv6 networks yield nothing.
    pub fn hosts_v4(&self) -> impl Iterator<Item = IpAddr> {
        let (base, range) = match self.network {
            IpAddr::V4(net) => {
                let size = 1u64 << (32 - u32::from(self.prefix_len));
                let range = if size <= 2 { 0..size } else { 1..size - 1 };
                (u32::from(net), range)
            }
            IpAddr::V6(_) => (0, 0..0),
        };
        range.map(move |offset| IpAddr::from(std::net::Ipv4Addr::from(base + offset as u32)))
    }
}

impl FromStr for IpCidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('/') {
            Some((addr, len)) => {
                let addr: IpAddr = addr
                    .trim()
                    .parse()
                    .map_err(|_| CidrError::Address(s.to_string()))?;
                let len: u8 = len
                    .trim()
                    .parse()
                    .map_err(|_| CidrError::Prefix(s.to_string()))?;
                IpCidr::new(canonical(addr), len)
            }
            None => {
                let addr: IpAddr = s.parse().map_err(|_| CidrError::Address(s.to_string()))?;
                Ok(IpCidr::host(canonical(addr)))
            }
        }
    }
}

impl fmt::Display for IpCidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_host() {
            write!(f, "{}", self.network)
        } else {
            write!(f, "{}/{}", self.network, self.prefix_len)
        }
    }
}

/// Collapse IPv4-mapped IPv6 addresses to IPv4.
pub fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => ip,
        },
        v4 => v4,
    }
}

fn max_prefix(addr: IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn mask(addr: IpAddr, prefix_len: u8) -> IpAddr {
    match addr {
        IpAddr::V4(v4) => {
            let bits = u32::from(v4);
            let m = if prefix_len == 0 { 0 } else { u32::MAX << (32 - prefix_len) };
            IpAddr::V4((bits & m).into())
        }
        IpAddr::V6(v6) => {
            let bits = u128::from(v6);
            let m = if prefix_len == 0 { 0 } else { u128::MAX << (128 - prefix_len) };
            IpAddr::V6((bits & m).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn parses_hosts_and_networks() {
        let host: IpCidr = "203.0.113.5".parse().unwrap();
        assert!(host.is_host());
        assert_eq!(host.to_string(), "203.0.113.5");

        let net: IpCidr = "173.245.48.0/20".parse().unwrap();
        assert_eq!(net.prefix_len(), 20);
        assert_eq!(net.to_string(), "173.245.48.0/20");

        let v6: IpCidr = "2400:cb00::/32".parse().unwrap();
        assert_eq!(v6.to_string(), "2400:cb00::/32");
    }

    #[test]
    fn host_bits_are_masked() {
        let net: IpCidr = "192.168.1.100/24".parse().unwrap();
        assert_eq!(net.network(), ip("192.168.1.0"));
    }

    #[test]
    fn rejects_junk() {
        assert!("".parse::<IpCidr>().is_err());
        assert!("not-an-ip".parse::<IpCidr>().is_err());
        assert!("10.0.0.0/33".parse::<IpCidr>().is_err());
        assert!("10.0.0.0/x".parse::<IpCidr>().is_err());
        assert!("::/129".parse::<IpCidr>().is_err());
    }

    #[test]
    fn containment() {
        let net: IpCidr = "173.245.48.0/20".parse().unwrap();
        assert!(net.contains(ip("173.245.48.1")));
        assert!(net.contains(ip("173.245.63.255")));
        assert!(!net.contains(ip("173.245.64.0")));
        assert!(!net.contains(ip("2400:cb00::1")));

        let v6: IpCidr = "2400:cb00::/32".parse().unwrap();
        assert!(v6.contains(ip("2400:cb00:1234::1")));
        assert!(!v6.contains(ip("2400:cb01::1")));

        let any: IpCidr = "0.0.0.0/0".parse().unwrap();
        assert!(any.contains(ip("8.8.8.8")));
    }

    #[test]
    fn mapped_v6_matches_v4() {
        let net: IpCidr = "10.0.0.0/8".parse().unwrap();
        assert!(net.contains(ip("::ffff:10.1.2.3")));

        let host: IpCidr = "::ffff:127.0.0.1".parse().unwrap();
        assert_eq!(host.network(), ip("127.0.0.1"));
    }

    #[test]
    fn v4_hosts() {
        let net: IpCidr = "192.168.1.0/30".parse().unwrap();
        assert_eq!(net.hosts_v4().collect::<Vec<_>>(), vec![ip("192.168.1.1"), ip("192.168.1.2")]);

        let p2p: IpCidr = "10.0.0.0/31".parse().unwrap();
        assert_eq!(p2p.hosts_v4().count(), 2);

        let v6: IpCidr = "::1".parse().unwrap();
        assert_eq!(v6.hosts_v4().next(), None);
    }
}
