//! Strict parsing of address-shaped input
//!
//! Every CIDR, address and endpoint must survive a parse/format round trip
//! unchanged, so nothing ambiguous or padded ever reaches a config file.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use hs_core::{Result, ValidationError};

/// Longest interface name the kernel accepts
pub const MAX_INTERFACE_NAME: usize = 15;

/// Parse an IPv4 CIDR such as `10.253.0.1/24`
pub fn parse_cidr(input: &str) -> Result<Ipv4Net> {
    let net = Ipv4Net::from_str(input).map_err(|_| ValidationError::Cidr(input.to_string()))?;
    if net.to_string() != input {
        return Err(ValidationError::Cidr(input.to_string()).into());
    }
    Ok(net)
}

/// Parse a dotted-quad IPv4 address
pub fn parse_address(input: &str) -> Result<Ipv4Addr> {
    let addr =
        Ipv4Addr::from_str(input).map_err(|_| ValidationError::Address(input.to_string()))?;
    if addr.to_string() != input {
        return Err(ValidationError::Address(input.to_string()).into());
    }
    Ok(addr)
}

/// Parse a comma separated CIDR list; blank input yields an empty list
pub fn parse_cidr_list(input: &str) -> Result<Vec<Ipv4Net>> {
    split_list(input).map(parse_cidr).collect()
}

/// Parse a comma separated address list; blank input yields an empty list
pub fn parse_address_list(input: &str) -> Result<Vec<Ipv4Addr>> {
    split_list(input).map(parse_address).collect()
}

fn split_list(input: &str) -> impl Iterator<Item = &str> {
    input.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a UDP port in `1..=65535`
pub fn parse_port(input: &str) -> Result<u16> {
    match input.parse::<u16>() {
        Ok(port) if port != 0 && port.to_string() == input => Ok(port),
        _ => Err(ValidationError::Port(input.to_string()).into()),
    }
}

/// Reject port 0
pub fn validate_port(port: u16) -> Result<u16> {
    if port == 0 {
        return Err(ValidationError::Port(port.to_string()).into());
    }
    Ok(port)
}

/// Validate a network interface name
///
/// 1 to 15 characters from `[A-Za-z0-9_=+.-]`, as `wg-quick` requires.
pub fn validate_interface_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_INTERFACE_NAME
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '=' | '+' | '.' | '-'));
    if !valid {
        return Err(ValidationError::Name(name.to_string()).into());
    }
    Ok(())
}

/// Whether `host` is an RFC 1123 host name
fn is_hostname(host: &str) -> bool {
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// Validate an endpoint host: an IPv4 address or a host name
pub fn validate_host(host: &str) -> Result<()> {
    if host.parse::<Ipv4Addr>().is_ok() {
        parse_address(host)?;
        return Ok(());
    }
    // All-numeric labels that are not a valid address are typos, not names
    let numeric = host.chars().all(|c| c.is_ascii_digit() || c == '.');
    if numeric || !is_hostname(host) {
        return Err(ValidationError::Endpoint(host.to_string()).into());
    }
    Ok(())
}

/// Public address peers connect to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Parse `host[:port]`, using `default_port` when no port is given
    pub fn parse(input: &str, default_port: u16) -> Result<Self> {
        if input.is_empty() {
            return Err(ValidationError::Endpoint(input.to_string()).into());
        }

        let (host, port) = match input.rsplit_once(':') {
            Some((host, port)) => {
                let port = parse_port(port)
                    .map_err(|_| ValidationError::Endpoint(input.to_string()))?;
                (host, port)
            }
            None => (input, validate_port(default_port)?),
        };

        validate_host(host).map_err(|_| ValidationError::Endpoint(input.to_string()))?;
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hs_core::HsError;

    #[test]
    fn test_parse_cidr_is_strict() {
        assert_eq!(parse_cidr("10.253.0.1/24").unwrap().prefix_len(), 24);
        assert!(parse_cidr("0.0.0.0/0").is_ok());

        for bad in [
            "",
            "10.253.0.1",
            "10.253.0.1/33",
            " 10.253.0.1/24",
            "10.253.0.1/24\n",
            "10.253.0.01/24",
            "10.253.0.1/024",
            "10.253.0.1/24]",
        ] {
            assert!(
                matches!(parse_cidr(bad), Err(HsError::Validation(ValidationError::Cidr(_)))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_lists() {
        assert_eq!(parse_cidr_list("10.0.0.0/8, 192.168.1.0/24").unwrap().len(), 2);
        assert!(parse_cidr_list("  ").unwrap().is_empty());
        assert!(parse_cidr_list("10.0.0.0/8,[Peer]").is_err());

        assert_eq!(
            parse_address_list("1.1.1.1,9.9.9.9").unwrap(),
            vec![Ipv4Addr::new(1, 1, 1, 1), Ipv4Addr::new(9, 9, 9, 9)]
        );
        assert!(parse_address_list("1.1.1.1 # comment").is_err());
    }

    #[test]
    fn test_ports() {
        assert_eq!(parse_port("51820").unwrap(), 51820);
        for bad in ["0", "65536", "-1", "+80", "080", ""] {
            assert!(parse_port(bad).is_err(), "{bad:?}");
        }
        assert!(validate_port(0).is_err());
    }

    #[test]
    fn test_interface_names() {
        for good in ["wg0", "wg-home", "a", "wg_0.lab+1=x"] {
            assert!(validate_interface_name(good).is_ok(), "{good}");
        }
        for bad in ["", "wg 0", "wg/0", "sixteen-chars-xx", "wg0\n"] {
            assert!(validate_interface_name(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn test_endpoint_parse() {
        let ep = Endpoint::parse("vpn.example.com", 51820).unwrap();
        assert_eq!(ep.to_string(), "vpn.example.com:51820");

        let ep = Endpoint::parse("203.0.113.7:443", 51820).unwrap();
        assert_eq!(ep.port, 443);

        for bad in [
            "",
            ":51820",
            "host:0",
            "host:port",
            "-bad.example.com",
            "300.1.1.1",
            "vpn.example.com\n[Peer]",
            "a b",
        ] {
            assert!(
                matches!(
                    Endpoint::parse(bad, 51820),
                    Err(HsError::Validation(ValidationError::Endpoint(_)))
                ),
                "{bad:?}"
            );
        }
    }
}
