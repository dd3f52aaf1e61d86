//! `tcp://host:port` addressing

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs};
use std::str::FromStr;

use crate::error::{Result, SensorWireError};

use super::ports::Topic;

const SCHEME: &str = "tcp://";

/// Where a socket listens or dials
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Listen on all interfaces (`tcp://*:port`)
    Bind { port: u16 },
    /// Dial a specific host (`tcp://host:port`)
    Connect { host: String, port: u16 },
}

impl Endpoint {
    pub fn bind(port: u16) -> Self {
        Self::Bind { port }
    }

    pub fn connect(host: impl Into<String>, port: u16) -> Self {
        Self::Connect {
            host: host.into(),
            port,
        }
    }

    /// Endpoint for `topic`: connect when a host is given, else bind
    pub fn for_topic(topic: &Topic, host: Option<&str>) -> Self {
        match host {
            Some(host) => Self::connect(host, topic.port),
            None => Self::bind(topic.port),
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            Self::Bind { port } | Self::Connect { port, .. } => *port,
        }
    }

    pub fn is_bind(&self) -> bool {
        matches!(self, Self::Bind { .. })
    }

    /// Address to listen on
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, self.port()))
    }

    /// Resolve the address to dial; binding endpoints dial localhost
    pub fn resolve(&self) -> Result<SocketAddr> {
        let host = match self {
            Self::Bind { .. } => "127.0.0.1",
            Self::Connect { host, .. } => host.as_str(),
        };
        (host, self.port())
            .to_socket_addrs()
            .map_err(|e| SensorWireError::from_io(e, &format!("Failed to resolve {}", self)))?
            .next()
            .ok_or_else(|| SensorWireError::invalid_endpoint(self.to_string()))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { port } => write!(f, "{}*:{}", SCHEME, port),
            Self::Connect { host, port } => write!(f, "{}{}:{}", SCHEME, host, port),
        }
    }
}

impl FromStr for Endpoint {
    type Err = SensorWireError;

    fn from_str(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix(SCHEME)
            .ok_or_else(|| SensorWireError::invalid_endpoint(s))?;
        let (host, port) = rest
            .rsplit_once(':')
            .ok_or_else(|| SensorWireError::invalid_endpoint(s))?;
        let port: u16 = port
            .parse()
            .map_err(|_| SensorWireError::invalid_endpoint(s))?;

        match host {
            "" => Err(SensorWireError::invalid_endpoint(s)),
            "*" | "0.0.0.0" => Ok(Self::bind(port)),
            host => Ok(Self::connect(host, port)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::ports::SOUP;

    #[test]
    fn test_display_forms() {
        assert_eq!(Endpoint::bind(9806).to_string(), "tcp://*:9806");
        assert_eq!(
            Endpoint::connect("192.168.1.9", 9806).to_string(),
            "tcp://192.168.1.9:9806"
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("tcp://*:9800".parse::<Endpoint>().unwrap(), Endpoint::bind(9800));
        assert_eq!(
            "tcp://localhost:9801".parse::<Endpoint>().unwrap(),
            Endpoint::connect("localhost", 9801)
        );
        assert!("udp://*:1".parse::<Endpoint>().is_err());
        assert!("tcp://host".parse::<Endpoint>().is_err());
        assert!("tcp://:80".parse::<Endpoint>().is_err());
        assert!("tcp://*:99999".parse::<Endpoint>().is_err());
    }

    #[test]
    fn test_for_topic() {
        assert_eq!(Endpoint::for_topic(&SOUP, None), Endpoint::bind(9806));
        assert_eq!(
            Endpoint::for_topic(&SOUP, Some("10.0.0.2")),
            Endpoint::connect("10.0.0.2", 9806)
        );
        assert_eq!(
            Endpoint::bind(0).resolve().unwrap(),
            "127.0.0.1:0".parse::<SocketAddr>().unwrap()
        );
    }
}
