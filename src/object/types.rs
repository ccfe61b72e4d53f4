//! Scalar types shared by the document model
//!
//! These are the leaf values of a [`Document`](super::Document): names,
//! port visibility, transport protocol and the two compact scalars
//! (port mappings and secret references) produced by the grammar decoders.

#![allow(clippy::must_use_candidate)]

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// A resource name
///
/// Names are checked against the DNS subdomain grammar by the validator,
/// not on construction, so a decoded document can carry an invalid name
/// until validation rejects it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(String);

impl Name {
    /// Wraps a string as a name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Name {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Where a port is reachable from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Only inside the cluster network
    #[default]
    Internal,
    /// From outside the cluster
    External,
}

impl Visibility {
    /// Every accepted spelling, for error messages
    pub const VARIANTS: &'static str = "\"internal\" or \"external\"";
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "internal" => Ok(Self::Internal),
            "external" => Ok(Self::External),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => write!(f, "internal"),
            Self::External => write!(f, "external"),
        }
    }
}

/// Transport protocol of a port mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// TCP
    #[serde(rename = "TCP")]
    Tcp,
    /// UDP
    #[serde(rename = "UDP")]
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
        }
    }
}

/// Decoded `container[:host[:service]][/protocol]` string
///
/// `Display` renders the fully expanded three-number form, so
/// `"5000"` prints as `"5000:5000:5000"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    /// Port the container listens on
    pub container_port: u16,
    /// Port published on the host
    pub host_port: u16,
    /// Port exposed by the endpoint object
    pub service_port: u16,
    /// Explicit protocol, if any
    pub protocol: Option<Protocol>,
}

impl PortMapping {
    /// Mapping where all three ports are the same
    pub fn same(port: u16) -> Self {
        Self {
            container_port: port,
            host_port: port,
            service_port: port,
            protocol: None,
        }
    }

    /// Sets the protocol
    #[must_use]
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.container_port, self.host_port, self.service_port
        )?;
        if let Some(protocol) = self.protocol {
            write!(f, "/{protocol}")?;
        }
        Ok(())
    }
}

/// Decoded `secretName/dataKey` string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretRef {
    /// Name of the secret store
    pub secret_name: String,
    /// Key inside the secret store
    pub data_key: String,
}

impl SecretRef {
    /// Creates a reference
    pub fn new(secret_name: impl Into<String>, data_key: impl Into<String>) -> Self {
        Self {
            secret_name: secret_name.into(),
            data_key: data_key.into(),
        }
    }

    /// Name of the pod volume that projects this secret
    ///
    /// Claim and emptyDir volumes use the bare volume name, secret volumes
    /// the `-secret` suffix.
    #[must_use]
    pub fn volume_name(&self) -> String {
        format!("{}-secret", self.secret_name)
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.secret_name, self.data_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_default_is_internal() {
        assert_eq!(Visibility::default(), Visibility::Internal);
    }

    #[test]
    fn test_visibility_from_str() {
        assert_eq!("external".parse::<Visibility>(), Ok(Visibility::External));
        assert_eq!("public".parse::<Visibility>(), Err("public".to_string()));
    }

    #[test]
    fn test_port_mapping_display() {
        let mapping = PortMapping {
            container_port: 5000,
            host_port: 8080,
            service_port: 80,
            protocol: Some(Protocol::Udp),
        };
        assert_eq!(mapping.to_string(), "5000:8080:80/udp");
        assert_eq!(PortMapping::same(53).to_string(), "53:53:53");
    }

    #[test]
    fn test_secret_ref_volume_name() {
        assert_eq!(SecretRef::new("db", "password").volume_name(), "db-secret");
    }

    #[test]
    fn test_protocol_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&Protocol::Tcp).unwrap(), "\"TCP\"");
    }

    #[test]
    fn test_name_borrows_as_str() {
        let names: std::collections::HashSet<Name> = [Name::from("db")].into_iter().collect();
        assert!(names.contains("db"));
    }
}
