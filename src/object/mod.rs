//! Canonical document model
//!
//! A [`Document`] is built once by the decoder, checked once by the
//! validator and consumed once by a transformer. Nothing in it is mutated
//! after decoding.
//!
//! Fields that are "exactly one of" several inputs are closed sum types
//! ([`EnvSource`], [`MountSource`], [`SecretSource`]), so a document can
//! never hold both or neither.

mod probe;
mod types;

pub use probe::{ExecAction, HttpGetAction, HttpHeader, PortRef, Probe, TcpSocketAction};
pub use types::{Name, PortMapping, Protocol, SecretRef, Visibility};

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Labels attached to a service, sorted by key
pub type Labels = BTreeMap<String, String>;

/// Root of a decoded input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Format version, always the supported one once decoded
    pub version: String,
    /// Services in input order
    pub services: Vec<Service>,
    /// Durable volumes shared by name
    pub volumes: Vec<Volume>,
    /// Secret stores
    pub secrets: Vec<Secret>,
}

impl Document {
    /// Looks up a root volume by name
    #[must_use]
    pub fn volume(&self, name: &str) -> Option<&Volume> {
        self.volumes.iter().find(|v| v.name.as_str() == name)
    }

    /// Looks up a secret store by name
    #[must_use]
    pub fn secret(&self, name: &str) -> Option<&Secret> {
        self.secrets.iter().find(|s| s.name.as_str() == name)
    }
}

/// One deployable unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    /// Service name, also the base name of its resources
    pub name: Name,
    /// Containers in input order
    pub containers: Vec<Container>,
    /// Replica count, platform default when absent
    pub replicas: Option<i32>,
    /// Scratch volumes local to this service
    pub empty_dir_volumes: Vec<EmptyDirVolume>,
    /// User labels
    pub labels: Labels,
}

impl Service {
    /// Whether `name` is one of this service's emptyDir volumes
    #[must_use]
    pub fn has_empty_dir(&self, name: &str) -> bool {
        self.empty_dir_volumes
            .iter()
            .any(|v| v.name.as_str() == name)
    }

    /// All ports of all containers, in declaration order
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.containers.iter().flat_map(|c| c.ports.iter())
    }
}

/// A container of a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    /// Image reference, passed through unchecked
    pub image: String,
    /// Environment variables
    pub env: Vec<EnvVar>,
    /// Exposed ports
    pub ports: Vec<Port>,
    /// Volume and secret mounts
    pub mounts: Vec<Mount>,
    /// Liveness and readiness probes
    pub health: Option<Health>,
}

/// One environment variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    /// Variable name
    pub key: String,
    /// Where the value comes from
    pub source: EnvSource,
}

impl EnvVar {
    /// Variable with a literal value
    pub fn literal(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: EnvSource::Value(value.into()),
        }
    }

    /// Variable read from a secret store
    pub fn from_secret(key: impl Into<String>, secret: SecretRef) -> Self {
        Self {
            key: key.into(),
            source: EnvSource::Secret(secret),
        }
    }
}

/// Value source of an [`EnvVar`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvSource {
    /// Literal string
    Value(String),
    /// Entry of a secret store
    Secret(SecretRef),
}

/// A port exposed by a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    /// Container and service port numbers
    pub mapping: PortMapping,
    /// Internal or external
    pub visibility: Visibility,
    /// Ingress host and path, when the port is routed
    pub ingress: Option<HostPath>,
}

/// Host and path under which a port is routed
///
/// `path` is empty when the input gave a host but no path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPath {
    /// Fully qualified host name
    pub host: String,
    /// Path prefix, possibly empty
    pub path: String,
}

/// A volume or secret mounted into a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    /// What gets mounted
    pub source: MountSource,
    /// Absolute path inside the container
    pub mount_path: String,
    /// Sub-path inside the volume
    pub sub_path: Option<String>,
    /// Read-only flag as written in the input
    pub read_only: Option<bool>,
}

/// Source of a [`Mount`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountSource {
    /// Root volume or emptyDir volume, by name
    Volume(Name),
    /// Entry of a secret store
    Secret(SecretRef),
}

/// Probe pair of a container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Health {
    /// Gate for receiving traffic
    pub readiness: Option<Probe>,
    /// Gate for restarting the container
    pub liveness: Option<Probe>,
}

/// Scratch volume scoped to one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyDirVolume {
    /// Volume name
    pub name: Name,
}

/// Durable volume declared at the root of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    /// Volume name, also the claim name
    pub name: Name,
    /// Requested size as a resource quantity
    pub size: String,
    /// Access mode string
    pub access_mode: String,
    /// Storage class, platform default when absent
    pub storage_class: Option<Name>,
}

/// Named secret store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    /// Store name
    pub name: Name,
    /// Entries in input order
    pub data: Vec<SecretData>,
}

impl Secret {
    /// Whether the store declares `key`
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.data.iter().any(|d| d.key == key)
    }
}

/// One entry of a secret store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretData {
    /// Entry key
    pub key: String,
    /// Where the bytes come from
    pub source: SecretSource,
}

/// Byte source of a [`SecretData`] entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Literal text, copied verbatim
    Plaintext(String),
    /// Base64 text, decoded at transform time
    Base64(String),
    /// File read at transform time
    File(PathBuf),
}
