//! Error types for every pipeline stage
//!
//! Each stage of Decode → Validate → Transform has its own error enum; the
//! top-level [`Error`] wraps all three so callers can use a single `?`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type used across the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Any failure of the decode, validate or transform stages
#[derive(Error, Debug)]
pub enum Error {
    /// Input could not be decoded into a document
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// Document violates a semantic rule
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Document could not be turned into resources
    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),
}

/// Errors raised by the compact scalar grammars
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// Malformed `container[:host[:service]][/protocol]` string
    #[error("invalid port mapping {raw:?}: {reason}")]
    PortMapping {
        /// The string as written in the input.
        raw: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Malformed `KEY=value` string
    #[error("invalid environment assignment {raw:?}: {reason}")]
    EnvAssignment {
        /// The string as written in the input.
        raw: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Malformed `secretName/dataKey` string
    #[error("invalid secret reference {raw:?}: {reason}")]
    SecretRef {
        /// The string as written in the input.
        raw: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Errors raised while decoding raw input into a document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input contained no document
    #[error("input is empty")]
    EmptyInput,

    /// Input is not well-formed YAML
    #[error("failed to parse input: {0}")]
    Syntax(String),

    /// The `version` key is absent
    #[error("missing \"version\" key")]
    MissingVersion,

    /// The `version` key names a format this crate does not read
    #[error("unsupported version {found:?}, supported version is {supported:?}")]
    UnsupportedVersion {
        /// Version found in the input.
        found: String,
        /// Version this crate reads.
        supported: &'static str,
    },

    /// A mapping carries keys outside its schema
    #[error("excess keys in {path:?}: {keys:?}")]
    ExcessKeys {
        /// Path of the offending mapping.
        path: String,
        /// Unrecognized keys, in input order.
        keys: Vec<String>,
    },

    /// A required field is absent or empty
    #[error("missing required field {field:?} in {path:?}")]
    MissingField {
        /// Path of the enclosing mapping.
        path: String,
        /// Name of the missing field.
        field: &'static str,
    },

    /// A node has the wrong shape
    #[error("{path:?} must be {expected}")]
    InvalidType {
        /// Path of the offending node.
        path: String,
        /// Description of the accepted shape.
        expected: &'static str,
    },

    /// A scalar is outside its enumerated values
    #[error("invalid value {value:?} at {path:?}, expected {expected}")]
    InvalidValue {
        /// Path of the offending node.
        path: String,
        /// Value found in the input.
        value: String,
        /// Accepted values.
        expected: &'static str,
    },

    /// Mutually exclusive fields are both set, or none is
    #[error("exactly one of {fields:?} must be set in {path:?}, found {found}")]
    OneOf {
        /// Path of the enclosing mapping.
        path: String,
        /// The exclusive field names.
        fields: &'static [&'static str],
        /// How many of them were present.
        found: usize,
    },

    /// A port declares `path` without `host`
    #[error("path requires host in {path:?}")]
    PathWithoutHost {
        /// Path of the port mapping.
        path: String,
    },

    /// A compact scalar failed its grammar
    #[error("at {path:?}: {source}")]
    Grammar {
        /// Path of the scalar.
        path: String,
        /// Grammar failure.
        #[source]
        source: GrammarError,
    },

    /// A probe body failed its second decode pass
    #[error("invalid probe at {path:?}: {reason}")]
    Probe {
        /// Path of the probe.
        path: String,
        /// Decoder message.
        reason: String,
    },
}

/// Semantic rule violations found after decoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Name does not match the DNS subdomain grammar
    #[error("invalid name {name:?}: {reason}")]
    InvalidName {
        /// The offending name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Replica count below zero
    #[error("replicas must not be negative, got {value}")]
    NegativeReplicas {
        /// The declared replica count.
        value: i32,
    },

    /// Label value does not match the label-value grammar
    #[error("invalid value {value:?} for label {key:?}: {reason}")]
    InvalidLabelValue {
        /// Label key.
        key: String,
        /// Offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Environment variable key or value is malformed
    #[error("invalid environment variable {key:?}: {reason}")]
    InvalidEnvVar {
        /// Variable key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Mount path is not absolute
    #[error("mount path {path:?} is not absolute")]
    RelativeMountPath {
        /// The declared mount path.
        path: String,
    },

    /// Two mounts of one container target the same path
    #[error("duplicate mount path {path:?}")]
    DuplicateMountPath {
        /// The repeated mount path.
        path: String,
    },

    /// A `volumeRef` points at nothing
    #[error(
        "container {container} of service {service:?} mounts volume {volume:?}, which is neither a root volume nor an emptyDir volume of the service"
    )]
    UnresolvedVolume {
        /// Owning service.
        service: String,
        /// Index of the container inside the service.
        container: usize,
        /// The dangling volume name.
        volume: String,
    },

    /// A secret's pod volume name is taken by a claim or emptyDir volume
    #[error("secret volume {volume:?} clashes with a volume of the same name")]
    VolumeNameConflict {
        /// The pod volume name both would use.
        volume: String,
    },

    /// Volume size is not a resource quantity
    #[error("invalid quantity {value:?}: {reason}")]
    InvalidQuantity {
        /// The declared size.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Access mode is not one of the known modes
    #[error("invalid access mode {value:?}, expected one of ReadWriteOnce, ReadOnlyMany, ReadWriteMany")]
    InvalidAccessMode {
        /// The declared access mode.
        value: String,
    },

    /// Probe body is malformed
    #[error("invalid probe: {reason}")]
    InvalidProbe {
        /// Why it was rejected.
        reason: String,
    },

    /// Probe timing field below zero
    #[error("probe field {field} must not be negative, got {value}")]
    NegativeProbeField {
        /// Field name as written in the input.
        field: &'static str,
        /// The declared value.
        value: i32,
    },

    /// Validation error with path context
    #[error("validation error at {path}: {error}")]
    WithPath {
        /// Path to the error location
        path: String,
        /// Underlying error
        error: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Returns the error without its path qualification
    #[must_use]
    pub fn root_cause(&self) -> &ValidationError {
        match self {
            Self::WithPath { error, .. } => error.root_cause(),
            other => other,
        }
    }
}

/// Failures that can only surface while building resources
#[derive(Error, Debug)]
pub enum TransformError {
    /// An invariant established by validation does not hold
    #[error("internal error: {reason}")]
    Internal {
        /// Which invariant broke.
        reason: String,
    },

    /// A secret `file` source could not be read
    #[error("failed to read secret file {}: {source}", path.display())]
    SecretFile {
        /// Resolved file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A secret `base64` source is not valid base64
    #[error("malformed base64 in key {key:?} of secret {secret:?}: {source}")]
    MalformedBase64 {
        /// Secret name.
        secret: String,
        /// Data key.
        key: String,
        /// Decoder error.
        #[source]
        source: base64::DecodeError,
    },

    /// A relative secret `file` cannot be resolved against a remote document
    #[error("secret file {} is relative but the document was fetched from {url}", path.display())]
    RelativeSecretFile {
        /// The declared relative path.
        path: PathBuf,
        /// Where the document came from.
        url: String,
    },
}
