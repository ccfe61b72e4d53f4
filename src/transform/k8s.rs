//! Kubernetes and OpenShift manifest types
//!
//! Only the fields this crate emits are modelled. Field names follow the
//! platform API through `camelCase` renames so the structs serialize
//! straight into applyable YAML.

use crate::object::{Probe, Protocol};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Object metadata
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Object name; empty inside pod templates
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Metadata with a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Replaces the labels
    #[must_use]
    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    /// Adds an annotation
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// Service
// =============================================================================

/// Network endpoint in front of a workload
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: ServiceSpec,
}

impl Service {
    /// Creates a service object
    pub fn new(metadata: ObjectMeta, spec: ServiceSpec) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "Service".to_string(),
            metadata,
            spec,
        }
    }
}

/// How a service is exposed
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub enum ServiceType {
    /// Cluster-internal virtual IP
    ClusterIP,
    /// External load balancer
    LoadBalancer,
}

/// Service spec
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    /// Exposure type
    #[serde(rename = "type")]
    pub type_: ServiceType,
    /// Pod selector
    pub selector: BTreeMap<String, String>,
    /// Ports
    pub ports: Vec<ServicePort>,
}

/// Service port
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    /// Port name
    pub name: String,
    /// Port exposed by the service
    pub port: u16,
    /// Container port traffic is sent to
    pub target_port: u16,
    /// Protocol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
}

// =============================================================================
// Ingress
// =============================================================================

/// HTTP routing into services
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Ingress {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: IngressSpec,
}

impl Ingress {
    /// Creates an ingress object
    pub fn new(metadata: ObjectMeta, rules: Vec<IngressRule>) -> Self {
        Self {
            api_version: "networking.k8s.io/v1".to_string(),
            kind: "Ingress".to_string(),
            metadata,
            spec: IngressSpec { rules },
        }
    }
}

/// Ingress spec
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct IngressSpec {
    /// One rule per host
    pub rules: Vec<IngressRule>,
}

/// Routing rule for one host
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct IngressRule {
    /// Host name
    pub host: String,
    /// HTTP paths
    pub http: HttpIngressRuleValue,
}

/// Paths of an ingress rule
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct HttpIngressRuleValue {
    /// Paths in declaration order
    pub paths: Vec<HttpIngressPath>,
}

/// One path of an ingress rule
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HttpIngressPath {
    /// Path, absent to match everything
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Path matching mode
    pub path_type: String,
    /// Target service
    pub backend: IngressBackend,
}

impl HttpIngressPath {
    /// Routes `path` to `service:port`
    pub fn new(path: &str, service: impl Into<String>, port: u16) -> Self {
        Self {
            path: (!path.is_empty()).then(|| path.to_string()),
            path_type: "ImplementationSpecific".to_string(),
            backend: IngressBackend {
                service: IngressServiceBackend {
                    name: service.into(),
                    port: ServiceBackendPort { number: port },
                },
            },
        }
    }
}

/// Ingress backend
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct IngressBackend {
    /// Target service
    pub service: IngressServiceBackend,
}

/// Service reference of an ingress backend
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct IngressServiceBackend {
    /// Service name
    pub name: String,
    /// Service port
    pub port: ServiceBackendPort,
}

/// Port of an ingress backend
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ServiceBackendPort {
    /// Port number
    pub number: u16,
}

// =============================================================================
// Workloads
// =============================================================================

/// Kubernetes workload
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: DeploymentSpec,
}

impl Deployment {
    /// Creates a deployment object
    pub fn new(metadata: ObjectMeta, spec: DeploymentSpec) -> Self {
        Self {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            metadata,
            spec,
        }
    }
}

/// Deployment spec
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    /// Replica count, platform default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    /// Pod selector
    pub selector: LabelSelector,
    /// Rollout strategy
    pub strategy: DeploymentStrategy,
    /// Pod template
    pub template: PodTemplateSpec,
}

/// Label selector
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    /// Labels that must match
    pub match_labels: BTreeMap<String, String>,
}

/// Rollout strategy
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct DeploymentStrategy {
    /// Strategy type
    #[serde(rename = "type")]
    pub type_: String,
}

impl DeploymentStrategy {
    /// `RollingUpdate`, for deployments
    pub fn rolling_update() -> Self {
        Self {
            type_: "RollingUpdate".to_string(),
        }
    }

    /// `Rolling`, for deployment configs
    pub fn rolling() -> Self {
        Self {
            type_: "Rolling".to_string(),
        }
    }
}

/// OpenShift workload
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: DeploymentConfigSpec,
}

impl DeploymentConfig {
    /// Creates a deployment config object
    pub fn new(metadata: ObjectMeta, spec: DeploymentConfigSpec) -> Self {
        Self {
            api_version: "apps.openshift.io/v1".to_string(),
            kind: "DeploymentConfig".to_string(),
            metadata,
            spec,
        }
    }
}

/// Deployment config spec
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct DeploymentConfigSpec {
    /// Replica count, platform default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    /// Pod selector
    pub selector: BTreeMap<String, String>,
    /// Rollout strategy
    pub strategy: DeploymentStrategy,
    /// Redeploy triggers
    pub triggers: Vec<DeploymentTrigger>,
    /// Pod template
    pub template: PodTemplateSpec,
}

/// Redeploy trigger
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct DeploymentTrigger {
    /// Trigger type
    #[serde(rename = "type")]
    pub type_: String,
}

impl DeploymentTrigger {
    /// Redeploy whenever the config changes
    pub fn config_change() -> Self {
        Self {
            type_: "ConfigChange".to_string(),
        }
    }
}

/// Pod template
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct PodTemplateSpec {
    /// Template metadata
    pub metadata: ObjectMeta,
    /// Pod spec
    pub spec: PodSpec,
}

/// Pod spec
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct PodSpec {
    /// Containers
    pub containers: Vec<Container>,
    /// Volumes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
}

/// Container spec
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Container name
    pub name: String,
    /// Image
    pub image: String,
    /// Environment variables
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    /// Ports
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ContainerPort>,
    /// Volume mounts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
    /// Liveness probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveness_probe: Option<Probe>,
    /// Readiness probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_probe: Option<Probe>,
}

/// Environment variable
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    /// Variable name
    pub name: String,
    /// Literal value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Value source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<EnvVarSource>,
}

impl EnvVar {
    /// Variable with a literal value
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            value_from: None,
        }
    }

    /// Variable read from a secret key
    pub fn from_secret(
        name: impl Into<String>,
        secret_name: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: None,
            value_from: Some(EnvVarSource {
                secret_key_ref: SecretKeySelector {
                    name: secret_name.into(),
                    key: key.into(),
                },
            }),
        }
    }
}

/// Environment variable source
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarSource {
    /// Secret key reference
    pub secret_key_ref: SecretKeySelector,
}

/// Secret key selector
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct SecretKeySelector {
    /// Secret name
    pub name: String,
    /// Key in the secret
    pub key: String,
}

/// Container port
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    /// Port name
    pub name: String,
    /// Port number
    pub container_port: u16,
    /// Protocol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
}

/// Volume mount
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    /// Volume name
    pub name: String,
    /// Mount path
    pub mount_path: String,
    /// Sub-path inside the volume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_path: Option<String>,
    /// Read-only flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
}

/// Pod volume
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    /// Volume name
    pub name: String,
    /// Secret source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<SecretVolumeSource>,
    /// Claim source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim: Option<PersistentVolumeClaimVolumeSource>,
    /// Scratch source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_dir: Option<EmptyDirVolumeSource>,
}

impl Volume {
    /// Volume `name` exposing one key of a secret as a file of the same name
    pub fn from_secret(
        name: impl Into<String>,
        secret_name: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            secret: Some(SecretVolumeSource {
                secret_name: secret_name.into(),
                items: vec![KeyToPath::same(key)],
            }),
            persistent_volume_claim: None,
            empty_dir: None,
        }
    }

    /// Volume backed by a claim of the same name
    pub fn from_pvc(claim_name: impl Into<String>) -> Self {
        let claim_name = claim_name.into();
        Self {
            name: claim_name.clone(),
            secret: None,
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource { claim_name }),
            empty_dir: None,
        }
    }

    /// Scratch volume
    pub fn from_empty_dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secret: None,
            persistent_volume_claim: None,
            empty_dir: Some(EmptyDirVolumeSource {}),
        }
    }
}

/// Secret volume source
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretVolumeSource {
    /// Secret name
    pub secret_name: String,
    /// Keys projected as files
    pub items: Vec<KeyToPath>,
}

/// Key projected to a file path
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct KeyToPath {
    /// Key in the secret
    pub key: String,
    /// Relative file path
    pub path: String,
}

impl KeyToPath {
    /// Projects `key` to a file named after it
    pub fn same(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            path: key.clone(),
            key,
        }
    }
}

/// Claim volume source
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaimVolumeSource {
    /// Claim name
    pub claim_name: String,
}

/// Scratch volume source
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct EmptyDirVolumeSource {}

// =============================================================================
// Storage and secrets
// =============================================================================

/// Storage annotation read by the platform's volume provisioner
pub const STORAGE_CLASS_ANNOTATION: &str = "volume.beta.kubernetes.io/storage-class";

/// Request for durable storage
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaim {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: PersistentVolumeClaimSpec,
}

impl PersistentVolumeClaim {
    /// Claims `size` of storage with one access mode
    pub fn new(
        metadata: ObjectMeta,
        access_mode: impl Into<String>,
        size: impl Into<String>,
    ) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "PersistentVolumeClaim".to_string(),
            metadata,
            spec: PersistentVolumeClaimSpec {
                access_modes: vec![access_mode.into()],
                resources: VolumeResourceRequirements {
                    requests: BTreeMap::from([("storage".to_string(), size.into())]),
                },
            },
        }
    }
}

/// Claim spec
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaimSpec {
    /// Access modes
    pub access_modes: Vec<String>,
    /// Requested resources
    pub resources: VolumeResourceRequirements,
}

/// Resource requests of a claim
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct VolumeResourceRequirements {
    /// Requested quantities
    pub requests: BTreeMap<String, String>,
}

/// Secret store
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Secret type
    #[serde(rename = "type")]
    pub type_: String,
    /// Raw bytes per key, base64-encoded on output
    #[serde(serialize_with = "serialize_bytes_map")]
    pub data: BTreeMap<String, Vec<u8>>,
}

impl Secret {
    /// Creates an opaque secret
    pub fn new(metadata: ObjectMeta, data: BTreeMap<String, Vec<u8>>) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "Secret".to_string(),
            metadata,
            type_: "Opaque".to_string(),
            data,
        }
    }
}

fn serialize_bytes_map<S>(
    data: &BTreeMap<String, Vec<u8>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(data.iter().map(|(key, bytes)| (key, STANDARD.encode(bytes))))
}
