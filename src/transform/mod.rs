//! Turning a validated document into platform resources
//!
//! A [`Transformer`] maps a [`Document`] to an ordered list of
//! [`Resource`]s. Each service yields its endpoint objects, route object
//! and workload object; then come the volume claims and secret stores.
//! The distribution profile only changes the workload object's shape.

pub mod k8s;
mod kubernetes;
mod openshift;

pub use kubernetes::KubernetesTransformer;
pub use openshift::OpenShiftTransformer;

use crate::encoding::Origin;
use crate::errors::TransformError;
use crate::object::Document;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trait for anything that builds resources from a document
pub trait Transformer {
    /// Builds every resource of `document`, in output order
    ///
    /// # Errors
    ///
    /// Returns a [`TransformError`] when a secret source cannot be read or
    /// decoded, or when the document breaks an invariant validation should
    /// have established.
    fn transform(&self, document: &Document) -> Result<Vec<Resource>, TransformError>;
}

/// Target distribution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distro {
    /// Plain Kubernetes
    #[default]
    Kubernetes,
    /// OpenShift
    OpenShift,
}

impl Distro {
    /// Transformer for this distribution
    ///
    /// `origin` locates relative secret files.
    #[must_use]
    pub fn transformer(self, origin: Origin) -> Box<dyn Transformer> {
        let kubernetes = KubernetesTransformer::new().with_origin(origin);
        match self {
            Self::Kubernetes => Box::new(kubernetes),
            Self::OpenShift => Box::new(OpenShiftTransformer::new(kubernetes)),
        }
    }
}

impl fmt::Display for Distro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kubernetes => write!(f, "kubernetes"),
            Self::OpenShift => write!(f, "openshift"),
        }
    }
}

/// One emitted manifest
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Resource {
    /// Endpoint object
    Service(k8s::Service),
    /// Route object
    Ingress(k8s::Ingress),
    /// Kubernetes workload object
    Deployment(k8s::Deployment),
    /// OpenShift workload object
    DeploymentConfig(k8s::DeploymentConfig),
    /// Claim object
    PersistentVolumeClaim(k8s::PersistentVolumeClaim),
    /// Secret store object
    Secret(k8s::Secret),
}

impl Resource {
    /// Kind as written in the manifest
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Service(r) => &r.kind,
            Self::Ingress(r) => &r.kind,
            Self::Deployment(r) => &r.kind,
            Self::DeploymentConfig(r) => &r.kind,
            Self::PersistentVolumeClaim(r) => &r.kind,
            Self::Secret(r) => &r.kind,
        }
    }

    /// Object name
    #[must_use]
    pub fn name(&self) -> &str {
        self.metadata().name.as_str()
    }

    /// Object metadata
    #[must_use]
    pub fn metadata(&self) -> &k8s::ObjectMeta {
        match self {
            Self::Service(r) => &r.metadata,
            Self::Ingress(r) => &r.metadata,
            Self::Deployment(r) => &r.metadata,
            Self::DeploymentConfig(r) => &r.metadata,
            Self::PersistentVolumeClaim(r) => &r.metadata,
            Self::Secret(r) => &r.metadata,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind(), self.name())
    }
}
