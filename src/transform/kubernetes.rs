//! Kubernetes transformer
//!
//! Builds `Service`, `Ingress`, `Deployment`, `PersistentVolumeClaim` and
//! `Secret` objects. Every builder returns its own objects; the results are
//! concatenated once in [`Transformer::transform`].

use super::k8s::{self, ObjectMeta};
use super::{Resource, Transformer};
use crate::encoding::Origin;
use crate::errors::TransformError;
use crate::object::{
    Container, Document, EnvSource, MountSource, Secret, SecretSource, Service, Visibility,
    Volume,
};
use crate::validation::rules::ACCESS_MODES;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Label every object of a service carries, and the pod selector
pub const SERVICE_LABEL: &str = "service";

/// Backend for generating Kubernetes manifests
#[derive(Debug, Clone, Default)]
pub struct KubernetesTransformer {
    origin: Origin,
}

impl KubernetesTransformer {
    /// Creates a new Kubernetes transformer
    ///
    /// Relative secret files resolve against the working directory until
    /// [`with_origin`](Self::with_origin) says otherwise.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets where the document came from
    #[must_use]
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Builds all resources, using `workload` to wrap each pod template
    pub(super) fn transform_with<F>(
        &self,
        document: &Document,
        workload: F,
    ) -> Result<Vec<Resource>, TransformError>
    where
        F: Fn(&Service, k8s::PodTemplateSpec) -> Resource,
    {
        let mut resources = Vec::new();

        for service in &document.services {
            let mut objects: Vec<Resource> = self
                .create_services(service)
                .into_iter()
                .map(Resource::Service)
                .collect();
            objects.extend(self.create_ingress(service).map(Resource::Ingress));
            objects.push(workload(service, self.create_pod_template(service)));

            tracing::debug!(
                service = %service.name,
                objects = objects.len(),
                "transformed service"
            );
            resources.extend(objects);
        }

        for volume in &document.volumes {
            resources.push(Resource::PersistentVolumeClaim(self.create_claim(volume)?));
        }

        for secret in &document.secrets {
            resources.push(Resource::Secret(self.create_secret(secret)?));
        }

        Ok(resources)
    }

    /// Creates the endpoint objects of a service
    ///
    /// Internal ports go to a `ClusterIP` service named after the service;
    /// external ports go to a `LoadBalancer` service with an `-external`
    /// suffix. A service object without ports is not emitted.
    #[must_use]
    pub fn create_services(&self, service: &Service) -> Vec<k8s::Service> {
        [
            (Visibility::Internal, k8s::ServiceType::ClusterIP),
            (Visibility::External, k8s::ServiceType::LoadBalancer),
        ]
        .into_iter()
        .filter_map(|(visibility, type_)| {
            let ports: Vec<k8s::ServicePort> = service
                .ports()
                .filter(|p| p.visibility == visibility)
                .map(|p| k8s::ServicePort {
                    name: format!("port-{}", p.mapping.service_port),
                    port: p.mapping.service_port,
                    target_port: p.mapping.container_port,
                    protocol: p.mapping.protocol,
                })
                .collect();

            (!ports.is_empty()).then(|| {
                k8s::Service::new(
                    ObjectMeta::new(endpoint_name(service, visibility))
                        .with_labels(labels(service)),
                    k8s::ServiceSpec {
                        type_,
                        selector: selector(service),
                        ports,
                    },
                )
            })
        })
        .collect()
    }

    /// Creates the ingress of a service, if any port declares a host
    ///
    /// Paths are grouped into one rule per host, hosts in first-seen order.
    #[must_use]
    pub fn create_ingress(&self, service: &Service) -> Option<k8s::Ingress> {
        let mut rules: Vec<k8s::IngressRule> = Vec::new();

        for port in service.ports() {
            let Some(route) = &port.ingress else {
                continue;
            };
            let path = k8s::HttpIngressPath::new(
                &route.path,
                endpoint_name(service, port.visibility),
                port.mapping.service_port,
            );

            match rules.iter_mut().find(|rule| rule.host == route.host) {
                Some(rule) => rule.http.paths.push(path),
                None => rules.push(k8s::IngressRule {
                    host: route.host.clone(),
                    http: k8s::HttpIngressRuleValue { paths: vec![path] },
                }),
            }
        }

        (!rules.is_empty()).then(|| {
            k8s::Ingress::new(
                ObjectMeta::new(service.name.as_str()).with_labels(labels(service)),
                rules,
            )
        })
    }

    /// Creates the Kubernetes workload of a service
    #[must_use]
    pub fn create_deployment(&self, service: &Service) -> k8s::Deployment {
        deployment(service, self.create_pod_template(service))
    }

    /// Creates the pod template shared by every workload kind
    #[must_use]
    pub fn create_pod_template(&self, service: &Service) -> k8s::PodTemplateSpec {
        let containers = service
            .containers
            .iter()
            .enumerate()
            .map(|(i, container)| create_container(service, i, container))
            .collect();

        k8s::PodTemplateSpec {
            metadata: ObjectMeta::default().with_labels(labels(service)),
            spec: k8s::PodSpec {
                containers,
                volumes: pod_volumes(service),
            },
        }
    }

    /// Creates the claim of a root volume
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Internal`] for an access mode validation
    /// should have rejected.
    pub fn create_claim(
        &self,
        volume: &Volume,
    ) -> Result<k8s::PersistentVolumeClaim, TransformError> {
        if !ACCESS_MODES.contains(&volume.access_mode.as_str()) {
            return Err(TransformError::Internal {
                reason: format!(
                    "unsupported access mode {:?} on volume {:?}",
                    volume.access_mode, volume.name.as_str()
                ),
            });
        }

        let metadata = match &volume.storage_class {
            Some(class) => ObjectMeta::new(volume.name.as_str())
                .with_annotation(k8s::STORAGE_CLASS_ANNOTATION, class.as_str()),
            None => ObjectMeta::new(volume.name.as_str()),
        };

        Ok(k8s::PersistentVolumeClaim::new(
            metadata,
            volume.access_mode.as_str(),
            volume.size.as_str(),
        ))
    }

    /// Creates a secret store, materializing every entry into bytes
    ///
    /// # Errors
    ///
    /// Fails when a `file` source cannot be read or a `base64` source does
    /// not decode.
    pub fn create_secret(&self, secret: &Secret) -> Result<k8s::Secret, TransformError> {
        let mut data = BTreeMap::new();

        for entry in &secret.data {
            let bytes = match &entry.source {
                SecretSource::Plaintext(text) => text.as_bytes().to_vec(),
                SecretSource::Base64(text) => {
                    let compact: String = text.split_ascii_whitespace().collect();
                    STANDARD
                        .decode(compact)
                        .map_err(|source| TransformError::MalformedBase64 {
                            secret: secret.name.to_string(),
                            key: entry.key.clone(),
                            source,
                        })?
                }
                SecretSource::File(path) => {
                    let path = self.resolve(path)?;
                    std::fs::read(&path)
                        .map_err(|source| TransformError::SecretFile { path, source })?
                }
            };
            if data.insert(entry.key.clone(), bytes).is_some() {
                tracing::warn!(
                    secret = %secret.name,
                    key = %entry.key,
                    "duplicate secret key, last entry wins"
                );
            }
        }

        Ok(k8s::Secret::new(ObjectMeta::new(secret.name.as_str()), data))
    }

    fn resolve(&self, path: &std::path::Path) -> Result<PathBuf, TransformError> {
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        match (self.origin.base_dir(), &self.origin) {
            (Some(dir), _) => Ok(dir.join(path)),
            (None, origin) => Err(TransformError::RelativeSecretFile {
                path: path.to_path_buf(),
                url: origin.to_string(),
            }),
        }
    }
}

impl Transformer for KubernetesTransformer {
    fn transform(&self, document: &Document) -> Result<Vec<Resource>, TransformError> {
        self.transform_with(document, |service, template| {
            Resource::Deployment(deployment(service, template))
        })
    }
}

fn deployment(service: &Service, template: k8s::PodTemplateSpec) -> k8s::Deployment {
    k8s::Deployment::new(
        ObjectMeta::new(service.name.as_str()).with_labels(labels(service)),
        k8s::DeploymentSpec {
            replicas: service.replicas,
            selector: k8s::LabelSelector {
                match_labels: selector(service),
            },
            strategy: k8s::DeploymentStrategy::rolling_update(),
            template,
        },
    )
}

/// Name of the endpoint object carrying ports of `visibility`
pub(super) fn endpoint_name(service: &Service, visibility: Visibility) -> String {
    match visibility {
        Visibility::Internal => service.name.to_string(),
        Visibility::External => format!("{}-external", service.name),
    }
}

/// Service labels plus the service label, which always wins
pub(super) fn labels(service: &Service) -> BTreeMap<String, String> {
    let mut labels = service.labels.clone();
    labels.insert(SERVICE_LABEL.to_string(), service.name.to_string());
    labels
}

pub(super) fn selector(service: &Service) -> BTreeMap<String, String> {
    BTreeMap::from([(SERVICE_LABEL.to_string(), service.name.to_string())])
}

fn create_container(service: &Service, index: usize, container: &Container) -> k8s::Container {
    let env = container
        .env
        .iter()
        .map(|var| match &var.source {
            EnvSource::Value(value) => k8s::EnvVar::literal(&var.key, value),
            EnvSource::Secret(secret) => {
                k8s::EnvVar::from_secret(&var.key, &secret.secret_name, &secret.data_key)
            }
        })
        .collect();

    let ports = container
        .ports
        .iter()
        .map(|p| k8s::ContainerPort {
            name: format!("port-{}", p.mapping.container_port),
            container_port: p.mapping.container_port,
            protocol: p.mapping.protocol,
        })
        .collect();

    let volume_mounts = container
        .mounts
        .iter()
        .map(|mount| match &mount.source {
            MountSource::Secret(secret) => k8s::VolumeMount {
                name: secret.volume_name(),
                mount_path: mount.mount_path.clone(),
                sub_path: mount.sub_path.clone(),
                read_only: Some(true),
            },
            MountSource::Volume(name) => k8s::VolumeMount {
                name: name.to_string(),
                mount_path: mount.mount_path.clone(),
                sub_path: mount.sub_path.clone(),
                read_only: mount.read_only,
            },
        })
        .collect();

    let health = container.health.as_ref();

    k8s::Container {
        name: format!("{}-{index}", service.name),
        image: container.image.clone(),
        env,
        ports,
        volume_mounts,
        liveness_probe: health.and_then(|h| h.liveness.clone()),
        readiness_probe: health.and_then(|h| h.readiness.clone()),
    }
}

/// Volumes referenced by mounts in first-seen order, then every emptyDir
///
/// Mounts of the same secret share one `<secret>-secret` volume listing all
/// mounted keys. Claim volumes are named after the claim.
fn pod_volumes(service: &Service) -> Vec<k8s::Volume> {
    let mut volumes: Vec<k8s::Volume> = Vec::new();

    for mount in service.containers.iter().flat_map(|c| &c.mounts) {
        match &mount.source {
            MountSource::Secret(secret) => {
                let existing = volumes
                    .iter_mut()
                    .filter_map(|v| v.secret.as_mut())
                    .find(|source| source.secret_name == secret.secret_name);
                match existing {
                    Some(source) => {
                        if !source.items.iter().any(|item| item.key == secret.data_key) {
                            source.items.push(k8s::KeyToPath::same(&secret.data_key));
                        }
                    }
                    None => volumes.push(k8s::Volume::from_secret(
                        secret.volume_name(),
                        &secret.secret_name,
                        &secret.data_key,
                    )),
                }
            }
            MountSource::Volume(name) if service.has_empty_dir(name.as_str()) => {}
            MountSource::Volume(name) => {
                let claimed = volumes
                    .iter()
                    .filter_map(|v| v.persistent_volume_claim.as_ref())
                    .any(|claim| claim.claim_name == name.as_str());
                if !claimed {
                    volumes.push(k8s::Volume::from_pvc(name.as_str()));
                }
            }
        }
    }

    volumes.extend(
        service
            .empty_dir_volumes
            .iter()
            .map(|v| k8s::Volume::from_empty_dir(v.name.as_str())),
    );
    volumes
}
