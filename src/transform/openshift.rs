//! OpenShift transformer
//!
//! Same objects as the Kubernetes transformer except the workload, which
//! becomes a `DeploymentConfig`. Ingress objects are kept; the platform
//! turns them into routes.

use super::k8s::{self, ObjectMeta};
use super::kubernetes::{KubernetesTransformer, labels, selector};
use super::{Resource, Transformer};
use crate::errors::TransformError;
use crate::object::{Document, Service};

/// Backend for generating OpenShift manifests
#[derive(Debug, Clone, Default)]
pub struct OpenShiftTransformer {
    kubernetes: KubernetesTransformer,
}

impl OpenShiftTransformer {
    /// Wraps a configured Kubernetes transformer
    #[must_use]
    pub fn new(kubernetes: KubernetesTransformer) -> Self {
        Self { kubernetes }
    }

    /// Creates the OpenShift workload of a service
    #[must_use]
    pub fn create_deployment_config(&self, service: &Service) -> k8s::DeploymentConfig {
        deployment_config(service, self.kubernetes.create_pod_template(service))
    }
}

impl Transformer for OpenShiftTransformer {
    fn transform(&self, document: &Document) -> Result<Vec<Resource>, TransformError> {
        self.kubernetes
            .transform_with(document, |service, template| {
                Resource::DeploymentConfig(deployment_config(service, template))
            })
    }
}

fn deployment_config(service: &Service, template: k8s::PodTemplateSpec) -> k8s::DeploymentConfig {
    k8s::DeploymentConfig::new(
        ObjectMeta::new(service.name.as_str()).with_labels(labels(service)),
        k8s::DeploymentConfigSpec {
            replicas: service.replicas,
            selector: selector(service),
            strategy: k8s::DeploymentStrategy::rolling(),
            triggers: vec![k8s::DeploymentTrigger::config_change()],
            template,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{Input, Origin, decode};
    use pretty_assertions::assert_eq;

    const DOCUMENT: &str = "version: 0.1-dev\nservices:\n- name: web\n  replicas: 2\n  containers:\n  - image: nginx\n    ports:\n    - port: 8080:80\n      type: external\n";

    #[test]
    fn test_workload_is_deployment_config() {
        let document = decode(&Input::new(DOCUMENT, Origin::Stdin)).unwrap();
        let resources = OpenShiftTransformer::default().transform(&document).unwrap();

        let kinds: Vec<&str> = resources.iter().map(Resource::kind).collect();
        assert_eq!(kinds, vec!["Service", "DeploymentConfig"]);

        let Resource::DeploymentConfig(config) = &resources[1] else {
            panic!("expected a deployment config, got {}", resources[1]);
        };
        assert_eq!(config.api_version, "apps.openshift.io/v1");
        assert_eq!(config.spec.replicas, Some(2));
        assert_eq!(config.spec.strategy, k8s::DeploymentStrategy::rolling());
        assert_eq!(config.spec.triggers, vec![k8s::DeploymentTrigger::config_change()]);
        assert_eq!(config.spec.selector, selector(&document.services[0]));
    }

    #[test]
    fn test_pod_template_matches_kubernetes() {
        let document = decode(&Input::new(DOCUMENT, Origin::Stdin)).unwrap();
        let service = &document.services[0];
        let kubernetes = KubernetesTransformer::new();

        assert_eq!(
            OpenShiftTransformer::new(kubernetes.clone())
                .create_deployment_config(service)
                .spec
                .template,
            kubernetes.create_deployment(service).spec.template
        );
    }
}
