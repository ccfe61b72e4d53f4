//! End-to-end conversion of fixture documents

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use stackform::infrastructure::{read_input, writer};
use stackform::{Config, Distro, Error, Input, Origin, Resource};
use std::path::PathBuf;

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .display()
        .to_string()
}

fn convert(name: &str, distro: Distro) -> Vec<Resource> {
    let input = read_input(&fixture(name), &Config::default()).unwrap();
    stackform::convert(&input, distro).unwrap()
}

fn to_json(resource: &Resource) -> Value {
    serde_json::to_value(resource).unwrap()
}

#[test]
fn test_frontend_service() {
    let resources = convert("frontend.yaml", Distro::Kubernetes);
    assert_eq!(resources.len(), 2);

    assert_eq!(
        to_json(&resources[0]),
        json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": {
                "name": "frontend-external",
                "labels": {"service": "frontend"}
            },
            "spec": {
                "type": "LoadBalancer",
                "selector": {"service": "frontend"},
                "ports": [{"name": "port-80", "port": 80, "targetPort": 8080}]
            }
        })
    );

    let deployment = to_json(&resources[1]);
    assert_eq!(deployment["kind"], "Deployment");
    assert_eq!(deployment["metadata"]["name"], "frontend");
    assert_eq!(
        deployment["spec"]["template"]["spec"],
        json!({
            "containers": [{
                "name": "frontend-0",
                "image": "tomaskral/kompose-demo-frontend:test",
                "env": [{"name": "KEY", "value": "value"}],
                "ports": [{"name": "port-8080", "containerPort": 8080}]
            }]
        })
    );
}

#[test]
fn test_full_document_order() {
    let resources = convert("shop.yaml", Distro::Kubernetes);
    let names: Vec<String> = resources.iter().map(ToString::to_string).collect();
    assert_eq!(
        names,
        vec![
            "Service/web",
            "Service/web-external",
            "Ingress/web",
            "Deployment/web",
            "PersistentVolumeClaim/data",
            "Secret/db",
            "Secret/tls",
        ]
    );
}

#[test]
fn test_full_document_routes() {
    let resources = convert("shop.yaml", Distro::Kubernetes);
    assert_eq!(
        to_json(&resources[2])["spec"],
        json!({
            "rules": [{
                "host": "shop.example.com",
                "http": {
                    "paths": [
                        {
                            "path": "/",
                            "pathType": "ImplementationSpecific",
                            "backend": {"service": {"name": "web-external", "port": {"number": 80}}}
                        },
                        {
                            "path": "/admin",
                            "pathType": "ImplementationSpecific",
                            "backend": {"service": {"name": "web-external", "port": {"number": 81}}}
                        }
                    ]
                }
            }]
        })
    );
}

#[test]
fn test_full_document_workload() {
    let resources = convert("shop.yaml", Distro::Kubernetes);
    let deployment = to_json(&resources[3]);

    assert_eq!(deployment["spec"]["replicas"], 2);
    assert_eq!(
        deployment["metadata"]["labels"],
        json!({"service": "web", "tier": "frontend"})
    );

    let pod = &deployment["spec"]["template"]["spec"];
    assert_eq!(
        pod["volumes"],
        json!([
            {"name": "data", "persistentVolumeClaim": {"claimName": "data"}},
            {
                "name": "tls-secret",
                "secret": {
                    "secretName": "tls",
                    "items": [{"key": "cert", "path": "cert"}, {"key": "key", "path": "key"}]
                }
            },
            {"name": "cache", "emptyDir": {}}
        ])
    );

    let container = &pod["containers"][0];
    assert_eq!(
        container["env"][1],
        json!({
            "name": "DB_PASSWORD",
            "valueFrom": {"secretKeyRef": {"name": "db", "key": "password"}}
        })
    );
    assert_eq!(
        container["volumeMounts"][2],
        json!({
            "name": "tls-secret",
            "mountPath": "/etc/tls/cert",
            "subPath": "cert",
            "readOnly": true
        })
    );
    assert_eq!(
        container["readinessProbe"],
        json!({"httpGet": {"path": "/healthz", "port": 8080}, "periodSeconds": 5})
    );
}

#[test]
fn test_full_document_storage() {
    let resources = convert("shop.yaml", Distro::Kubernetes);

    assert_eq!(
        to_json(&resources[4]),
        json!({
            "apiVersion": "v1",
            "kind": "PersistentVolumeClaim",
            "metadata": {
                "name": "data",
                "annotations": {"volume.beta.kubernetes.io/storage-class": "fast"}
            },
            "spec": {
                "accessModes": ["ReadWriteOnce"],
                "resources": {"requests": {"storage": "1Gi"}}
            }
        })
    );
    assert_eq!(to_json(&resources[5])["data"], json!({"password": "aHVudGVyMg=="}));
    assert_eq!(
        to_json(&resources[6])["data"],
        json!({"cert": "Y2VydGlmaWNhdGU=", "key": "c2VjcmV0"})
    );
}

#[test]
fn test_openshift_profile() {
    let kubernetes = convert("shop.yaml", Distro::Kubernetes);
    let openshift = convert("shop.yaml", Distro::OpenShift);

    let kinds: Vec<&str> = openshift.iter().map(Resource::kind).collect();
    assert_eq!(
        kinds,
        vec![
            "Service",
            "Service",
            "Ingress",
            "DeploymentConfig",
            "PersistentVolumeClaim",
            "Secret",
            "Secret",
        ]
    );

    let config = to_json(&openshift[3]);
    assert_eq!(config["apiVersion"], "apps.openshift.io/v1");
    assert_eq!(config["spec"]["selector"], json!({"service": "web"}));
    assert_eq!(config["spec"]["triggers"], json!([{"type": "ConfigChange"}]));
    assert_eq!(
        config["spec"]["template"],
        to_json(&kubernetes[3])["spec"]["template"]
    );
}

#[test]
fn test_render_stream() {
    let resources = convert("frontend.yaml", Distro::Kubernetes);
    let yaml = writer::render(&resources).unwrap();

    let documents: Vec<Value> = serde_yaml::Deserializer::from_str(&yaml)
        .map(|doc| serde::Deserialize::deserialize(doc).unwrap())
        .collect();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0], to_json(&resources[0]));
    assert_eq!(documents[1], to_json(&resources[1]));
}

#[test]
fn test_relative_secret_file_from_url_input() {
    let text = std::fs::read_to_string(fixture("shop.yaml")).unwrap();
    let input = Input::new(text, Origin::Url("https://example.com/shop.yaml".to_string()));

    let error = stackform::convert(&input, Distro::Kubernetes).unwrap_err();
    assert!(matches!(error, Error::Transform(_)), "{error}");
}

#[test]
fn test_no_partial_output_on_error() {
    let input = Input::new(
        "version: 0.1-dev\nservices:\n- name: web\n  replicas: -1\n  containers:\n  - image: nginx\n",
        Origin::Stdin,
    );

    let error = stackform::convert(&input, Distro::Kubernetes).unwrap_err();
    assert!(matches!(error, Error::Validation(_)), "{error}");
    assert!(error.to_string().contains("services.0.replicas"), "{error}");
}
