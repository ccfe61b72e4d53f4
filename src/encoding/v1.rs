//! Decoder for format version `0.1-dev`

use super::grammar::{parse_env_assignment, parse_port_mapping, parse_secret_ref};
use super::strict::{Field, ROOT, Schema, StrictObject, scalar_string};
use crate::errors::{DecodeError, GrammarError};
use crate::object::{
    Container, Document, EmptyDirVolume, EnvVar, Health, HostPath, Mount, MountSource, Name,
    Port, Probe, Secret, SecretData, SecretRef, SecretSource, Service, Visibility, Volume,
};
use serde_yaml::Value;
use std::path::PathBuf;

const DOCUMENT: Schema = &[
    Field::required("version"),
    Field::required("services"),
    Field::optional("volumes"),
    Field::optional("secrets"),
];

const SERVICE: Schema = &[
    Field::required("name"),
    Field::required("containers"),
    Field::optional("replicas"),
    Field::optional("emptyDirVolumes"),
    Field::optional("labels"),
];

const CONTAINER: Schema = &[
    Field::required("image"),
    Field::optional("env"),
    Field::optional("ports"),
    Field::optional("mounts"),
    Field::optional("health"),
];

const ENV: Schema = &[
    Field::required("name"),
    Field::optional("value"),
    Field::optional("secretRef"),
];

const PORT: Schema = &[
    Field::required("port"),
    Field::optional("type"),
    Field::optional("host"),
    Field::optional("path"),
];

const MOUNT: Schema = &[
    Field::optional("volumeRef"),
    Field::optional("secretRef"),
    Field::required("mountPath"),
    Field::optional("volumeSubPath"),
    Field::optional("readOnly"),
];

const HEALTH: Schema = &[
    Field::optional("readinessProbe"),
    Field::optional("livenessProbe"),
];

const EMPTY_DIR: Schema = &[Field::required("name")];

const VOLUME: Schema = &[
    Field::required("name"),
    Field::required("size"),
    Field::required("accessMode"),
    Field::optional("storageClass"),
];

const SECRET: Schema = &[Field::required("name"), Field::required("data")];

const SECRET_DATA: Schema = &[
    Field::required("key"),
    Field::optional("plaintext"),
    Field::optional("base64"),
    Field::optional("file"),
];

const ENV_SOURCES: &[&str] = &["value", "secretRef"];
const MOUNT_SOURCES: &[&str] = &["volumeRef", "secretRef"];
const SECRET_SOURCES: &[&str] = &["plaintext", "base64", "file"];

fn grammar(path: String) -> impl FnOnce(GrammarError) -> DecodeError {
    move |source| DecodeError::Grammar { path, source }
}

fn exactly_one(
    object: &StrictObject<'_>,
    fields: &'static [&'static str],
) -> Result<(), DecodeError> {
    match object.count_present(fields) {
        1 => Ok(()),
        found => Err(DecodeError::OneOf {
            path: object.path().to_string(),
            fields,
            found,
        }),
    }
}

fn secret_ref(object: &StrictObject<'_>) -> Result<SecretRef, DecodeError> {
    let raw = object.required_string("secretRef")?;
    parse_secret_ref(&raw).map_err(grammar(object.field_path("secretRef")))
}

/// Decodes a whole document
///
/// The caller has already checked that `version` is the supported one.
pub fn decode(root: &Value) -> Result<Document, DecodeError> {
    let object = StrictObject::open(root, ROOT, DOCUMENT)?;

    let services = object
        .sequence("services")?
        .into_iter()
        .map(|(path, node)| decode_service(node, &path))
        .collect::<Result<Vec<_>, _>>()?;

    let volumes = object
        .sequence("volumes")?
        .into_iter()
        .map(|(path, node)| decode_volume(node, &path))
        .collect::<Result<Vec<_>, _>>()?;

    let secrets = object
        .sequence("secrets")?
        .into_iter()
        .map(|(path, node)| decode_secret(node, &path))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Document {
        version: object.required_string("version")?,
        services,
        volumes,
        secrets,
    })
}

fn decode_service(node: &Value, path: &str) -> Result<Service, DecodeError> {
    let object = StrictObject::open(node, path, SERVICE)?;

    let containers = object
        .sequence("containers")?
        .into_iter()
        .map(|(path, node)| decode_container(node, &path))
        .collect::<Result<Vec<_>, _>>()?;

    let empty_dir_volumes = object
        .sequence("emptyDirVolumes")?
        .into_iter()
        .map(|(path, node)| {
            let volume = StrictObject::open(node, &path, EMPTY_DIR)?;
            Ok(EmptyDirVolume {
                name: Name::new(volume.required_string("name")?),
            })
        })
        .collect::<Result<Vec<_>, DecodeError>>()?;

    Ok(Service {
        name: Name::new(object.required_string("name")?),
        containers,
        replicas: object.i32("replicas")?,
        empty_dir_volumes,
        labels: object.string_map("labels")?,
    })
}

fn decode_container(node: &Value, path: &str) -> Result<Container, DecodeError> {
    let object = StrictObject::open(node, path, CONTAINER)?;

    let env = object
        .sequence("env")?
        .into_iter()
        .map(|(path, node)| decode_env(node, &path))
        .collect::<Result<Vec<_>, _>>()?;

    let ports = object
        .sequence("ports")?
        .into_iter()
        .map(|(path, node)| decode_port(node, &path))
        .collect::<Result<Vec<_>, _>>()?;

    let mounts = object
        .sequence("mounts")?
        .into_iter()
        .map(|(path, node)| decode_mount(node, &path))
        .collect::<Result<Vec<_>, _>>()?;

    let health = object
        .get("health")
        .map(|node| decode_health(node, &object.field_path("health")))
        .transpose()?;

    Ok(Container {
        image: object.required_string("image")?,
        env,
        ports,
        mounts,
        health,
    })
}

fn decode_env(node: &Value, path: &str) -> Result<EnvVar, DecodeError> {
    if let Value::String(raw) = node {
        return parse_env_assignment(raw).map_err(grammar(path.to_string()));
    }
    if !node.is_mapping() {
        return Err(DecodeError::InvalidType {
            path: path.to_string(),
            expected: "a KEY=value string or a mapping",
        });
    }

    let object = StrictObject::open(node, path, ENV)?;
    exactly_one(&object, ENV_SOURCES)?;
    let key = object.required_string("name")?;

    match object.string("value")? {
        Some(value) => Ok(EnvVar::literal(key, value)),
        None => Ok(EnvVar::from_secret(key, secret_ref(&object)?)),
    }
}

fn decode_port(node: &Value, path: &str) -> Result<Port, DecodeError> {
    let object = StrictObject::open(node, path, PORT)?;

    let raw = object.required_string("port")?;
    let mapping = parse_port_mapping(&raw).map_err(grammar(object.field_path("port")))?;

    let visibility = match object.string("type")? {
        None => Visibility::default(),
        Some(value) => value.parse().map_err(|value| DecodeError::InvalidValue {
            path: object.field_path("type"),
            value,
            expected: Visibility::VARIANTS,
        })?,
    };

    let ingress = match (object.string("host")?, object.string("path")?) {
        (None, None) => None,
        (None, Some(_)) => {
            return Err(DecodeError::PathWithoutHost {
                path: path.to_string(),
            });
        }
        (Some(host), path) => Some(HostPath {
            host,
            path: path.unwrap_or_default(),
        }),
    };

    Ok(Port {
        mapping,
        visibility,
        ingress,
    })
}

fn decode_mount(node: &Value, path: &str) -> Result<Mount, DecodeError> {
    let object = StrictObject::open(node, path, MOUNT)?;
    exactly_one(&object, MOUNT_SOURCES)?;

    let source = match object.string("volumeRef")? {
        Some(name) => MountSource::Volume(Name::new(name)),
        None => MountSource::Secret(secret_ref(&object)?),
    };

    Ok(Mount {
        source,
        mount_path: object.required_string("mountPath")?,
        sub_path: object.string("volumeSubPath")?,
        read_only: object.bool("readOnly")?,
    })
}

fn decode_health(node: &Value, path: &str) -> Result<Health, DecodeError> {
    let object = StrictObject::open(node, path, HEALTH)?;

    let probe = |key: &str| {
        object
            .get(key)
            .map(|node| decode_probe(node, &object.field_path(key)))
            .transpose()
    };

    Ok(Health {
        readiness: probe("readinessProbe")?,
        liveness: probe("livenessProbe")?,
    })
}

/// Probe bodies go through a generic JSON value and then into [`Probe`],
/// which tolerates unknown keys.
fn decode_probe(node: &Value, path: &str) -> Result<Probe, DecodeError> {
    let error = |reason: String| DecodeError::Probe {
        path: path.to_string(),
        reason,
    };
    let json = serde_json::to_value(node).map_err(|e| error(e.to_string()))?;
    serde_json::from_value(json).map_err(|e| error(e.to_string()))
}

fn decode_volume(node: &Value, path: &str) -> Result<Volume, DecodeError> {
    let object = StrictObject::open(node, path, VOLUME)?;

    Ok(Volume {
        name: Name::new(object.required_string("name")?),
        size: object.required_string("size")?,
        access_mode: object.required_string("accessMode")?,
        storage_class: object.string("storageClass")?.map(Name::new),
    })
}

fn decode_secret(node: &Value, path: &str) -> Result<Secret, DecodeError> {
    let object = StrictObject::open(node, path, SECRET)?;

    let data = object
        .sequence("data")?
        .into_iter()
        .map(|(path, node)| decode_secret_data(node, &path))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Secret {
        name: Name::new(object.required_string("name")?),
        data,
    })
}

fn decode_secret_data(node: &Value, path: &str) -> Result<SecretData, DecodeError> {
    let object = StrictObject::open(node, path, SECRET_DATA)?;
    exactly_one(&object, SECRET_SOURCES)?;

    let text = |key: &str| -> Result<String, DecodeError> {
        object
            .get(key)
            .map_or(Ok(String::new()), |value| {
                scalar_string(value, &object.field_path(key))
            })
    };

    let source = if object.has("plaintext") {
        SecretSource::Plaintext(text("plaintext")?)
    } else if object.has("base64") {
        SecretSource::Base64(text("base64")?)
    } else {
        SecretSource::File(PathBuf::from(text("file")?))
    };

    Ok(SecretData {
        key: object.required_string("key")?,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{EnvSource, PortMapping, Protocol};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn decode_str(text: &str) -> Result<Document, DecodeError> {
        let value: Value = serde_yaml::from_str(text).unwrap();
        decode(&value)
    }

    fn service_yaml(container: &str) -> String {
        format!(
            "version: 0.1-dev\nservices:\n- name: web\n  containers:\n  - image: nginx\n{container}"
        )
    }

    #[test]
    fn test_decode_minimal_document() {
        let document = decode_str(&service_yaml("")).unwrap();
        assert_eq!(document.version, "0.1-dev");
        assert_eq!(document.services.len(), 1);
        assert_eq!(document.services[0].name.as_str(), "web");
        assert_eq!(document.services[0].containers[0].image, "nginx");
        assert!(document.volumes.is_empty());
        assert!(document.secrets.is_empty());
    }

    #[test]
    fn test_decode_env_forms() {
        let document = decode_str(&service_yaml(
            "    env:\n    - KEY=value\n    - name: LITERAL\n      value: \"\"\n    - name: PASSWORD\n      secretRef: db/password\n",
        ))
        .unwrap();
        let env = &document.services[0].containers[0].env;
        assert_eq!(env[0], EnvVar::literal("KEY", "value"));
        assert_eq!(env[1], EnvVar::literal("LITERAL", ""));
        assert_eq!(
            env[2].source,
            EnvSource::Secret(SecretRef::new("db", "password"))
        );
    }

    #[rstest]
    #[case("    env:\n    - name: A\n      value: x\n      secretRef: db/password\n", 2)]
    #[case("    env:\n    - name: A\n", 0)]
    fn test_decode_env_requires_exactly_one_source(#[case] container: &str, #[case] found: usize) {
        let error = decode_str(&service_yaml(container)).unwrap_err();
        assert_eq!(
            error,
            DecodeError::OneOf {
                path: "services.0.containers.0.env.0".to_string(),
                fields: ENV_SOURCES,
                found,
            }
        );
    }

    #[test]
    fn test_decode_port_defaults() {
        let document = decode_str(&service_yaml(
            "    ports:\n    - port: 8080:80\n    - port: 53/udp\n      type: external\n      host: example.com\n",
        ))
        .unwrap();
        let ports = &document.services[0].containers[0].ports;

        assert_eq!(ports[0].mapping.container_port, 8080);
        assert_eq!(ports[0].mapping.service_port, 80);
        assert_eq!(ports[0].visibility, Visibility::Internal);
        assert_eq!(ports[0].ingress, None);

        assert_eq!(
            ports[1].mapping,
            PortMapping::same(53).with_protocol(Protocol::Udp)
        );
        assert_eq!(ports[1].visibility, Visibility::External);
        assert_eq!(
            ports[1].ingress,
            Some(HostPath {
                host: "example.com".to_string(),
                path: String::new(),
            })
        );
    }

    #[test]
    fn test_decode_numeric_port() {
        let document = decode_str(&service_yaml("    ports:\n    - port: 8080\n")).unwrap();
        assert_eq!(
            document.services[0].containers[0].ports[0].mapping,
            PortMapping::same(8080)
        );
    }

    #[test]
    fn test_decode_path_requires_host() {
        let error = decode_str(&service_yaml("    ports:\n    - port: 80\n      path: /api\n"))
            .unwrap_err();
        assert_eq!(
            error,
            DecodeError::PathWithoutHost {
                path: "services.0.containers.0.ports.0".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_unknown_visibility() {
        let error = decode_str(&service_yaml("    ports:\n    - port: 80\n      type: public\n"))
            .unwrap_err();
        assert!(matches!(error, DecodeError::InvalidValue { ref value, .. } if value == "public"));
    }

    #[test]
    fn test_decode_port_grammar_error_carries_path() {
        let error = decode_str(&service_yaml("    ports:\n    - port: \"5000:\"\n")).unwrap_err();
        assert!(matches!(
            error,
            DecodeError::Grammar { ref path, source: GrammarError::PortMapping { .. } }
                if path == "services.0.containers.0.ports.0.port"
        ));
    }

    #[rstest]
    #[case("    mounts:\n    - mountPath: /data\n", 0)]
    #[case("    mounts:\n    - volumeRef: data\n      secretRef: db/key\n      mountPath: /data\n", 2)]
    fn test_decode_mount_requires_exactly_one_source(
        #[case] container: &str,
        #[case] found: usize,
    ) {
        let error = decode_str(&service_yaml(container)).unwrap_err();
        assert!(matches!(error, DecodeError::OneOf { found: f, .. } if f == found));
    }

    #[test]
    fn test_decode_mount() {
        let document = decode_str(&service_yaml(
            "    mounts:\n    - volumeRef: data\n      mountPath: /data\n      volumeSubPath: sub\n      readOnly: true\n",
        ))
        .unwrap();
        assert_eq!(
            document.services[0].containers[0].mounts[0],
            Mount {
                source: MountSource::Volume(Name::from("data")),
                mount_path: "/data".to_string(),
                sub_path: Some("sub".to_string()),
                read_only: Some(true),
            }
        );
    }

    #[test]
    fn test_decode_health_is_permissive() {
        let document = decode_str(&service_yaml(
            "    health:\n      livenessProbe:\n        tcpSocket:\n          port: 8080\n        futureField: 1\n",
        ))
        .unwrap();
        let health = document.services[0].containers[0].health.as_ref().unwrap();
        assert!(health.readiness.is_none());
        assert!(health.liveness.as_ref().unwrap().tcp_socket.is_some());
    }

    #[test]
    fn test_decode_health_itself_is_strict() {
        let error = decode_str(&service_yaml("    health:\n      startupProbe: {}\n")).unwrap_err();
        assert!(matches!(
            error,
            DecodeError::ExcessKeys { ref keys, .. } if keys == &["startupProbe"]
        ));
    }

    #[test]
    fn test_decode_probe_type_mismatch() {
        let error = decode_str(&service_yaml(
            "    health:\n      readinessProbe:\n        periodSeconds: often\n",
        ))
        .unwrap_err();
        assert!(matches!(error, DecodeError::Probe { .. }));
    }

    #[test]
    fn test_decode_volumes_and_secrets() {
        let text = format!(
            "{}volumes:\n- name: data\n  size: 1Gi\n  accessMode: ReadWriteOnce\n  storageClass: fast\nsecrets:\n- name: db\n  data:\n  - key: password\n    plaintext: hunter2\n  - key: token\n    base64: aGVsbG8=\n  - key: cert\n    file: certs/tls.crt\n",
            service_yaml("")
        );
        let document = decode_str(&text).unwrap();

        assert_eq!(
            document.volumes[0],
            Volume {
                name: Name::from("data"),
                size: "1Gi".to_string(),
                access_mode: "ReadWriteOnce".to_string(),
                storage_class: Some(Name::from("fast")),
            }
        );
        let data = &document.secrets[0].data;
        assert_eq!(data[0].source, SecretSource::Plaintext("hunter2".to_string()));
        assert_eq!(data[1].source, SecretSource::Base64("aGVsbG8=".to_string()));
        assert_eq!(data[2].source, SecretSource::File(PathBuf::from("certs/tls.crt")));
    }

    #[rstest]
    #[case("  - key: k\n", 0)]
    #[case("  - key: k\n    plaintext: a\n    base64: YQ==\n", 2)]
    #[case("  - key: k\n    plaintext: a\n    base64: YQ==\n    file: f\n", 3)]
    fn test_decode_secret_data_requires_exactly_one_source(
        #[case] data: &str,
        #[case] found: usize,
    ) {
        let text = format!("{}secrets:\n- name: db\n  data:\n{data}", service_yaml(""));
        let error = decode_str(&text).unwrap_err();
        assert!(matches!(error, DecodeError::OneOf { found: f, .. } if f == found));
    }

    #[rstest]
    #[case("version: 0.1-dev\nservices:\n- name: web\n  containers:\n  - image: nginx\n    imagePullPolicy: Always\n", "services.0.containers.0", "imagePullPolicy")]
    #[case("version: 0.1-dev\nservices:\n- name: web\n  replica: 2\n  containers:\n  - image: nginx\n", "services.0", "replica")]
    #[case("version: 0.1-dev\nkind: List\nservices:\n- name: web\n  containers:\n  - image: nginx\n", "(root)", "kind")]
    #[case("version: 0.1-dev\nservices:\n- name: web\n  containers:\n  - image: nginx\nvolumes:\n- name: v\n  size: 1Gi\n  accessMode: ReadWriteOnce\n  class: x\n", "volumes.0", "class")]
    fn test_decode_rejects_excess_keys(#[case] text: &str, #[case] path: &str, #[case] key: &str) {
        assert_eq!(
            decode_str(text).unwrap_err(),
            DecodeError::ExcessKeys {
                path: path.to_string(),
                keys: vec![key.to_string()],
            }
        );
    }

    #[rstest]
    #[case("version: 0.1-dev\nservices:\n- name: web\n  containers:\n  - image: nginx\n    ports:\n    - port: 80\n      protocol: tcp\n", "services.0.containers.0.ports.0", "protocol")]
    #[case("version: 0.1-dev\nservices:\n- name: web\n  containers:\n  - image: nginx\n    env:\n    - name: A\n      value: b\n      valueFrom: c\n", "services.0.containers.0.env.0", "valueFrom")]
    #[case("version: 0.1-dev\nservices:\n- name: web\n  containers:\n  - image: nginx\n    mounts:\n    - volumeRef: cache\n      mountPath: /cache\n      subPath: x\n", "services.0.containers.0.mounts.0", "subPath")]
    #[case("version: 0.1-dev\nservices:\n- name: web\n  emptyDirVolumes:\n  - name: cache\n    medium: Memory\n  containers:\n  - image: nginx\n", "services.0.emptyDirVolumes.0", "medium")]
    #[case("version: 0.1-dev\nservices:\n- name: web\n  containers:\n  - image: nginx\nsecrets:\n- name: db\n  type: Opaque\n  data:\n  - key: k\n    plaintext: v\n", "secrets.0", "type")]
    #[case("version: 0.1-dev\nservices:\n- name: web\n  containers:\n  - image: nginx\nsecrets:\n- name: db\n  data:\n  - key: k\n    plaintext: v\n    mode: 384\n", "secrets.0.data.0", "mode")]
    fn test_decode_rejects_excess_keys_in_nested_nodes(
        #[case] text: &str,
        #[case] path: &str,
        #[case] key: &str,
    ) {
        assert_eq!(
            decode_str(text).unwrap_err(),
            DecodeError::ExcessKeys {
                path: path.to_string(),
                keys: vec![key.to_string()],
            }
        );
    }

    #[rstest]
    #[case("version: 0.1-dev\nservices: []\n", "(root)", "services")]
    #[case("version: 0.1-dev\nservices:\n- name: web\n", "services.0", "containers")]
    #[case("version: 0.1-dev\nservices:\n- containers:\n  - image: nginx\n", "services.0", "name")]
    #[case("version: 0.1-dev\nservices:\n- name: web\n  containers:\n  - env: []\n", "services.0.containers.0", "image")]
    fn test_decode_rejects_missing_required(
        #[case] text: &str,
        #[case] path: &str,
        #[case] field: &'static str,
    ) {
        assert_eq!(
            decode_str(text).unwrap_err(),
            DecodeError::MissingField {
                path: path.to_string(),
                field,
            }
        );
    }

    #[test]
    fn test_decode_labels_and_replicas() {
        let document = decode_str(
            "version: 0.1-dev\nservices:\n- name: web\n  replicas: -1\n  labels:\n    tier: frontend\n    release: 2\n  emptyDirVolumes:\n  - name: cache\n  containers:\n  - image: nginx\n",
        )
        .unwrap();
        let service = &document.services[0];
        assert_eq!(service.replicas, Some(-1));
        assert_eq!(service.labels["tier"], "frontend");
        assert_eq!(service.labels["release"], "2");
        assert!(service.has_empty_dir("cache"));
    }
}
