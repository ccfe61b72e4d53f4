//! Semantic validation of decoded documents
//!
//! Runs after decoding and checks what a single node cannot see on its
//! own: name and value syntax, numeric ranges, and references between
//! mounts, volumes and secrets. Validation is fail-fast: the first
//! violation is returned, qualified with its path.
//!
//! Secret references are checked leniently. A `secretRef` that names no
//! root secret only logs a warning, since the secret may already exist on
//! the platform.

pub mod rules;

use crate::errors::ValidationError;
use crate::object::{Container, Document, EnvSource, MountSource, SecretRef, Service, Volume};
use std::collections::HashSet;

/// Validation result type
pub type ValidationResult<T = ()> = Result<T, ValidationError>;

/// Trait for types that can be validated
#[allow(clippy::missing_errors_doc)]
pub trait Validate {
    /// Type of validation error
    type Error;

    /// Validates this value
    fn validate(&self) -> Result<(), Self::Error>;
}

impl Validate for Document {
    type Error = ValidationError;

    fn validate(&self) -> ValidationResult {
        let mut ctx = ValidationContext::new();
        validate_document(self, &mut ctx)?;
        tracing::debug!(services = self.services.len(), "document is valid");
        Ok(())
    }
}

/// Validation context for nested validations
#[derive(Debug, Default)]
pub struct ValidationContext {
    path: Vec<String>,
}

impl ValidationContext {
    /// Creates a new validation context
    #[must_use]
    pub fn new() -> Self {
        Self { path: Vec::new() }
    }

    /// Pushes a path component
    pub fn push(&mut self, component: impl ToString) {
        self.path.push(component.to_string());
    }

    /// Pops a path component
    pub fn pop(&mut self) {
        self.path.pop();
    }

    /// Gets the current path as a string
    #[must_use]
    pub fn path(&self) -> String {
        self.path.join(".")
    }

    /// Wraps an error with the current path
    #[must_use]
    pub fn wrap(&self, error: ValidationError) -> ValidationError {
        if self.path.is_empty() {
            error
        } else {
            ValidationError::WithPath {
                path: self.path(),
                error: Box::new(error),
            }
        }
    }

    /// Runs `check` with `component` appended to the path
    ///
    /// An error coming back unqualified is wrapped with the full path.
    pub fn at<T>(
        &mut self,
        component: impl ToString,
        check: impl FnOnce(&mut Self) -> ValidationResult<T>,
    ) -> ValidationResult<T> {
        self.push(component);
        let result = check(self).map_err(|error| match error {
            ValidationError::WithPath { .. } => error,
            error => self.wrap(error),
        });
        self.pop();
        result
    }
}

fn validate_document(document: &Document, ctx: &mut ValidationContext) -> ValidationResult {
    let secret_refs = ctx.at("services", |ctx| {
        let mut refs = Vec::new();
        for (i, service) in document.services.iter().enumerate() {
            ctx.at(i, |ctx| validate_service(document, service, ctx, &mut refs))?;
        }
        Ok(refs)
    })?;

    ctx.at("volumes", |ctx| {
        for (i, volume) in document.volumes.iter().enumerate() {
            ctx.at(i, |ctx| validate_volume(volume, ctx))?;
        }
        Ok(())
    })?;

    ctx.at("secrets", |ctx| {
        for (i, secret) in document.secrets.iter().enumerate() {
            ctx.at(i, |ctx| ctx.at("name", |_| rules::validate_name(secret.name.as_str())))?;
        }
        Ok(())
    })?;

    warn_unresolved_secrets(document, &secret_refs);
    Ok(())
}

fn validate_service<'a>(
    document: &Document,
    service: &'a Service,
    ctx: &mut ValidationContext,
    secret_refs: &mut Vec<&'a SecretRef>,
) -> ValidationResult {
    ctx.at("name", |_| rules::validate_name(service.name.as_str()))?;

    if let Some(replicas) = service.replicas
        && replicas < 0
    {
        return ctx.at("replicas", |_| {
            Err(ValidationError::NegativeReplicas { value: replicas })
        });
    }

    ctx.at("labels", |ctx| {
        for (key, value) in &service.labels {
            ctx.at(key, |_| rules::validate_label_value(key, value))?;
        }
        Ok(())
    })?;

    ctx.at("emptyDirVolumes", |ctx| {
        for (i, volume) in service.empty_dir_volumes.iter().enumerate() {
            ctx.at(i, |ctx| ctx.at("name", |_| rules::validate_name(volume.name.as_str())))?;
        }
        Ok(())
    })?;

    ctx.at("containers", |ctx| {
        for (i, container) in service.containers.iter().enumerate() {
            ctx.at(i, |ctx| {
                validate_container(document, service, i, container, ctx, secret_refs)
            })?;
        }
        Ok(())
    })
}

fn validate_container<'a>(
    document: &Document,
    service: &Service,
    index: usize,
    container: &'a Container,
    ctx: &mut ValidationContext,
    secret_refs: &mut Vec<&'a SecretRef>,
) -> ValidationResult {
    ctx.at("env", |ctx| {
        for (i, var) in container.env.iter().enumerate() {
            ctx.at(i, |_| rules::validate_env_var(var))?;
            if let EnvSource::Secret(secret) = &var.source {
                secret_refs.push(secret);
            }
        }
        Ok(())
    })?;

    ctx.at("mounts", |ctx| {
        let mut seen = HashSet::new();
        for (i, mount) in container.mounts.iter().enumerate() {
            ctx.at(i, |ctx| {
                ctx.at("mountPath", |_| {
                    rules::validate_mount_path(&mount.mount_path)?;
                    if seen.insert(mount.mount_path.as_str()) {
                        Ok(())
                    } else {
                        Err(ValidationError::DuplicateMountPath {
                            path: mount.mount_path.clone(),
                        })
                    }
                })?;

                match &mount.source {
                    MountSource::Volume(name) => {
                        let resolved = document.volume(name.as_str()).is_some()
                            || service.has_empty_dir(name.as_str());
                        if !resolved {
                            return ctx.at("volumeRef", |_| {
                                Err(ValidationError::UnresolvedVolume {
                                    service: service.name.to_string(),
                                    container: index,
                                    volume: name.to_string(),
                                })
                            });
                        }
                    }
                    MountSource::Secret(secret) => {
                        let volume = secret.volume_name();
                        if uses_volume_name(service, &volume) {
                            return ctx.at("secretRef", |_| {
                                Err(ValidationError::VolumeNameConflict { volume })
                            });
                        }
                        secret_refs.push(secret);
                    }
                }
                Ok(())
            })?;
        }
        Ok(())
    })?;

    if let Some(health) = &container.health {
        ctx.at("health", |ctx| {
            if let Some(probe) = &health.readiness {
                ctx.at("readinessProbe", |_| rules::validate_probe(probe))?;
            }
            if let Some(probe) = &health.liveness {
                ctx.at("livenessProbe", |_| rules::validate_probe(probe))?;
            }
            Ok(())
        })?;
    }

    Ok(())
}

/// Whether an emptyDir or claim volume of `service` is called `name`
fn uses_volume_name(service: &Service, name: &str) -> bool {
    service.has_empty_dir(name)
        || service
            .containers
            .iter()
            .flat_map(|c| &c.mounts)
            .any(|m| matches!(&m.source, MountSource::Volume(v) if v.as_str() == name))
}

fn validate_volume(volume: &Volume, ctx: &mut ValidationContext) -> ValidationResult {
    ctx.at("name", |_| rules::validate_name(volume.name.as_str()))?;
    ctx.at("size", |_| rules::validate_quantity(&volume.size))?;
    ctx.at("accessMode", |_| rules::validate_access_mode(&volume.access_mode))?;
    if let Some(class) = &volume.storage_class {
        ctx.at("storageClass", |_| rules::validate_name(class.as_str()))?;
    }
    Ok(())
}

fn warn_unresolved_secrets(document: &Document, secret_refs: &[&SecretRef]) {
    if secret_refs.is_empty() {
        return;
    }
    if document.secrets.is_empty() {
        tracing::warn!(
            references = secret_refs.len(),
            "no root secrets declared, secret references must exist on the platform"
        );
        return;
    }
    for reference in secret_refs {
        match document.secret(&reference.secret_name) {
            None => tracing::warn!(
                secret = %reference.secret_name,
                "secret is not declared in the document, it must exist on the platform"
            ),
            Some(secret) if !secret.has_key(&reference.data_key) => tracing::warn!(
                secret = %reference.secret_name,
                key = %reference.data_key,
                "secret does not declare the referenced key"
            ),
            Some(_) => {}
        }
    }
}
