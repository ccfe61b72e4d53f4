//! Writing resources
//!
//! Resources go either to stdout as one multi-document YAML stream, or to
//! one `<name>-<kind>.yaml` file each inside a directory.

use crate::transform::Resource;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where resources are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Standard output, documents separated by `---`
    Stdout,
    /// One file per resource inside this directory
    Directory(PathBuf),
}

impl Destination {
    /// `-` or an empty path means stdout, anything else a directory
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        if path.as_os_str().is_empty() || path == Path::new("-") {
            Self::Stdout
        } else {
            Self::Directory(path.to_path_buf())
        }
    }
}

/// File name of a resource inside an output directory
#[must_use]
pub fn file_name(resource: &Resource) -> String {
    format!(
        "{}-{}.yaml",
        resource.name(),
        resource.kind().to_lowercase()
    )
}

/// Renders resources as one multi-document YAML stream
///
/// # Errors
///
/// Fails if a resource cannot be serialized.
pub fn render(resources: &[Resource]) -> Result<String> {
    let mut out = String::new();
    for (i, resource) in resources.iter().enumerate() {
        if i > 0 {
            out.push_str("---\n");
        }
        out.push_str(
            &serde_yaml::to_string(resource)
                .with_context(|| format!("Failed to serialize {resource}"))?,
        );
    }
    Ok(out)
}

/// Writes resources to `destination`, returning the files created
///
/// # Errors
///
/// Fails if serialization or any write fails.
pub fn write_resources(resources: &[Resource], destination: &Destination) -> Result<Vec<PathBuf>> {
    match destination {
        Destination::Stdout => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(render(resources)?.as_bytes())
                .context("Failed to write to stdout")?;
            Ok(Vec::new())
        }
        Destination::Directory(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            resources
                .iter()
                .map(|resource| {
                    let path = dir.join(file_name(resource));
                    let yaml = serde_yaml::to_string(resource)
                        .with_context(|| format!("Failed to serialize {resource}"))?;
                    fs::write(&path, yaml)
                        .with_context(|| format!("Failed to write file: {}", path.display()))?;
                    tracing::debug!(path = %path.display(), "wrote resource");
                    Ok(path)
                })
                .collect()
        }
    }
}
