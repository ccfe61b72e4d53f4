//! `stackform convert` - Turn documents into platform manifests

use anyhow::{Context, Result};
use stackform::infrastructure::{Destination, read_input, write_resources};
use stackform::{Config, Document, Input};
use std::path::PathBuf;

/// Reads, validates and converts `files`, writing to `config.output_dir`
///
/// Every document is validated; only the first is converted. Returns the
/// files written, empty when writing to stdout.
pub fn convert(files: &[String], config: &Config) -> Result<Vec<PathBuf>> {
    let documents = load_all(files, config)?;
    let Some((input, document)) = documents.first() else {
        anyhow::bail!("No input documents given");
    };
    if documents.len() > 1 {
        tracing::warn!(
            ignored = documents.len() - 1,
            "only the first document is converted"
        );
    }

    let resources = config
        .distro
        .transformer(input.origin.clone())
        .transform(document)
        .with_context(|| format!("Failed to convert {}", input.origin))?;
    tracing::info!(distro = %config.distro, resources = resources.len(), "converted document");

    let written = write_resources(&resources, &Destination::from_path(&config.output_dir))?;
    for path in &written {
        eprintln!("created file \"{}\"", path.display());
    }
    Ok(written)
}

/// Reads and validates every source in order, stopping at the first failure
pub fn load_all(files: &[String], config: &Config) -> Result<Vec<(Input, Document)>> {
    files
        .iter()
        .map(|source| {
            let input = read_input(source, config)?;
            let document = stackform::load(&input)
                .with_context(|| format!("Invalid document {}", input.origin))?;
            Ok((input, document))
        })
        .collect()
}
