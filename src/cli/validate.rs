//! `stackform validate` - Decode and validate documents

use super::convert::load_all;
use anyhow::Result;
use stackform::Config;

/// Validates every source, returning one `<source>: valid` line per document
pub fn validate(files: &[String], config: &Config) -> Result<Vec<String>> {
    Ok(load_all(files, config)?
        .iter()
        .map(|(input, _)| format!("{}: valid", input.origin))
        .collect())
}
