//! Decoding raw input into a [`Document`]
//!
//! Input is YAML. The `version` key is read first and selects the decoder;
//! only [`SUPPORTED_VERSION`] exists today. Only the first YAML document of
//! a stream is decoded.

pub mod grammar;
pub mod strict;
mod v1;

use crate::errors::DecodeError;
use crate::object::Document;
use serde::Deserialize;
use serde_yaml::Value;
use std::fmt;
use std::path::{Path, PathBuf};

/// The only input format version this crate reads
pub const SUPPORTED_VERSION: &str = "0.1-dev";

/// Where an input came from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Origin {
    /// Standard input
    #[default]
    Stdin,
    /// Fetched over HTTP(S)
    Url(String),
    /// Read from a local file
    File(PathBuf),
}

impl Origin {
    /// Directory that relative paths inside the document resolve against
    ///
    /// `None` means the document has no local directory (it was fetched).
    #[must_use]
    pub fn base_dir(&self) -> Option<PathBuf> {
        match self {
            Self::Stdin => Some(PathBuf::new()),
            Self::Url(_) => None,
            Self::File(path) => Some(
                path.parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
            ),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => write!(f, "<stdin>"),
            Self::Url(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Raw input bytes plus provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    /// Document bytes
    pub data: Vec<u8>,
    /// Where the bytes came from
    pub origin: Origin,
}

impl Input {
    /// Creates an input
    pub fn new(data: impl Into<Vec<u8>>, origin: Origin) -> Self {
        Self {
            data: data.into(),
            origin,
        }
    }
}

/// Decodes `input` into a document
///
/// # Errors
///
/// Returns a [`DecodeError`] for empty or malformed YAML, a missing or
/// unsupported `version`, or any schema or grammar violation.
pub fn decode(input: &Input) -> Result<Document, DecodeError> {
    if input.data.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::EmptyInput);
    }

    let mut documents = serde_yaml::Deserializer::from_slice(&input.data);
    let first = documents.next().ok_or(DecodeError::EmptyInput)?;
    let root = Value::deserialize(first).map_err(|e| DecodeError::Syntax(e.to_string()))?;
    if documents.next().is_some() {
        tracing::warn!(
            origin = %input.origin,
            "input holds several documents, only the first is used"
        );
    }
    if root.is_null() {
        return Err(DecodeError::EmptyInput);
    }

    let version = root
        .get("version")
        .filter(|v| !v.is_null())
        .ok_or(DecodeError::MissingVersion)?;
    let version = strict::scalar_string(version, "version")?;

    match version.as_str() {
        SUPPORTED_VERSION => {
            let document = v1::decode(&root)?;
            tracing::debug!(
                origin = %input.origin,
                services = document.services.len(),
                volumes = document.volumes.len(),
                secrets = document.secrets.len(),
                "decoded document"
            );
            Ok(document)
        }
        _ => Err(DecodeError::UnsupportedVersion {
            found: version,
            supported: SUPPORTED_VERSION,
        }),
    }
}
