//! # Stackform - compact service descriptions to Kubernetes manifests
//!
//! Stackform reads a small YAML document describing services, volumes and
//! secrets, validates it, and emits the matching set of platform objects:
//! services, ingresses, deployments, persistent volume claims and secrets.
//!
//! ## Pipeline
//!
//! ```text
//! bytes ──decode──▶ Document ──validate──▶ Document ──transform──▶ [Resource]
//! ```
//!
//! - [`encoding::decode`] applies a closed schema to every node and parses
//!   the compact port, environment and secret-reference syntaxes.
//! - [`Validate::validate`] checks names, ranges and cross references.
//! - [`Transformer::transform`] builds the resources for a [`Distro`].
//!
//! ## Example
//!
//! ```
//! use stackform::{Distro, Input, Origin};
//!
//! let input = Input::new(
//!     "version: 0.1-dev\nservices:\n- name: frontend\n  containers:\n  - image: nginx\n    ports:\n    - port: 8080:80\n      type: external\n",
//!     Origin::Stdin,
//! );
//! let resources = stackform::convert(&input, Distro::Kubernetes).unwrap();
//! assert_eq!(resources.len(), 2);
//! ```
//!
//! ## License
//!
//! Licensed under either of
//! - Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <https://www.apache.org/licenses/LICENSE-2.0>)
//! - MIT license ([LICENSE-MIT](LICENSE-MIT) or <https://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod encoding;
pub mod errors;
pub mod infrastructure;
pub mod object;
pub mod transform;
pub mod validation;

pub use encoding::{Input, Origin, SUPPORTED_VERSION};
pub use errors::{DecodeError, Error, GrammarError, Result, TransformError, ValidationError};
pub use infrastructure::Config;
pub use object::Document;
pub use transform::{Distro, Resource, Transformer};
pub use validation::Validate;

/// Version of the stackform crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Decodes and validates `input`
///
/// # Errors
///
/// Returns the first decode or validation error.
pub fn load(input: &Input) -> Result<Document> {
    let document = encoding::decode(input)?;
    document.validate()?;
    Ok(document)
}

/// Runs the whole pipeline on `input` for `distro`
///
/// # Errors
///
/// Returns the first decode, validation or transform error; no partial
/// resource list is returned.
pub fn convert(input: &Input, distro: Distro) -> Result<Vec<Resource>> {
    let document = load(input)?;
    let resources = distro
        .transformer(input.origin.clone())
        .transform(&document)?;
    tracing::info!(%distro, resources = resources.len(), "converted document");
    Ok(resources)
}
