//! stackform - compact service descriptions to Kubernetes manifests
//!
//! ## Commands
//!
//! - `stackform convert` - Convert documents into manifests
//! - `stackform validate` - Decode and validate documents
//! - `stackform version` - Print version information
//! - `stackform completions` - Generate shell completions
//!
//! ## Quick Start
//!
//! ```bash
//! # Print manifests for a document
//! stackform convert -f app.yaml -o -
//!
//! # Write one file per manifest for OpenShift
//! stackform convert -f app.yaml -o manifests/ --distro openshift
//!
//! # Generate shell completions
//! stackform completions bash > /etc/bash_completion.d/stackform
//! ```

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
