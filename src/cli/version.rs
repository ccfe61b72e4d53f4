//! `stackform version` - Print version information

use stackform::{SUPPORTED_VERSION, VERSION};

/// Crate version followed by the accepted input format version
pub fn version() -> String {
    format!("stackform {VERSION}\ninput format version {SUPPORTED_VERSION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let text = version();
        assert!(text.starts_with(&format!("stackform {}", env!("CARGO_PKG_VERSION"))));
        assert!(text.ends_with("0.1-dev"));
    }
}
