//! Syntax rules for names, labels, quantities and probes

use crate::errors::ValidationError;
use crate::object::{EnvSource, EnvVar, PortRef, Probe};
use once_cell::sync::Lazy;
use regex::Regex;

/// Longest allowed name
pub const MAX_NAME_LENGTH: usize = 253;

/// Longest allowed label value
pub const MAX_LABEL_VALUE_LENGTH: usize = 63;

/// Volume access modes the platform understands
pub const ACCESS_MODES: &[&str] = &["ReadWriteOnce", "ReadOnlyMany", "ReadWriteMany"];

static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("valid regex")
});

static LABEL_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?$").expect("valid regex"));

static QUANTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+|[KMGTPE]i|[kKMGTPE]|m|u|n)?$")
        .expect("valid regex")
});

static HEADER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-A-Za-z0-9]+$").expect("valid regex"));

static SERVICE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$").expect("valid regex"));

/// Validates a DNS subdomain name
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(invalid("must be no more than 253 characters"));
    }
    if !NAME.is_match(name) {
        return Err(invalid(
            "must consist of lower case alphanumeric characters, '-' or '.', and must start and end with an alphanumeric character",
        ));
    }
    Ok(())
}

/// Validates a label value; empty values are allowed
pub fn validate_label_value(key: &str, value: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidLabelValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if value.is_empty() {
        return Ok(());
    }
    if value.len() > MAX_LABEL_VALUE_LENGTH {
        return Err(invalid("must be no more than 63 characters"));
    }
    if !LABEL_VALUE.is_match(value) {
        return Err(invalid(
            "must consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character",
        ));
    }
    Ok(())
}

/// Rejects `=` in a variable key or literal value
pub fn validate_env_var(var: &EnvVar) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidEnvVar {
        key: var.key.clone(),
        reason: reason.to_string(),
    };

    if var.key.contains('=') {
        return Err(invalid("key must not contain '='"));
    }
    if let EnvSource::Value(value) = &var.source
        && value.contains('=')
    {
        return Err(invalid("value must not contain '='"));
    }
    Ok(())
}

/// Mount paths are container paths and must start with `/`
pub fn validate_mount_path(path: &str) -> Result<(), ValidationError> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(ValidationError::RelativeMountPath {
            path: path.to_string(),
        })
    }
}

/// Validates a resource quantity such as `1Gi` or `500M`
pub fn validate_quantity(value: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidQuantity {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if !QUANTITY.is_match(value) {
        return Err(invalid(
            "must match the regular expression '^([+-]?[0-9.]+)([eEinumkKMGTP]*[-+]?[0-9]*)$'",
        ));
    }
    if value.starts_with('-') {
        return Err(invalid("must not be negative"));
    }
    Ok(())
}

/// Validates a volume access mode
pub fn validate_access_mode(mode: &str) -> Result<(), ValidationError> {
    if ACCESS_MODES.contains(&mode) {
        Ok(())
    } else {
        Err(ValidationError::InvalidAccessMode {
            value: mode.to_string(),
        })
    }
}

/// Validates a probe port: a number in 1..=65535 or an IANA service name
pub fn validate_port_ref(port: &PortRef) -> Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidProbe { reason };

    match port {
        PortRef::Number(n) if (1..=65535).contains(n) => Ok(()),
        PortRef::Number(n) => Err(invalid(format!(
            "port {n} must be between 1 and 65535, inclusive"
        ))),
        PortRef::Name(name) => {
            let valid = !name.is_empty()
                && name.len() <= 15
                && SERVICE_NAME.is_match(name)
                && !name.contains("--")
                && name.bytes().any(|b| b.is_ascii_lowercase());
            if valid {
                Ok(())
            } else {
                Err(invalid(format!(
                    "port name {name:?} must be 1-15 lower case alphanumeric characters or '-', contain a letter, and not start, end or repeat '-'"
                )))
            }
        }
    }
}

/// Validates an HTTP header name
pub fn validate_header_name(name: &str) -> Result<(), ValidationError> {
    if HEADER_NAME.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::InvalidProbe {
            reason: format!("header name {name:?} must consist of alphanumeric characters or '-'"),
        })
    }
}

/// Validates a probe body
pub fn validate_probe(probe: &Probe) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidProbe {
        reason: reason.to_string(),
    };

    if probe.handler_count() > 1 {
        return Err(invalid(
            "may not specify more than one of exec, httpGet and tcpSocket",
        ));
    }

    if let Some(exec) = &probe.exec
        && exec.command.is_empty()
    {
        return Err(invalid("exec command must not be empty"));
    }

    if let Some(http_get) = &probe.http_get {
        validate_port_ref(&http_get.port)?;
        if let Some(scheme) = &http_get.scheme
            && scheme != "HTTP"
            && scheme != "HTTPS"
        {
            return Err(ValidationError::InvalidProbe {
                reason: format!("scheme {scheme:?} must be HTTP or HTTPS"),
            });
        }
        for header in &http_get.http_headers {
            validate_header_name(&header.name)?;
        }
    }

    if let Some(tcp_socket) = &probe.tcp_socket {
        validate_port_ref(&tcp_socket.port)?;
    }

    for (field, value) in probe.timings() {
        if let Some(value) = value
            && value < 0
        {
            return Err(ValidationError::NegativeProbeField { field, value });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ExecAction, HttpGetAction, HttpHeader, SecretRef, TcpSocketAction};
    use rstest::rstest;

    #[rstest]
    #[case("web")]
    #[case("web-1")]
    #[case("a.b.c")]
    #[case("0")]
    fn test_validate_name_valid(#[case] name: &str) {
        assert!(validate_name(name).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("Web")]
    #[case("-web")]
    #[case("web-")]
    #[case("web_1")]
    #[case("a..b")]
    fn test_validate_name_invalid(#[case] name: &str) {
        assert!(matches!(
            validate_name(name),
            Err(ValidationError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_validate_name_too_long() {
        assert!(validate_name(&"a".repeat(253)).is_ok());
        assert!(validate_name(&"a".repeat(254)).is_err());
    }

    #[rstest]
    #[case("", true)]
    #[case("frontend", true)]
    #[case("v1.2_beta-3", true)]
    #[case("garbage^value", false)]
    #[case("-lead", false)]
    #[case("trail.", false)]
    fn test_validate_label_value(#[case] value: &str, #[case] valid: bool) {
        assert_eq!(validate_label_value("key", value).is_ok(), valid);
    }

    #[test]
    fn test_validate_label_value_too_long() {
        assert!(validate_label_value("key", &"a".repeat(63)).is_ok());
        assert!(validate_label_value("key", &"a".repeat(64)).is_err());
    }

    #[test]
    fn test_validate_env_var() {
        assert!(validate_env_var(&EnvVar::literal("KEY", "value")).is_ok());
        assert!(validate_env_var(&EnvVar::literal("KEY", "a=b")).is_err());
        assert!(validate_env_var(&EnvVar::literal("K=Y", "value")).is_err());
        assert!(
            validate_env_var(&EnvVar::from_secret("KEY", SecretRef::new("db", "a"))).is_ok()
        );
    }

    #[test]
    fn test_validate_mount_path() {
        assert!(validate_mount_path("/data").is_ok());
        assert_eq!(
            validate_mount_path("data"),
            Err(ValidationError::RelativeMountPath {
                path: "data".to_string()
            })
        );
    }

    #[rstest]
    #[case("1Gi", true)]
    #[case("500M", true)]
    #[case("1.5Ti", true)]
    #[case("100", true)]
    #[case("1e3", true)]
    #[case("5foo", false)]
    #[case("Gi", false)]
    #[case("-1Gi", false)]
    #[case("", false)]
    fn test_validate_quantity(#[case] value: &str, #[case] valid: bool) {
        assert_eq!(validate_quantity(value).is_ok(), valid);
    }

    #[test]
    fn test_validate_access_mode() {
        for mode in ACCESS_MODES {
            assert!(validate_access_mode(mode).is_ok());
        }
        assert!(validate_access_mode("ReadWriteSometimes").is_err());
    }

    #[rstest]
    #[case(PortRef::Number(80), true)]
    #[case(PortRef::Number(65535), true)]
    #[case(PortRef::Number(0), false)]
    #[case(PortRef::Number(65536), false)]
    #[case(PortRef::Name("http".into()), true)]
    #[case(PortRef::Name("h2c-1".into()), true)]
    #[case(PortRef::Name("12345".into()), false)]
    #[case(PortRef::Name("1-2-3-4".into()), false)]
    #[case(PortRef::Name("whois++".into()), false)]
    #[case(PortRef::Name("-begin".into()), false)]
    #[case(PortRef::Name("end-".into()), false)]
    #[case(PortRef::Name("two--hyphens".into()), false)]
    #[case(PortRef::Name("abcdefghijklmnop".into()), false)]
    fn test_validate_port_ref(#[case] port: PortRef, #[case] valid: bool) {
        assert_eq!(validate_port_ref(&port).is_ok(), valid);
    }

    fn http_probe(scheme: Option<&str>, header: Option<&str>) -> Probe {
        Probe {
            http_get: Some(HttpGetAction {
                path: Some("/healthz".to_string()),
                port: PortRef::Number(8080),
                host: None,
                scheme: scheme.map(str::to_string),
                http_headers: header
                    .map(|name| HttpHeader {
                        name: name.to_string(),
                        value: "1".to_string(),
                    })
                    .into_iter()
                    .collect(),
            }),
            ..Probe::default()
        }
    }

    #[test]
    fn test_validate_probe_http_get() {
        assert!(validate_probe(&http_probe(Some("HTTPS"), Some("X-Forwarded-For"))).is_ok());
        assert!(validate_probe(&http_probe(Some("http"), None)).is_err());
        assert!(validate_probe(&http_probe(None, Some("X-Forwarded-For:"))).is_err());
    }

    #[test]
    fn test_validate_probe_single_handler() {
        let mut probe = http_probe(None, None);
        probe.tcp_socket = Some(TcpSocketAction {
            port: PortRef::Number(8080),
            host: None,
        });
        assert!(validate_probe(&probe).is_err());
    }

    #[test]
    fn test_validate_probe_empty_exec() {
        let probe = Probe {
            exec: Some(ExecAction::default()),
            ..Probe::default()
        };
        assert!(validate_probe(&probe).is_err());
    }

    #[test]
    fn test_validate_probe_negative_timing() {
        let probe = Probe {
            period_seconds: Some(-1),
            ..Probe::default()
        };
        assert_eq!(
            validate_probe(&probe),
            Err(ValidationError::NegativeProbeField {
                field: "periodSeconds",
                value: -1,
            })
        );
    }
}
