//! Compact scalar grammars
//!
//! - port mappings: `container[:host[:service]][/tcp|/udp]`
//! - environment assignments: `KEY=value`
//! - secret references: `secretName/dataKey`
//!
//! Every parser either returns a complete value or an error naming the raw
//! string; nothing is partially filled in.

use crate::errors::GrammarError;
use crate::object::{EnvVar, PortMapping, Protocol, SecretRef};
use std::str::FromStr;

fn port_error(raw: &str, reason: impl Into<String>) -> GrammarError {
    GrammarError::PortMapping {
        raw: raw.to_string(),
        reason: reason.into(),
    }
}

fn parse_port_number(raw: &str, segment: &str) -> Result<u16, GrammarError> {
    if segment.is_empty() {
        return Err(port_error(raw, "empty port number"));
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(port_error(raw, format!("{segment:?} is not a port number")));
    }
    segment
        .parse()
        .map_err(|_| port_error(raw, format!("{segment} is out of range")))
}

/// Parses a port mapping
///
/// Numbers fill right to left: one number sets all three ports, two numbers
/// set the container port and a shared host/service port.
///
/// # Errors
///
/// Returns [`GrammarError::PortMapping`] for empty input, non-numeric or
/// out-of-range segments, more than three segments, or a protocol other
/// than `tcp`/`udp` (including an empty one after `/`).
pub fn parse_port_mapping(raw: &str) -> Result<PortMapping, GrammarError> {
    let (ports, protocol) = match raw.split_once('/') {
        Some((ports, protocol)) => {
            let protocol = match protocol.to_ascii_lowercase().as_str() {
                "tcp" => Protocol::Tcp,
                "udp" => Protocol::Udp,
                "" => return Err(port_error(raw, "empty protocol after '/'")),
                other => {
                    return Err(port_error(
                        raw,
                        format!("unknown protocol {other:?}, expected tcp or udp"),
                    ));
                }
            };
            (ports, Some(protocol))
        }
        None => (raw, None),
    };

    if ports.is_empty() {
        return Err(port_error(raw, "no port numbers"));
    }

    let numbers = ports
        .split(':')
        .map(|segment| parse_port_number(raw, segment))
        .collect::<Result<Vec<_>, _>>()?;

    let (container_port, host_port, service_port) = match numbers.as_slice() {
        [port] => (*port, *port, *port),
        [container, host] => (*container, *host, *host),
        [container, host, service] => (*container, *host, *service),
        more => {
            return Err(port_error(
                raw,
                format!("expected 1 to 3 port numbers, got {}", more.len()),
            ));
        }
    };

    Ok(PortMapping {
        container_port,
        host_port,
        service_port,
        protocol,
    })
}

/// Parses the compact `KEY=value` form of an environment variable
///
/// The split happens at the first `=`; the value is kept verbatim, including
/// further `=` characters and surrounding whitespace. Whitespace around the
/// key is trimmed.
///
/// # Errors
///
/// Returns [`GrammarError::EnvAssignment`] when there is no `=` or the key
/// is empty.
pub fn parse_env_assignment(raw: &str) -> Result<EnvVar, GrammarError> {
    let error = |reason: &str| GrammarError::EnvAssignment {
        raw: raw.to_string(),
        reason: reason.to_string(),
    };

    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| error("expected KEY=value"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(error("empty key"));
    }

    Ok(EnvVar::literal(key, value))
}

/// Parses a `secretName/dataKey` reference
///
/// # Errors
///
/// Returns [`GrammarError::SecretRef`] unless the string has exactly one
/// `/` with non-empty text on both sides.
pub fn parse_secret_ref(raw: &str) -> Result<SecretRef, GrammarError> {
    let error = |reason: String| GrammarError::SecretRef {
        raw: raw.to_string(),
        reason,
    };

    let parts: Vec<&str> = raw.split('/').collect();
    match parts.as_slice() {
        [secret_name, data_key] if !secret_name.is_empty() && !data_key.is_empty() => {
            Ok(SecretRef::new(*secret_name, *data_key))
        }
        [_, _] => Err(error("secret name and data key must not be empty".to_string())),
        parts => Err(error(format!(
            "expected secretName/dataKey, got {} part(s)",
            parts.len()
        ))),
    }
}

impl FromStr for PortMapping {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_port_mapping(s)
    }
}

impl FromStr for SecretRef {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_secret_ref(s)
    }
}
