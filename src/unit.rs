//! Units of work and their tags.
//!
//! A `Unit` is a header line naming its genre followed by the body lines that
//! belong to it. Units travel between the dispatcher and the workers as
//! bincode-encoded payloads inside Data frames.

use crate::error::{ClusterError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display name of a genre, exactly as it appears on a header line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tag(pub String);

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Unit {
    /// The header line, byte-identical to the input.
    pub header: String,
    /// Body lines in input order.
    pub lines: Vec<String>,
}

impl Unit {
    pub fn new(header: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            header: header.into(),
            lines,
        }
    }

    pub fn tag(&self) -> Tag {
        Tag::new(self.header.clone())
    }

    pub fn encode(&self, endpoint: &str) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| ClusterError::protocol(endpoint, format!("cannot encode unit: {}", e)))
    }

    pub fn decode(payload: &[u8], endpoint: &str) -> Result<Self> {
        bincode::deserialize(payload)
            .map_err(|e| ClusterError::protocol(endpoint, format!("malformed unit payload: {}", e)))
    }

    /// Appends the unit as it appears in the output: header, then every body
    /// line, each followed by a newline.
    pub fn render_into(&self, out: &mut String) {
        out.push_str(&self.header);
        out.push('\n');
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_payload_keeps_whitespace() {
        let unit = Unit::new(
            "fantasy",
            vec!["  leading".to_string(), "".to_string(), "tab\there ".to_string()],
        );

        let payload = unit.encode("test").unwrap();
        let restored = Unit::decode(&payload, "test").unwrap();

        assert_eq!(restored, unit);
        assert_eq!(restored.tag(), Tag::new("fantasy"));
    }

    #[test]
    fn test_truncated_payload_is_protocol_violation() {
        let unit = Unit::new("horror", vec!["Dark night".to_string()]);
        let payload = unit.encode("test").unwrap();

        let result = Unit::decode(&payload[..payload.len() - 3], "worker:horror");

        match result {
            Err(ClusterError::Protocol { endpoint, .. }) => assert_eq!(endpoint, "worker:horror"),
            other => panic!("expected protocol violation, got {:?}", other),
        }
    }

    #[test]
    fn test_render_empty_body() {
        let mut out = String::new();
        Unit::new("comedy", vec![]).render_into(&mut out);
        assert_eq!(out, "comedy\n");
    }
}
