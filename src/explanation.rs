//! Explanation records returned by the analysis API
//!
//! A record is only ever built by [`ExplanationRecord::from_response`],
//! which rejects error bodies and bodies missing any required field.

use crate::error::ExplainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fields every successful response must carry
const REQUIRED_FIELDS: [&str; 4] = ["command", "summary", "sections", "risk_level"];

/// Assessed risk of running a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
    Minimal,
    #[serde(other)]
    Unknown,
}

impl RiskLevel {
    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Minimal => "minimal",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One titled block of the explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
}

/// Structured result of one risk analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationRecord {
    /// Command as echoed back by the API
    pub command: String,

    /// One-paragraph summary of what the command does
    pub summary: String,

    /// Assessed risk level
    pub risk_level: RiskLevel,

    /// Detail sections, in display order
    pub sections: Vec<Section>,
}

impl ExplanationRecord {
    /// Validate a raw response body and turn it into a record.
    ///
    /// Empty bodies, non-JSON, bodies with a `detail` error field and
    /// bodies missing a required field are all rejected.
    pub fn from_response(body: &str) -> Result<Self, ExplainError> {
        if body.trim().is_empty() {
            return Err(ExplainError::malformed("empty response body", body));
        }

        let value: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| ExplainError::malformed(format!("not valid JSON: {}", e), body))?;

        let object = value
            .as_object()
            .ok_or_else(|| ExplainError::malformed("response is not a JSON object", body))?;

        if let Some(detail) = object.get("detail") {
            let message = match detail {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(ExplainError::Remote(message));
        }

        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| !object.contains_key(*field))
            .collect();
        if !missing.is_empty() {
            return Err(ExplainError::malformed(
                format!("missing field(s): {}", missing.join(", ")),
                body,
            ));
        }

        serde_json::from_value(value)
            .map_err(|e| ExplainError::malformed(format!("unexpected shape: {}", e), body))
    }
}
