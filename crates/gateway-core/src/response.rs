//! Response types for the gateway.
//!
//! The upstream payload is semi-trusted: any field may be missing or carry the
//! wrong JSON type. [`UpstreamResponse::from_value`] parses every field on its
//! own into a `Result`, so one bad field never poisons the others, and
//! [`sanitize`] turns that into the fully populated [`SanitizedResponse`].

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Default `response` text
pub const DEFAULT_RESPONSE_TEXT: &str = "No response from agents";

/// Default `risk` level
pub const DEFAULT_RISK: &str = "low";

/// Why a single upstream field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// Field absent or `null`
    #[error("missing")]
    Missing,
    /// Field present but an empty string
    #[error("empty string")]
    Empty,
    /// Field present with another JSON type
    #[error("expected {expected}, found {found}")]
    WrongType {
        /// Expected JSON type
        expected: &'static str,
        /// Actual JSON type
        found: &'static str,
    },
    /// String that is not an ISO-8601 date-time
    #[error("not an ISO-8601 timestamp")]
    InvalidTimestamp,
}

/// Upstream payload, parsed field by field
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    /// Agent answer text
    pub response: Result<String, FieldError>,
    /// Risk level label
    pub risk: Result<String, FieldError>,
    /// Agents that took part
    pub agent_traces: Result<Vec<Value>, FieldError>,
    /// Recommended actions
    pub actions: Result<Vec<Value>, FieldError>,
    /// Incident log identifier
    pub logs_id: Result<String, FieldError>,
    /// Confidence of the answer
    pub confidence_score: Result<Number, FieldError>,
    /// Upstream timestamp
    pub timestamp: Result<String, FieldError>,
    /// Family alert identifier
    pub family_alert_id: Result<String, FieldError>,
}

impl UpstreamResponse {
    /// Parse an arbitrary JSON value. Non-object values yield all-missing fields.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let mut fields = match value {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };

        Self {
            response: non_empty_string(fields.remove("response")),
            risk: non_empty_string(fields.remove("risk")),
            agent_traces: array(fields.remove("agent_traces")),
            actions: array(fields.remove("actions")),
            logs_id: non_empty_string(fields.remove("logs_id")),
            confidence_score: number(fields.remove("confidence_score")),
            timestamp: timestamp(fields.remove("timestamp")),
            family_alert_id: non_empty_string(fields.remove("family_alert_id")),
        }
    }

    /// Fields that were present but unusable. Missing fields are not reported.
    #[must_use]
    pub fn rejected_fields(&self) -> Vec<(&'static str, FieldError)> {
        let checks = [
            ("response", self.response.as_ref().err()),
            ("risk", self.risk.as_ref().err()),
            ("agent_traces", self.agent_traces.as_ref().err()),
            ("actions", self.actions.as_ref().err()),
            ("logs_id", self.logs_id.as_ref().err()),
            ("confidence_score", self.confidence_score.as_ref().err()),
            ("timestamp", self.timestamp.as_ref().err()),
            ("family_alert_id", self.family_alert_id.as_ref().err()),
        ];

        checks
            .into_iter()
            .filter_map(|(name, err)| match err {
                Some(FieldError::Missing) | None => None,
                Some(err) => Some((name, *err)),
            })
            .collect()
    }
}

/// Public success contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizedResponse {
    /// Agent answer text
    pub response: String,
    /// Risk level label
    pub risk: String,
    /// Agents that took part
    pub agent_traces: Vec<Value>,
    /// Recommended actions
    pub actions: Vec<Value>,
    /// Incident log identifier
    pub logs_id: Option<String>,
    /// Confidence of the answer, numeric type kept as sent
    pub confidence_score: Option<Number>,
    /// ISO-8601 timestamp
    pub timestamp: String,
    /// Family alert identifier
    pub family_alert_id: Option<String>,
}

/// Sanitize an upstream payload, stamping missing timestamps with the current time.
#[must_use]
pub fn sanitize(raw: UpstreamResponse) -> SanitizedResponse {
    sanitize_at(raw, Utc::now())
}

/// Sanitize an upstream payload using `now` for a missing timestamp.
#[must_use]
pub fn sanitize_at(raw: UpstreamResponse, now: DateTime<Utc>) -> SanitizedResponse {
    SanitizedResponse {
        response: raw
            .response
            .unwrap_or_else(|_| DEFAULT_RESPONSE_TEXT.to_string()),
        risk: raw.risk.unwrap_or_else(|_| DEFAULT_RISK.to_string()),
        agent_traces: raw.agent_traces.unwrap_or_default(),
        actions: raw.actions.unwrap_or_default(),
        logs_id: raw.logs_id.ok(),
        confidence_score: raw.confidence_score.ok(),
        timestamp: raw
            .timestamp
            .unwrap_or_else(|_| now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        family_alert_id: raw.family_alert_id.ok(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn non_empty_string(value: Option<Value>) -> Result<String, FieldError> {
    match value {
        None | Some(Value::Null) => Err(FieldError::Missing),
        Some(Value::String(s)) if s.is_empty() => Err(FieldError::Empty),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(FieldError::WrongType {
            expected: "string",
            found: type_name(&other),
        }),
    }
}

fn array(value: Option<Value>) -> Result<Vec<Value>, FieldError> {
    match value {
        None | Some(Value::Null) => Err(FieldError::Missing),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(FieldError::WrongType {
            expected: "array",
            found: type_name(&other),
        }),
    }
}

fn number(value: Option<Value>) -> Result<Number, FieldError> {
    match value {
        None | Some(Value::Null) => Err(FieldError::Missing),
        Some(Value::Number(n)) => Ok(n),
        Some(other) => Err(FieldError::WrongType {
            expected: "number",
            found: type_name(&other),
        }),
    }
}

fn timestamp(value: Option<Value>) -> Result<String, FieldError> {
    let raw = non_empty_string(value)?;
    if is_iso8601(&raw) {
        Ok(raw)
    } else {
        Err(FieldError::InvalidTimestamp)
    }
}

// Python's `isoformat()` omits the offset, so naive date-times are accepted too.
fn is_iso8601(raw: &str) -> bool {
    DateTime::parse_from_rfc3339(raw).is_ok()
        || NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}
