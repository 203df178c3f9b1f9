//! Structured tool errors.

use serde_json::{json, Map, Value};

use crate::models::ErrorKind;
use crate::normalize::ValidationError;
use crate::sources::{AggregateError, SourceError};

/// Every way a tool call can fail
#[derive(Debug, Clone, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("Unknown tool '{0}'")]
    UnknownTool(String),
}

impl ToolError {
    /// Stable category reported to the client
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::Validation(_) => ErrorKind::Validation,
            ToolError::Source(e) => e.kind(),
            ToolError::Aggregate(_) => ErrorKind::Aggregate,
            ToolError::UnknownTool(_) => ErrorKind::UnknownTool,
        }
    }

    /// The offending argument, for validation failures
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ToolError::Validation(e) => Some(e.field()),
            _ => None,
        }
    }

    /// The `{"error": {...}}` object returned to the client
    pub fn envelope(&self) -> Value {
        let mut error = Map::new();
        error.insert("kind".to_string(), json!(self.kind()));
        error.insert("message".to_string(), json!(self.to_string()));

        if let Some(field) = self.field() {
            error.insert("field".to_string(), json!(field));
        }

        let details = match self {
            ToolError::Source(SourceError::Http { status, body })
            | ToolError::Source(SourceError::AuthExchange { status, body }) => Some(json!({
                "status": status,
                "body": parse_body(body),
            })),
            ToolError::Aggregate(e) => Some(json!({
                "hianime": e.hianime,
                "mal": e.mal,
            })),
            ToolError::UnknownTool(_) => Some(json!({
                "available": super::ToolKind::ALL.iter().map(|t| t.name()).collect::<Vec<_>>(),
            })),
            _ => None,
        };
        if let Some(details) = details {
            error.insert("details".to_string(), details);
        }

        json!({ "error": error })
    }
}

/// Upstream bodies are echoed as JSON when they parse, else as text
fn parse_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorDescriptor;

    #[test]
    fn test_validation_envelope() {
        let err = ToolError::from(ValidationError::NotAllowed {
            field: "genre",
            value: "cooking".to_string(),
            allowed: &["action", "comedy"],
        });
        let envelope = err.envelope();

        assert_eq!(envelope["error"]["kind"], "validation");
        assert_eq!(envelope["error"]["field"], "genre");
        assert_eq!(
            envelope["error"]["message"],
            "Invalid genre 'cooking'. Available: action, comedy"
        );
        assert!(envelope["error"].get("details").is_none());
    }

    #[test]
    fn test_auth_exchange_envelope_keeps_oauth_error() {
        let err = ToolError::from(SourceError::AuthExchange {
            status: 400,
            body: r#"{"error":"invalid_grant","message":"verifier mismatch"}"#.to_string(),
        });
        let envelope = err.envelope();

        assert_eq!(envelope["error"]["kind"], "auth_exchange");
        assert_eq!(envelope["error"]["details"]["status"], 400);
        assert_eq!(envelope["error"]["details"]["body"]["error"], "invalid_grant");
    }

    #[test]
    fn test_aggregate_envelope() {
        let err = ToolError::from(AggregateError {
            hianime: ErrorDescriptor {
                kind: ErrorKind::UpstreamHttp,
                message: "HTTP 500".to_string(),
                status: Some(500),
            },
            mal: ErrorDescriptor {
                kind: ErrorKind::Timeout,
                message: "timed out".to_string(),
                status: None,
            },
        });
        let envelope = err.envelope();

        assert_eq!(envelope["error"]["kind"], "aggregate");
        assert_eq!(envelope["error"]["details"]["hianime"]["kind"], "upstream_http");
        assert_eq!(envelope["error"]["details"]["mal"]["kind"], "timeout");
    }

    #[test]
    fn test_unknown_tool_envelope() {
        let envelope = ToolError::UnknownTool("nope".to_string()).envelope();
        assert_eq!(envelope["error"]["kind"], "unknown_tool");
        assert_eq!(envelope["error"]["message"], "Unknown tool 'nope'");
        assert_eq!(envelope["error"]["details"]["available"].as_array().unwrap().len(), 26);
    }

    #[test]
    fn test_plain_text_body() {
        let envelope = ToolError::from(SourceError::Http {
            status: 502,
            body: "Bad Gateway".to_string(),
        })
        .envelope();
        assert_eq!(envelope["error"]["details"]["body"], "Bad Gateway");
    }
}
