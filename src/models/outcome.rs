//! Error descriptors and the side-by-side result of a combined search.

use serde::{Deserialize, Serialize};

use super::AnimeSummary;

/// Stable machine-readable error category surfaced to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Timeout,
    UpstreamHttp,
    UpstreamShape,
    Network,
    NotFound,
    AuthExchange,
    Aggregate,
    UnknownTool,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Timeout => "timeout",
            ErrorKind::UpstreamHttp => "upstream_http",
            ErrorKind::UpstreamShape => "upstream_shape",
            ErrorKind::Network => "network",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AuthExchange => "auth_exchange",
            ErrorKind::Aggregate => "aggregate",
            ErrorKind::UnknownTool => "unknown_tool",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure reduced to its kind and a human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub kind: ErrorKind,
    pub message: String,

    /// HTTP status for upstream failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// One provider's half of a combined search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BranchOutcome {
    Results(Vec<AnimeSummary>),
    Failed { error: ErrorDescriptor },
}

impl BranchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, BranchOutcome::Failed { .. })
    }

    pub fn results(&self) -> Option<&[AnimeSummary]> {
        match self {
            BranchOutcome::Results(items) => Some(items),
            BranchOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorDescriptor> {
        match self {
            BranchOutcome::Results(_) => None,
            BranchOutcome::Failed { error } => Some(error),
        }
    }
}

/// Side-by-side comparison of both providers. Both branches are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedResult {
    pub query: String,
    pub limit: usize,
    pub hianime: BranchOutcome,
    pub mal: BranchOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provider;

    #[test]
    fn test_branch_outcome_serialization() {
        let ok = BranchOutcome::Results(vec![AnimeSummary::new("20", "Naruto", Provider::Mal)]);
        let json = serde_json::to_value(&ok).unwrap();
        assert!(json.is_array());

        let failed = BranchOutcome::Failed {
            error: ErrorDescriptor {
                kind: ErrorKind::Timeout,
                message: "no response".to_string(),
                status: None,
            },
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["error"]["kind"], "timeout");
        assert!(json["error"].get("status").is_none());
    }
}
