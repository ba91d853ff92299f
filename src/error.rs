use anyhow::anyhow;
use serde_json::Value;

pub type Result<T> = std::result::Result<T, LibError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NodeNotFound,
    EdgeNotFound,
    InvalidWeight,
    InvalidPosition,
    InvalidEdgeType,
    InvalidEdge,
    MalformedGraph,
    NotLoaded,
    Network,
    Validation,
    Forbidden,
    SaveInProgress,
    Unknown,
}

#[derive(Debug)]
pub struct LibError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub public: &'static str,
    pub details: Option<Value>,
    pub source: anyhow::Error,
}

impl LibError {
    pub fn node_not_found(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::NodeNotFound,
            code: "node_not_found",
            public,
            details: None,
            source,
        }
    }

    pub fn edge_not_found(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::EdgeNotFound,
            code: "edge_not_found",
            public,
            details: None,
            source,
        }
    }

    pub fn invalid_weight(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::InvalidWeight,
            code: "invalid_weight",
            public,
            details: None,
            source,
        }
    }

    pub fn invalid_position(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::InvalidPosition,
            code: "invalid_position",
            public,
            details: None,
            source,
        }
    }

    pub fn invalid_edge_type(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::InvalidEdgeType,
            code: "invalid_edge_type",
            public,
            details: None,
            source,
        }
    }

    pub fn invalid_edge(code: &'static str, public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::InvalidEdge,
            code,
            public,
            details: None,
            source,
        }
    }

    pub fn malformed(code: &'static str, public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::MalformedGraph,
            code,
            public,
            details: None,
            source,
        }
    }

    pub fn not_loaded(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::NotLoaded,
            code: "graph_not_loaded",
            public,
            details: None,
            source,
        }
    }

    pub fn network(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Network,
            code: "network_error",
            public,
            details: None,
            source,
        }
    }

    pub fn validation(code: &'static str, public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Validation,
            code,
            public,
            details: None,
            source,
        }
    }

    pub fn rejected(public: &'static str, details: Option<Value>, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Validation,
            code: "remote_validation_failed",
            public,
            details,
            source,
        }
    }

    pub fn forbidden(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Forbidden,
            code: "forbidden",
            public,
            details: None,
            source,
        }
    }

    pub fn save_in_progress() -> Self {
        Self {
            kind: ErrorKind::SaveInProgress,
            code: "save_in_progress",
            public: "A save is already in progress",
            details: None,
            source: anyhow!("save requested while another save is in flight"),
        }
    }

    pub fn unknown(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            code: "unknown_error",
            public,
            details: None,
            source,
        }
    }

    /// Transient transport failures; the local graph is intact and the call can be repeated.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::Network
    }
}

impl std::fmt::Display for LibError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.public, self.code, self.source)
    }
}

impl std::error::Error for LibError {}

#[cfg(feature = "http")]
impl From<reqwest::Error> for LibError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::malformed(
                "graph_undecodable",
                "Remote response could not be decoded",
                anyhow!(value),
            )
        } else if value.is_timeout() {
            Self::network("Request to the graph service timed out", anyhow!(value))
        } else {
            Self::network("Graph service request failed", anyhow!(value))
        }
    }
}
