//! Response envelope shared by every operation.
//!
//! An envelope is either a continuation (`SUCCESS` / `NOOP`, `decision=CONTINUE`)
//! carrying content, or a hard stop (`ERROR`, `decision=STOP`) carrying an error
//! descriptor. The three constructors are the only way to build one.

use serde::{Deserialize, Serialize};

/// Outcome class of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    /// Proceed; the payload is meaningful.
    Success,
    /// Proceed; nothing to act on (e.g. key absent).
    Noop,
    Error,
}

/// Orchestration hint for callers chaining this service into pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Continue,
    Stop,
}

/// Error codes carried in `error.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Reserved; `InvalidToken` is emitted for authorization failures.
    Unauthorized,
    InvalidToken,
    InvalidRequest,
    MemoryNotFound,
    /// Reserved; an absent key is reported as `NOOP`.
    KeyNotFound,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::InvalidToken => "INVALID_TOKEN",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::MemoryNotFound => "MEMORY_NOT_FOUND",
            ErrorCode::KeyNotFound => "KEY_NOT_FOUND",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error descriptor present on every `ERROR` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// The unit of output for every operation.
///
/// Invariant: `ok` is true iff `status` is `SUCCESS` or `NOOP` and `decision`
/// is `CONTINUE`; otherwise `status=ERROR`, `decision=STOP`, `content` is null
/// and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = serde_json::Value> {
    ok: bool,
    status: ResponseStatus,
    decision: Decision,
    content: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
}

impl<T> ApiResponse<T> {
    pub fn success(content: T) -> Self {
        Self::proceed(ResponseStatus::Success, content)
    }

    pub fn noop(content: T) -> Self {
        Self::proceed(ResponseStatus::Noop, content)
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            status: ResponseStatus::Error,
            decision: Decision::Stop,
            content: None,
            error: Some(ErrorBody {
                code,
                message: message.into(),
            }),
        }
    }

    fn proceed(status: ResponseStatus, content: T) -> Self {
        Self {
            ok: true,
            status,
            decision: Decision::Continue,
            content: Some(content),
            error: None,
        }
    }

    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn content(&self) -> Option<&T> {
        self.content.as_ref()
    }

    pub fn error_body(&self) -> Option<&ErrorBody> {
        self.error.as_ref()
    }

    /// Whether `ok`, `status` and `decision` agree. Always true for envelopes
    /// built by the constructors; a decoded one may not be.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            ResponseStatus::Success | ResponseStatus::Noop => {
                self.ok && self.decision == Decision::Continue
            }
            ResponseStatus::Error => !self.ok && self.decision == Decision::Stop,
        }
    }

    /// Split into content or error. An inconsistent envelope, or one that
    /// claims `ok=false` without an error descriptor, yields an
    /// `INTERNAL_ERROR` body.
    pub fn into_result(self) -> Result<Option<T>, ErrorBody> {
        if !self.is_consistent() {
            return Err(ErrorBody {
                code: ErrorCode::InternalError,
                message: format!(
                    "inconsistent envelope: ok={} status={:?} decision={:?}",
                    self.ok, self.status, self.decision
                ),
            });
        }
        if self.ok {
            return Ok(self.content);
        }
        Err(self.error.unwrap_or_else(|| ErrorBody {
            code: ErrorCode::InternalError,
            message: "error envelope without error descriptor".to_string(),
        }))
    }
}
