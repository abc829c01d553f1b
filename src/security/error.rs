//! Authentication error types.
//!
//! Every failure of a MAC call is one [`MacErrorKind`]; [`MacError`] adds an
//! optional context string naming the lane or request involved.

use core::fmt;
use thiserror::Error;

/// The kind of MAC service error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacErrorKind {
    /// The engine could not open a session for this key and algorithm.
    ///
    /// The lane stays without a session; the next call retries creation.
    SessionCreationFailed,
    /// The engine had no job resources to build a request.
    EngineUnavailable,
    /// The engine reported a terminal, non-busy failure code.
    EngineFailed(i32),
    /// The blocking wait was aborted by the host (interrupt or timeout).
    WaitInterrupted,
    /// The buffer or length is too small for the wire layout.
    MalformedRequest,
    /// The computed tag did not match the tag carried in the buffer.
    AuthenticationMismatch,
    /// The lane id is outside the configured lane range.
    InvalidLane,
}

impl MacErrorKind {
    const fn message(self) -> &'static str {
        match self {
            Self::SessionCreationFailed => "could not create engine session",
            Self::EngineUnavailable => "no engine job resources available",
            Self::EngineFailed(_) => "engine operation failed",
            Self::WaitInterrupted => "wait for engine completion interrupted",
            Self::MalformedRequest => "malformed request",
            Self::AuthenticationMismatch => "authentication tag mismatch",
            Self::InvalidLane => "lane id out of range",
        }
    }
}

/// An error from a MAC service call.
///
/// # Example
///
/// ```
/// use lanemac::security::{MacError, MacErrorKind};
///
/// let err = MacError::mismatch().with_context("lane3");
/// assert!(err.is_mismatch());
/// assert!(err.to_string().contains("lane3"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacError {
    kind: MacErrorKind,
    context: Option<String>,
}

impl MacError {
    /// Creates an error with the given kind.
    #[must_use]
    pub const fn new(kind: MacErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Creates a session creation failure.
    #[must_use]
    pub const fn session_creation_failed() -> Self {
        Self::new(MacErrorKind::SessionCreationFailed)
    }

    /// Creates an engine-unavailable error.
    #[must_use]
    pub const fn engine_unavailable() -> Self {
        Self::new(MacErrorKind::EngineUnavailable)
    }

    /// Creates an engine failure carrying the engine's code.
    #[must_use]
    pub const fn engine_failed(code: i32) -> Self {
        Self::new(MacErrorKind::EngineFailed(code))
    }

    /// Creates a wait-interrupted error.
    #[must_use]
    pub const fn interrupted() -> Self {
        Self::new(MacErrorKind::WaitInterrupted)
    }

    /// Creates a malformed request error.
    #[must_use]
    pub const fn malformed() -> Self {
        Self::new(MacErrorKind::MalformedRequest)
    }

    /// Creates a tag mismatch error.
    #[must_use]
    pub const fn mismatch() -> Self {
        Self::new(MacErrorKind::AuthenticationMismatch)
    }

    /// Creates an invalid lane error.
    #[must_use]
    pub const fn invalid_lane() -> Self {
        Self::new(MacErrorKind::InvalidLane)
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> MacErrorKind {
        self.kind
    }

    /// Returns `true` if the verify path found a tag mismatch.
    #[must_use]
    pub const fn is_mismatch(&self) -> bool {
        matches!(self.kind, MacErrorKind::AuthenticationMismatch)
    }

    /// Returns `true` if the wait was interrupted.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(self.kind, MacErrorKind::WaitInterrupted)
    }

    /// Returns the engine failure code, if this is an engine failure.
    #[must_use]
    pub const fn engine_code(&self) -> Option<i32> {
        match self.kind {
            MacErrorKind::EngineFailed(code) => Some(code),
            _ => None,
        }
    }

    /// Adds context to the error.
    #[must_use]
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context = Some(ctx.into());
        self
    }

    /// Returns the error context, if any.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

impl fmt::Display for MacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.message())?;
        if let MacErrorKind::EngineFailed(code) = self.kind {
            write!(f, " (code {code})")?;
        }
        if let Some(ctx) = &self.context {
            write!(f, ": {ctx}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MacError {}

impl From<MacErrorKind> for MacError {
    fn from(kind: MacErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Result type for MAC service operations.
pub type MacResult<T> = Result<T, MacError>;

/// Key material of the wrong length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid key length: expected {expected} bytes, got {actual}")]
pub struct KeyLengthError {
    /// Required length.
    pub expected: usize,
    /// Supplied length.
    pub actual: usize,
}
