//! Raw command codes and errno-style status values for the syscall surface.

use crate::engine::errno;
use crate::security::{MacError, MacErrorKind, MacResult};
use core::fmt;
use thiserror::Error;

/// Direction of an [`authenticate`](super::MacService::authenticate) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Compute the tag and write it into the buffer.
    Write = 0,
    /// Compute the tag and compare it with the one in the buffer.
    Read = 1,
}

/// A raw command byte that names neither direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown command code {0}")]
pub struct UnknownCommand(pub u8);

impl TryFrom<u8> for Command {
    type Error = UnknownCommand;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Write),
            1 => Ok(Self::Read),
            other => Err(UnknownCommand(other)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write => f.write_str("write"),
            Self::Read => f.write_str("read"),
        }
    }
}

/// Status returned by [`authenticate`](super::MacService::authenticate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyscallStatus {
    /// The call succeeded.
    Success,
    /// The lane's session could not be opened.
    SessionCreationFailed,
    /// The engine had no job available.
    EngineUnavailable,
    /// The engine reported a terminal failure code.
    EngineFailed(i32),
    /// The wait was interrupted or timed out.
    WaitInterrupted,
    /// The request was malformed or named an unknown lane.
    MalformedRequest,
    /// The tag did not match.
    AuthenticationMismatch,
}

impl SyscallStatus {
    /// Errno-style code; zero on success.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::SessionCreationFailed => errno::EIO,
            Self::EngineUnavailable => errno::ENOBUFS,
            Self::EngineFailed(code) => code,
            Self::WaitInterrupted => errno::EINTR,
            Self::MalformedRequest => errno::EINVAL,
            Self::AuthenticationMismatch => errno::EAUTH,
        }
    }

    /// Returns `true` for [`SyscallStatus::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Maps a typed result onto a status.
    #[must_use]
    pub fn from_result(result: &MacResult<()>) -> Self {
        match result {
            Ok(()) => Self::Success,
            Err(err) => Self::from(err),
        }
    }
}

impl From<&MacError> for SyscallStatus {
    fn from(err: &MacError) -> Self {
        match err.kind() {
            MacErrorKind::SessionCreationFailed => Self::SessionCreationFailed,
            MacErrorKind::EngineUnavailable => Self::EngineUnavailable,
            MacErrorKind::EngineFailed(code) => Self::EngineFailed(code),
            MacErrorKind::WaitInterrupted => Self::WaitInterrupted,
            MacErrorKind::MalformedRequest | MacErrorKind::InvalidLane => Self::MalformedRequest,
            MacErrorKind::AuthenticationMismatch => Self::AuthenticationMismatch,
        }
    }
}

impl fmt::Display for SyscallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::EngineFailed(code) => write!(f, "engine failed ({code})"),
            other => write!(f, "{other:?} ({})", other.code()),
        }
    }
}
