//! Error classification shared by the task and time-log services.

/// Caller-facing classification of a service failure.
///
/// `Internal` is the only retryable kind; the others describe a request
/// that will keep failing until the caller changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced task or time log does not exist.
    NotFound,
    /// The request input is malformed.
    Validation,
    /// The caller lacks the role or assignment the operation requires.
    Forbidden,
    /// The operation conflicts with existing state.
    Conflict,
    /// Storage or unexpected failure.
    Internal,
}

impl ErrorKind {
    /// Returns `true` when retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Internal)
    }
}
