//! Runtime error and status types

use thiserror::Error;

/// Errors raised by core runtime operations.
///
/// There is no local recovery inside core routines: a routine is either
/// infallible or it returns one of these, and the protected-call machinery
/// in `thread` is the only place that catches them.
#[derive(Debug, Error)]
pub enum VmError {
    /// Bad operand, bad table key, overflow of a bounded resource.
    #[error("{0}")]
    Runtime(String),

    /// Allocation refused even after an emergency collection retry.
    #[error("not enough memory")]
    OutOfMemory,

    /// Malformed source; raised by layers above the core but surfaced
    /// through the same status channel.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// An error was raised while already handling an error.
    #[error("error in error handling")]
    ErrorInHandler,

    /// A finalizer raised an error during collection.
    #[error("error in finalizer ({0})")]
    Finalizer(String),
}

impl VmError {
    /// Runtime error with a formatted message.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// The status code this error unwinds with.
    pub fn status(&self) -> ThreadStatus {
        match self {
            VmError::Runtime(_) => ThreadStatus::ErrRun,
            VmError::OutOfMemory => ThreadStatus::ErrMem,
            VmError::Syntax(_) => ThreadStatus::ErrSyntax,
            VmError::ErrorInHandler => ThreadStatus::ErrErr,
            VmError::Finalizer(_) => ThreadStatus::ErrGcMm,
        }
    }
}

/// Thread status codes, surfaced to the host unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ThreadStatus {
    /// Normal completion (or a thread that has not run yet).
    Ok = 0,
    /// Suspended in a yield.
    Yield = 1,
    /// Runtime error.
    ErrRun = 2,
    /// Syntax error.
    ErrSyntax = 3,
    /// Memory allocation error.
    ErrMem = 4,
    /// Error while running a finalizer.
    ErrGcMm = 5,
    /// Error while running the error handler.
    ErrErr = 6,
}

impl ThreadStatus {
    /// True for `Ok`.
    #[inline]
    pub fn is_ok(self) -> bool {
        self == ThreadStatus::Ok
    }
}

/// Result alias used throughout the core.
pub type VmResult<T> = Result<T, VmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(VmError::runtime("x").status(), ThreadStatus::ErrRun);
        assert_eq!(VmError::OutOfMemory.status(), ThreadStatus::ErrMem);
        assert_eq!(VmError::ErrorInHandler.status(), ThreadStatus::ErrErr);
    }

    #[test]
    fn display_messages() {
        assert_eq!(VmError::runtime("table index is nil").to_string(), "table index is nil");
        assert_eq!(VmError::OutOfMemory.to_string(), "not enough memory");
    }
}
