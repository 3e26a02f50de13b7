//! Fallible access to documents behind security boundaries
//!
//! Whether a frame is same-origin is only knowable by trying the read. The
//! helpers here turn a blocked read into [`Access::Unavailable`] so callers
//! never see a security error.

use crate::platform::SecurityError;

/// Outcome of a privileged read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access<T> {
    Available(T),
    Unavailable,
}

impl<T> Access<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Access::Available(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Access::Available(v) => Some(v),
            Access::Unavailable => None,
        }
    }
}

impl<T> From<Access<T>> for Option<T> {
    fn from(a: Access<T>) -> Self {
        a.into_option()
    }
}

/// Run a read that may be blocked by a cross-origin boundary
pub fn attempt<T>(read: impl FnOnce() -> Result<T, SecurityError>) -> Access<T> {
    match read() {
        Ok(v) => Access::Available(v),
        Err(e) => {
            log::trace!("absorbed access denial: {}", e);
            Access::Unavailable
        }
    }
}

/// Like [`attempt`] for reads whose success value may itself be absent
/// (a frame that has not loaded a document yet)
pub fn attempt_optional<T>(read: impl FnOnce() -> Result<Option<T>, SecurityError>) -> Access<T> {
    match attempt(read) {
        Access::Available(Some(v)) => Access::Available(v),
        _ => Access::Unavailable,
    }
}
