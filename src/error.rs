//! Structured errors shared by the save decoder and the live locator.

use std::fmt;

use crate::primitives::Address32;

/// Everything that can go wrong while decoding a save file or locating the
/// counter in a running process.
///
/// Every variant carries enough context (an address, a process name) for an
/// external CLI/GUI/polling collaborator to render a useful message; none of
/// these are retried internally, per the propagation policy described for
/// each component.
#[derive(Debug, thiserror::Error)]
pub enum GrubCounterError {
    /// The save file's first four bytes did not match the expected magic.
    #[error("not a save file (magic mismatch)")]
    NotASave,

    /// The counter signature was not found: either absent from a decoded
    /// save buffer, or no candidate survived selection in a live scan.
    #[error("grub counter signature not found")]
    CounterNotFound,

    /// The named process image was not found among running processes.
    #[error("process `{name}` is not running")]
    ProcessNotRunning {
        /// The process image name that was looked up.
        name: String,
    },

    /// The OS refused to attach to or enumerate the process under the
    /// current privileges (or the platform backend does not support
    /// attaching at all).
    #[error("access denied")]
    AccessDenied,

    /// An individual memory read failed. Region-level reads absorb this
    /// silently and move on to the next region; it only becomes
    /// user-visible when the cached fast-path read fails, which invalidates
    /// the cache rather than propagating further.
    #[error("failed to read memory at {address}")]
    ReadFailed {
        /// The address the failed read targeted.
        address: Address32,
    },

    /// The OS region-enumeration call itself failed, as opposed to an
    /// individual region being skipped.
    #[error("failed to enumerate process memory regions")]
    EnumerationFailed,

    /// An I/O error occurred opening or reading a save file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GrubCounterError {
    /// Shorthand for constructing [`GrubCounterError::ProcessNotRunning`].
    pub fn process_not_running(name: impl Into<String>) -> Self {
        Self::ProcessNotRunning { name: name.into() }
    }

    /// Shorthand for constructing [`GrubCounterError::ReadFailed`].
    pub fn read_failed(address: Address32) -> Self {
        Self::ReadFailed { address }
    }
}

// Kept distinct from `Display` (which `thiserror` already derives) so call
// sites that only care about which bucket an error falls into don't have to
// match on the full enum, matching how a CLI wrapper would branch on error
// kind without caring about the exact message.
/// The coarse kind of a [`GrubCounterError`], useful for a collaborator that
/// wants to branch on failure category (e.g. retry on `ProcessNotRunning`,
/// but not on `NotASave`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotASave,
    CounterNotFound,
    ProcessNotRunning,
    AccessDenied,
    ReadFailed,
    EnumerationFailed,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl GrubCounterError {
    /// Returns the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotASave => ErrorKind::NotASave,
            Self::CounterNotFound => ErrorKind::CounterNotFound,
            Self::ProcessNotRunning { .. } => ErrorKind::ProcessNotRunning,
            Self::AccessDenied => ErrorKind::AccessDenied,
            Self::ReadFailed { .. } => ErrorKind::ReadFailed,
            Self::EnumerationFailed => ErrorKind::EnumerationFailed,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(GrubCounterError::NotASave.kind(), ErrorKind::NotASave);
        assert_eq!(
            GrubCounterError::process_not_running("monkeyisland103.exe").kind(),
            ErrorKind::ProcessNotRunning
        );
        assert_eq!(
            GrubCounterError::read_failed(Address32::new(0x1000)).kind(),
            ErrorKind::ReadFailed
        );
    }

    #[test]
    fn messages_are_human_readable() {
        assert_eq!(
            GrubCounterError::process_not_running("monkeyisland103.exe").to_string(),
            "process `monkeyisland103.exe` is not running"
        );
        assert_eq!(
            GrubCounterError::read_failed(Address32::new(0xdead_beef)).to_string(),
            "failed to read memory at 0xdeadbeef"
        );
    }
}
