//! Platform dispatch for the process-attach capability.
//!
//! The reference target is Windows, where the game actually runs. Other
//! platforms get a stub that always fails with `AccessDenied`, per the
//! crate's design notes -- there is no meaningful way to attach to a Win32
//! process's address space from a non-Windows host.

#[cfg(windows)]
mod windows;
#[cfg(not(windows))]
mod unsupported;

#[cfg(windows)]
pub(crate) use self::windows::WindowsProcess as PlatformHandle;
#[cfg(not(windows))]
pub(crate) use self::unsupported::UnsupportedProcess as PlatformHandle;
