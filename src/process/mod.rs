//! The process attach handle, region enumeration, and region reads: the
//! OS-facing half of the live locator.

mod region;
mod sys;

#[cfg(test)]
pub(crate) mod fake;

pub use region::{MemoryRegion, RegionProtection};

use crate::error::GrubCounterError;
use crate::primitives::Address32;

/// A small capability interface a platform backend must implement to let the
/// locator attach to, enumerate, and read a 32-bit process.
///
/// This is the "platform abstraction" the crate's design notes call for:
/// region enumeration and cross-process reads are entirely OS-specific, so
/// everything above this trait (the scanner, the classifier, the cache)
/// never has to know which OS it's running on.
pub(crate) trait PlatformProcess: Sized {
    fn attach(name: &str) -> Result<Self, GrubCounterError>;
    fn enumerate_regions(&self) -> Result<Vec<MemoryRegion>, GrubCounterError>;
    fn read(&self, address: Address32, buf: &mut [u8]) -> Result<(), GrubCounterError>;
}

/// Opaque, read-only handle to a foreign 32-bit process's address space.
///
/// Acquired via [`ProcessHandle::attach`], released deterministically when
/// dropped regardless of whether any subsequent operation succeeded.
/// Exclusively owned by the locator that attached it for its lifetime; it is
/// not safe to share across concurrent scans (see the crate's concurrency
/// model).
pub struct ProcessHandle(sys::PlatformHandle);

impl ProcessHandle {
    /// Attaches to a process based on its image name, e.g.
    /// `monkeyisland103.exe`. Fails with
    /// [`GrubCounterError::ProcessNotRunning`] if no such process is found,
    /// or [`GrubCounterError::AccessDenied`] if the OS refuses the attach.
    pub fn attach(name: &str) -> Result<Self, GrubCounterError> {
        sys::PlatformHandle::attach(name).map(Self)
    }

    /// Enumerates the process's committed, readable memory regions in
    /// ascending base-address order. A fresh enumeration is produced on
    /// every call, since region layout can change between scans (the engine
    /// allocates, frees, and compacts memory continuously).
    pub fn enumerate_regions(&self) -> Result<Vec<MemoryRegion>, GrubCounterError> {
        self.0.enumerate_regions()
    }

    /// Reads `buf.len()` bytes from `address`. A short or failed read is
    /// surfaced as [`GrubCounterError::ReadFailed`]; it is up to the caller
    /// to decide whether that's fatal (cached fast-path read) or skippable
    /// (full scan over a region that was freed since enumeration).
    pub fn read(&self, address: Address32, buf: &mut [u8]) -> Result<(), GrubCounterError> {
        self.0.read(address, buf)
    }

    /// Reads a single little-endian `u32` at `address`.
    pub fn read_u32(&self, address: Address32) -> Result<u32, GrubCounterError> {
        let mut buf = [0u8; 4];
        self.read(address, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }
}

// Lets the scanner in `crate::locator` stay generic over "something that can
// enumerate and read a process" instead of hardcoding `ProcessHandle`, so the
// same scanning code runs against a `FakeProcess` in tests.
impl PlatformProcess for ProcessHandle {
    fn attach(name: &str) -> Result<Self, GrubCounterError> {
        Self::attach(name)
    }

    fn enumerate_regions(&self) -> Result<Vec<MemoryRegion>, GrubCounterError> {
        Self::enumerate_regions(self)
    }

    fn read(&self, address: Address32, buf: &mut [u8]) -> Result<(), GrubCounterError> {
        Self::read(self, address, buf)
    }
}
