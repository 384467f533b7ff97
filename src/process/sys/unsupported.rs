//! Fallback backend for non-Windows hosts. The target process is always a
//! Win32 build of the game (per the crate's Non-goals: no 64-bit, no other
//! OS), so there is nothing meaningful to implement here.

use crate::error::GrubCounterError;
use crate::primitives::Address32;
use crate::process::region::MemoryRegion;
use crate::process::PlatformProcess;

pub(crate) struct UnsupportedProcess;

impl PlatformProcess for UnsupportedProcess {
    fn attach(_name: &str) -> Result<Self, GrubCounterError> {
        Err(GrubCounterError::AccessDenied)
    }

    fn enumerate_regions(&self) -> Result<Vec<MemoryRegion>, GrubCounterError> {
        Err(GrubCounterError::AccessDenied)
    }

    fn read(&self, _address: Address32, _buf: &mut [u8]) -> Result<(), GrubCounterError> {
        Err(GrubCounterError::AccessDenied)
    }
}
