//! In-memory stand-in for a real OS process, used only by the locator's own
//! test suite. Lets the scanner, classifier, selector, and cache be exercised
//! deterministically without a real `monkeyisland103.exe` running, on any
//! host OS.

use crate::error::GrubCounterError;
use crate::primitives::Address32;
use crate::process::region::{MemoryRegion, RegionProtection};
use crate::process::PlatformProcess;

/// A single backing region: a base address plus the bytes that live there.
pub(crate) struct FakeRegion {
    pub base: Address32,
    pub bytes: Vec<u8>,
    pub protection: RegionProtection,
}

impl FakeRegion {
    pub fn readable(base: u32, bytes: Vec<u8>) -> Self {
        Self {
            base: Address32::new(base),
            bytes,
            protection: RegionProtection::READ | RegionProtection::WRITE,
        }
    }
}

/// Backend over a fixed set of [`FakeRegion`]s. `attach` never fails; reads
/// fail outside the configured regions, mirroring a freed or unmapped page.
pub(crate) struct FakeProcess {
    regions: Vec<FakeRegion>,
}

impl FakeProcess {
    pub fn new(regions: Vec<FakeRegion>) -> Self {
        Self { regions }
    }
}

impl PlatformProcess for FakeProcess {
    fn attach(_name: &str) -> Result<Self, GrubCounterError> {
        Ok(Self { regions: Vec::new() })
    }

    fn enumerate_regions(&self) -> Result<Vec<MemoryRegion>, GrubCounterError> {
        Ok(self
            .regions
            .iter()
            .map(|r| MemoryRegion::new(r.base, r.bytes.len() as u32, r.protection))
            .collect())
    }

    fn read(&self, address: Address32, buf: &mut [u8]) -> Result<(), GrubCounterError> {
        for region in &self.regions {
            let base = region.base.value();
            let end = base + region.bytes.len() as u32;
            let addr = address.value();
            if addr >= base && addr.saturating_add(buf.len() as u32) <= end {
                let start = (addr - base) as usize;
                buf.copy_from_slice(&region.bytes[start..start + buf.len()]);
                return Ok(());
            }
        }
        Err(GrubCounterError::read_failed(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_inside_a_region_succeed() {
        let process = FakeProcess::new(vec![FakeRegion::readable(0x1000, vec![1, 2, 3, 4])]);
        let mut buf = [0u8; 2];
        process.read(Address32::new(0x1001), &mut buf).unwrap();
        assert_eq!(buf, [2, 3]);
    }

    #[test]
    fn reads_outside_every_region_fail() {
        let process = FakeProcess::new(vec![FakeRegion::readable(0x1000, vec![1, 2, 3, 4])]);
        let mut buf = [0u8; 2];
        assert!(process.read(Address32::new(0x2000), &mut buf).is_err());
    }

    #[test]
    fn enumerate_reports_configured_regions() {
        let process = FakeProcess::new(vec![FakeRegion::readable(0x1000, vec![0; 16])]);
        let regions = process.enumerate_regions().unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].base(), Address32::new(0x1000));
        assert_eq!(regions[0].size(), 16);
    }
}
