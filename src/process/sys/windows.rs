//! Real Win32 backend: process lookup by name via a `CreateToolhelp32Snapshot`
//! walk, region enumeration via `VirtualQueryEx`, and reads via
//! `ReadProcessMemory`. Read-only: nothing here ever calls
//! `WriteProcessMemory` or otherwise mutates the target.

use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
    TH32CS_SNAPPROCESS,
};
use windows::Win32::System::Memory::{
    VirtualQueryEx, MEMORY_BASIC_INFORMATION, MEM_COMMIT, PAGE_EXECUTE, PAGE_EXECUTE_READ,
    PAGE_EXECUTE_READWRITE, PAGE_EXECUTE_WRITECOPY, PAGE_GUARD, PAGE_NOACCESS, PAGE_NOCACHE,
    PAGE_READONLY, PAGE_READWRITE, PAGE_WRITECOPY,
};
use windows::Win32::System::Threading::{OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ};

use crate::error::GrubCounterError;
use crate::primitives::Address32;
use crate::process::region::{MemoryRegion, RegionProtection};
use crate::process::PlatformProcess;

pub(crate) struct WindowsProcess {
    handle: HANDLE,
}

// SAFETY: `HANDLE` is just a kernel object reference; Win32 makes no
// guarantees about which thread calls into it, but none of these calls
// (VirtualQueryEx, ReadProcessMemory) require thread affinity. The crate's
// own concurrency model additionally forbids calling into the same
// `ProcessHandle` from two threads at once, so this is never exercised
// concurrently in practice.
unsafe impl Send for WindowsProcess {}

impl PlatformProcess for WindowsProcess {
    fn attach(name: &str) -> Result<Self, GrubCounterError> {
        let pid = find_process_id_by_name(name)?;

        // SAFETY: `pid` was just observed in a live snapshot; `OpenProcess`
        // tolerates a pid that has since exited by simply failing.
        let handle = unsafe {
            OpenProcess(
                PROCESS_QUERY_INFORMATION | PROCESS_VM_READ,
                false,
                pid,
            )
        }
        .map_err(|_| GrubCounterError::AccessDenied)?;

        Ok(Self { handle })
    }

    fn enumerate_regions(&self) -> Result<Vec<MemoryRegion>, GrubCounterError> {
        let mut regions = Vec::new();
        let mut address: u32 = 0;

        loop {
            let mut info = MEMORY_BASIC_INFORMATION::default();

            // SAFETY: `info` is a valid, appropriately-sized out parameter;
            // the handle is kept alive for the lifetime of `self`.
            let written = unsafe {
                VirtualQueryEx(
                    self.handle,
                    Some(address as usize as *const _),
                    &mut info,
                    std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
                )
            };

            if written == 0 {
                // VirtualQueryEx fails once the address walks off the end of
                // the address space; that's the normal end-of-enumeration
                // condition, not an enumeration failure.
                break;
            }

            let region_base = info.BaseAddress as usize as u32;
            let region_size = info.RegionSize as u32;

            if info.State == MEM_COMMIT {
                if let Some(protection) = readable_protection(info.Protect.0) {
                    regions.push(MemoryRegion::new(
                        Address32::new(region_base),
                        region_size,
                        protection,
                    ));
                }
            }

            let next = region_base.checked_add(region_size);
            match next {
                Some(next) if next > address => address = next,
                _ => break,
            }
        }

        Ok(regions)
    }

    fn read(&self, address: Address32, buf: &mut [u8]) -> Result<(), GrubCounterError> {
        let mut bytes_read = 0usize;

        // SAFETY: `buf` is a valid, appropriately-sized out parameter owned
        // by the caller for the duration of this call.
        let result = unsafe {
            ReadProcessMemory(
                self.handle,
                address.value() as usize as *const _,
                buf.as_mut_ptr().cast(),
                buf.len(),
                Some(&mut bytes_read),
            )
        };

        if result.is_err() || bytes_read != buf.len() {
            return Err(GrubCounterError::read_failed(address));
        }

        Ok(())
    }
}

impl Drop for WindowsProcess {
    fn drop(&mut self) {
        // SAFETY: `self.handle` is only ever constructed by a successful
        // `OpenProcess` call above, and is never closed anywhere else.
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

/// Maps a raw Win32 page-protection value to the subset this crate cares
/// about, or `None` if the region is not readable at all (guard pages and
/// `PAGE_NOACCESS` are excluded here, per the region enumeration contract).
fn readable_protection(protect: u32) -> Option<RegionProtection> {
    // Guard pages raise an exception on access; treat as unreadable. The
    // no-cache bit doesn't affect readability, just strip it before matching.
    if protect & PAGE_GUARD.0 != 0 {
        return None;
    }
    let base = protect & !PAGE_NOCACHE.0;

    let mut flags = RegionProtection::empty();
    match base {
        x if x == PAGE_NOACCESS.0 => return None,
        x if x == PAGE_READONLY.0 => flags |= RegionProtection::READ,
        x if x == PAGE_READWRITE.0 => flags |= RegionProtection::READ | RegionProtection::WRITE,
        x if x == PAGE_WRITECOPY.0 => flags |= RegionProtection::READ | RegionProtection::WRITE,
        x if x == PAGE_EXECUTE.0 => flags |= RegionProtection::EXECUTE,
        x if x == PAGE_EXECUTE_READ.0 => {
            flags |= RegionProtection::READ | RegionProtection::EXECUTE
        }
        x if x == PAGE_EXECUTE_READWRITE.0 => {
            flags |= RegionProtection::READ | RegionProtection::WRITE | RegionProtection::EXECUTE
        }
        x if x == PAGE_EXECUTE_WRITECOPY.0 => {
            flags |= RegionProtection::READ | RegionProtection::WRITE | RegionProtection::EXECUTE
        }
        _ => return None,
    }

    if flags.contains(RegionProtection::READ) {
        Some(flags)
    } else {
        None
    }
}

/// Walks a process snapshot looking for the first process whose image
/// filename matches `name` (case-insensitive, as Windows process lookups by
/// name conventionally are).
fn find_process_id_by_name(name: &str) -> Result<u32, GrubCounterError> {
    // SAFETY: Requesting a process-only snapshot is always a valid call.
    let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }
        .map_err(|_| GrubCounterError::EnumerationFailed)?;

    let mut entry = PROCESSENTRY32W {
        dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };

    // SAFETY: `entry.dwSize` is set as the API requires; `snapshot` is a
    // freshly created, still-open handle.
    let mut has_entry = unsafe { Process32FirstW(snapshot, &mut entry) }.is_ok();

    let mut found = None;
    while has_entry {
        if process_name_matches(&entry.szExeFile, name) {
            found = Some(entry.th32ProcessID);
            break;
        }
        // SAFETY: `snapshot` remains valid and `entry` is reused in place.
        has_entry = unsafe { Process32NextW(snapshot, &mut entry) }.is_ok();
    }

    // SAFETY: `snapshot` was created by `CreateToolhelp32Snapshot` above and
    // is not used again after this point.
    unsafe {
        let _ = CloseHandle(snapshot);
    }

    found.ok_or_else(|| GrubCounterError::process_not_running(name))
}

fn process_name_matches(raw_exe_file: &[u16], target: &str) -> bool {
    let len = raw_exe_file
        .iter()
        .position(|&c| c == 0)
        .unwrap_or(raw_exe_file.len());
    let exe_file = String::from_utf16_lossy(&raw_exe_file[..len]);
    exe_file.eq_ignore_ascii_case(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_name_match_is_case_insensitive() {
        let wide: Vec<u16> = "MonkeyIsland103.exe\0".encode_utf16().collect();
        assert!(process_name_matches(&wide, "monkeyisland103.exe"));
        assert!(!process_name_matches(&wide, "scummvm.exe"));
    }

    #[test]
    fn readable_protection_excludes_noaccess_and_guard() {
        assert_eq!(readable_protection(PAGE_NOACCESS.0), None);
        assert_eq!(readable_protection(PAGE_READWRITE.0 | PAGE_GUARD.0), None);
    }

    #[test]
    fn readable_protection_accepts_read_variants() {
        assert!(readable_protection(PAGE_READONLY.0).is_some());
        assert!(readable_protection(PAGE_READWRITE.0).is_some());
        assert!(readable_protection(PAGE_EXECUTE_READ.0).is_some());
    }

    #[test]
    fn readable_protection_excludes_execute_only() {
        assert_eq!(readable_protection(PAGE_EXECUTE.0), None);
    }
}
