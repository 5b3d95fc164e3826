//! OS process discovery and raw memory access.
//!
//! Only Windows hosts can attach; elsewhere [`ProcessHandle::find_and_open`]
//! reports the target as not found so the poll loop keeps idling.

use serde::Serialize;

/// Identity of an attached process and its main module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub process_name: String,
    pub module_name: String,
    pub base_address: u64,
    pub module_size: u32,
}

/// Compare an executable name from the OS against a configured process name.
///
/// The configured name may omit the `.exe` suffix. Matching is ASCII
/// case-insensitive, as Windows file names are.
pub fn process_name_matches(exe_name: &str, wanted: &str) -> bool {
    if exe_name.eq_ignore_ascii_case(wanted) {
        return true;
    }
    exe_name.len() == wanted.len() + 4
        && exe_name
            .get(..wanted.len())
            .is_some_and(|stem| stem.eq_ignore_ascii_case(wanted))
        && exe_name
            .get(wanted.len()..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".exe"))
}

/// Convert a NUL-terminated UTF-16 buffer from a Win32 struct
pub fn wide_to_string(wide: &[u16]) -> String {
    let end = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..end])
}

#[cfg(target_os = "windows")]
mod imp {
    use std::ffi::c_void;
    use std::mem::size_of;

    use tracing::debug;
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, MODULEENTRY32W, Module32FirstW, Module32NextW,
        PROCESSENTRY32W, Process32FirstW, Process32NextW, TH32CS_SNAPMODULE,
        TH32CS_SNAPMODULE32, TH32CS_SNAPPROCESS,
    };
    use windows::Win32::System::Threading::{
        GetExitCodeProcess, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_VM_READ,
    };

    use super::{ProcessInfo, process_name_matches, wide_to_string};
    use crate::error::{Error, Result};

    /// Exit code reported for a process that has not terminated
    const STILL_ACTIVE: u32 = 259;

    pub struct ProcessHandle {
        handle: HANDLE,
        info: ProcessInfo,
    }

    // SAFETY: a process HANDLE is a kernel object reference valid from any thread;
    // ProcessHandle only uses it for read-only queries.
    unsafe impl Send for ProcessHandle {}

    impl ProcessHandle {
        pub fn find_and_open(process_name: &str, module_name: &str) -> Result<Self> {
            let pid = find_process_id(process_name)?;

            // SAFETY: OpenProcess has no pointer arguments; the handle is closed in Drop.
            let handle =
                unsafe { OpenProcess(PROCESS_VM_READ | PROCESS_QUERY_LIMITED_INFORMATION, false, pid) }
                    .map_err(|e| {
                        Error::ProcessMemoryReadDenied(format!("{} (pid {}): {}", process_name, pid, e))
                    })?;

            let (base_address, module_size) = match find_module(pid, module_name) {
                Ok(module) => module,
                Err(e) => {
                    // SAFETY: handle was returned by OpenProcess above and not closed yet.
                    unsafe {
                        let _ = CloseHandle(handle);
                    }
                    return Err(e);
                }
            };

            debug!(
                "Opened {} (pid {}), {} at {:#x} ({} bytes)",
                process_name, pid, module_name, base_address, module_size
            );

            Ok(Self {
                handle,
                info: ProcessInfo {
                    pid,
                    process_name: process_name.to_string(),
                    module_name: module_name.to_string(),
                    base_address,
                    module_size,
                },
            })
        }

        pub fn info(&self) -> &ProcessInfo {
            &self.info
        }

        pub fn is_alive(&self) -> bool {
            let mut code = 0u32;
            // SAFETY: handle stays open for the lifetime of self; code is a valid out pointer.
            let queried = unsafe { GetExitCodeProcess(self.handle, &mut code) };
            queried.is_ok() && code == STILL_ACTIVE
        }

        pub fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
            let mut buffer = vec![0u8; size];
            let mut read = 0usize;

            // SAFETY: buffer is valid for `size` writable bytes and outlives the call;
            // the remote address is only interpreted by the kernel.
            unsafe {
                ReadProcessMemory(
                    self.handle,
                    address as usize as *const c_void,
                    buffer.as_mut_ptr().cast(),
                    size,
                    Some(&mut read),
                )
            }
            .map_err(|e| Error::MemoryReadFailed {
                address,
                message: e.to_string(),
            })?;

            if read != size {
                return Err(Error::MemoryReadFailed {
                    address,
                    message: format!("short read: {} of {} bytes", read, size),
                });
            }

            Ok(buffer)
        }
    }

    impl Drop for ProcessHandle {
        fn drop(&mut self) {
            // SAFETY: handle came from OpenProcess and is closed exactly once.
            unsafe {
                let _ = CloseHandle(self.handle);
            }
        }
    }

    /// ToolHelp snapshot closed on drop
    struct Snapshot(HANDLE);

    impl Drop for Snapshot {
        fn drop(&mut self) {
            // SAFETY: the snapshot handle is owned by this guard.
            unsafe {
                let _ = CloseHandle(self.0);
            }
        }
    }

    fn find_process_id(process_name: &str) -> Result<u32> {
        // SAFETY: no pointer arguments.
        let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }
            .map(Snapshot)
            .map_err(|e| Error::ProcessNotFound(format!("{}: {}", process_name, e)))?;

        let mut entry = PROCESSENTRY32W {
            dwSize: size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };

        // SAFETY: entry is a properly sized PROCESSENTRY32W with dwSize set.
        let mut more = unsafe { Process32FirstW(snapshot.0, &mut entry) }.is_ok();
        while more {
            if process_name_matches(&wide_to_string(&entry.szExeFile), process_name) {
                return Ok(entry.th32ProcessID);
            }
            // SAFETY: as above.
            more = unsafe { Process32NextW(snapshot.0, &mut entry) }.is_ok();
        }

        Err(Error::ProcessNotFound(process_name.to_string()))
    }

    fn find_module(pid: u32, module_name: &str) -> Result<(u64, u32)> {
        // SAFETY: no pointer arguments.
        let snapshot =
            unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid) }
                .map(Snapshot)
                .map_err(|e| {
                    Error::ProcessMemoryReadDenied(format!("module list of pid {}: {}", pid, e))
                })?;

        let mut entry = MODULEENTRY32W {
            dwSize: size_of::<MODULEENTRY32W>() as u32,
            ..Default::default()
        };

        // SAFETY: entry is a properly sized MODULEENTRY32W with dwSize set.
        let mut more = unsafe { Module32FirstW(snapshot.0, &mut entry) }.is_ok();
        while more {
            if wide_to_string(&entry.szModule).eq_ignore_ascii_case(module_name) {
                return Ok((entry.modBaseAddr as usize as u64, entry.modBaseSize));
            }
            // SAFETY: as above.
            more = unsafe { Module32NextW(snapshot.0, &mut entry) }.is_ok();
        }

        Err(Error::ProcessNotFound(format!(
            "module {} in pid {}",
            module_name, pid
        )))
    }
}

#[cfg(not(target_os = "windows"))]
mod imp {
    use super::ProcessInfo;
    use crate::error::{Error, Result};

    pub struct ProcessHandle {
        info: ProcessInfo,
    }

    impl ProcessHandle {
        pub fn find_and_open(process_name: &str, _module_name: &str) -> Result<Self> {
            Err(Error::ProcessNotFound(format!(
                "{}: attaching is only supported on Windows",
                process_name
            )))
        }

        pub fn info(&self) -> &ProcessInfo {
            &self.info
        }

        pub fn is_alive(&self) -> bool {
            false
        }

        pub fn read_bytes(&self, address: u64, _size: usize) -> Result<Vec<u8>> {
            Err(Error::MemoryReadFailed {
                address,
                message: "process memory is only readable on Windows".to_string(),
            })
        }
    }
}

pub use imp::ProcessHandle;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_name_matches() {
        assert!(process_name_matches("Game.exe", "game"));
        assert!(process_name_matches("game.EXE", "Game"));
        assert!(process_name_matches("Game.exe", "Game.exe"));
        assert!(!process_name_matches("Game2.exe", "game"));
        assert!(!process_name_matches("Gamexexe", "game"));
        assert!(!process_name_matches("gam", "game"));
    }

    #[test]
    fn test_wide_to_string_stops_at_nul() {
        let mut wide = [0u16; 16];
        for (i, c) in "Game.exe".encode_utf16().enumerate() {
            wide[i] = c;
        }
        assert_eq!(wide_to_string(&wide), "Game.exe");
        assert_eq!(wide_to_string(&[0x41, 0x42]), "AB");
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_attach_unsupported_reports_not_found() {
        let result = ProcessHandle::find_and_open("game", "Game.exe");
        assert!(matches!(result, Err(crate::Error::ProcessNotFound(_))));
    }
}
