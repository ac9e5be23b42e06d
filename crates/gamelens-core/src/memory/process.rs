//! Read-only handle to the observed process.
//!
//! Windows uses `OpenProcess`/`ReadProcessMemory`; other platforms read
//! through `/proc/<pid>/mem`.

use tracing::{debug, info};

use crate::error::{Error, Result};

pub struct ProcessHandle {
    pub pid: u32,
    inner: platform::RawProcess,
}

impl ProcessHandle {
    /// Open a process by id with read-only access
    pub fn open(pid: u32) -> Result<Self> {
        let inner = platform::RawProcess::open(pid)?;
        info!("Opened process {} for reading", pid);
        Ok(Self { pid, inner })
    }

    /// Find a running process by executable name and open it
    pub fn find_and_open(name: &str) -> Result<Self> {
        let pid = platform::find_pid(name)?
            .ok_or_else(|| Error::ProcessNotFound(name.to_string()))?;
        debug!("Found {} with pid {}", name, pid);
        Self::open(pid)
    }

    /// Read into `buffer`, returning the number of bytes actually read
    pub fn read_into(&self, address: u64, buffer: &mut [u8]) -> Result<usize> {
        self.inner.read_into(address, buffer)
    }

    pub fn is_running(&self) -> bool {
        self.inner.is_running()
    }
}

#[cfg(target_os = "windows")]
mod platform {
    use std::ffi::c_void;

    use windows::Win32::Foundation::{CloseHandle, HANDLE, STILL_ACTIVE};
    use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW,
        TH32CS_SNAPPROCESS,
    };
    use windows::Win32::System::Threading::{
        GetExitCodeProcess, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_VM_READ,
    };

    use crate::error::{Error, Result};

    /// Raw handle value, kept as an integer so the handle is `Send + Sync`
    pub struct RawProcess {
        handle: isize,
    }

    impl RawProcess {
        pub fn open(pid: u32) -> Result<Self> {
            let handle = unsafe {
                OpenProcess(
                    PROCESS_VM_READ | PROCESS_QUERY_LIMITED_INFORMATION,
                    false,
                    pid,
                )
            }
            .map_err(|e| Error::ProcessOpenFailed(format!("pid {}: {}", pid, e)))?;

            Ok(Self {
                handle: handle.0 as isize,
            })
        }

        fn handle(&self) -> HANDLE {
            HANDLE(self.handle as *mut c_void)
        }

        pub fn read_into(&self, address: u64, buffer: &mut [u8]) -> Result<usize> {
            let mut read = 0usize;
            let result = unsafe {
                ReadProcessMemory(
                    self.handle(),
                    address as *const c_void,
                    buffer.as_mut_ptr() as *mut c_void,
                    buffer.len(),
                    Some(&mut read),
                )
            };

            match result {
                Ok(()) => Ok(read),
                // ERROR_PARTIAL_COPY still reports how much was copied
                Err(_) if read > 0 => Ok(read),
                Err(e) => Err(Error::MemoryReadFailed {
                    address,
                    message: e.to_string(),
                }),
            }
        }

        pub fn is_running(&self) -> bool {
            let mut code = 0u32;
            let ok = unsafe { GetExitCodeProcess(self.handle(), &mut code) }.is_ok();
            ok && code == STILL_ACTIVE.0 as u32
        }
    }

    impl Drop for RawProcess {
        fn drop(&mut self) {
            let _ = unsafe { CloseHandle(self.handle()) };
        }
    }

    pub fn find_pid(name: &str) -> Result<Option<u32>> {
        let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }
            .map_err(|e| Error::ProcessNotFound(format!("process snapshot failed: {}", e)))?;

        let mut entry = PROCESSENTRY32W {
            dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };

        let mut found = None;
        let mut has_entry = unsafe { Process32FirstW(snapshot, &mut entry) }.is_ok();
        while has_entry {
            let len = entry
                .szExeFile
                .iter()
                .position(|&c| c == 0)
                .unwrap_or(entry.szExeFile.len());
            let exe = String::from_utf16_lossy(&entry.szExeFile[..len]);
            if exe.eq_ignore_ascii_case(name) {
                found = Some(entry.th32ProcessID);
                break;
            }
            has_entry = unsafe { Process32NextW(snapshot, &mut entry) }.is_ok();
        }

        let _ = unsafe { CloseHandle(snapshot) };
        Ok(found)
    }
}

#[cfg(not(target_os = "windows"))]
mod platform {
    use std::fs::{self, File};
    use std::os::unix::fs::FileExt;
    use std::path::PathBuf;

    use crate::error::{Error, Result};

    pub struct RawProcess {
        pid: u32,
        mem: File,
    }

    impl RawProcess {
        pub fn open(pid: u32) -> Result<Self> {
            let path = PathBuf::from(format!("/proc/{}/mem", pid));
            let mem = File::open(&path)
                .map_err(|e| Error::ProcessOpenFailed(format!("{}: {}", path.display(), e)))?;
            Ok(Self { pid, mem })
        }

        pub fn read_into(&self, address: u64, buffer: &mut [u8]) -> Result<usize> {
            let mut total = 0;
            while total < buffer.len() {
                match self.mem.read_at(&mut buffer[total..], address + total as u64) {
                    Ok(0) => break,
                    Ok(n) => total += n,
                    Err(_) if total > 0 => break,
                    Err(e) => {
                        return Err(Error::MemoryReadFailed {
                            address,
                            message: e.to_string(),
                        });
                    }
                }
            }
            Ok(total)
        }

        pub fn is_running(&self) -> bool {
            PathBuf::from(format!("/proc/{}", self.pid)).exists()
        }
    }

    pub fn find_pid(name: &str) -> Result<Option<u32>> {
        for entry in fs::read_dir("/proc")? {
            let entry = entry?;
            let Some(pid) = entry
                .file_name()
                .to_str()
                .and_then(|s| s.parse::<u32>().ok())
            else {
                continue;
            };

            // comm is truncated to 15 bytes, so match against the command line too
            let comm = fs::read_to_string(entry.path().join("comm")).unwrap_or_default();
            let cmdline = fs::read(entry.path().join("cmdline")).unwrap_or_default();
            let exe = cmdline
                .split(|&b| b == 0)
                .next()
                .map(|arg| String::from_utf8_lossy(arg).into_owned())
                .unwrap_or_default();
            let exe_name = exe.rsplit(['/', '\\']).next().unwrap_or_default();

            if comm.trim_end() == name || exe_name.eq_ignore_ascii_case(name) {
                return Ok(Some(pid));
            }
        }
        Ok(None)
    }
}
