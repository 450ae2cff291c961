// Named POSIX semaphores as owned capability handles. The creator owns the
// kernel name and unlinks it on drop; handles survive fork, so children
// inherit them without reopening.

use std::ffi::CString;

use crate::error::{Error, Result};

pub struct Semaphore {
    raw: *mut libc::sem_t,
    name: CString,
    owner: bool,
}

// The handle is a stable pointer into the C runtime; the kernel object
// itself serializes all access.
unsafe impl Send for Semaphore {}
unsafe impl Sync for Semaphore {}

impl Semaphore {
    /// Create a fresh named semaphore with the given initial count,
    /// destroying any stale instance left by a previous abnormal run.
    pub fn create(name: &str, initial: u32) -> Result<Self> {
        let cname = sem_name(name)?;
        unsafe {
            // Stale-name cleanup; ENOENT is the normal case.
            libc::sem_unlink(cname.as_ptr());
            let raw = libc::sem_open(
                cname.as_ptr(),
                libc::O_CREAT | libc::O_EXCL,
                0o600 as libc::c_uint,
                initial as libc::c_uint,
            );
            if raw == libc::SEM_FAILED {
                return Err(Error::sys("sem_open", name));
            }
            Ok(Semaphore {
                raw,
                name: cname,
                owner: true,
            })
        }
    }

    /// Decrement, blocking until a permit is available. Retries EINTR.
    pub fn wait(&self) -> Result<()> {
        loop {
            if unsafe { libc::sem_wait(self.raw) } == 0 {
                return Ok(());
            }
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EINTR) {
                return Err(Error::Sys {
                    op: "sem_wait",
                    name: self.display_name(),
                    source: err,
                });
            }
        }
    }

    /// Increment, releasing one permit.
    pub fn post(&self) -> Result<()> {
        if unsafe { libc::sem_post(self.raw) } == 0 {
            Ok(())
        } else {
            Err(Error::Sys {
                op: "sem_post",
                name: self.display_name(),
                source: std::io::Error::last_os_error(),
            })
        }
    }

    /// Scoped acquisition: waits, then releases on every exit path when the
    /// guard drops.
    pub fn lock(&self) -> Result<SemGuard<'_>> {
        self.wait()?;
        Ok(SemGuard { sem: self })
    }

    fn display_name(&self) -> String {
        self.name.to_string_lossy().into_owned()
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            libc::sem_close(self.raw);
            if self.owner {
                libc::sem_unlink(self.name.as_ptr());
            }
        }
    }
}

pub struct SemGuard<'a> {
    sem: &'a Semaphore,
}

impl Drop for SemGuard<'_> {
    fn drop(&mut self) {
        // Post cannot meaningfully fail on a valid handle.
        unsafe { libc::sem_post(self.sem.raw) };
    }
}

// POSIX sem names must start with '/' and contain no further slashes.
fn sem_name(name: &str) -> Result<CString> {
    CString::new(format!("/{}", name)).map_err(|_| Error::Sys {
        op: "sem_open",
        name: name.to_string(),
        source: std::io::Error::from_raw_os_error(libc::EINVAL),
    })
}
