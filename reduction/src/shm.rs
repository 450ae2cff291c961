// Named shared-memory region holding exactly one `T`, mapped MAP_SHARED so
// forked children see the same pages. The creator owns the kernel name.

use std::ffi::CString;
use std::marker::PhantomData;
use std::ptr;

use crate::error::{Error, Result};

pub struct ShmRegion<T> {
    map: *mut libc::c_void,
    len: usize,
    name: CString,
    owner: bool,
    _marker: PhantomData<T>,
}

unsafe impl<T> Send for ShmRegion<T> {}
unsafe impl<T> Sync for ShmRegion<T> {}

impl<T> ShmRegion<T> {
    /// Create, size, and map a fresh region. `ftruncate` zero-fills, so all
    /// fields of `T` start as all-zero bytes.
    pub fn create(name: &str) -> Result<Self> {
        let cname = shm_name(name)?;
        let len = std::mem::size_of::<T>();
        unsafe {
            libc::shm_unlink(cname.as_ptr());
            let fd = libc::shm_open(
                cname.as_ptr(),
                libc::O_CREAT | libc::O_EXCL | libc::O_RDWR,
                0o600 as libc::mode_t,
            );
            if fd < 0 {
                return Err(Error::sys("shm_open", name));
            }
            if libc::ftruncate(fd, len as libc::off_t) != 0 {
                let err = Error::sys("ftruncate", name);
                libc::close(fd);
                libc::shm_unlink(cname.as_ptr());
                return Err(err);
            }
            let map = libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            );
            libc::close(fd);
            if map == libc::MAP_FAILED {
                let err = Error::sys("mmap", name);
                libc::shm_unlink(cname.as_ptr());
                return Err(err);
            }
            Ok(ShmRegion {
                map,
                len,
                name: cname,
                owner: true,
                _marker: PhantomData,
            })
        }
    }

    /// Raw pointer into the mapping. Valid for the lifetime of the region
    /// in this process and, after fork, in every child that inherited it.
    pub fn get(&self) -> *mut T {
        self.map as *mut T
    }
}

impl<T> Drop for ShmRegion<T> {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.map, self.len);
            if self.owner {
                libc::shm_unlink(self.name.as_ptr());
            }
        }
    }
}

fn shm_name(name: &str) -> Result<CString> {
    CString::new(format!("/{}", name)).map_err(|_| Error::Sys {
        op: "shm_open",
        name: name.to_string(),
        source: std::io::Error::from_raw_os_error(libc::EINVAL),
    })
}
