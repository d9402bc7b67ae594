use std::{
    ffi::{CString, OsStr},
    io,
    os::unix::prelude::OsStrExt,
};

pub fn cerr<Int: Copy + TryInto<libc::c_long>>(res: Int) -> std::io::Result<Int> {
    match res.try_into() {
        Ok(-1) => Err(std::io::Error::last_os_error()),
        _ => Ok(res),
    }
}

extern "C" {
    #[cfg_attr(
        any(target_os = "macos", target_os = "ios", target_os = "freebsd"),
        link_name = "__error"
    )]
    #[cfg_attr(
        any(target_os = "openbsd", target_os = "netbsd", target_os = "android"),
        link_name = "__errno"
    )]
    #[cfg_attr(target_os = "linux", link_name = "__errno_location")]
    fn errno_location() -> *mut libc::c_int;
}

/// Read the calling thread's `errno`. Async-signal-safe.
pub fn errno() -> libc::c_int {
    unsafe { *errno_location() }
}

/// Overwrite the calling thread's `errno`. Async-signal-safe.
pub fn set_errno(no: libc::c_int) {
    unsafe { *errno_location() = no };
}

/// Copy an OS string into a NUL-terminated C string, failing if it contains an interior
/// NUL byte.
pub fn to_cstring(value: impl AsRef<OsStr>) -> io::Result<CString> {
    CString::new(value.as_ref().as_bytes()).map_err(|err| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("nul byte at position {}", err.nul_position()),
        )
    })
}

/// Write the whole buffer to `fd` using only `write(2)`, retrying on partial writes and
/// `EINTR`. Errors are dropped: this is used where there is nobody left to report to.
///
/// Async-signal-safe: performs no allocation and takes no locks.
pub fn write_all_raw(fd: libc::c_int, mut buf: &[u8]) {
    while !buf.is_empty() {
        let written = unsafe { libc::write(fd, buf.as_ptr().cast(), buf.len()) };
        if written < 0 {
            if errno() == libc::EINTR {
                continue;
            }
            return;
        }
        if written == 0 {
            return;
        }
        buf = &buf[written as usize..];
    }
}
