/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

/// Change ownership of a file, used by the Maildir LDA to hand delivered
/// mail to its target user/group.
///
/// # Errors
///
/// * `path` cannot be converted to `CString`
/// * see `chown(2)` ERRORS
#[inline]
pub fn chown(path: &std::path::Path, user: Option<u32>, group: Option<u32>) -> std::io::Result<()> {
    let path = std::ffi::CString::new(path.to_string_lossy().as_bytes())?;
    #[allow(unsafe_code)]
    // SAFETY: ffi call
    match unsafe {
        libc::chown(
            path.as_ptr(),
            user.unwrap_or(u32::MAX),
            group.unwrap_or(u32::MAX),
        )
    } {
        0i32 => Ok(()),
        _ => Err(std::io::Error::last_os_error()),
    }
}

/// Get a local user's home directory by uid.
///
/// # Errors
///
/// * see `getpwuid(2)` ERRORS
/// * the path is not valid utf8
#[inline]
pub fn getpwuid(uid: libc::uid_t) -> std::io::Result<std::path::PathBuf> {
    #[allow(unsafe_code)]
    // SAFETY: ffi call
    let passwd = unsafe { libc::getpwuid(uid) };
    #[allow(unsafe_code)]
    // SAFETY: `passwd` is checked against null before deref
    if passwd.is_null() || unsafe { *passwd }.pw_dir.is_null() {
        return Err(std::io::Error::last_os_error());
    }
    #[allow(unsafe_code)]
    // SAFETY: pointer is not null, checked above
    let buffer = unsafe { *passwd }.pw_dir;
    #[allow(unsafe_code)]
    // SAFETY: the foreign allocation is used correctly as specified in `CStr::from_ptr`
    Ok(unsafe { std::ffi::CStr::from_ptr(buffer) }
        .to_str()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?
        .into())
}
