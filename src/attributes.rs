//! File attribute capability: the hidden flag used to skip items and the
//! protective flags kept on checksum files.
//!
//! The bit layout follows the Windows file attribute mask. Platforms without
//! a hidden/system concept only honor [`FileAttributes::READONLY`], which is
//! mapped onto the permission write bits.

use std::io::ErrorKind;
use std::ops::BitOr;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum AttributeError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Not found: {0}")]
    NotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
}

impl AttributeError {
    fn from_io(path: &Path, e: std::io::Error) -> Self {
        match e.kind() {
            ErrorKind::NotFound => AttributeError::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => AttributeError::PermissionDenied(path.to_path_buf()),
            _ => AttributeError::Io(e),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileAttributes(u32);

impl FileAttributes {
    pub const READONLY: FileAttributes = FileAttributes(0x01);
    pub const HIDDEN: FileAttributes = FileAttributes(0x02);

    /// Flags applied to checksum files so they are not casually edited or deleted.
    pub const PROTECTED: FileAttributes = FileAttributes(0x01 | 0x02);

    #[cfg_attr(not(windows), allow(dead_code))]
    pub const fn from_bits(bits: u32) -> Self {
        FileAttributes(bits)
    }

    #[cfg_attr(not(windows), allow(dead_code))]
    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: FileAttributes) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn without(self, other: FileAttributes) -> Self {
        FileAttributes(self.0 & !other.0)
    }
}

impl BitOr for FileAttributes {
    type Output = FileAttributes;

    fn bitor(self, rhs: FileAttributes) -> FileAttributes {
        FileAttributes(self.0 | rhs.0)
    }
}

/// Query and set access to a path's attribute mask.
pub trait AttributeStore {
    /// Fails with [`AttributeError::NotFound`] if `path` does not exist.
    fn get(&self, path: &Path) -> Result<FileAttributes, AttributeError>;

    fn set(&self, path: &Path, attributes: FileAttributes) -> Result<(), AttributeError>;

    fn is_hidden(&self, path: &Path) -> Result<bool, AttributeError> {
        Ok(self.get(path)?.contains(FileAttributes::HIDDEN))
    }

    fn protect(&self, path: &Path) -> Result<(), AttributeError> {
        let current = self.get(path)?;
        self.set(path, current | FileAttributes::PROTECTED)
    }

    fn unprotect(&self, path: &Path) -> Result<(), AttributeError> {
        let current = self.get(path)?;
        self.set(path, current.without(FileAttributes::PROTECTED))
    }
}

/// Attributes as provided by the host platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeAttributes;

#[cfg(windows)]
mod win32 {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use winapi::um::fileapi::{GetFileAttributesW, SetFileAttributesW};

    pub use winapi::um::fileapi::INVALID_FILE_ATTRIBUTES;

    fn wide(path: &OsStr) -> Vec<u16> {
        path.encode_wide().chain(std::iter::once(0)).collect()
    }

    pub fn get(path: &OsStr) -> u32 {
        let name = wide(path);
        // SAFETY: `name` is a NUL-terminated UTF-16 string that outlives the call.
        unsafe { GetFileAttributesW(name.as_ptr()) }
    }

    pub fn set(path: &OsStr, attributes: u32) -> bool {
        let name = wide(path);
        // SAFETY: `name` is a NUL-terminated UTF-16 string that outlives the call.
        unsafe { SetFileAttributesW(name.as_ptr(), attributes) != 0 }
    }
}

#[cfg(windows)]
impl AttributeStore for NativeAttributes {
    fn get(&self, path: &Path) -> Result<FileAttributes, AttributeError> {
        let bits = win32::get(path.as_os_str());
        if bits == win32::INVALID_FILE_ATTRIBUTES {
            return Err(AttributeError::from_io(
                path,
                std::io::Error::last_os_error(),
            ));
        }
        Ok(FileAttributes::from_bits(bits))
    }

    fn set(&self, path: &Path, attributes: FileAttributes) -> Result<(), AttributeError> {
        if win32::set(path.as_os_str(), attributes.bits()) {
            Ok(())
        } else {
            Err(AttributeError::from_io(
                path,
                std::io::Error::last_os_error(),
            ))
        }
    }
}

#[cfg(not(windows))]
impl AttributeStore for NativeAttributes {
    fn get(&self, path: &Path) -> Result<FileAttributes, AttributeError> {
        let metadata = std::fs::metadata(path).map_err(|e| AttributeError::from_io(path, e))?;
        if metadata.permissions().readonly() {
            Ok(FileAttributes::READONLY)
        } else {
            Ok(FileAttributes::default())
        }
    }

    fn set(&self, path: &Path, attributes: FileAttributes) -> Result<(), AttributeError> {
        let metadata = std::fs::metadata(path).map_err(|e| AttributeError::from_io(path, e))?;
        let mut permissions = metadata.permissions();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = permissions.mode();
            let mode = if attributes.contains(FileAttributes::READONLY) {
                mode & !0o222
            } else {
                mode | 0o200
            };
            if mode == permissions.mode() {
                return Ok(());
            }
            permissions.set_mode(mode);
        }
        #[cfg(not(unix))]
        {
            let readonly = attributes.contains(FileAttributes::READONLY);
            if readonly == permissions.readonly() {
                return Ok(());
            }
            permissions.set_readonly(readonly);
        }

        std::fs::set_permissions(path, permissions).map_err(|e| AttributeError::from_io(path, e))
    }
}

/// Attribute store that never reports hidden items and never changes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAttributes;

impl AttributeStore for NoAttributes {
    fn get(&self, path: &Path) -> Result<FileAttributes, AttributeError> {
        std::fs::symlink_metadata(path).map_err(|e| AttributeError::from_io(path, e))?;
        Ok(FileAttributes::default())
    }

    fn set(&self, _path: &Path, _attributes: FileAttributes) -> Result<(), AttributeError> {
        Ok(())
    }
}
