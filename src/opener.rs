use crate::errors::{Error, Result};
use crate::guard::Release;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::IntoRawFd;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OpenMode {
    /// Read only, the file must exist.
    Read,
    /// Create if absent and truncate to zero length.
    Write,
    /// Create if absent, every write lands at end of file.
    Append,
    /// Both directions, create if absent, no truncation.
    ReadWrite,
}

impl OpenMode {
    fn options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        match self {
            OpenMode::Read => options.read(true).write(false),
            OpenMode::Write => options.write(true).create(true).truncate(true),
            OpenMode::Append => options.append(true).create(true),
            OpenMode::ReadWrite => options.read(true).write(true).create(true),
        };
        options
    }
}

/// An owned OS file descriptor. It is closed explicitly on release so that close errors
/// are reported instead of being swallowed by `File`'s destructor.
#[derive(Debug)]
pub struct Descriptor {
    path: PathBuf,
    file: Option<File>,
}

impl Descriptor {
    pub(crate) fn file_mut(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::from_raw_os_error(libc::EBADF))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Release for Descriptor {
    fn release(&mut self) -> Result<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };
        let fd = file.into_raw_fd();
        debug!("closing descriptor {} for {:?}", fd, self.path);
        // SAFETY: `fd` was just detached from its `File`, nothing else owns it.
        if unsafe { libc::close(fd) } == -1 {
            return Err(Error::Close(io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl Drop for Descriptor {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::error!("failed to close {:?} on drop: {}", self.path, e);
        }
    }
}

/// Opens `path` with the flags `mode` calls for. No retry is attempted.
pub fn open(path: &Path, mode: OpenMode) -> Result<Descriptor> {
    let file = mode.options().open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("opened {:?} in {:?} mode", path, mode);
    Ok(Descriptor {
        path: path.to_path_buf(),
        file: Some(file),
    })
}
