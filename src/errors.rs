use crate::opener::OpenMode;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Open { path: PathBuf, source: io::Error },
    // Output streams cannot be opened read-only. Reported before the path is touched.
    InvalidMode(OpenMode),
    Stat { path: PathBuf, source: io::Error },
    Map { path: PathBuf, source: io::Error },
    Seek(io::Error),
    Read(io::Error),
    Write(io::Error),
    Close(io::Error),
    InvalidOptions(&'static str),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Open { path, source } => {
                write!(f, "failed to open {}: {}", path.display(), source)
            }
            Error::InvalidMode(mode) => {
                write!(f, "output stream cannot be opened in {:?} mode", mode)
            }
            Error::Stat { path, source } => {
                write!(f, "failed to stat {}: {}", path.display(), source)
            }
            Error::Map { path, source } => {
                write!(f, "failed to map {}: {}", path.display(), source)
            }
            Error::Seek(err) => write!(f, "seek error: {}", err),
            Error::Read(err) => write!(f, "read error: {}", err),
            Error::Write(err) => write!(f, "write error: {}", err),
            Error::Close(err) => write!(f, "close error: {}", err),
            Error::InvalidOptions(reason) => write!(f, "invalid stream options: {}", reason),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { source, .. } | Error::Stat { source, .. } | Error::Map { source, .. } => {
                Some(source)
            }
            Error::Seek(err) | Error::Read(err) | Error::Write(err) | Error::Close(err) => Some(err),
            Error::InvalidMode(_) | Error::InvalidOptions(_) => None,
        }
    }
}

impl Error {
    /// The underlying OS error kind, if this error came from a syscall.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::Open { source, .. } | Error::Stat { source, .. } | Error::Map { source, .. } => {
                Some(source.kind())
            }
            Error::Seek(err) | Error::Read(err) | Error::Write(err) | Error::Close(err) => {
                Some(err.kind())
            }
            Error::InvalidMode(_) | Error::InvalidOptions(_) => None,
        }
    }
}
