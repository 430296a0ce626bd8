use crate::errors::{Error, Result};
use crate::opener::{Descriptor, OpenMode, open};
use crate::stream::PushStream;
use std::io::{self, Write};
use std::path::Path;
use tracing::trace;

/// Opens `path` for writing. Read mode is rejected before the path is touched.
pub(crate) fn open_output(path: &Path, mode: OpenMode) -> Result<Descriptor> {
    if mode == OpenMode::Read {
        return Err(Error::InvalidMode(mode));
    }
    open(path, mode)
}

/// Push stream writing every chunk in full to `descriptor`. `None` chunks are ignored.
pub(crate) fn stream(descriptor: &mut Descriptor) -> PushStream<'_> {
    PushStream::from_fn(move |chunk| match chunk {
        None => Ok(()),
        Some(data) => {
            let file = descriptor.file_mut().map_err(Error::Write)?;
            write_fully(file, data)
        }
    })
}

/// Loops over short writes until `data` is exhausted.
fn write_fully<W: Write>(writer: &mut W, mut data: &[u8]) -> Result<()> {
    while !data.is_empty() {
        match writer.write(data) {
            Ok(0) => return Err(Error::Write(io::Error::from(io::ErrorKind::WriteZero))),
            Ok(n) => {
                if n < data.len() {
                    trace!("short write: {} of {} bytes", n, data.len());
                }
                data = &data[n..];
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Write(e)),
        }
    }
    Ok(())
}
