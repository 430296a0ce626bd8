use crate::buffer::{Ephemeral, Reused};
use crate::classify::{Strategy, classify};
use crate::errors::{Error, Result};
use crate::guard::Release;
use crate::opener::{Descriptor, OpenMode, open};
use crate::stream::PullStream;
use bytes::Bytes;
use memmap2::Mmap;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, trace};

/// The resource behind an input stream. Exactly one of the two is ever held.
#[derive(Debug)]
pub(crate) enum InputSource {
    /// The mapped file with the offset prefix already dropped. The descriptor used to
    /// map it is closed before the stream is handed out.
    Mapped(Bytes),
    /// A descriptor already positioned at the requested offset.
    Buffered(Descriptor),
}

impl InputSource {
    pub(crate) fn open(path: &Path, offset: u64, mmap_threshold: u64) -> Result<InputSource> {
        match classify(path, mmap_threshold)? {
            Strategy::Mapped => map_region(path, offset).map(InputSource::Mapped),
            Strategy::Buffered => {
                let mut descriptor = open(path, OpenMode::Read)?;
                if offset != 0 {
                    seek_to(&mut descriptor, offset)?;
                }
                Ok(InputSource::Buffered(descriptor))
            }
        }
    }

    pub(crate) fn strategy(&self) -> Strategy {
        match self {
            InputSource::Mapped(_) => Strategy::Mapped,
            InputSource::Buffered(_) => Strategy::Buffered,
        }
    }

    /// Builds the owned-chunk stream. A mapped region is moved into the stream, so the
    /// chunk handed out is the only remaining reference to the mapping.
    pub(crate) fn stream(&mut self, allocator: Ephemeral) -> PullStream<'_> {
        match self {
            InputSource::Mapped(region) => PullStream::once(std::mem::take(region)),
            InputSource::Buffered(descriptor) => {
                PullStream::from_fn(move || read_owned(descriptor, &allocator))
            }
        }
    }
}

impl Release for InputSource {
    fn release(&mut self) -> Result<()> {
        match self {
            InputSource::Mapped(region) => {
                // the mapping goes away once the last chunk sliced from it is dropped
                *region = Bytes::new();
                Ok(())
            }
            InputSource::Buffered(descriptor) => descriptor.release(),
        }
    }
}

fn seek_to(descriptor: &mut Descriptor, offset: u64) -> Result<()> {
    let file = descriptor.file_mut().map_err(Error::Seek)?;
    file.seek(SeekFrom::Start(offset)).map_err(Error::Seek)?;
    debug!("seeked {:?} to {}", descriptor.path(), offset);
    Ok(())
}

fn map_region(path: &Path, offset: u64) -> Result<Bytes> {
    let mut descriptor = open(path, OpenMode::Read)?;
    let region = map_descriptor(&mut descriptor);
    descriptor.release()?;
    let region = region?;

    let start = usize::try_from(offset).map_or(region.len(), |o| o.min(region.len()));
    Ok(region.slice(start..))
}

fn map_descriptor(descriptor: &mut Descriptor) -> Result<Bytes> {
    let path = descriptor.path().to_path_buf();
    let map_error = |source: io::Error| Error::Map {
        path: path.clone(),
        source,
    };

    let file = descriptor.file_mut().map_err(map_error)?;
    let len = file.metadata().map_err(map_error)?.len();
    // zero-length mappings are rejected by mmap(2)
    if len == 0 {
        return Ok(Bytes::new());
    }
    // SAFETY: the mapping is read-only. The file must not be truncated while chunks
    // sliced from it are alive, which is the usual contract of mapped files.
    let mmap = unsafe { Mmap::map(&*file) }.map_err(map_error)?;
    debug!("mapped {} bytes of {:?}", mmap.len(), path);
    Ok(Bytes::from_owner(mmap))
}

/// Issues one read into `buf`. Zero means end of file.
fn read_some(descriptor: &mut Descriptor, buf: &mut [u8]) -> Result<usize> {
    let file = descriptor.file_mut().map_err(Error::Read)?;
    loop {
        match file.read(buf) {
            Ok(n) => {
                trace!("read {} of {} bytes", n, buf.len());
                return Ok(n);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Read(e)),
        }
    }
}

fn read_owned(descriptor: &mut Descriptor, allocator: &Ephemeral) -> Result<Option<Bytes>> {
    let mut buf = allocator.allocate();
    let n = read_some(descriptor, &mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    buf.truncate(n);
    Ok(Some(buf.freeze()))
}

/// Input stream over a single reused buffer.
///
/// Every chunk is a view into memory that the next read overwrites, so a chunk borrows
/// the stream and has to be dropped (or copied) before the next pull:
///
/// ```compile_fail
/// # fn demo(stream: &mut yfstream::ReusedInputStream<'_>) -> yfstream::Result<()> {
/// let first = stream.next_chunk()?;
/// let second = stream.next_chunk()?; // `first` would alias this read
/// assert_ne!(first, second);
/// # Ok(())
/// # }
/// ```
pub struct ReusedInputStream<'a> {
    source: &'a mut InputSource,
    buffer: Option<Reused>,
    capacity: usize,
    mapped_taken: bool,
    finished: bool,
}

impl<'a> ReusedInputStream<'a> {
    pub(crate) fn new(source: &'a mut InputSource, capacity: usize) -> Self {
        ReusedInputStream {
            source,
            buffer: None,
            capacity,
            mapped_taken: false,
            finished: false,
        }
    }

    pub fn next_chunk(&mut self) -> Result<Option<&[u8]>> {
        if self.finished {
            return Ok(None);
        }
        match &mut *self.source {
            InputSource::Mapped(region) => {
                if self.mapped_taken {
                    self.finished = true;
                    return Ok(None);
                }
                self.mapped_taken = true;
                Ok(Some(&region[..]))
            }
            InputSource::Buffered(descriptor) => {
                let capacity = self.capacity;
                let buf = self
                    .buffer
                    .get_or_insert_with(|| Reused::new(capacity))
                    .get();
                let n = read_some(descriptor, buf)?;
                if n == 0 {
                    self.finished = true;
                    return Ok(None);
                }
                Ok(Some(&buf[..n]))
            }
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.source.strategy()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
