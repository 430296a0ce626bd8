use crate::errors::{Error, Result};
use bytes::Bytes;
use std::io;

/// Consumer-driven byte stream. Each pull yields `Some(chunk)` or `None`, and the first
/// `None` is final: the producer is never called again afterwards.
pub struct PullStream<'a> {
    produce: Box<dyn FnMut() -> Result<Option<Bytes>> + 'a>,
    finished: bool,
}

impl<'a> PullStream<'a> {
    pub fn from_fn<F>(produce: F) -> Self
    where
        F: FnMut() -> Result<Option<Bytes>> + 'a,
    {
        PullStream {
            produce: Box::new(produce),
            finished: false,
        }
    }

    /// A stream yielding `chunk` once, then ending.
    pub fn once(chunk: Bytes) -> Self {
        let mut chunk = Some(chunk);
        PullStream::from_fn(move || Ok(chunk.take()))
    }

    pub fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        if self.finished {
            return Ok(None);
        }
        let chunk = (self.produce)()?;
        if chunk.is_none() {
            self.finished = true;
        }
        Ok(chunk)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drains the rest of the stream into a single vector.
    pub fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(chunk) = self.next_chunk()? {
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }
}

impl Iterator for PullStream<'_> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}

impl std::iter::FusedIterator for PullStream<'_> {}

/// Producer-driven byte sink. `None` is accepted and ignored, it does not close anything.
pub struct PushStream<'a> {
    consume: Box<dyn FnMut(Option<&[u8]>) -> Result<()> + 'a>,
}

impl<'a> PushStream<'a> {
    pub fn from_fn<F>(consume: F) -> Self
    where
        F: FnMut(Option<&[u8]>) -> Result<()> + 'a,
    {
        PushStream {
            consume: Box::new(consume),
        }
    }

    pub fn push(&mut self, chunk: Option<&[u8]>) -> Result<()> {
        (self.consume)(chunk)
    }
}

impl io::Write for PushStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push(Some(buf)).map_err(into_io_error)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn into_io_error(e: Error) -> io::Error {
    let kind = e.io_kind().unwrap_or(io::ErrorKind::Other);
    io::Error::new(kind, e)
}

/// Moves every chunk of `source` into `sink`, returning the number of bytes moved.
pub fn pump(source: &mut PullStream<'_>, sink: &mut PushStream<'_>) -> Result<u64> {
    let mut total = 0u64;
    while let Some(chunk) = source.next_chunk()? {
        sink.push(Some(&chunk))?;
        total += chunk.len() as u64;
    }
    Ok(total)
}
