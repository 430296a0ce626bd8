//! Scoped byte streams over files.
//!
//! Input streams pick their strategy once, when the file is opened: files up to
//! [`StreamOptions::mmap_threshold`] bytes are memory-mapped and handed out as a single
//! chunk, larger ones are read with one syscall per chunk. Output streams always write
//! through the descriptor. Every stream lives for the duration of a closure and its
//! descriptor is closed when the closure returns, fails or panics.
//!
//! ```no_run
//! use yfstream::{OpenMode, with_file_input, with_file_output};
//!
//! fn copy() -> yfstream::Result<u64> {
//!     with_file_input("in.bin", |input| {
//!         with_file_output("out.bin", OpenMode::Write, |output| yfstream::pump(input, output))
//!     })
//! }
//! ```
use crate::buffer::Ephemeral;
use crate::input::InputSource;
use std::path::Path;

mod buffer;
mod classify;
mod errors;
mod guard;
mod input;
mod opener;
mod output;
mod stream;

pub use classify::{Strategy, classify};
pub use errors::{Error, Result};
pub use input::ReusedInputStream;
pub use opener::OpenMode;
pub use stream::{PullStream, PushStream, pump};

// ------------------- General consts ------------------------
/// Files at or below this size are mapped instead of read.
pub const DEFAULT_MMAP_THRESHOLD: u64 = 10 * 1024 * 1024; // 10 MiB
/// Read buffer size: 32 KiB less some room for the allocator's bookkeeping, so a
/// buffer and its header stay within a 32 KiB block.
pub const DEFAULT_BUFFER_CAPACITY: usize = 32 * 1024 - 16;
// -------------------- General Consts end -------------------

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct StreamOptions {
    /// Largest file size, in bytes, that input streams map into memory. Anything larger
    /// is read through a buffer.
    pub mmap_threshold: u64,
    /// Size of each read buffer. Also the largest chunk a buffered input stream yields.
    pub buffer_capacity: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        StreamOptions {
            mmap_threshold: DEFAULT_MMAP_THRESHOLD,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl StreamOptions {
    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity == 0 {
            return Err(Error::InvalidOptions("buffer capacity must be positive"));
        }
        Ok(())
    }
}

/// Opens scoped file streams with a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct FileStreams {
    options: StreamOptions,
}

impl FileStreams {
    pub fn new(options: StreamOptions) -> Result<Self> {
        options.validate()?;
        Ok(FileStreams { options })
    }

    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    /// The strategy an input stream opened on `path` right now would use.
    pub fn classify(&self, path: impl AsRef<Path>) -> Result<Strategy> {
        classify(path.as_ref(), self.options.mmap_threshold)
    }

    pub fn input<T, E, F>(&self, path: impl AsRef<Path>, f: F) -> std::result::Result<T, E>
    where
        E: From<Error> + std::fmt::Display,
        F: FnOnce(&mut PullStream<'_>) -> std::result::Result<T, E>,
    {
        self.input_at(0, path, f)
    }

    /// Runs `f` against an input stream starting `offset` bytes into the file. Chunks are
    /// owned and stay valid after the stream moves on.
    pub fn input_at<T, E, F>(
        &self,
        offset: u64,
        path: impl AsRef<Path>,
        f: F,
    ) -> std::result::Result<T, E>
    where
        E: From<Error> + std::fmt::Display,
        F: FnOnce(&mut PullStream<'_>) -> std::result::Result<T, E>,
    {
        let source = InputSource::open(path.as_ref(), offset, self.options.mmap_threshold)?;
        let allocator = Ephemeral::new(self.options.buffer_capacity);
        guard::bracket(source, |source| {
            let mut stream = source.stream(allocator);
            f(&mut stream)
        })
    }

    /// Like [`FileStreams::input_at`] but every read lands in the same buffer. Chunks
    /// borrow the stream and are overwritten by the next read.
    pub fn input_at_reused<T, E, F>(
        &self,
        offset: u64,
        path: impl AsRef<Path>,
        f: F,
    ) -> std::result::Result<T, E>
    where
        E: From<Error> + std::fmt::Display,
        F: FnOnce(&mut ReusedInputStream<'_>) -> std::result::Result<T, E>,
    {
        let source = InputSource::open(path.as_ref(), offset, self.options.mmap_threshold)?;
        let capacity = self.options.buffer_capacity;
        guard::bracket(source, |source| {
            let mut stream = ReusedInputStream::new(source, capacity);
            f(&mut stream)
        })
    }

    /// Runs `f` against an output stream. [`OpenMode::Read`] is rejected with
    /// [`Error::InvalidMode`] before the path is touched.
    pub fn output<T, E, F>(
        &self,
        path: impl AsRef<Path>,
        mode: OpenMode,
        f: F,
    ) -> std::result::Result<T, E>
    where
        E: From<Error> + std::fmt::Display,
        F: FnOnce(&mut PushStream<'_>) -> std::result::Result<T, E>,
    {
        let descriptor = output::open_output(path.as_ref(), mode)?;
        guard::bracket(descriptor, |descriptor| {
            let mut stream = output::stream(descriptor);
            f(&mut stream)
        })
    }
}

/// Input stream over the whole file, with default options.
pub fn with_file_input<T, E, F>(path: impl AsRef<Path>, f: F) -> std::result::Result<T, E>
where
    E: From<Error> + std::fmt::Display,
    F: FnOnce(&mut PullStream<'_>) -> std::result::Result<T, E>,
{
    FileStreams::default().input(path, f)
}

/// Input stream starting `offset` bytes into the file, with default options.
pub fn with_file_input_at<T, E, F>(
    offset: u64,
    path: impl AsRef<Path>,
    f: F,
) -> std::result::Result<T, E>
where
    E: From<Error> + std::fmt::Display,
    F: FnOnce(&mut PullStream<'_>) -> std::result::Result<T, E>,
{
    FileStreams::default().input_at(offset, path, f)
}

/// Reused-buffer input stream starting `offset` bytes into the file, with default options.
pub fn with_file_input_at_reused<T, E, F>(
    offset: u64,
    path: impl AsRef<Path>,
    f: F,
) -> std::result::Result<T, E>
where
    E: From<Error> + std::fmt::Display,
    F: FnOnce(&mut ReusedInputStream<'_>) -> std::result::Result<T, E>,
{
    FileStreams::default().input_at_reused(offset, path, f)
}

/// Output stream with default options.
pub fn with_file_output<T, E, F>(
    path: impl AsRef<Path>,
    mode: OpenMode,
    f: F,
) -> std::result::Result<T, E>
where
    E: From<Error> + std::fmt::Display,
    F: FnOnce(&mut PushStream<'_>) -> std::result::Result<T, E>,
{
    FileStreams::default().output(path, mode, f)
}
