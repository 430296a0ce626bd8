use crate::errors::{Error, Result};
use std::path::Path;
use tracing::debug;

/// How an input stream reaches the bytes of its file. Chosen once, at open time.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Strategy {
    /// The whole file is mapped and handed out as a single chunk.
    Mapped,
    /// One read syscall per chunk.
    Buffered,
}

impl Strategy {
    /// Files up to and including `threshold` bytes are mapped.
    pub fn for_size(size: u64, threshold: u64) -> Strategy {
        if size > threshold {
            Strategy::Buffered
        } else {
            Strategy::Mapped
        }
    }
}

/// Stats `path` and picks the input strategy for its current size.
pub fn classify(path: &Path, threshold: u64) -> Result<Strategy> {
    let metadata = std::fs::metadata(path).map_err(|source| Error::Stat {
        path: path.to_path_buf(),
        source,
    })?;
    let strategy = Strategy::for_size(metadata.len(), threshold);
    debug!(
        "{:?} is {} bytes, threshold {}: {:?}",
        path,
        metadata.len(),
        threshold,
        strategy
    );
    Ok(strategy)
}
