use bytes::BytesMut;

/// Hands out a fresh, zeroed buffer on every call. Ownership goes to the caller, who
/// usually freezes it into a chunk, so nothing is ever overwritten behind its back.
#[derive(Debug, Clone, Copy)]
pub struct Ephemeral {
    capacity: usize,
}

impl Ephemeral {
    pub fn new(capacity: usize) -> Self {
        Ephemeral { capacity }
    }

    pub fn allocate(&self) -> BytesMut {
        BytesMut::zeroed(self.capacity)
    }
}

/// A single allocation for the lifetime of a stream, overwritten in place on every read.
/// Anything borrowed from it is only valid until the next call to [`Reused::get`].
#[derive(Debug)]
pub struct Reused {
    buf: Box<[u8]>,
}

impl Reused {
    pub fn new(capacity: usize) -> Self {
        Reused {
            buf: vec![0u8; capacity].into_boxed_slice(),
        }
    }

    pub fn get(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}
