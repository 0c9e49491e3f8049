//! Scratch buffer pool for rendering.

use std::ops::{Deref, DerefMut};

use bytes::BytesMut;
use parking_lot::Mutex;

const DEFAULT_BUFFER_CAPACITY: usize = 4 * 1024;
const DEFAULT_MAX_POOLED: usize = 64;
const DEFAULT_MAX_RETAINED_CAPACITY: usize = 256 * 1024;

/// A pool of reusable [`BytesMut`] buffers.
///
/// Safe to share between threads. Each acquired buffer is owned by exactly
/// one [`PooledBuffer`] until that guard is dropped, at which point it is
/// cleared and returned. Buffers that grew beyond the retention limit are
/// dropped instead of pooled.
#[derive(Debug)]
pub struct BufferPool {
    buffers: Mutex<Vec<BytesMut>>,
    buffer_capacity: usize,
    max_pooled: usize,
    max_retained_capacity: usize,
}

impl BufferPool {
    /// Creates a pool with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(
            DEFAULT_BUFFER_CAPACITY,
            DEFAULT_MAX_POOLED,
            DEFAULT_MAX_RETAINED_CAPACITY,
        )
    }

    /// Creates a pool with explicit limits.
    #[must_use]
    pub fn with_limits(
        buffer_capacity: usize,
        max_pooled: usize,
        max_retained_capacity: usize,
    ) -> Self {
        Self {
            buffers: Mutex::new(Vec::new()),
            buffer_capacity,
            max_pooled,
            max_retained_capacity,
        }
    }

    /// Takes a buffer from the pool, allocating one if the pool is empty.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buffer = self
            .buffers
            .lock()
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(self.buffer_capacity));
        PooledBuffer {
            pool: self,
            buffer,
        }
    }

    /// Number of idle buffers currently held.
    #[must_use]
    pub fn available(&self) -> usize {
        self.buffers.lock().len()
    }

    fn release(&self, mut buffer: BytesMut) {
        if buffer.capacity() > self.max_retained_capacity {
            return;
        }
        buffer.clear();
        let mut buffers = self.buffers.lock();
        if buffers.len() < self.max_pooled {
            buffers.push(buffer);
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffer on loan from a [`BufferPool`]; returned when dropped.
#[derive(Debug)]
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buffer: BytesMut,
}

impl Deref for PooledBuffer<'_> {
    type Target = BytesMut;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buffer));
    }
}
