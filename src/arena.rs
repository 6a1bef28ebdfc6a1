//! Per-shard bump arena for `CorrespondenceResult` (C7).
//!
//! `CorrespondenceResult`s are cheap to produce in bulk and short-lived: they
//! live from C4's accept to C6's rank-and-drain. A push-only bump arena,
//! reset wholesale once a shard's results have drained into the ranker, is a
//! simpler fit than a free-list pool (this codebase's graph edge pool uses a
//! free list because it needs individual deallocation; this arena never
//! does).

use parking_lot::Mutex;
use std::mem::MaybeUninit;

const DEFAULT_CHUNK_SIZE: usize = 256;

struct Chunk<T> {
    slots: Box<[MaybeUninit<T>]>,
    len: usize,
}

impl<T> Chunk<T> {
    fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, MaybeUninit::uninit);
        Self { slots: slots.into_boxed_slice(), len: 0 }
    }

    fn remaining(&self) -> usize {
        self.slots.len() - self.len
    }

    fn push(&mut self, value: T) -> *mut T {
        let slot = &mut self.slots[self.len];
        self.len += 1;
        slot.write(value)
    }
}

impl<T> Drop for Chunk<T> {
    fn drop(&mut self) {
        for slot in &mut self.slots[..self.len] {
            unsafe {
                std::ptr::drop_in_place(slot.as_mut_ptr());
            }
        }
    }
}

/// A push-only bump allocator for one worker/shard's `T` values.
///
/// Values are boxed individually on push (so callers keep stable `Box<T>`
/// handles to pass through queues) while the arena itself only owns chunk
/// capacity bookkeeping; `reset` drops every value allocated since the last
/// reset in one pass.
pub struct BumpArena<T> {
    inner: Mutex<Inner<T>>,
}

struct Inner<T> {
    chunks: Vec<Chunk<T>>,
    chunk_size: usize,
}

impl<T> BumpArena<T> {
    /// Creates an empty arena with the default chunk size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Creates an empty arena with an explicit chunk size.
    #[must_use]
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            inner: Mutex::new(Inner { chunks: Vec::new(), chunk_size: chunk_size.max(1) }),
        }
    }

    /// Allocates `value` into the arena, returning a raw pointer stable until
    /// the next `reset`.
    ///
    /// # Safety
    ///
    /// The returned pointer is valid only until the next call to `reset` on
    /// this arena; callers must not dereference it afterward.
    pub unsafe fn alloc(&self, value: T) -> *mut T {
        let mut inner = self.inner.lock();
        let chunk_size = inner.chunk_size;
        if inner.chunks.last().is_none_or(|c| c.remaining() == 0) {
            inner.chunks.push(Chunk::new(chunk_size));
        }
        inner.chunks.last_mut().unwrap().push(value)
    }

    /// Drops every value allocated since the last reset and frees chunk
    /// storage. Call once a shard's results have fully drained downstream.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.chunks.clear();
    }

    /// Total values currently live in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().chunks.iter().map(|c| c.len).sum()
    }

    /// Whether the arena currently holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for BumpArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
