use std::cell::{Cell, RefCell};
use std::cmp;
use std::fmt;
use std::slice;

/// The default capacity of a single chunk, in bytes.
const DEFAULT_CHUNK_SIZE: usize = 4096;

/// A bump allocator for short-lived byte buffers.
///
/// The converter uses an arena for the compacted copies produced while
/// unescaping fields, so that a scan can produce one small buffer per field
/// without paying one heap round trip per field. Memory is handed out from
/// large chunks and reclaimed all at once when the arena is dropped; there is
/// no per-buffer free.
///
/// Buffers returned by [`Arena::alloc`] remain valid, and pairwise disjoint,
/// for the lifetime of the arena. The arena itself is not `Sync`; a scan that
/// shares one across threads must serialize access on its side.
pub struct Arena {
    /// Filled chunks plus the one currently being bumped. A chunk's capacity
    /// is fixed at creation; its buffer never moves after that.
    chunks: RefCell<Vec<Vec<u8>>>,
    /// Capacity of each new chunk, except oversized one-off allocations.
    chunk_size: usize,
    /// Total bytes handed out so far.
    allocated: Cell<usize>,
}

impl Arena {
    /// Create a new arena with the default chunk size.
    pub fn new() -> Arena {
        Arena::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Create a new arena whose chunks hold `chunk_size` bytes.
    ///
    /// Allocations larger than `chunk_size` get a dedicated chunk of their
    /// own size.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn with_chunk_size(chunk_size: usize) -> Arena {
        assert!(chunk_size > 0, "arena chunk size must be non-zero");
        Arena {
            chunks: RefCell::new(vec![]),
            chunk_size,
            allocated: Cell::new(0),
        }
    }

    /// Allocate `len` zeroed bytes.
    ///
    /// The returned buffer is exclusively owned by the caller and valid until
    /// the arena is dropped.
    pub fn alloc(&self, len: usize) -> &mut [u8] {
        let mut chunks = self.chunks.borrow_mut();
        let needs_chunk = match chunks.last() {
            Some(chunk) => chunk.capacity() - chunk.len() < len,
            None => true,
        };
        if needs_chunk {
            chunks.push(Vec::with_capacity(cmp::max(self.chunk_size, len)));
        }
        let chunk = chunks.last_mut().unwrap();
        let start = chunk.len();
        // Stays within the chunk's reserved capacity, so the buffer does not
        // move.
        chunk.resize(start + len, 0);
        self.allocated.set(self.allocated.get() + len);
        // SAFETY: the range `start..start + len` of this chunk is handed out
        // exactly once, because the chunk length only ever grows. The chunk's
        // heap buffer never moves (resizes stay within capacity) and is not
        // freed before the arena is, so the reborrow may outlive the RefCell
        // guard and carry the arena's lifetime.
        unsafe { slice::from_raw_parts_mut(chunk.as_mut_ptr().add(start), len) }
    }

    /// The total number of bytes handed out by this arena.
    pub fn allocated_bytes(&self) -> usize {
        self.allocated.get()
    }
}

impl Default for Arena {
    fn default() -> Arena {
        Arena::new()
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Arena")
            .field("chunk_size", &self.chunk_size)
            .field("allocated", &self.allocated.get())
            .finish()
    }
}
