// miniheap.rs — bump allocator backing the per-frame Ghoul2 vertex space
//
// The owner resets the heap once per frame. Every reset bumps a generation
// counter; spans handed out before the reset no longer resolve.

use crate::g2_error::G2Error;

/// Size of the server-side vertex space in bytes.
pub const G2_VERT_SPACE_SERVER_SIZE: usize = 256 * 1024;

const FLOAT_SIZE: usize = std::mem::size_of::<f32>();

/// A region of the heap, in floats, tagged with the generation it was carved from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeapSpan {
    offset: usize,
    len: usize,
    generation: u32,
}

impl HeapSpan {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

pub struct MiniHeap {
    data: Vec<f32>,
    cur: usize,
    generation: u32,
}

impl MiniHeap {
    /// Create a heap holding `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0.0; size / FLOAT_SIZE],
            cur: 0,
            generation: 0,
        }
    }

    /// Forget every allocation.
    pub fn reset(&mut self) {
        self.cur = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn size(&self) -> usize {
        self.data.len() * FLOAT_SIZE
    }

    pub fn used(&self) -> usize {
        self.cur * FLOAT_SIZE
    }

    pub fn free(&self) -> usize {
        self.size() - self.used()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Carve `count` floats off the end of the heap.
    pub fn alloc_floats(&mut self, count: usize) -> Result<HeapSpan, G2Error> {
        if self.cur + count > self.data.len() {
            return Err(G2Error::OutOfVertSpace {
                requested: count * FLOAT_SIZE,
                available: self.free(),
            });
        }
        let span = HeapSpan {
            offset: self.cur,
            len: count,
            generation: self.generation,
        };
        self.cur += count;
        Ok(span)
    }

    /// True if `span` was allocated since the last reset.
    pub fn is_live(&self, span: &HeapSpan) -> bool {
        span.generation == self.generation && span.offset + span.len <= self.cur
    }

    pub fn get(&self, span: &HeapSpan) -> Option<&[f32]> {
        if !self.is_live(span) {
            return None;
        }
        Some(&self.data[span.offset..span.offset + span.len])
    }

    pub fn get_mut(&mut self, span: &HeapSpan) -> Option<&mut [f32]> {
        if !self.is_live(span) {
            return None;
        }
        Some(&mut self.data[span.offset..span.offset + span.len])
    }
}

impl Default for MiniHeap {
    fn default() -> Self {
        Self::new(G2_VERT_SPACE_SERVER_SIZE)
    }
}
