//! The segment heap
//!
//! Every array the machine can address lives here, keyed by a `u32`
//! handle. Handle 0 is the running program. Freed handles go onto a
//! stack and are handed out again most-recently-freed first, which
//! keeps both allocation and abandonment O(1).

use std::fmt::{self, Display};
use std::mem::{replace, size_of};

use thiserror::Error;

/// Handle identifying a segment
pub type Handle = u32;

/// The handle of the executing program
pub const PROGRAM: Handle = 0;

/// A fixed length array of words
pub type Segment = Box<[u32]>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeapError {
    /// Handle is free, never issued or (for abandonment) the program
    #[error("invalid array handle {0}")]
    InvalidHandle(Handle),
    #[error("index {index} out of bounds for array {handle} of length {length}")]
    OutOfBounds {
        handle: Handle,
        index: u32,
        length: usize,
    },
    #[error(
        "out of memory: failed to allocate {} words ({} live{})",
        .requested,
        .live,
        format_limit(.limit)
    )]
    OutOfMemory {
        requested: usize,
        live: usize,
        limit: Option<usize>,
    },
    #[error("no array handles remain")]
    HandlesExhausted,
}

fn format_limit(limit: &Option<usize>) -> String {
    match limit {
        Some(words) => format!(", limit {words}"),
        None => String::new(),
    }
}

/// Snapshot of heap occupancy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Number of live segments, including the program
    pub live_segments: usize,
    /// Total words across live segments
    pub live_words: usize,
    /// Handles waiting to be reused
    pub free_handles: usize,
    /// Highest handle ever issued, plus one
    pub issued: usize,
}

impl Display for HeapStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} segments / {} words live, {} handles free of {} issued",
            self.live_segments, self.live_words, self.free_handles, self.issued
        )
    }
}

/// Handle-indexed segment table with a free handle stack
#[derive(Debug)]
pub struct Heap {
    /// Slot per issued handle, `None` when the handle is free
    segments: Vec<Option<Segment>>,
    /// Freed handles, reused from the top
    free: Vec<Handle>,
    /// Words currently held by live segments
    live_words: usize,
    /// Optional cap on `live_words`
    limit: Option<usize>,
}

impl Heap {
    /// Create a heap whose program segment is `program`
    pub fn new(program: Vec<u32>) -> Self {
        let live_words = program.len();
        Heap {
            segments: vec![Some(program.into_boxed_slice())],
            free: vec![],
            live_words,
            limit: None,
        }
    }

    /// Create a heap that refuses to hold more than `limit_mib` MiB
    /// of words in live segments
    pub fn with_limit(program: Vec<u32>, limit_mib: usize) -> Self {
        let mut heap = Heap::new(program);
        heap.limit = Some(limit_mib.saturating_mul(1_048_576) / size_of::<u32>());
        heap
    }

    /// Allocate a zeroed segment of `size` words
    pub fn allocate(&mut self, size: u32) -> Result<Handle, HeapError> {
        let segment = self.zeroed(size as usize)?;

        let handle = match self.free.pop() {
            Some(handle) => {
                self.segments[handle as usize] = Some(segment);
                handle
            }
            None => {
                let handle =
                    Handle::try_from(self.segments.len()).map_err(|_| HeapError::HandlesExhausted)?;
                self.segments.push(Some(segment));
                handle
            }
        };

        self.live_words += size as usize;
        Ok(handle)
    }

    /// Abandon the segment at `handle`, making the handle reusable
    pub fn free(&mut self, handle: Handle) -> Result<(), HeapError> {
        if handle == PROGRAM {
            return Err(HeapError::InvalidHandle(handle));
        }

        let segment = self
            .segments
            .get_mut(handle as usize)
            .and_then(Option::take)
            .ok_or(HeapError::InvalidHandle(handle))?;

        self.live_words -= segment.len();
        self.free.push(handle);
        Ok(())
    }

    /// Read word `index` of segment `handle`
    pub fn read(&self, handle: Handle, index: u32) -> Result<u32, HeapError> {
        let segment = self.segment(handle)?;
        segment
            .get(index as usize)
            .copied()
            .ok_or(HeapError::OutOfBounds {
                handle,
                index,
                length: segment.len(),
            })
    }

    /// Write `value` to word `index` of segment `handle`
    pub fn write(&mut self, handle: Handle, index: u32, value: u32) -> Result<(), HeapError> {
        let segment = self
            .segments
            .get_mut(handle as usize)
            .and_then(Option::as_mut)
            .ok_or(HeapError::InvalidHandle(handle))?;
        let length = segment.len();
        let slot = segment
            .get_mut(index as usize)
            .ok_or(HeapError::OutOfBounds {
                handle,
                index,
                length,
            })?;
        *slot = value;
        Ok(())
    }

    /// Replace the program with a copy of segment `handle`
    ///
    /// The copy is swapped in as a whole, so the next fetch sees
    /// either the old program or the complete new one. Replacing with
    /// the program itself leaves everything as it is.
    pub fn replace_program(&mut self, handle: Handle) -> Result<(), HeapError> {
        if handle == PROGRAM {
            return Ok(());
        }

        let source = self.segment(handle)?;
        let mut copy = self.zeroed(source.len())?;
        copy.copy_from_slice(source);

        let length = copy.len();
        let old = replace(&mut self.segments[PROGRAM as usize], Some(copy));
        let old_length = old.map_or(0, |s| s.len());
        self.live_words = self.live_words - old_length + length;
        Ok(())
    }

    /// Fetch the instruction word at `pc` in the program
    #[inline]
    pub fn fetch(&self, pc: u32) -> Result<u32, HeapError> {
        self.read(PROGRAM, pc)
    }

    /// Number of words in the program
    pub fn program_len(&self) -> usize {
        self.segment(PROGRAM).map_or(0, |s| s.len())
    }

    pub fn live_segments(&self) -> usize {
        self.segments.len() - self.free.len()
    }

    pub fn live_words(&self) -> usize {
        self.live_words
    }

    pub fn stats(&self) -> HeapStats {
        HeapStats {
            live_segments: self.live_segments(),
            live_words: self.live_words,
            free_handles: self.free.len(),
            issued: self.segments.len(),
        }
    }

    fn segment(&self, handle: Handle) -> Result<&Segment, HeapError> {
        self.segments
            .get(handle as usize)
            .and_then(Option::as_ref)
            .ok_or(HeapError::InvalidHandle(handle))
    }

    /// Build a zero-filled segment, honouring the word limit and
    /// failing cleanly if the host cannot supply the memory
    fn zeroed(&self, size: usize) -> Result<Segment, HeapError> {
        let out_of_memory = || HeapError::OutOfMemory {
            requested: size,
            live: self.live_words,
            limit: self.limit,
        };

        if let Some(limit) = self.limit {
            if self.live_words.saturating_add(size) > limit {
                return Err(out_of_memory());
            }
        }

        let mut words: Vec<u32> = Vec::new();
        words.try_reserve_exact(size).map_err(|_| out_of_memory())?;
        words.resize(size, 0);
        Ok(words.into_boxed_slice())
    }
}

#[cfg(test)]
pub mod tests {

    use super::*;

    #[test]
    pub fn test_allocate_zeroes_and_issues_fresh_handles() {
        let mut heap = Heap::new(vec![7]);
        let a = heap.allocate(3).unwrap();
        let b = heap.allocate(0).unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        for i in 0..3 {
            assert_eq!(heap.read(a, i), Ok(0));
        }
        assert_eq!(
            heap.read(b, 0),
            Err(HeapError::OutOfBounds {
                handle: b,
                index: 0,
                length: 0
            })
        );
        assert_eq!(heap.live_words(), 4);
    }

    #[test]
    pub fn test_freed_handles_reused_last_in_first_out() {
        let mut heap = Heap::new(vec![]);
        let a = heap.allocate(1).unwrap();
        let b = heap.allocate(1).unwrap();
        let c = heap.allocate(1).unwrap();
        heap.free(a).unwrap();
        heap.free(c).unwrap();

        assert_eq!(heap.allocate(5), Ok(c));
        assert_eq!(heap.allocate(5), Ok(a));
        assert_eq!(heap.allocate(5), Ok(4));
        assert_eq!(heap.read(b, 0), Ok(0));
    }

    #[test]
    pub fn test_reused_segment_is_fresh() {
        let mut heap = Heap::new(vec![]);
        let a = heap.allocate(2).unwrap();
        heap.write(a, 1, 42).unwrap();
        heap.free(a).unwrap();
        let b = heap.allocate(2).unwrap();
        assert_eq!(a, b);
        assert_eq!(heap.read(b, 1), Ok(0));
    }

    #[test]
    pub fn test_free_rejects_program_double_free_and_unissued() {
        let mut heap = Heap::new(vec![1, 2]);
        assert_eq!(heap.free(PROGRAM), Err(HeapError::InvalidHandle(0)));

        let a = heap.allocate(1).unwrap();
        heap.free(a).unwrap();
        assert_eq!(heap.free(a), Err(HeapError::InvalidHandle(a)));
        assert_eq!(heap.free(99), Err(HeapError::InvalidHandle(99)));
        assert_eq!(heap.live_segments(), 1);
    }

    #[test]
    pub fn test_read_after_write() {
        let mut heap = Heap::new(vec![]);
        let h = heap.allocate(4).unwrap();
        for (i, v) in [0, 1, u32::MAX, 0x8000_0000].iter().enumerate() {
            heap.write(h, i as u32, *v).unwrap();
            assert_eq!(heap.read(h, i as u32), Ok(*v));
        }
    }

    #[test]
    pub fn test_access_checks() {
        let mut heap = Heap::new(vec![]);
        let h = heap.allocate(2).unwrap();
        assert_eq!(
            heap.read(h, 2),
            Err(HeapError::OutOfBounds {
                handle: h,
                index: 2,
                length: 2
            })
        );
        assert!(matches!(
            heap.write(h, 7, 1),
            Err(HeapError::OutOfBounds { index: 7, .. })
        ));
        heap.free(h).unwrap();
        assert_eq!(heap.read(h, 0), Err(HeapError::InvalidHandle(h)));
        assert_eq!(heap.write(h, 0, 1), Err(HeapError::InvalidHandle(h)));
        assert_eq!(heap.read(12, 0), Err(HeapError::InvalidHandle(12)));
    }

    #[test]
    pub fn test_replace_program_copies() {
        let mut heap = Heap::new(vec![1, 2, 3]);
        let h = heap.allocate(2).unwrap();
        heap.write(h, 0, 10).unwrap();
        heap.write(h, 1, 20).unwrap();

        heap.replace_program(h).unwrap();
        assert_eq!(heap.program_len(), 2);
        assert_eq!(heap.fetch(0), Ok(10));

        heap.write(h, 0, 99).unwrap();
        assert_eq!(heap.fetch(0), Ok(10));
        heap.write(PROGRAM, 1, 77).unwrap();
        assert_eq!(heap.read(h, 1), Ok(20));
        assert_eq!(heap.live_words(), 4);
    }

    #[test]
    pub fn test_replace_program_with_itself_is_noop() {
        let mut heap = Heap::new(vec![5, 6]);
        heap.replace_program(PROGRAM).unwrap();
        assert_eq!(heap.fetch(1), Ok(6));
        assert_eq!(heap.replace_program(3), Err(HeapError::InvalidHandle(3)));
    }

    #[test]
    pub fn test_word_limit() {
        // one MiB holds 262144 words
        let mut heap = Heap::with_limit(vec![0; 4], 1);
        assert!(heap.allocate(262_140).is_ok());
        assert!(matches!(
            heap.allocate(1),
            Err(HeapError::OutOfMemory {
                requested: 1,
                limit: Some(262_144),
                ..
            })
        ));
    }

    #[test]
    pub fn test_stats() {
        let mut heap = Heap::new(vec![0; 10]);
        let a = heap.allocate(5).unwrap();
        heap.allocate(1).unwrap();
        heap.free(a).unwrap();
        assert_eq!(
            heap.stats(),
            HeapStats {
                live_segments: 2,
                live_words: 11,
                free_handles: 1,
                issued: 3,
            }
        );
    }
}
