use std::sync::Arc;

const CHUNK_BITS: u32 = 16;
const CHUNK_SIZE: usize = 1 << CHUNK_BITS;

/// An append-only byte buffer addressed by 64-bit offsets.
///
/// The buffer is split into fixed-size chunks that are shared between clones. Writing into a
/// shared chunk copies it first, hence a clone never observes writes made through another clone.
#[derive(Clone, Debug, Default)]
pub(crate) struct ByteArena {
    chunks: Vec<Arc<Vec<u8>>>,
    len: u64,
}

impl ByteArena {
    /// The number of bytes written so far, including padding.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Writes `bytes` at `offset`, growing the arena as needed.
    pub fn write(&mut self, offset: u64, bytes: &[u8]) {
        let end = offset + bytes.len() as u64;
        while ((self.chunks.len() as u64) << CHUNK_BITS) < end {
            self.chunks.push(Arc::new(vec![0; CHUNK_SIZE]));
        }

        let mut position = offset;
        let mut remaining = bytes;
        while !remaining.is_empty() {
            let (chunk, within) = split_offset(position);
            let chunk = Arc::make_mut(&mut self.chunks[chunk]);
            let count = remaining.len().min(CHUNK_SIZE - within);
            chunk[within..within + count].copy_from_slice(&remaining[..count]);
            remaining = &remaining[count..];
            position += count as u64;
        }
        self.len = self.len.max(end);
    }

    /// Appends `bytes` at the end of the arena and returns their offset.
    pub fn append(&mut self, bytes: &[u8]) -> u64 {
        let offset = self.len;
        self.write(offset, bytes);
        offset
    }

    pub fn read_u8(&self, offset: u64) -> Option<u8> {
        let mut byte = [0];
        self.read(offset, &mut byte).then_some(byte[0])
    }

    /// Reads a little-endian unsigned integer of `width` bytes.
    pub fn read_uint(&self, offset: u64, width: usize) -> Option<u64> {
        let mut bytes = [0; 8];
        self.read(offset, bytes.get_mut(..width)?)
            .then(|| u64::from_le_bytes(bytes))
    }

    pub fn read_bytes(&self, offset: u64, len: usize) -> Option<Vec<u8>> {
        if !self.contains(offset, len) {
            return None;
        }
        let mut bytes = vec![0; len];
        self.read(offset, &mut bytes).then_some(bytes)
    }

    /// Fills `out` with the bytes at `offset`. Returns `false` if the range was not written.
    pub fn read(&self, offset: u64, out: &mut [u8]) -> bool {
        let mut filled = 0;
        let found = self.for_each_segment(offset, out.len(), |segment| {
            out[filled..filled + segment.len()].copy_from_slice(segment);
            filled += segment.len();
            true
        });
        found && filled == out.len()
    }

    /// Compares the bytes at `offset` with `bytes` without copying them out.
    pub fn equals(&self, offset: u64, bytes: &[u8]) -> bool {
        let mut compared = 0;
        self.for_each_segment(offset, bytes.len(), |segment| {
            let matches = bytes[compared..compared + segment.len()] == *segment;
            compared += segment.len();
            matches
        })
    }

    /// Whether `len` bytes from `offset` lie within the written part of the arena.
    fn contains(&self, offset: u64, len: usize) -> bool {
        offset
            .checked_add(len as u64)
            .is_some_and(|end| end <= self.len)
    }

    /// Calls `f` with consecutive slices covering `len` bytes from `offset`, stopping early when
    /// it returns `false`. Returns `false` if the range is out of bounds or `f` stopped.
    fn for_each_segment(
        &self,
        offset: u64,
        len: usize,
        mut f: impl FnMut(&[u8]) -> bool,
    ) -> bool {
        if !self.contains(offset, len) {
            return false;
        }
        let mut position = offset;
        let mut remaining = len;
        while remaining > 0 {
            let (chunk, within) = split_offset(position);
            let count = remaining.min(CHUNK_SIZE - within);
            if !f(&self.chunks[chunk][within..within + count]) {
                return false;
            }
            remaining -= count;
            position += count as u64;
        }
        true
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "Offsets stay below 2^40, so the chunk index fits"
)]
fn split_offset(offset: u64) -> (usize, usize) {
    (
        (offset >> CHUNK_BITS) as usize,
        (offset & (CHUNK_SIZE as u64 - 1)) as usize,
    )
}
