use crate::error::{ChunktarError, Result};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bytes pulled from the source per read
pub const READ_BUFFER_SIZE: usize = 4096;

/// Path of chunk `index` for an archive: `<base>.<NN>`
/// Indices of 100 and above simply widen (`<base>.100`).
pub fn chunk_path(base: &Path, index: usize) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(format!(".{:02}", index));
    PathBuf::from(name)
}

/// Number of chunks a payload of `len` bytes occupies under `threshold`
/// An empty payload still occupies chunk 0.
pub fn expected_chunk_count(len: u64, threshold: u64) -> usize {
    if threshold == 0 || len == 0 {
        1
    } else {
        len.div_ceil(threshold) as usize
    }
}

/// Splits a byte stream across numbered sinks so that no sink receives more
/// than `threshold` payload bytes. A threshold of 0 never rotates.
///
/// Sinks are produced on demand by `open(index)`. Rotation is lazy: the next
/// sink is only opened once there is at least one byte to put in it.
pub struct ChunkWriter<S, F>
where
    S: Write,
    F: FnMut(usize) -> Result<S>,
{
    open: F,
    current: S,
    index: usize,
    threshold: u64,
    written_in_chunk: u64,
    total_written: u64,
}

impl<S, F> ChunkWriter<S, F>
where
    S: Write,
    F: FnMut(usize) -> Result<S>,
{
    /// Open chunk 0 and start writing
    pub fn new(threshold: u64, mut open: F) -> Result<Self> {
        let current = open(0)?;
        Ok(Self {
            open,
            current,
            index: 0,
            threshold,
            written_in_chunk: 0,
            total_written: 0,
        })
    }

    /// Write a buffer, crossing as many chunk boundaries as it needs
    pub fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            if self.threshold > 0 && self.written_in_chunk >= self.threshold {
                self.rotate()?;
            }

            let room = if self.threshold == 0 {
                buf.len()
            } else {
                let left = self.threshold - self.written_in_chunk;
                buf.len().min(usize::try_from(left).unwrap_or(usize::MAX))
            };

            let (head, tail) = buf.split_at(room);
            self.current.write_all(head).map_err(ChunktarError::Write)?;
            self.written_in_chunk += room as u64;
            self.total_written += room as u64;
            buf = tail;
        }
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        self.current.flush().map_err(ChunktarError::Write)?;
        debug!(index = self.index, bytes = self.written_in_chunk, "chunk closed");
        let next = (self.open)(self.index + 1)?;
        // Old sink is dropped (closed) here
        self.current = next;
        self.index += 1;
        self.written_in_chunk = 0;
        Ok(())
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Flush and close the last chunk; returns the number of chunks produced
    pub fn finish(mut self) -> Result<usize> {
        self.current.flush().map_err(ChunktarError::Write)?;
        debug!(index = self.index, bytes = self.written_in_chunk, "chunk closed");
        Ok(self.index + 1)
    }
}

/// Pump `source` into `writer` through a fixed read buffer.
/// `on_progress` is called with the byte count of every buffer written.
pub fn copy_into_chunks<R, S, F>(
    source: &mut R,
    writer: &mut ChunkWriter<S, F>,
    mut on_progress: impl FnMut(u64),
) -> Result<u64>
where
    R: Read,
    S: Write,
    F: FnMut(usize) -> Result<S>,
{
    let mut buf = [0u8; READ_BUFFER_SIZE];
    let mut copied = 0u64;
    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ChunktarError::Read(e)),
        };
        writer.write_all(&buf[..n])?;
        copied += n as u64;
        on_progress(n as u64);
    }
    Ok(copied)
}

/// A chunk file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkInfo {
    pub index: usize,
    pub path: PathBuf,
    /// On-disk size, including the frame header when encrypted
    pub len: u64,
}

/// Enumerate `<base>.00`, `<base>.01`, ... up to the first missing index
pub fn discover_chunks(base: &Path) -> Result<Vec<ChunkInfo>> {
    let mut chunks = Vec::new();
    for index in 0.. {
        let path = chunk_path(base, index);
        let meta = match std::fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => break,
            Err(source) => return Err(ChunktarError::ChunkOpen { path, source }),
        };
        chunks.push(ChunkInfo {
            index,
            path,
            len: meta.len(),
        });
    }
    Ok(chunks)
}

/// Delete `<base>.<from>`, `<base>.<from + 1>`, ... up to the first missing
/// index. Used after a split so chunks left by an earlier, longer split of the
/// same file are not picked up by a join.
pub fn remove_chunks_from(base: &Path, from: usize) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for index in from.. {
        let path = chunk_path(base, index);
        match std::fs::remove_file(&path) {
            Ok(()) => removed.push(path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => break,
            Err(source) => return Err(ChunktarError::ChunkRemove { path, source }),
        }
    }
    Ok(removed)
}

/// Total on-disk size of a chunk set
pub fn total_len(chunks: &[ChunkInfo]) -> u64 {
    chunks.iter().map(|c| c.len).sum()
}

/// If the chunk right after the first missing index exists, the set has a
/// hole and enumeration stopped early. Returns that stray chunk.
pub fn chunk_after_gap(base: &Path, found: usize) -> Option<PathBuf> {
    let stray = chunk_path(base, found + 1);
    stray.exists().then_some(stray)
}
