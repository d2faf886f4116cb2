use crate::error::{ChunktarError, Result};
use crate::pipeline::{
    chunk_path, copy_into_chunks, remove_chunks_from, with_progress, wrap_for_encryption, ChunkWriter, CipherKey,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Options for the split command
#[derive(Debug, Clone, Default)]
pub struct SplitOptions {
    /// Maximum plaintext bytes per chunk, 0 for a single chunk
    pub split_size: u64,
    pub key: Option<CipherKey>,
    pub show_progress: bool,
}

/// What a finished split produced
#[derive(Debug, Clone)]
pub struct SplitSummary {
    pub chunks: Vec<PathBuf>,
    /// Plaintext bytes read from the source
    pub bytes: u64,
}

/// Split `source` into `<source>.00`, `<source>.01`, ... next to it.
/// The key, if any, is validated before anything is opened.
pub fn split_and_encrypt(source: &Path, threshold: u64, key: Option<&[u8]>) -> Result<SplitSummary> {
    let key = key.map(CipherKey::new).transpose()?;
    let options = SplitOptions {
        split_size: threshold,
        key,
        show_progress: true,
    };
    split_file(source, &options)
}

/// Split a file according to `options`.
/// Chunks left past the new last index by an earlier split are deleted.
/// On failure, chunks already written stay on disk.
pub fn split_file(source: &Path, options: &SplitOptions) -> Result<SplitSummary> {
    let mut input = File::open(source).map_err(|e| ChunktarError::SourceOpen {
        path: source.to_path_buf(),
        source: e,
    })?;
    let total = input.metadata().map_err(ChunktarError::Read)?.len();

    info!(
        source = %source.display(),
        bytes = total,
        split_size = options.split_size,
        encrypted = options.key.is_some(),
        "splitting"
    );

    let key = options.key.as_ref();
    let mut chunks = Vec::new();
    let bytes = with_progress("Splitting", total, options.show_progress, |counter| -> Result<u64> {
        let mut writer = ChunkWriter::new(options.split_size, |index| {
            let (path, sink) = open_chunk(source, index, key)?;
            chunks.push(path);
            Ok(sink)
        })?;
        let copied = copy_into_chunks(&mut input, &mut writer, |n| counter.add(n))?;
        writer.finish()?;
        Ok(copied)
    })?;

    let stale = remove_chunks_from(source, chunks.len())?;
    if let (Some(first), Some(last)) = (stale.first(), stale.last()) {
        warn!(
            removed = stale.len(),
            first = %first.display(),
            last = %last.display(),
            "removed stale chunks from an earlier split"
        );
    }

    info!(chunks = chunks.len(), bytes, "split complete");
    Ok(SplitSummary { chunks, bytes })
}

/// Create chunk `index` and, when encrypting, write its frame header
fn open_chunk(base: &Path, index: usize, key: Option<&CipherKey>) -> Result<(PathBuf, Box<dyn Write>)> {
    let path = chunk_path(base, index);
    let file = File::create(&path).map_err(|e| ChunktarError::ChunkOpen {
        path: path.clone(),
        source: e,
    })?;
    let sink = BufWriter::new(file);
    let sink: Box<dyn Write> = match key {
        Some(key) => Box::new(wrap_for_encryption(sink, key)?),
        None => Box::new(sink),
    };
    debug!(chunk = %path.display(), index, "chunk opened");
    Ok((path, sink))
}
