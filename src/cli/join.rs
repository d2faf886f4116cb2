use crate::error::{ChunktarError, Result};
use crate::pipeline::{
    chunk_after_gap, chunk_path, discover_chunks, total_len, wrap_for_decryption, ChunkInfo, CipherKey,
    with_progress, CountingReader, TransferCounter, READ_BUFFER_SIZE,
};
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Prepended to the base file name to name the joined output
pub const JOINED_PREFIX: &str = "joined_";

/// Options for the join command
#[derive(Debug, Clone, Default)]
pub struct JoinOptions {
    pub key: Option<CipherKey>,
    pub show_progress: bool,
}

/// What a finished join produced
#[derive(Debug, Clone)]
pub struct JoinSummary {
    pub output: PathBuf,
    pub chunks: usize,
    /// Payload bytes written to the output
    pub bytes: u64,
}

/// `joined_<file name of base>`, relative to the current directory
pub fn default_output_path(base: &Path) -> PathBuf {
    let mut name = OsString::from(JOINED_PREFIX);
    if let Some(file_name) = base.file_name() {
        name.push(file_name);
    }
    PathBuf::from(name)
}

/// Join `<base>.00`, `<base>.01`, ... into `joined_<name>` in the current directory
pub fn join_and_decrypt(base: &Path, key: Option<&[u8]>) -> Result<JoinSummary> {
    let key = key.map(CipherKey::new).transpose()?;
    let options = JoinOptions {
        key,
        show_progress: true,
    };
    join_chunks(base, &default_output_path(base), &options)
}

/// Join every chunk of `base` up to the first missing index into `output`.
/// On failure the partially written output stays on disk.
pub fn join_chunks(base: &Path, output: &Path, options: &JoinOptions) -> Result<JoinSummary> {
    let chunks = discover_chunks(base)?;
    if chunks.is_empty() {
        return Err(ChunktarError::ChunkOpen {
            path: chunk_path(base, 0),
            source: io::Error::new(io::ErrorKind::NotFound, "no chunks found"),
        });
    }
    if let Some(stray) = chunk_after_gap(base, chunks.len()) {
        warn!(
            missing = %chunk_path(base, chunks.len()).display(),
            stray = %stray.display(),
            "chunk set has a gap; joining stops at the missing chunk"
        );
    }

    let total = total_len(&chunks);
    info!(
        base = %base.display(),
        output = %output.display(),
        chunks = chunks.len(),
        bytes = total,
        "joining"
    );

    let file = File::create(output).map_err(|e| ChunktarError::DestinationCreate {
        path: output.to_path_buf(),
        source: e,
    })?;
    let mut sink = BufWriter::new(file);
    let key = options.key.as_ref();
    let bytes = with_progress("Joining", total, options.show_progress, |counter| -> Result<u64> {
        let mut bytes = 0;
        for chunk in &chunks {
            bytes += copy_chunk(chunk, key, &mut sink, counter)?;
        }
        sink.flush().map_err(ChunktarError::Write)?;
        Ok(bytes)
    })?;

    info!(chunks = chunks.len(), bytes, "join complete");
    Ok(JoinSummary {
        output: output.to_path_buf(),
        chunks: chunks.len(),
        bytes,
    })
}

/// Append one chunk's payload to `sink`, verifying its frame header first when a key is given
fn copy_chunk<W: Write>(
    chunk: &ChunkInfo,
    key: Option<&CipherKey>,
    sink: &mut W,
    counter: &TransferCounter,
) -> Result<u64> {
    let file = File::open(&chunk.path).map_err(|e| ChunktarError::ChunkOpen {
        path: chunk.path.clone(),
        source: e,
    })?;
    let mut source = CountingReader::new(BufReader::new(file), counter);

    let copied = match key {
        Some(key) => {
            let mut reader = wrap_for_decryption(source, key).map_err(|e| {
                if matches!(e, ChunktarError::KeyMismatch) {
                    error!(chunk = %chunk.path.display(), "key fingerprint mismatch");
                }
                e
            })?;
            pump(&mut reader, sink)?
        }
        None => pump(&mut source, sink)?,
    };

    debug!(chunk = %chunk.path.display(), index = chunk.index, bytes = copied, "chunk joined");
    Ok(copied)
}

/// Copy until end of stream, keeping read and write failures apart
fn pump<R: Read, W: Write>(source: &mut R, sink: &mut W) -> Result<u64> {
    let mut buf = [0u8; READ_BUFFER_SIZE];
    let mut copied = 0u64;
    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => return Ok(copied),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ChunktarError::Read(e)),
        };
        sink.write_all(&buf[..n]).map_err(ChunktarError::Write)?;
        copied += n as u64;
    }
}
