use crate::error::Result;
use crate::pipeline::{chunk_after_gap, chunk_path, discover_chunks, total_len};
use crate::size::format_size;
use std::path::Path;

/// Describe the chunk set of `base`
pub fn show_info(base: &Path) -> Result<String> {
    let chunks = discover_chunks(base)?;

    let mut output = String::new();
    output.push_str("Chunk Set Information\n");
    output.push_str("=====================\n\n");
    output.push_str(&format!("Base: {}\n", base.display()));

    if chunks.is_empty() {
        output.push_str(&format!("No chunks found (expected {})\n", chunk_path(base, 0).display()));
        return Ok(output);
    }

    output.push('\n');
    for chunk in &chunks {
        output.push_str(&format!(
            "  {:>3}  {}  {}\n",
            chunk.index,
            chunk.path.display(),
            format_size(chunk.len)
        ));
    }
    output.push('\n');
    output.push_str(&format!("Chunks: {}\n", chunks.len()));
    output.push_str(&format!("Total size: {}\n", format_size(total_len(&chunks))));

    if let Some(stray) = chunk_after_gap(base, chunks.len()) {
        output.push_str(&format!(
            "\nWarning: {} is missing but {} exists; join stops at the gap\n",
            chunk_path(base, chunks.len()).display(),
            stray.display()
        ));
    }

    Ok(output)
}
