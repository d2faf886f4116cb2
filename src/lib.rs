//! Chunktar - split large files into numbered chunks and join them back
//!
//! A file is cut into `<name>.00`, `<name>.01`, ... each holding at most a
//! fixed number of payload bytes. Chunks can optionally be encrypted one by
//! one with AES-CFB; every encrypted chunk starts with its own frame header.
//!
//! ## Chunk Layout
//!
//! ```text
//! plain:      [payload...]
//! encrypted:  [IV: 16][SHA-256(key)[..4]: 4][AES-CFB ciphertext...]
//! ```
//!
//! - **IV**: fresh random IV per chunk, so chunks decode independently
//! - **Fingerprint**: detects a wrong key before anything is decrypted.
//!   It is not a MAC and does not detect tampering.
//! - **Split size**: bounds the payload, not the on-disk chunk size
//!
//! ## Example
//!
//! ```no_run
//! use chunktar::cli::{join_chunks, split_file, JoinOptions, SplitOptions};
//! use chunktar::pipeline::CipherKey;
//! use std::path::Path;
//!
//! let key = CipherKey::from_hex("000102030405060708090a0b0c0d0e0f").unwrap();
//!
//! let split_opts = SplitOptions {
//!     split_size: 100 * 1024 * 1024,
//!     key: Some(key.clone()),
//!     ..Default::default()
//! };
//! split_file(Path::new("backup.tar.gz"), &split_opts).unwrap();
//!
//! let join_opts = JoinOptions {
//!     key: Some(key),
//!     ..Default::default()
//! };
//! join_chunks(
//!     Path::new("backup.tar.gz"),
//!     Path::new("restored.tar.gz"),
//!     &join_opts,
//! ).unwrap();
//! ```

pub mod cli;
pub mod error;
pub mod pipeline;
pub mod size;

pub use cli::{join_and_decrypt, split_and_encrypt, JoinSummary, SplitSummary};
pub use error::{ChunktarError, Result};
pub use pipeline::CipherKey;
