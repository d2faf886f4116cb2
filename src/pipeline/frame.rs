use crate::error::{ChunktarError, Result};
use aes::{Aes128, Aes192, Aes256};
use cfb_mode::cipher::{InvalidLength, KeyIvInit};
use cfb_mode::{BufDecryptor, BufEncryptor};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::{self, Read, Write};

/// IV size: one AES block
pub const IV_SIZE: usize = 16;

/// Truncated SHA-256 of the key
pub const FINGERPRINT_SIZE: usize = 4;

/// An AES key of 16, 24 or 32 bytes
#[derive(Clone, PartialEq, Eq)]
pub struct CipherKey {
    bytes: Vec<u8>,
}

impl CipherKey {
    pub fn new(bytes: &[u8]) -> Result<Self> {
        match bytes.len() {
            16 | 24 | 32 => Ok(Self {
                bytes: bytes.to_vec(),
            }),
            other => Err(ChunktarError::KeyLengthInvalid(other)),
        }
    }

    /// Parse a hex-encoded key
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim()).map_err(|e| ChunktarError::InvalidKey(e.to_string()))?;
        Self::new(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// AES variant selected by the key length
    pub fn bits(&self) -> usize {
        self.bytes.len() * 8
    }

    /// First bytes of SHA-256(key), stored in every frame header
    pub fn fingerprint(&self) -> [u8; FINGERPRINT_SIZE] {
        let digest = Sha256::digest(&self.bytes);
        let mut out = [0u8; FINGERPRINT_SIZE];
        out.copy_from_slice(&digest[..FINGERPRINT_SIZE]);
        out
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherKey")
            .field("bits", &self.bits())
            .field("fingerprint", &hex::encode(self.fingerprint()))
            .finish()
    }
}

/// Per-chunk header written in clear ahead of the ciphertext
/// Layout: [iv: 16][fingerprint: 4]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub iv: [u8; IV_SIZE],
    pub fingerprint: [u8; FINGERPRINT_SIZE],
}

impl FrameHeader {
    pub const SIZE: usize = IV_SIZE + FINGERPRINT_SIZE;

    /// Fresh header with a random IV from the OS RNG
    pub fn generate(key: &CipherKey) -> Self {
        let mut iv = [0u8; IV_SIZE];
        OsRng.fill_bytes(&mut iv);
        Self {
            iv,
            fingerprint: key.fingerprint(),
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[..IV_SIZE].copy_from_slice(&self.iv);
        buf[IV_SIZE..].copy_from_slice(&self.fingerprint);
        buf
    }

    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        let mut iv = [0u8; IV_SIZE];
        let mut fingerprint = [0u8; FINGERPRINT_SIZE];
        iv.copy_from_slice(&bytes[..IV_SIZE]);
        fingerprint.copy_from_slice(&bytes[IV_SIZE..]);
        Self { iv, fingerprint }
    }

    /// Read exactly one header, IV first
    pub fn read_from<R: Read>(source: &mut R) -> Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        source.read_exact(&mut buf).map_err(ChunktarError::Read)?;
        Ok(Self::from_bytes(&buf))
    }

    pub fn matches(&self, key: &CipherKey) -> bool {
        self.fingerprint == key.fingerprint()
    }
}

enum CfbEncryptor {
    Aes128(BufEncryptor<Aes128>),
    Aes192(BufEncryptor<Aes192>),
    Aes256(BufEncryptor<Aes256>),
}

impl CfbEncryptor {
    fn new(key: &CipherKey, iv: &[u8; IV_SIZE]) -> Result<Self> {
        let k = key.as_bytes();
        let invalid = |_: InvalidLength| ChunktarError::KeyLengthInvalid(k.len());
        Ok(match k.len() {
            16 => Self::Aes128(BufEncryptor::new_from_slices(k, iv).map_err(invalid)?),
            24 => Self::Aes192(BufEncryptor::new_from_slices(k, iv).map_err(invalid)?),
            32 => Self::Aes256(BufEncryptor::new_from_slices(k, iv).map_err(invalid)?),
            other => return Err(ChunktarError::KeyLengthInvalid(other)),
        })
    }

    fn encrypt(&mut self, data: &mut [u8]) {
        match self {
            Self::Aes128(c) => c.encrypt(data),
            Self::Aes192(c) => c.encrypt(data),
            Self::Aes256(c) => c.encrypt(data),
        }
    }
}

enum CfbDecryptor {
    Aes128(BufDecryptor<Aes128>),
    Aes192(BufDecryptor<Aes192>),
    Aes256(BufDecryptor<Aes256>),
}

impl CfbDecryptor {
    fn new(key: &CipherKey, iv: &[u8; IV_SIZE]) -> Result<Self> {
        let k = key.as_bytes();
        let invalid = |_: InvalidLength| ChunktarError::KeyLengthInvalid(k.len());
        Ok(match k.len() {
            16 => Self::Aes128(BufDecryptor::new_from_slices(k, iv).map_err(invalid)?),
            24 => Self::Aes192(BufDecryptor::new_from_slices(k, iv).map_err(invalid)?),
            32 => Self::Aes256(BufDecryptor::new_from_slices(k, iv).map_err(invalid)?),
            other => return Err(ChunktarError::KeyLengthInvalid(other)),
        })
    }

    fn decrypt(&mut self, data: &mut [u8]) {
        match self {
            Self::Aes128(c) => c.decrypt(data),
            Self::Aes192(c) => c.decrypt(data),
            Self::Aes256(c) => c.decrypt(data),
        }
    }
}

/// Sink adapter: every byte written through it is AES-CFB ciphertext
pub struct EncryptingWriter<W: Write> {
    inner: W,
    cipher: CfbEncryptor,
    scratch: Vec<u8>,
}

impl<W: Write> EncryptingWriter<W> {
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for EncryptingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // The keystream has already advanced past these bytes, so they must
        // all reach the sink.
        self.scratch.clear();
        self.scratch.extend_from_slice(buf);
        self.cipher.encrypt(&mut self.scratch);
        self.inner.write_all(&self.scratch)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Source adapter decrypting everything after the frame header
pub struct DecryptingReader<R: Read> {
    inner: R,
    cipher: CfbDecryptor,
}

impl<R: Read> DecryptingReader<R> {
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for DecryptingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.cipher.decrypt(&mut buf[..n]);
        Ok(n)
    }
}

/// Write a fresh frame header to `sink` and return an encrypting wrapper
pub fn wrap_for_encryption<W: Write>(sink: W, key: &CipherKey) -> Result<EncryptingWriter<W>> {
    wrap_with_header(sink, key, FrameHeader::generate(key))
}

fn wrap_with_header<W: Write>(
    mut sink: W,
    key: &CipherKey,
    header: FrameHeader,
) -> Result<EncryptingWriter<W>> {
    let cipher = CfbEncryptor::new(key, &header.iv)?;
    sink.write_all(&header.to_bytes())
        .map_err(ChunktarError::Write)?;
    Ok(EncryptingWriter {
        inner: sink,
        cipher,
        scratch: Vec::new(),
    })
}

/// Read and verify the frame header from `source`, then return a decrypting wrapper.
/// Nothing past the header is read when the fingerprint does not match.
pub fn wrap_for_decryption<R: Read>(mut source: R, key: &CipherKey) -> Result<DecryptingReader<R>> {
    let header = FrameHeader::read_from(&mut source)?;
    if !header.matches(key) {
        return Err(ChunktarError::KeyMismatch);
    }
    let cipher = CfbDecryptor::new(key, &header.iv)?;
    Ok(DecryptingReader {
        inner: source,
        cipher,
    })
}
