/// Streaming file digests for evidence integrity
///
/// Files are read in fixed-size chunks and fed into an incremental digest,
/// so memory use does not depend on the size of the evidence.
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use super::error::HashError;

/// Default read size for streaming digests and copies
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Supported hash algorithms
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    MD5,
    SHA1,
    #[default]
    SHA256,
    SHA512,
}

impl HashAlgorithm {
    /// Get algorithm name
    pub fn name(&self) -> &'static str {
        match self {
            Self::MD5 => "MD5",
            Self::SHA1 => "SHA1",
            Self::SHA256 => "SHA256",
            Self::SHA512 => "SHA512",
        }
    }

    /// Digest length in bytes
    pub fn output_len(&self) -> usize {
        match self {
            Self::MD5 => 16,
            Self::SHA1 => 20,
            Self::SHA256 => 32,
            Self::SHA512 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported hash algorithm: {0}")]
pub struct UnsupportedAlgorithm(pub String);

impl FromStr for HashAlgorithm {
    type Err = UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "MD5" => Ok(Self::MD5),
            "SHA1" => Ok(Self::SHA1),
            "SHA256" => Ok(Self::SHA256),
            "SHA512" => Ok(Self::SHA512),
            _ => Err(UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Digest of a file's contents at the time it was read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDigest {
    algorithm: HashAlgorithm,

    /// Raw digest bytes, serialized as lowercase hex
    #[serde(rename = "hash", with = "hex::serde")]
    value: Vec<u8>,

    bytes_hashed: u64,
}

impl FileDigest {
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.value
    }

    /// Lowercase hexadecimal form
    pub fn to_hex(&self) -> String {
        hex::encode(&self.value)
    }

    /// Number of content bytes that went into the digest
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes_hashed
    }
}

// Byte count is informational; identity is algorithm plus digest value.
impl PartialEq for FileDigest {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm && self.value == other.value
    }
}

impl Eq for FileDigest {}

impl fmt::Display for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hash a file with the default chunk size
pub fn digest_file(path: impl AsRef<Path>, algorithm: HashAlgorithm) -> Result<FileDigest, HashError> {
    digest_file_chunked(path, algorithm, DEFAULT_CHUNK_SIZE)
}

/// Hash a file, reading `chunk_size` bytes at a time
pub fn digest_file_chunked(
    path: impl AsRef<Path>,
    algorithm: HashAlgorithm,
    chunk_size: usize,
) -> Result<FileDigest, HashError> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
    let mut buffer = vec![0; chunk_size.max(1)];

    let (value, bytes_hashed) = match algorithm {
        HashAlgorithm::MD5 => {
            let mut context = md5::Context::new();
            stream_chunks(&mut file, &mut buffer, |chunk| context.consume(chunk))
                .map(|n| (context.compute().0.to_vec(), n))
        }
        HashAlgorithm::SHA1 => stream_digest::<sha1::Sha1>(&mut file, &mut buffer),
        HashAlgorithm::SHA256 => stream_digest::<Sha256>(&mut file, &mut buffer),
        HashAlgorithm::SHA512 => stream_digest::<Sha512>(&mut file, &mut buffer),
    }
    .map_err(|e| HashError::from_io(path, e))?;

    tracing::debug!(
        "Hashed {} ({} bytes, {})",
        path.display(),
        bytes_hashed,
        algorithm
    );

    Ok(FileDigest {
        algorithm,
        value,
        bytes_hashed,
    })
}

/// Single-shot digest of an in-memory buffer
pub fn digest_bytes(data: &[u8], algorithm: HashAlgorithm) -> FileDigest {
    let value = match algorithm {
        HashAlgorithm::MD5 => md5::compute(data).0.to_vec(),
        HashAlgorithm::SHA1 => sha1::Sha1::digest(data).to_vec(),
        HashAlgorithm::SHA256 => Sha256::digest(data).to_vec(),
        HashAlgorithm::SHA512 => Sha512::digest(data).to_vec(),
    };

    FileDigest {
        algorithm,
        value,
        bytes_hashed: data.len() as u64,
    }
}

fn stream_digest<D: Digest>(reader: &mut impl Read, buffer: &mut [u8]) -> io::Result<(Vec<u8>, u64)> {
    let mut hasher = D::new();
    let total = stream_chunks(reader, buffer, |chunk| hasher.update(chunk))?;
    Ok((hasher.finalize().to_vec(), total))
}

/// Feed every chunk of `reader` to `sink`, returning the byte total
fn stream_chunks(
    reader: &mut impl Read,
    buffer: &mut [u8],
    mut sink: impl FnMut(&[u8]),
) -> io::Result<u64> {
    let mut total = 0u64;
    loop {
        let n = match reader.read(buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        sink(&buffer[..n]);
        total += n as u64;
    }
    Ok(total)
}

/// Verification status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VerificationStatus {
    /// Hash matches expected value
    Verified,

    /// Hash does not match (corruption detected)
    Corrupted,
}

/// Hash a file and compare it against a known hex digest
pub fn verify_file_integrity(
    path: impl AsRef<Path>,
    expected_hex: &str,
    algorithm: HashAlgorithm,
) -> Result<(FileDigest, VerificationStatus), HashError> {
    let digest = digest_file(path, algorithm)?;
    let status = if digest.to_hex().eq_ignore_ascii_case(expected_hex.trim()) {
        VerificationStatus::Verified
    } else {
        VerificationStatus::Corrupted
    };
    Ok((digest, status))
}
