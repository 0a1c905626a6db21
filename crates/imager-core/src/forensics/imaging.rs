/// Bit-for-bit streaming copy of evidence into a forensic image
///
/// Only file content is copied. Timestamps, permissions and other
/// filesystem metadata of the source are not carried over.
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use super::error::ImagingError;
use super::verification::DEFAULT_CHUNK_SIZE;

/// Copy `source` into `destination` with the default chunk size
pub fn copy_file(source: impl AsRef<Path>, destination: impl AsRef<Path>) -> Result<u64, ImagingError> {
    copy_file_chunked(source, destination, DEFAULT_CHUNK_SIZE)
}

/// Copy `source` into `destination`, `chunk_size` bytes at a time.
///
/// The destination is created if absent and truncated if present. Returns the
/// number of bytes written. A failure part-way through leaves whatever was
/// already written in place.
pub fn copy_file_chunked(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    chunk_size: usize,
) -> Result<u64, ImagingError> {
    let source = source.as_ref();
    let destination = destination.as_ref();

    let mut reader = File::open(source).map_err(|e| ImagingError::OpenSource {
        path: source.to_path_buf(),
        source: e,
    })?;

    // Truncating the destination would wipe the evidence itself
    if is_same_file(source, destination) {
        return Err(ImagingError::SameFile(destination.to_path_buf()));
    }

    let mut writer = File::create(destination).map_err(|e| ImagingError::CreateDestination {
        path: destination.to_path_buf(),
        source: e,
    })?;

    let mut buffer = vec![0; chunk_size.max(1)];
    let mut bytes_written = 0u64;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(ImagingError::Read {
                    offset: bytes_written,
                    source: e,
                })
            }
        };

        writer
            .write_all(&buffer[..n])
            .map_err(|e| ImagingError::Write {
                offset: bytes_written,
                source: e,
            })?;
        bytes_written += n as u64;
    }

    writer
        .flush()
        .and_then(|_| writer.sync_all())
        .map_err(|e| ImagingError::Sync {
            path: destination.to_path_buf(),
            source: e,
        })?;

    tracing::debug!(
        "Copied {} bytes from {} to {}",
        bytes_written,
        source.display(),
        destination.display()
    );

    Ok(bytes_written)
}

#[cfg(unix)]
fn is_same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (std::fs::metadata(a), std::fs::metadata(b)) {
        (Ok(ma), Ok(mb)) => ma.dev() == mb.dev() && ma.ino() == mb.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_is_byte_exact() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("evidence.bin");
        let image = temp_dir.path().join("evidence.img");

        let data: Vec<u8> = (0..=255u8).cycle().take(DEFAULT_CHUNK_SIZE * 3 + 17).collect();
        std::fs::write(&source, &data).unwrap();

        let copied = copy_file(&source, &image).unwrap();

        assert_eq!(copied, data.len() as u64);
        assert_eq!(std::fs::read(&image).unwrap(), data);
    }

    #[test]
    fn test_copy_with_odd_chunk_size() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("evidence.bin");
        let image = temp_dir.path().join("evidence.img");
        std::fs::write(&source, b"evidence-data").unwrap();

        assert_eq!(copy_file_chunked(&source, &image, 3).unwrap(), 13);
        assert_eq!(std::fs::read(&image).unwrap(), b"evidence-data");
    }

    #[test]
    fn test_copy_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("empty.bin");
        let image = temp_dir.path().join("empty.img");
        std::fs::write(&source, b"").unwrap();

        assert_eq!(copy_file(&source, &image).unwrap(), 0);
        assert!(image.exists());
        assert_eq!(std::fs::metadata(&image).unwrap().len(), 0);
    }

    #[test]
    fn test_copy_overwrites_existing_destination() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("evidence.bin");
        let image = temp_dir.path().join("evidence.img");
        std::fs::write(&source, b"short").unwrap();
        std::fs::write(&image, b"a much longer stale image from a previous run").unwrap();

        copy_file(&source, &image).unwrap();

        assert_eq!(std::fs::read(&image).unwrap(), b"short");
    }

    #[test]
    fn test_missing_source_creates_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("missing.bin");
        let image = temp_dir.path().join("evidence.img");

        let err = copy_file(&source, &image).unwrap_err();

        assert!(matches!(err, ImagingError::OpenSource { .. }));
        assert!(!image.exists());
    }

    #[test]
    fn test_unwritable_destination() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("evidence.bin");
        let image = temp_dir.path().join("no-such-dir").join("evidence.img");
        std::fs::write(&source, b"evidence-data").unwrap();

        let err = copy_file(&source, &image).unwrap_err();

        assert!(matches!(err, ImagingError::CreateDestination { .. }));
    }

    #[test]
    fn test_refuses_to_copy_onto_itself() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("evidence.bin");
        std::fs::write(&source, b"evidence-data").unwrap();

        let err = copy_file(&source, &source).unwrap_err();

        assert!(matches!(err, ImagingError::SameFile(_)));
        assert_eq!(std::fs::read(&source).unwrap(), b"evidence-data");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_read_failure_leaves_destination_behind() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("evidence-dir");
        let image = temp_dir.path().join("evidence.img");
        std::fs::create_dir(&source).unwrap();

        // Directories open fine on Linux but fail on read
        let err = copy_file(&source, &image).unwrap_err();

        assert!(matches!(err, ImagingError::Read { offset: 0, .. }));
        assert!(image.exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_failure_reports_offset() {
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("evidence.bin");
        std::fs::write(&source, b"evidence-data").unwrap();

        match copy_file(&source, full) {
            Err(ImagingError::Write { offset, .. }) => assert_eq!(offset, 0),
            Err(ImagingError::CreateDestination { .. }) => {} // not writable in this sandbox
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
