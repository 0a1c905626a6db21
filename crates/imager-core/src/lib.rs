//! Integrity-verified forensic acquisition of evidence files.
//!
//! A run hashes the source, streams it into a forensic image, hashes the
//! image and compares the two digests. Every completed step is written to an
//! append-only chain-of-custody ledger that is handed back with the verdict.

pub mod forensics;

// Re-export the acquisition surface
pub use forensics::{
    copy_file, copy_file_chunked, digest_bytes, digest_file, digest_file_chunked,
    run_acquisition, verify_file_integrity, AcquisitionConfig, AcquisitionOutcome,
    AcquisitionProgress, AcquisitionResult, AcquisitionStage, AcquisitionWorkflow, CustodyAction,
    CustodyEvent, CustodyLedger, FileDigest, HashAlgorithm, HashError, HashTarget, ImagingError,
    UnsupportedAlgorithm, VerificationStatus, DEFAULT_CHUNK_SIZE,
};
