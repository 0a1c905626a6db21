/// Forensic acquisition: hashing, imaging, custody logging and verification
pub mod acquisition;
pub mod custody;
pub mod error;
pub mod imaging;
pub mod verification;

pub use acquisition::{
    run_acquisition, AcquisitionConfig, AcquisitionOutcome, AcquisitionProgress,
    AcquisitionResult, AcquisitionStage, AcquisitionWorkflow, HashTarget,
};

pub use custody::{CustodyAction, CustodyEvent, CustodyLedger};

pub use error::{HashError, ImagingError};

pub use imaging::{copy_file, copy_file_chunked};

pub use verification::{
    digest_bytes, digest_file, digest_file_chunked, verify_file_integrity, FileDigest,
    HashAlgorithm, UnsupportedAlgorithm, VerificationStatus, DEFAULT_CHUNK_SIZE,
};
