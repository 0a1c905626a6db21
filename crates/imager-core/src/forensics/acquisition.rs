/// Integrity-verified acquisition of a single evidence file
///
/// The workflow runs a fixed pipeline: hash the source, image it, hash the
/// image, compare. Each step that completes is recorded in the run's custody
/// ledger before the next step starts, and any failure stops the pipeline
/// while keeping the ledger accumulated so far.
///
/// Known inconsistency: a failed hash of the *source* is not recorded, but the
/// image hash step is always recorded once imaging succeeded, even when the
/// image could not be read back.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::custody::{CustodyAction, CustodyLedger};
use super::error::ImagingError;
use super::imaging::copy_file_chunked;
use super::verification::{digest_file_chunked, FileDigest, HashAlgorithm, DEFAULT_CHUNK_SIZE};

/// Configuration for an acquisition run
#[derive(Debug, Clone)]
pub struct AcquisitionConfig {
    /// Algorithm used for both the source and the image digest
    pub hash_algorithm: HashAlgorithm,

    /// Read size for hashing and imaging
    pub chunk_size: usize,

    /// Delete a partially written image when copying fails
    pub remove_partial_image: bool,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::SHA256,
            chunk_size: DEFAULT_CHUNK_SIZE,
            remove_partial_image: false,
        }
    }
}

impl AcquisitionConfig {
    /// Default settings with a specific hash algorithm
    pub fn with_algorithm(hash_algorithm: HashAlgorithm) -> Self {
        Self {
            hash_algorithm,
            ..Default::default()
        }
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn remove_partial_image(mut self, enabled: bool) -> Self {
        self.remove_partial_image = enabled;
        self
    }
}

/// Pipeline stages, in the order they are reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionStage {
    Start,
    SourceChecked,
    OriginalHashed,
    Imaged,
    ImageHashed,
    Verified,
    Done,
}

/// Which file a failed digest belonged to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashTarget {
    Source,
    Image,
}

impl fmt::Display for HashTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashTarget::Source => write!(f, "source file"),
            HashTarget::Image => write!(f, "forensic image"),
        }
    }
}

/// Terminal outcome of an acquisition run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AcquisitionResult {
    Success {
        original: FileDigest,
        image: FileDigest,
    },
    SourceMissing,
    HashFailed {
        target: HashTarget,
        cause: String,
    },
    ImagingFailed {
        cause: String,
    },
    IntegrityMismatch {
        original: FileDigest,
        image: FileDigest,
    },
}

impl AcquisitionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AcquisitionResult::Success { .. })
    }
}

impl fmt::Display for AcquisitionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionResult::Success { .. } => write!(
                f,
                "Verification Passed: The forensic image matches the original evidence."
            ),
            AcquisitionResult::SourceMissing => write!(f, "Source file not found!"),
            AcquisitionResult::HashFailed { target, cause } => {
                write!(f, "Unable to compute hash of the {}: {}", target, cause)
            }
            AcquisitionResult::ImagingFailed { cause } => {
                write!(f, "Error during forensic imaging: {}", cause)
            }
            AcquisitionResult::IntegrityMismatch { original, image } => write!(
                f,
                "Verification Failed: The forensic image does not match the original evidence \
                 (original {}, image {}).",
                original, image
            ),
        }
    }
}

/// Progress notification emitted on every stage transition
#[derive(Debug, Clone)]
pub struct AcquisitionProgress {
    pub stage: AcquisitionStage,
    pub subject: PathBuf,
    pub digest: Option<FileDigest>,
    pub bytes_copied: Option<u64>,
}

/// Everything a caller needs after a run: verdict plus custody trail
#[derive(Debug, Clone, Serialize)]
pub struct AcquisitionOutcome {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub actor: String,
    pub algorithm: HashAlgorithm,
    /// Last stage the pipeline reached
    pub last_stage: AcquisitionStage,
    pub bytes_copied: Option<u64>,
    pub result: AcquisitionResult,
    pub ledger: CustodyLedger,
}

/// Bookkeeping for one in-flight run
struct Run<'a> {
    source: &'a Path,
    destination: &'a Path,
    actor: String,
    stage: AcquisitionStage,
    bytes_copied: Option<u64>,
    ledger: CustodyLedger,
}

impl Run<'_> {
    fn record(&mut self, action: CustodyAction, subject: &Path) {
        self.ledger
            .append(action, subject.display().to_string(), self.actor.clone());
    }
}

/// Orchestrates hashing, imaging and verification for one evidence file
pub struct AcquisitionWorkflow {
    config: AcquisitionConfig,
    progress_callback: Option<Box<dyn Fn(&AcquisitionProgress) + Send + Sync>>,
}

impl AcquisitionWorkflow {
    pub fn new(config: AcquisitionConfig) -> Self {
        Self {
            config,
            progress_callback: None,
        }
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    pub fn set_progress_callback<F>(&mut self, callback: F)
    where
        F: Fn(&AcquisitionProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
    }

    /// Acquire `source` into `destination` on behalf of `actor`
    pub fn run(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
        actor: impl Into<String>,
    ) -> AcquisitionOutcome {
        let mut run = Run {
            source: source.as_ref(),
            destination: destination.as_ref(),
            actor: actor.into(),
            stage: AcquisitionStage::Start,
            bytes_copied: None,
            ledger: CustodyLedger::new(),
        };

        tracing::info!(
            "Starting acquisition {} of {} -> {} ({})",
            run.ledger.run_id(),
            run.source.display(),
            run.destination.display(),
            self.config.hash_algorithm
        );

        let result = self.execute(&mut run);

        if result.is_success() {
            tracing::info!("Acquisition {} verified", run.ledger.run_id());
        } else {
            tracing::warn!(
                "Acquisition {} stopped after {:?}: {}",
                run.ledger.run_id(),
                run.stage,
                result
            );
        }

        AcquisitionOutcome {
            source: run.source.to_path_buf(),
            destination: run.destination.to_path_buf(),
            actor: run.actor,
            algorithm: self.config.hash_algorithm,
            last_stage: run.stage,
            bytes_copied: run.bytes_copied,
            result,
            ledger: run.ledger,
        }
    }

    fn execute(&self, run: &mut Run<'_>) -> AcquisitionResult {
        let algorithm = self.config.hash_algorithm;
        let chunk_size = self.config.chunk_size;

        // Existence check comes before anything is logged
        if !run.source.exists() {
            return AcquisitionResult::SourceMissing;
        }
        self.advance(run, AcquisitionStage::SourceChecked, None);

        let original = match digest_file_chunked(run.source, algorithm, chunk_size) {
            Ok(digest) => digest,
            Err(e) => {
                return AcquisitionResult::HashFailed {
                    target: HashTarget::Source,
                    cause: e.to_string(),
                }
            }
        };
        tracing::info!("Original file hash ({}): {}", algorithm, original);
        run.record(CustodyAction::OriginalHashed, run.source);
        self.advance(run, AcquisitionStage::OriginalHashed, Some(&original));

        match copy_file_chunked(run.source, run.destination, chunk_size) {
            Ok(bytes) => run.bytes_copied = Some(bytes),
            Err(e) => {
                if self.config.remove_partial_image {
                    discard_partial_image(run.destination, &e);
                }
                return AcquisitionResult::ImagingFailed {
                    cause: e.to_string(),
                };
            }
        }
        run.record(CustodyAction::ImageCreated, run.destination);
        self.advance(run, AcquisitionStage::Imaged, None);

        let image = digest_file_chunked(run.destination, algorithm, chunk_size);
        run.record(CustodyAction::ImageHashed, run.destination);

        let image = match image {
            Ok(digest) => digest,
            Err(e) => {
                run.record(CustodyAction::VerificationFailed, run.destination);
                return AcquisitionResult::HashFailed {
                    target: HashTarget::Image,
                    cause: e.to_string(),
                };
            }
        };
        tracing::info!("Forensic image hash ({}): {}", algorithm, image);
        self.advance(run, AcquisitionStage::ImageHashed, Some(&image));

        if original == image {
            run.record(CustodyAction::IntegrityVerified, run.destination);
            self.advance(run, AcquisitionStage::Verified, Some(&image));
            self.advance(run, AcquisitionStage::Done, None);
            AcquisitionResult::Success { original, image }
        } else {
            run.record(CustodyAction::VerificationFailed, run.destination);
            self.advance(run, AcquisitionStage::Done, None);
            AcquisitionResult::IntegrityMismatch { original, image }
        }
    }

    fn advance(&self, run: &mut Run<'_>, stage: AcquisitionStage, digest: Option<&FileDigest>) {
        run.stage = stage;

        let subject = match stage {
            AcquisitionStage::Start
            | AcquisitionStage::SourceChecked
            | AcquisitionStage::OriginalHashed => run.source,
            _ => run.destination,
        };
        tracing::debug!("Acquisition stage {:?} ({})", stage, subject.display());

        if let Some(ref callback) = self.progress_callback {
            callback(&AcquisitionProgress {
                stage,
                subject: subject.to_path_buf(),
                digest: digest.cloned(),
                bytes_copied: run.bytes_copied,
            });
        }
    }
}

impl Default for AcquisitionWorkflow {
    fn default() -> Self {
        Self::new(AcquisitionConfig::default())
    }
}

/// Run an acquisition with the default configuration
pub fn run_acquisition(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    actor: impl Into<String>,
) -> AcquisitionOutcome {
    AcquisitionWorkflow::default().run(source, destination, actor)
}

/// Remove an image left behind by an interrupted copy.
///
/// Only errors raised after the destination was opened for writing qualify,
/// and only regular files are removed.
fn discard_partial_image(destination: &Path, error: &ImagingError) -> bool {
    let written = matches!(
        error,
        ImagingError::Read { .. } | ImagingError::Write { .. } | ImagingError::Sync { .. }
    );
    let is_regular_file = std::fs::metadata(destination)
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !written || !is_regular_file {
        return false;
    }

    match std::fs::remove_file(destination) {
        Ok(()) => {
            tracing::info!("Removed partial image {}", destination.display());
            true
        }
        Err(e) => {
            tracing::warn!(
                "Could not remove partial image {}: {}",
                destination.display(),
                e
            );
            false
        }
    }
}
