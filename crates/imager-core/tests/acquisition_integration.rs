//! End-to-end acquisition scenarios: hashing, imaging, verification and the
//! custody trail they leave behind

use imager_core::{
    copy_file, digest_file, run_acquisition, AcquisitionConfig, AcquisitionResult,
    AcquisitionStage, AcquisitionWorkflow, HashAlgorithm,
};
use std::path::PathBuf;
use tempfile::TempDir;

const EVIDENCE: &[u8] = b"evidence-data";
const EVIDENCE_SHA256: &str = "addbb2d367216c206f2b5022a12ea809945385fe6c15230de3e286b10e609e23";
const ANALYST: &str = "Forensic Analyst";

/// Helper to lay out a source file and an image path in a fresh directory
fn setup(contents: &[u8]) -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("evidence.bin");
    let image = temp_dir.path().join("evidence.img");
    std::fs::write(&source, contents).unwrap();
    (temp_dir, source, image)
}

// ============================================================================
// LEAF OPERATIONS
// ============================================================================

#[test]
fn test_known_evidence_digest() {
    let (_dir, source, _) = setup(EVIDENCE);

    let digest = digest_file(&source, HashAlgorithm::SHA256).unwrap();

    assert_eq!(digest.to_hex(), EVIDENCE_SHA256);
}

#[test]
fn test_copy_preserves_digest() {
    let (_dir, source, image) = setup(EVIDENCE);

    copy_file(&source, &image).unwrap();

    let original = digest_file(&source, HashAlgorithm::SHA256).unwrap();
    let copy = digest_file(&image, HashAlgorithm::SHA256).unwrap();
    assert_eq!(original, copy);
    assert_eq!(copy.to_hex(), EVIDENCE_SHA256);
}

#[test]
fn test_multi_chunk_copy_preserves_digest() {
    let contents: Vec<u8> = (0..200_003u32).map(|i| (i % 253) as u8).collect();
    let (_dir, source, image) = setup(&contents);

    let copied = copy_file(&source, &image).unwrap();

    assert_eq!(copied, contents.len() as u64);
    assert_eq!(
        digest_file(&source, HashAlgorithm::SHA256).unwrap(),
        digest_file(&image, HashAlgorithm::SHA256).unwrap()
    );
}

// ============================================================================
// WORKFLOW SCENARIOS
// ============================================================================

#[test]
fn test_full_acquisition_succeeds() {
    let (_dir, source, image) = setup(EVIDENCE);

    let outcome = run_acquisition(&source, &image, ANALYST);

    match &outcome.result {
        AcquisitionResult::Success { original, image } => {
            assert_eq!(original.to_hex(), EVIDENCE_SHA256);
            assert_eq!(image.to_hex(), EVIDENCE_SHA256);
        }
        other => panic!("expected success, got {:?}", other),
    }
    assert_eq!(outcome.ledger.len(), 4);
    assert_eq!(std::fs::read(&image).unwrap(), EVIDENCE);
}

#[test]
fn test_nonexistent_source() {
    let temp_dir = TempDir::new().unwrap();
    let image = temp_dir.path().join("evidence.img");

    let outcome = run_acquisition("/nonexistent/path", &image, ANALYST);

    assert_eq!(outcome.result, AcquisitionResult::SourceMissing);
    assert!(outcome.ledger.is_empty());
    assert!(!image.exists());
}

#[test]
fn test_corrupted_image_is_detected() {
    let (_dir, source, image) = setup(EVIDENCE);

    let mut workflow = AcquisitionWorkflow::default();
    let tamper_target = image.clone();
    workflow.set_progress_callback(move |progress| {
        if progress.stage == AcquisitionStage::Imaged {
            let mut bytes = std::fs::read(&tamper_target).unwrap();
            let last = bytes.len() - 1;
            bytes[last] ^= 0x01;
            std::fs::write(&tamper_target, bytes).unwrap();
        }
    });

    let outcome = workflow.run(&source, &image, ANALYST);

    match &outcome.result {
        AcquisitionResult::IntegrityMismatch { original, image } => {
            assert_eq!(original.to_hex(), EVIDENCE_SHA256);
            // "evidence-data" with its final byte flipped
            assert_eq!(
                image.to_hex(),
                "036c322d0ef2fb2587ae7c0e1716fe0281a72796998893aa9fcd5c3929d10815"
            );
        }
        other => panic!("expected integrity mismatch, got {:?}", other),
    }

    let last = outcome.ledger.last().unwrap();
    assert_eq!(last.action(), "Verification failed");
    assert!(outcome
        .ledger
        .render()
        .iter()
        .all(|e| e.action() != "Verified integrity of forensic image"));
}

#[test]
fn test_overwrites_stale_image() {
    let (_dir, source, image) = setup(EVIDENCE);
    std::fs::write(&image, b"stale bytes from an earlier, longer acquisition").unwrap();

    let outcome = run_acquisition(&source, &image, ANALYST);

    assert!(outcome.result.is_success());
    assert_eq!(std::fs::read(&image).unwrap(), EVIDENCE);
}

#[test]
fn test_empty_evidence_file() {
    let (_dir, source, image) = setup(b"");

    let outcome = run_acquisition(&source, &image, ANALYST);

    assert!(outcome.result.is_success());
    assert_eq!(outcome.bytes_copied, Some(0));
    assert_eq!(outcome.ledger.len(), 4);
}

#[test]
fn test_custody_timestamps_are_ordered() {
    let (_dir, source, image) = setup(EVIDENCE);

    let outcome = AcquisitionWorkflow::new(AcquisitionConfig::default()).run(&source, &image, ANALYST);

    let timestamps: Vec<_> = outcome.ledger.render().iter().map(|e| e.timestamp()).collect();
    assert_eq!(timestamps.len(), 4);
    assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_custody_json_report() {
    let (_dir, source, image) = setup(EVIDENCE);

    let outcome = run_acquisition(&source, &image, ANALYST);
    let json: serde_json::Value = serde_json::from_str(&outcome.ledger.to_json().unwrap()).unwrap();
    let records = json.as_array().unwrap();

    assert_eq!(records.len(), 4);
    assert_eq!(records[0]["file"], source.display().to_string());
    assert_eq!(records[3]["action"], "Verified integrity of forensic image");
    assert!(records.iter().all(|r| r["person"] == ANALYST));
}
