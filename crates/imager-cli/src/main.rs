use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use imager_core::{
	digest_file, verify_file_integrity, AcquisitionConfig, AcquisitionResult,
	AcquisitionStage, AcquisitionWorkflow, FileDigest, HashAlgorithm, VerificationStatus,
	DEFAULT_CHUNK_SIZE,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "evidence-imager", version, about = "Forensic imaging with chain-of-custody logging")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Image an evidence file and verify the copy
	Acquire {
		/// Source evidence file (prompted for when omitted)
		source: Option<PathBuf>,
		/// Where to write the forensic image (prompted for when omitted)
		destination: Option<PathBuf>,
		/// Custodian recorded in the chain of custody
		#[arg(long, default_value = "Forensic Analyst")]
		actor: String,
		/// Hash algorithm (md5, sha1, sha256, sha512)
		#[arg(long, default_value = "sha256")]
		algorithm: HashAlgorithm,
		/// Read size in bytes
		#[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
		chunk_size: usize,
		/// Delete the image if copying fails part-way
		#[arg(long)]
		remove_partial: bool,
		/// Print the full outcome as JSON instead of text
		#[arg(long)]
		json: bool,
	},
	/// Hash a single file
	Hash {
		path: PathBuf,
		#[arg(long, default_value = "sha256")]
		algorithm: HashAlgorithm,
		/// Expected hex digest to verify against
		#[arg(long)]
		expect: Option<String>,
		#[arg(long)]
		json: bool,
	},
}

#[derive(Serialize)]
struct HashReport {
	path: PathBuf,
	digest: FileDigest,
	#[serde(skip_serializing_if = "Option::is_none")]
	status: Option<VerificationStatus>,
}

fn main() -> Result<ExitCode> {
	// Logs go to stderr so stdout stays machine-readable
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with_writer(io::stderr)
		.init();

	let cli = Cli::parse();
	match cli.command {
		Commands::Acquire { source, destination, actor, algorithm, chunk_size, remove_partial, json } => {
			if !json {
				println!("🔒 Welcome to Forensic Imaging System");
			}

			let source = match source {
				Some(path) => path,
				None => prompt_path("Enter the path of the source evidence file: ")?,
			};
			let destination = match destination {
				Some(path) => path,
				None => prompt_path("Enter the path to save the forensic image: ")?,
			};

			let config = AcquisitionConfig::with_algorithm(algorithm)
				.chunk_size(chunk_size)
				.remove_partial_image(remove_partial);
			let mut workflow = AcquisitionWorkflow::new(config);

			if !json {
				workflow.set_progress_callback(move |progress| match progress.stage {
					AcquisitionStage::OriginalHashed => {
						if let Some(ref digest) = progress.digest {
							println!("🔑 Original File Hash ({}): {}", digest.algorithm(), digest);
						}
					}
					AcquisitionStage::Imaged => {
						println!(
							"💾 Forensic image created successfully ({} bytes).",
							progress.bytes_copied.unwrap_or(0)
						);
					}
					AcquisitionStage::ImageHashed => {
						if let Some(ref digest) = progress.digest {
							println!("🔑 Forensic Image Hash ({}): {}", digest.algorithm(), digest);
						}
					}
					_ => {}
				});
			}

			let outcome = workflow.run(&source, &destination, actor);

			if json {
				println!("{}", serde_json::to_string_pretty(&outcome)?);
			} else {
				let marker = if outcome.result.is_success() { "✅" } else { "❌" };
				println!("{} {}", marker, outcome.result);
				println!();
				println!("📜 Chain of Custody Log:");
				println!("{}", outcome.ledger.to_json()?);
			}

			Ok(exit_code(&outcome.result))
		}
		Commands::Hash { path, algorithm, expect, json } => {
			let (digest, status) = match expect {
				Some(ref expected) => {
					let (digest, status) = verify_file_integrity(&path, expected, algorithm)
						.with_context(|| format!("Failed to hash {}", path.display()))?;
					(digest, Some(status))
				}
				None => {
					let digest = digest_file(&path, algorithm)
						.with_context(|| format!("Failed to hash {}", path.display()))?;
					(digest, None)
				}
			};

			if json {
				let report = HashReport { path, digest, status };
				println!("{}", serde_json::to_string_pretty(&report)?);
			} else {
				println!("{}  {}", digest, path.display());
				match status {
					Some(VerificationStatus::Verified) => println!("✅ Hash matches expected value"),
					Some(VerificationStatus::Corrupted) => println!("❌ Hash mismatch - possible corruption"),
					None => {}
				}
			}

			Ok(match status {
				Some(VerificationStatus::Corrupted) => ExitCode::from(2),
				_ => ExitCode::SUCCESS,
			})
		}
	}
}

/// Ask for a path on stdin, as the interactive imaging session does
fn prompt_path(prompt: &str) -> Result<PathBuf> {
	print!("{}", prompt);
	io::stdout().flush()?;

	let mut line = String::new();
	let read = io::stdin().lock().read_line(&mut line).context("Failed to read from stdin")?;
	let trimmed = line.trim();
	if read == 0 || trimmed.is_empty() {
		bail!("No path entered");
	}
	Ok(PathBuf::from(trimmed))
}

/// 0 on verified success, 2 on integrity mismatch, 1 on any other failure
fn exit_code(result: &AcquisitionResult) -> ExitCode {
	match result {
		AcquisitionResult::Success { .. } => ExitCode::SUCCESS,
		AcquisitionResult::IntegrityMismatch { .. } => ExitCode::from(2),
		_ => ExitCode::FAILURE,
	}
}
