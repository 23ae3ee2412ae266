//! Batch driver.
//!
//! Applies every configured chain to every file of the input directory and
//! writes each result into a freshly versioned output directory.
//!
//! ## Flow
//!
//! ```text
//! chains   → resolve once (unknown names mark the chain abandoned)
//! input/   → sorted entries, unnameable ones skipped
//! Output/  → prepare (previous run archived as Output_<k>)
//! images   → rayon: decode, run each chain, name, encode
//! ```
//!
//! ## Sequence indices
//!
//! The pair (image at position `p`, chain at position `c`) always gets index
//! `p × chain_count + c`. Indices are assigned before any work starts, so
//! file names do not depend on thread scheduling. An abandoned pair leaves a
//! gap; no index is ever reused within a run.
//!
//! ## Failure policy
//!
//! Only setup can fail the run: an unreadable input directory or an output
//! directory that cannot be prepared. Unknown operations, failing steps,
//! uninspectable entries such as dangling links, undecodable files and
//! encode failures are logged, reported through [`ProcessEvent`]s and
//! collected in the [`RunReport`].

use crate::chain::Configuration;
use crate::executor::{self, ChainError};
use crate::imaging::{ImageBackend, Quality, RustBackend};
use crate::naming::{self, SourceName};
use crate::output_dir::{self, OutputDirError};
use crate::registry::{self, ResolvedChain};
use image::RgbImage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    OutputDir(#[from] OutputDirError),
    #[error("cannot read input directory {}: {source}", .path.display())]
    InputDir {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Everything a run needs besides the chains.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input_dir: PathBuf,
    /// Output root; versioned by [`output_dir::prepare`].
    pub output_root: PathBuf,
    pub jpeg_quality: Quality,
    /// Base seed for noise. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl RunOptions {
    pub fn new(input_dir: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_root: output_root.into(),
            jpeg_quality: Quality::default(),
            seed: None,
        }
    }
}

// ============================================================================
// Progress events
// ============================================================================

/// Progress notifications, sent while the run is in flight.
///
/// Image events arrive in completion order, not input order.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    RunStarted {
        output_dir: PathBuf,
        archived: Option<PathBuf>,
        image_count: usize,
        chain_count: usize,
    },
    ImageProcessed {
        /// 1-based position in sorted input order.
        position: usize,
        source: String,
        variants: Vec<VariantInfo>,
    },
    EntrySkipped {
        name: String,
        reason: String,
    },
}

/// Outcome of one (image, chain) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantInfo {
    pub sequence_index: u64,
    pub status: VariantStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VariantStatus {
    Written { file_name: String },
    Abandoned { reason: String },
}

// ============================================================================
// Run report
// ============================================================================

/// Result of a completed run, ordered by sequence index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    /// `None` when the configuration held no chains and nothing was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<PathBuf>,
    pub written: Vec<WrittenVariant>,
    pub abandoned: Vec<AbandonedPair>,
    pub skipped: Vec<SkippedEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrittenVariant {
    pub source: String,
    pub chain_line: usize,
    pub sequence_index: u64,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbandonedPair {
    pub source: String,
    pub chain_line: usize,
    pub sequence_index: u64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedEntry {
    pub name: String,
    pub reason: String,
}

// ============================================================================
// Driver
// ============================================================================

/// A nameable input file.
#[derive(Debug, Clone)]
struct SourceImage {
    path: PathBuf,
    file_name: String,
    name: SourceName,
}

/// Per-image result, merged into the report in input order.
enum ImageOutcome {
    Processed {
        written: Vec<WrittenVariant>,
        abandoned: Vec<AbandonedPair>,
    },
    Skipped(SkippedEntry),
}

/// Run with the pure-Rust codec backend.
pub fn process(
    options: &RunOptions,
    configuration: &Configuration,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<RunReport, ProcessError> {
    let backend = RustBackend::with_quality(options.jpeg_quality);
    process_with_backend(&backend, options, configuration, progress)
}

/// Run using a specific backend (allows testing with mock).
pub fn process_with_backend(
    backend: &impl ImageBackend,
    options: &RunOptions,
    configuration: &Configuration,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<RunReport, ProcessError> {
    if configuration.is_empty() {
        info!("configuration holds no chains, nothing to do");
        return Ok(RunReport::default());
    }

    let chains = resolve_chains(configuration);
    let (sources, mut skipped) = enumerate_inputs(&options.input_dir)?;
    for entry in &skipped {
        send(&progress, ProcessEvent::EntrySkipped {
            name: entry.name.clone(),
            reason: entry.reason.clone(),
        });
    }

    let prepared = output_dir::prepare(&options.output_root)?;
    send(&progress, ProcessEvent::RunStarted {
        output_dir: prepared.path.clone(),
        archived: prepared.archived.clone(),
        image_count: sources.len(),
        chain_count: chains.len(),
    });

    let outcomes: Vec<ImageOutcome> = sources
        .par_iter()
        .enumerate()
        .map(|(position, source)| {
            process_image(
                backend,
                source,
                position,
                &chains,
                &prepared.path,
                options.seed,
                &progress,
            )
        })
        .collect();

    let mut report = RunReport {
        output_dir: Some(prepared.path),
        archived: prepared.archived,
        ..RunReport::default()
    };
    for outcome in outcomes {
        match outcome {
            ImageOutcome::Processed { written, abandoned } => {
                report.written.extend(written);
                report.abandoned.extend(abandoned);
            }
            ImageOutcome::Skipped(entry) => skipped.push(entry),
        }
    }
    report.skipped = skipped;
    Ok(report)
}

/// Resolve each chain once. Unknown operations are reported here, not per
/// image.
fn resolve_chains(configuration: &Configuration) -> Vec<(usize, Result<ResolvedChain, ChainError>)> {
    configuration
        .iter()
        .map(|chain| {
            let resolved = registry::resolve_chain(chain).map_err(ChainError::from);
            if let Err(e) = &resolved {
                warn!(line = chain.line, "{e}; chain will be skipped");
            }
            (chain.line, resolved)
        })
        .collect()
}

/// Files directly inside `dir`, sorted by name, split into nameable sources
/// and skipped entries.
///
/// Symlinks are followed. Only a failure to read `dir` itself is an error;
/// an entry that cannot be inspected (a dangling link, say) is skipped.
fn enumerate_inputs(dir: &Path) -> Result<(Vec<SourceImage>, Vec<SkippedEntry>), ProcessError> {
    let mut sources = Vec::new();
    let mut skipped = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) if source.depth() == 0 => {
                return Err(ProcessError::InputDir {
                    path: dir.to_path_buf(),
                    source,
                });
            }
            Err(e) => {
                let name = e
                    .path()
                    .and_then(Path::file_name)
                    .map(|f| f.to_string_lossy().into_owned())
                    .unwrap_or_default();
                warn!(entry = %name, "cannot inspect entry, skipping: {e}");
                skipped.push(SkippedEntry {
                    name,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let file_name = entry.file_name().to_string_lossy().into_owned();

        if !entry.file_type().is_file() {
            warn!(entry = %file_name, "not a regular file, skipping");
            skipped.push(SkippedEntry {
                name: file_name,
                reason: "not a regular file".into(),
            });
            continue;
        }

        match naming::split_source_name(&file_name) {
            Some(name) => sources.push(SourceImage {
                path: entry.into_path(),
                file_name,
                name,
            }),
            None => {
                warn!(entry = %file_name, "no basename/extension, skipping");
                skipped.push(SkippedEntry {
                    name: file_name,
                    reason: "name has no basename or extension".into(),
                });
            }
        }
    }

    Ok((sources, skipped))
}

fn process_image(
    backend: &impl ImageBackend,
    source: &SourceImage,
    position: usize,
    chains: &[(usize, Result<ResolvedChain, ChainError>)],
    output_dir: &Path,
    seed: Option<u64>,
    progress: &Option<Sender<ProcessEvent>>,
) -> ImageOutcome {
    let image = match backend.decode(&source.path) {
        Ok(image) => image,
        Err(e) => {
            warn!(source = %source.file_name, "decode failed: {e}");
            let entry = SkippedEntry {
                name: source.file_name.clone(),
                reason: e.to_string(),
            };
            send(progress, ProcessEvent::EntrySkipped {
                name: entry.name.clone(),
                reason: entry.reason.clone(),
            });
            return ImageOutcome::Skipped(entry);
        }
    };

    let mut written = Vec::new();
    let mut abandoned = Vec::new();
    let mut variants = Vec::with_capacity(chains.len());

    for (chain_position, (line, chain)) in chains.iter().enumerate() {
        let sequence_index = (position * chains.len() + chain_position) as u64;
        let status = match run_pair(backend, &image, source, chain, sequence_index, output_dir, seed) {
            Ok(variant) => {
                let status = VariantStatus::Written {
                    file_name: variant.file_name.clone(),
                };
                written.push(variant);
                status
            }
            Err(reason) => {
                warn!(
                    source = %source.file_name,
                    line = *line,
                    "chain abandoned: {reason}"
                );
                abandoned.push(AbandonedPair {
                    source: source.file_name.clone(),
                    chain_line: *line,
                    sequence_index,
                    reason: reason.clone(),
                });
                VariantStatus::Abandoned { reason }
            }
        };
        variants.push(VariantInfo {
            sequence_index,
            status,
        });
    }

    send(progress, ProcessEvent::ImageProcessed {
        position: position + 1,
        source: source.file_name.clone(),
        variants,
    });
    ImageOutcome::Processed { written, abandoned }
}

/// Execute one chain on a copy of `image` and persist the result.
fn run_pair(
    backend: &impl ImageBackend,
    image: &RgbImage,
    source: &SourceImage,
    chain: &Result<ResolvedChain, ChainError>,
    sequence_index: u64,
    output_dir: &Path,
    seed: Option<u64>,
) -> Result<WrittenVariant, String> {
    let chain = chain.as_ref().map_err(|e| e.to_string())?;
    let mut rng = rng_for(seed, sequence_index);
    let output = executor::run(image.clone(), chain, &mut rng).map_err(|e| e.to_string())?;

    let file_name = naming::name_for(
        &source.name.basename,
        &source.name.extension,
        chain.canonical(),
        sequence_index,
    );
    backend
        .encode(&output, &output_dir.join(&file_name))
        .map_err(|e| format!("encode failed: {e}"))?;

    Ok(WrittenVariant {
        source: source.file_name.clone(),
        chain_line: chain.line,
        sequence_index,
        file_name,
        width: output.width(),
        height: output.height(),
    })
}

/// Per-output RNG: reproducible when seeded, independent of scheduling.
fn rng_for(seed: Option<u64>, sequence_index: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(sequence_index)),
        None => StdRng::from_os_rng(),
    }
}

fn send(progress: &Option<Sender<ProcessEvent>>, event: ProcessEvent) {
    if let Some(tx) = progress {
        // Receiver gone means nobody is listening; the run goes on.
        let _ = tx.send(event);
    }
}
