//! CLI output formatting.
//!
//! Every display is built by a pure `format_*` function returning lines, so
//! it can be tested without capturing stdout; thin `print_*` wrappers write
//! them out. Diagnostics (warnings about tokens, abandoned chains) go through
//! `tracing` to stderr and are not rendered here.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! Output → Output (previous run moved to Output_2)
//! 3 images × 2 chains
//! 001 cat.png
//!     #0 cat_rotate-90---flip-vertical_0.png
//!     #1 abandoned: operation `foo` is not implemented
//! skipped README: name has no basename or extension
//! Wrote 3 variants (3 abandoned, 1 skipped entries)
//! ```
//!
//! ## Check
//!
//! ```text
//! line 1: rotate-90---flip-vertical
//! line 3: abandoned: operation `foo` is not implemented
//! 2 chains
//! ```

use crate::chain::Configuration;
use crate::naming;
use crate::process::{ProcessEvent, RunReport, VariantStatus};
use crate::registry;

/// Indentation for context lines below an image header.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

// ============================================================================
// Run output
// ============================================================================

/// Format a single run progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::RunStarted {
            output_dir,
            archived,
            image_count,
            chain_count,
        } => {
            let mut header = format!("Output \u{2192} {}", output_dir.display());
            if let Some(archived) = archived {
                header.push_str(&format!(
                    " (previous run moved to {})",
                    archived.display()
                ));
            }
            vec![
                header,
                format!("{} images \u{d7} {} chains", image_count, chain_count),
            ]
        }
        ProcessEvent::ImageProcessed {
            position,
            source,
            variants,
        } => {
            let mut lines = vec![format!("{:0>3} {}", position, source)];
            for variant in variants {
                let detail = match &variant.status {
                    VariantStatus::Written { file_name } => file_name.clone(),
                    VariantStatus::Abandoned { reason } => format!("abandoned: {}", reason),
                };
                lines.push(format!(
                    "{}#{} {}",
                    indent(1),
                    variant.sequence_index,
                    detail
                ));
            }
            lines
        }
        ProcessEvent::EntrySkipped { name, reason } => {
            vec![format!("skipped {}: {}", name, reason)]
        }
    }
}

/// One-line totals for a finished run.
pub fn format_summary(report: &RunReport) -> String {
    format!(
        "Wrote {} variants ({} abandoned, {} skipped entries)",
        report.written.len(),
        report.abandoned.len(),
        report.skipped.len()
    )
}

/// Print a finished run's summary to stdout.
pub fn print_summary(report: &RunReport) {
    println!("{}", format_summary(report));
}

// ============================================================================
// Check output
// ============================================================================

/// Resolve every chain without touching any image and describe the result.
///
/// Resolved chains show the name fragment their outputs will carry.
pub fn format_check_output(configuration: &Configuration) -> Vec<String> {
    let mut lines: Vec<String> = configuration
        .iter()
        .map(|chain| match registry::resolve_chain(chain) {
            Ok(resolved) => format!(
                "line {}: {}",
                chain.line,
                naming::chain_fragment(resolved.canonical())
            ),
            Err(e) => format!("line {}: abandoned: {}", chain.line, e),
        })
        .collect();
    lines.push(match configuration.len() {
        0 => "no chains, nothing would be written".to_string(),
        1 => "1 chain".to_string(),
        n => format!("{} chains", n),
    });
    lines
}

/// Print check output to stdout.
pub fn print_check_output(configuration: &Configuration) {
    for line in format_check_output(configuration) {
        println!("{}", line);
    }
}
