//! Chain execution.
//!
//! Runs the steps of one chain over one decoded image, threading each step's
//! output into the next. Execution is all-or-nothing: the first step that
//! fails abandons the chain and no intermediate buffer escapes.

use crate::chain::Chain;
use crate::imaging::operations::{self, TransformError};
use crate::registry::{self, DispatchError, ResolvedChain, ResolvedOperation, Transform};
use image::RgbImage;
use rand::Rng;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("step {step} (`{operation}`) failed: {source}")]
    Step {
        step: usize,
        operation: String,
        #[source]
        source: TransformError,
    },
}

/// Run an already resolved chain.
pub fn run<R: Rng + ?Sized>(
    image: RgbImage,
    chain: &ResolvedChain,
    rng: &mut R,
) -> Result<RgbImage, ChainError> {
    chain
        .steps
        .iter()
        .enumerate()
        .try_fold(image, |image, (idx, step)| {
            apply(image, step, rng).map_err(|source| ChainError::Step {
                step: idx + 1,
                operation: step.canonical.name.clone(),
                source,
            })
        })
}

/// Resolve `chain` and run it. Returns the result together with the resolved
/// chain, whose canonical operations name the output.
///
/// This is the single-image entry point for library callers. The batch
/// driver resolves each chain once per run and calls [`run`] instead.
pub fn execute<R: Rng + ?Sized>(
    image: RgbImage,
    chain: &Chain,
    rng: &mut R,
) -> Result<(RgbImage, ResolvedChain), ChainError> {
    let resolved = registry::resolve_chain(chain)?;
    let output = run(image, &resolved, rng)?;
    Ok((output, resolved))
}

/// Apply one step.
pub fn apply<R: Rng + ?Sized>(
    image: RgbImage,
    step: &ResolvedOperation,
    rng: &mut R,
) -> Result<RgbImage, TransformError> {
    operations::ensure_non_empty(&image)?;
    debug!(
        operation = %step.canonical.name,
        params = ?step.canonical.params,
        width = image.width(),
        height = image.height(),
        "applying step"
    );

    match &step.transform {
        Transform::Tint { channels, mode } => Ok(operations::tint(image, channels, *mode)),
        Transform::Rotate { degrees, policy } => operations::rotate(image, *degrees, *policy),
        Transform::Rescale { width, height } => operations::rescale(image, *width, *height),
        Transform::Blur { kernel_size } => operations::blur(image, *kernel_size),
        Transform::Noise { lower, upper } => Ok(operations::noise(image, *lower, *upper, rng)),
        Transform::Brighten { intensity } => Ok(operations::brighten(image, *intensity)),
        Transform::Flip { axes } => Ok(operations::flip(image, axes)),
    }
}
