//! Operation registry: name dispatch and default materialization.
//!
//! Resolution is a two-phase step. [`OperationKind::from_name`] maps a
//! case-folded name onto a closed set of kinds (unknown names fail with
//! [`DispatchError::Unimplemented`]), then the kind's parameter rules turn the
//! raw tokens into a typed [`Transform`] plus a *canonical* parameter list.
//! The canonical list holds the effective values, defaults included, and is
//! what the output file name is built from. The parsed [`Operation`] is never
//! modified.
//!
//! ## Names and defaults
//!
//! | Name(s) | Parameters | Defaults |
//! |---|---|---|
//! | `rotate`, `rotate_keep_size` | degrees | 15 |
//! | `rotate_keep_corners` | degrees | 15 |
//! | `rotate_crop_inward` | degrees | 15 |
//! | `rescale` | width height | 256 256 |
//! | `blur` | kernel size (even → minus one) | 3 |
//! | `noise` | lower upper | 0.7 1.0 |
//! | `brighten` | intensity | 1.5 |
//! | `flip`, `mirror` | `vertical` / `horizontal`, any order | horizontal |
//! | `tint`, `abs_tint` | `redNN` `greenNN` `blueNN` | none (no-op) |
//!
//! Malformed tokens are skipped with a warning; for numeric parameters the
//! default takes their place.

use crate::chain::{Chain, Operation};
use crate::imaging::calculations::odd_kernel_size;
use crate::imaging::{ChannelValue, CropPolicy, FlipAxis, TintMode};
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

const DEFAULT_ROTATION_DEGREES: (f64, &str) = (15.0, "15");
const DEFAULT_RESCALE_SIDE: (u32, &str) = (256, "256");
const DEFAULT_BLUR_KERNEL: (u32, &str) = (3, "3");
const DEFAULT_NOISE_LOWER: (f32, &str) = (0.7, "0.7");
const DEFAULT_NOISE_UPPER: (f32, &str) = (1.0, "1.0");
const DEFAULT_BRIGHTNESS: (f32, &str) = (1.5, "1.5");

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("operation `{0}` is not implemented")]
    Unimplemented(String),
}

/// Every operation the engine knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Tint(TintMode),
    Rotate(CropPolicy),
    Rescale,
    Blur,
    Noise,
    Brighten,
    Flip,
}

impl OperationKind {
    /// All accepted operation names, aliases included.
    pub const NAMES: &'static [&'static str] = &[
        "tint",
        "abs_tint",
        "rotate",
        "rotate_keep_size",
        "rotate_keep_corners",
        "rotate_crop_inward",
        "rescale",
        "blur",
        "noise",
        "brighten",
        "flip",
        "mirror",
    ];

    /// Exact-match lookup on an already case-folded name.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "tint" => Self::Tint(TintMode::Additive),
            "abs_tint" => Self::Tint(TintMode::Absolute),
            "rotate" | "rotate_keep_size" => Self::Rotate(CropPolicy::KeepOriginalSize),
            "rotate_keep_corners" => Self::Rotate(CropPolicy::KeepCorners),
            "rotate_crop_inward" => Self::Rotate(CropPolicy::CropInward),
            "rescale" => Self::Rescale,
            "blur" => Self::Blur,
            "noise" => Self::Noise,
            "brighten" => Self::Brighten,
            "flip" | "mirror" => Self::Flip,
            _ => return None,
        };
        Some(kind)
    }
}

/// A transform with fully resolved, typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    Tint {
        channels: Vec<ChannelValue>,
        mode: TintMode,
    },
    Rotate {
        degrees: f64,
        policy: CropPolicy,
    },
    Rescale {
        width: u32,
        height: u32,
    },
    Blur {
        kernel_size: u32,
    },
    Noise {
        lower: f32,
        upper: f32,
    },
    Brighten {
        intensity: f32,
    },
    Flip {
        axes: Vec<FlipAxis>,
    },
}

/// One chain step after dispatch and default resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOperation {
    /// Name plus effective parameters, used for output naming.
    pub canonical: Operation,
    pub transform: Transform,
}

/// A chain whose every step resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedChain {
    pub line: usize,
    pub steps: Vec<ResolvedOperation>,
}

impl ResolvedChain {
    pub fn canonical(&self) -> impl Iterator<Item = &Operation> {
        self.steps.iter().map(|s| &s.canonical)
    }
}

/// Resolve a single operation.
pub fn resolve(op: &Operation) -> Result<ResolvedOperation, DispatchError> {
    let kind = OperationKind::from_name(&op.name)
        .ok_or_else(|| DispatchError::Unimplemented(op.name.clone()))?;
    let (transform, params) = resolve_defaults(kind, &op.name, &op.params);
    Ok(ResolvedOperation {
        canonical: Operation {
            name: op.name.clone(),
            params,
        },
        transform,
    })
}

/// Resolve every step of a chain; the first unknown name fails the chain.
pub fn resolve_chain(chain: &Chain) -> Result<ResolvedChain, DispatchError> {
    let steps = chain
        .operations
        .iter()
        .map(resolve)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ResolvedChain {
        line: chain.line,
        steps,
    })
}

/// Materialize defaults for `kind`, returning the typed transform and the
/// canonical parameter tokens.
pub fn resolve_defaults(kind: OperationKind, name: &str, raw: &[String]) -> (Transform, Vec<String>) {
    let arg = |i: usize| raw.get(i).map(String::as_str);

    match kind {
        OperationKind::Rotate(policy) => {
            warn_extra(name, raw, 1);
            let (degrees, token) =
                numeric(name, "degrees", arg(0), DEFAULT_ROTATION_DEGREES, |d: &f64| {
                    d.is_finite()
                });
            (Transform::Rotate { degrees, policy }, vec![token])
        }
        OperationKind::Rescale => {
            warn_extra(name, raw, 2);
            let (width, w_token) = numeric(name, "width", arg(0), DEFAULT_RESCALE_SIDE, |v| *v > 0);
            let (height, h_token) =
                numeric(name, "height", arg(1), DEFAULT_RESCALE_SIDE, |v| *v > 0);
            (Transform::Rescale { width, height }, vec![w_token, h_token])
        }
        OperationKind::Blur => {
            warn_extra(name, raw, 1);
            let (requested, _) =
                numeric(name, "kernel size", arg(0), DEFAULT_BLUR_KERNEL, |k| *k > 0);
            let kernel_size = odd_kernel_size(requested).unwrap_or(DEFAULT_BLUR_KERNEL.0);
            (
                Transform::Blur { kernel_size },
                vec![kernel_size.to_string()],
            )
        }
        OperationKind::Noise => {
            warn_extra(name, raw, 2);
            let valid = |v: &f32| v.is_finite() && *v >= 0.0;
            let mut lower = numeric(name, "lower bound", arg(0), DEFAULT_NOISE_LOWER, valid);
            let mut upper = numeric(name, "upper bound", arg(1), DEFAULT_NOISE_UPPER, valid);
            if lower.0 > upper.0 {
                warn!(
                    operation = name,
                    lower = %lower.1,
                    upper = %upper.1,
                    "noise bounds are reversed, swapping"
                );
                std::mem::swap(&mut lower, &mut upper);
            }
            (
                Transform::Noise {
                    lower: lower.0,
                    upper: upper.0,
                },
                vec![lower.1, upper.1],
            )
        }
        OperationKind::Brighten => {
            warn_extra(name, raw, 1);
            let (intensity, token) = numeric(name, "intensity", arg(0), DEFAULT_BRIGHTNESS, |v: &f32| {
                v.is_finite() && *v >= 0.0
            });
            (Transform::Brighten { intensity }, vec![token])
        }
        OperationKind::Flip => {
            let mut axes = Vec::new();
            let mut tokens = Vec::new();
            for token in raw {
                match FlipAxis::from_token(token) {
                    Some(axis) => {
                        axes.push(axis);
                        tokens.push(axis.as_str().to_string());
                    }
                    None => warn!(
                        operation = name,
                        token = %token,
                        "expected `vertical` or `horizontal`, ignoring"
                    ),
                }
            }
            if axes.is_empty() {
                axes.push(FlipAxis::Horizontal);
                tokens.push(FlipAxis::Horizontal.as_str().to_string());
            }
            (Transform::Flip { axes }, tokens)
        }
        OperationKind::Tint(mode) => {
            let mut channels = Vec::new();
            let mut tokens = Vec::new();
            for token in raw {
                match ChannelValue::parse(token) {
                    Ok(cv) => {
                        channels.push(cv);
                        tokens.push(token.clone());
                    }
                    Err(e) => warn!(operation = name, "{e}, ignoring"),
                }
            }
            (Transform::Tint { channels, mode }, tokens)
        }
    }
}

/// Parse an optional numeric token, falling back to `default` when it is
/// absent, unparsable, or rejected by `valid`.
fn numeric<T: FromStr>(
    operation: &str,
    parameter: &str,
    token: Option<&str>,
    default: (T, &'static str),
    valid: impl Fn(&T) -> bool,
) -> (T, String) {
    if let Some(token) = token {
        match token.parse::<T>() {
            Ok(value) if valid(&value) => return (value, token.to_string()),
            _ => warn!(
                operation,
                parameter,
                token,
                default = default.1,
                "malformed parameter, using default"
            ),
        }
    }
    (default.0, default.1.to_string())
}

fn warn_extra(operation: &str, raw: &[String], expected: usize) {
    if raw.len() > expected {
        warn!(
            operation,
            ignored = ?&raw[expected..],
            "too many parameters, ignoring the rest"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Channel;

    fn resolved(name: &str, params: &[&str]) -> ResolvedOperation {
        resolve(&Operation::new(name, params.iter().copied())).unwrap()
    }

    fn canonical(name: &str, params: &[&str]) -> Vec<String> {
        resolved(name, params).canonical.params
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    #[test]
    fn unknown_name_is_unimplemented() {
        let err = resolve(&Operation::new("foo", ["bar"])).unwrap_err();
        assert_eq!(err, DispatchError::Unimplemented("foo".into()));
    }

    #[test]
    fn every_listed_name_dispatches() {
        for name in OperationKind::NAMES {
            assert!(OperationKind::from_name(name).is_some(), "{name}");
        }
    }

    #[test]
    fn rotate_aliases_select_crop_policy() {
        assert_eq!(
            OperationKind::from_name("rotate"),
            Some(OperationKind::Rotate(CropPolicy::KeepOriginalSize))
        );
        assert_eq!(
            OperationKind::from_name("rotate_keep_size"),
            Some(OperationKind::Rotate(CropPolicy::KeepOriginalSize))
        );
        assert_eq!(
            OperationKind::from_name("rotate_keep_corners"),
            Some(OperationKind::Rotate(CropPolicy::KeepCorners))
        );
        assert_eq!(
            OperationKind::from_name("rotate_crop_inward"),
            Some(OperationKind::Rotate(CropPolicy::CropInward))
        );
    }

    #[test]
    fn mirror_is_flip() {
        assert_eq!(OperationKind::from_name("mirror"), Some(OperationKind::Flip));
    }

    #[test]
    fn resolve_chain_fails_on_any_unknown_step() {
        let chain = Chain {
            line: 4,
            operations: vec![Operation::new("rotate", ["90"]), Operation::new("sharpen", ["2"])],
        };
        assert_eq!(
            resolve_chain(&chain),
            Err(DispatchError::Unimplemented("sharpen".into()))
        );
    }

    #[test]
    fn resolve_chain_keeps_line_and_order() {
        let chain = Chain {
            line: 2,
            operations: vec![Operation::new("rotate", ["90"]), Operation::new("flip", ["vertical"])],
        };
        let resolved = resolve_chain(&chain).unwrap();
        assert_eq!(resolved.line, 2);
        let names: Vec<&str> = resolved.canonical().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["rotate", "flip"]);
    }

    #[test]
    fn resolution_does_not_touch_the_parsed_operation() {
        let op = Operation::new("rotate", Vec::<String>::new());
        let before = op.clone();
        let _ = resolve(&op).unwrap();
        assert_eq!(op, before);
    }

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn rotate_defaults_to_15() {
        let r = resolved("rotate", &[]);
        assert_eq!(r.canonical.params, vec!["15"]);
        assert_eq!(
            r.transform,
            Transform::Rotate {
                degrees: 15.0,
                policy: CropPolicy::KeepOriginalSize
            }
        );
    }

    #[test]
    fn rotate_keeps_supplied_token() {
        assert_eq!(canonical("rotate_keep_corners", &["-22.5"]), vec!["-22.5"]);
    }

    #[test]
    fn rotate_malformed_falls_back_to_default() {
        assert_eq!(canonical("rotate", &["abc"]), vec!["15"]);
        assert_eq!(canonical("rotate", &["inf"]), vec!["15"]);
    }

    #[test]
    fn rotate_ignores_extra_parameters() {
        assert_eq!(canonical("rotate", &["30", "40"]), vec!["30"]);
    }

    #[test]
    fn rescale_defaults_each_side() {
        assert_eq!(canonical("rescale", &[]), vec!["256", "256"]);
        assert_eq!(canonical("rescale", &["128"]), vec!["128", "256"]);
        assert_eq!(canonical("rescale", &["0", "64"]), vec!["256", "64"]);
        assert_eq!(
            resolved("rescale", &["320", "240"]).transform,
            Transform::Rescale {
                width: 320,
                height: 240
            }
        );
    }

    #[test]
    fn blur_defaults_and_forces_odd() {
        assert_eq!(canonical("blur", &[]), vec!["3"]);
        assert_eq!(canonical("blur", &["5"]), vec!["5"]);
        assert_eq!(canonical("blur", &["6"]), vec!["5"]);
        assert_eq!(canonical("blur", &["2"]), vec!["1"]);
        assert_eq!(canonical("blur", &["0"]), vec!["3"]);
        assert_eq!(
            resolved("blur", &["8"]).transform,
            Transform::Blur { kernel_size: 7 }
        );
    }

    #[test]
    fn noise_defaults() {
        let r = resolved("noise", &[]);
        assert_eq!(r.canonical.params, vec!["0.7", "1.0"]);
        assert_eq!(
            r.transform,
            Transform::Noise {
                lower: 0.7,
                upper: 1.0
            }
        );
        assert_eq!(canonical("noise", &["0.5"]), vec!["0.5", "1.0"]);
    }

    #[test]
    fn noise_swaps_reversed_bounds() {
        let r = resolved("noise", &["1.2", "0.8"]);
        assert_eq!(r.canonical.params, vec!["0.8", "1.2"]);
        assert_eq!(
            r.transform,
            Transform::Noise {
                lower: 0.8,
                upper: 1.2
            }
        );
    }

    #[test]
    fn noise_rejects_negative_bounds() {
        assert_eq!(canonical("noise", &["-1", "0.9"]), vec!["0.7", "0.9"]);
    }

    #[test]
    fn brighten_defaults_to_1_5() {
        assert_eq!(canonical("brighten", &[]), vec!["1.5"]);
        assert_eq!(canonical("brighten", &["0.25"]), vec!["0.25"]);
        assert_eq!(canonical("brighten", &["bright"]), vec!["1.5"]);
    }

    #[test]
    fn flip_defaults_to_horizontal() {
        let r = resolved("flip", &[]);
        assert_eq!(r.canonical.params, vec!["horizontal"]);
        assert_eq!(
            r.transform,
            Transform::Flip {
                axes: vec![FlipAxis::Horizontal]
            }
        );
    }

    #[test]
    fn flip_keeps_axes_in_order_and_drops_junk() {
        let r = resolved("flip", &["vertical", "sideways", "horizontal"]);
        assert_eq!(r.canonical.params, vec!["vertical", "horizontal"]);
        assert_eq!(
            r.transform,
            Transform::Flip {
                axes: vec![FlipAxis::Vertical, FlipAxis::Horizontal]
            }
        );
    }

    #[test]
    fn flip_with_only_junk_uses_default() {
        assert_eq!(canonical("flip", &["diagonal"]), vec!["horizontal"]);
    }

    #[test]
    fn tint_skips_malformed_tokens() {
        let r = resolved("tint", &["red20", "purple5", "blueish", "green-3"]);
        assert_eq!(r.canonical.params, vec!["red20", "green-3"]);
        assert_eq!(
            r.transform,
            Transform::Tint {
                channels: vec![
                    ChannelValue {
                        channel: Channel::Red,
                        value: 20
                    },
                    ChannelValue {
                        channel: Channel::Green,
                        value: -3
                    },
                ],
                mode: TintMode::Additive,
            }
        );
    }

    #[test]
    fn abs_tint_without_tokens_is_empty() {
        let r = resolved("abs_tint", &[]);
        assert!(r.canonical.params.is_empty());
        assert_eq!(
            r.transform,
            Transform::Tint {
                channels: vec![],
                mode: TintMode::Absolute
            }
        );
    }
}
