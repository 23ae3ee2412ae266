//! # Batch Augment
//!
//! Batch image augmentation driven by a tiny line-oriented language. Every
//! line of a chain configuration is a sequence of transformations; every
//! image in the input directory is run through every chain, and each result
//! is written under a name that spells out exactly what was done to it.
//!
//! ```text
//! augment.conf                      input/            Output/
//! rotate 90 ; flip vertical   ──▶   cat.png    ──▶    cat_rotate-90---flip-vertical_0.png
//! blur                              dog.jpg           cat_blur-3_1.png
//!                                                     dog_rotate-90---flip-vertical_2.jpg
//!                                                     dog_blur-3_3.jpg
//! ```
//!
//! # Pipeline
//!
//! ```text
//! text ─▶ chain::parse ─▶ registry::resolve_chain ─▶ executor::run ─▶ naming::name_for
//!                                                          │
//!                                               imaging::operations
//! ```
//!
//! Parsing never fails on content; unknown names are rejected at resolution,
//! which abandons that one chain. Resolution also fills in defaults, so the
//! output name records the parameters actually used (`blur` becomes
//! `blur-3`).
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`chain`] | Configuration grammar: lines, `;`-separated operations, tokens |
//! | [`registry`] | Name dispatch onto a closed set of operations, default materialization |
//! | [`imaging`] | Pixel transforms, rotation geometry, codec backend |
//! | [`executor`] | Runs one resolved chain over one image, all-or-nothing |
//! | [`naming`] | Output file names from source name, chain and sequence index |
//! | [`output_dir`] | Output directory versioning (`Output` → `Output_<k>`) |
//! | [`process`] | The batch driver: enumerate, run in parallel, encode, report |
//! | [`config`] | `augment.toml` run settings |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Closed Operation Set
//!
//! Operations are an enum, not a name → function table. Adding an operation
//! means adding a variant, and the compiler points at every match that has
//! to learn about it.
//!
//! ## Explicit Randomness
//!
//! `noise` takes its random source as an argument. With a configured seed,
//! every output gets its own generator derived from the seed and its
//! sequence index, so a rerun reproduces the same files regardless of how
//! rayon schedules the work.
//!
//! ## Output Is Never Overwritten
//!
//! A run always writes into an empty directory. Whatever was there before is
//! moved aside to the lowest free `_<k>` suffix, so no run can clobber the
//! results of an earlier one.

pub mod chain;
pub mod config;
pub mod executor;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod output_dir;
pub mod process;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_helpers;
