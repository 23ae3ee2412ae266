//! Chain configuration grammar.
//!
//! A configuration file is plain text, one chain per line. A line may hold
//! several operations separated by `;`, applied left to right:
//!
//! ```text
//! rotate 90 ; flip vertical
//! tint red20 blue-10
//!
//! blur 5
//! ```
//!
//! The first whitespace-separated token of each segment is the operation
//! name, the rest are its parameters. Names and parameters are lower-cased.
//! Blank lines and empty segments contribute nothing. Parsing is permissive:
//! unknown operation names survive parsing and are rejected later by the
//! [`registry`](crate::registry), so a typo only costs the chain it sits in.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Separates inline operations on a single configuration line.
pub const CHAIN_DELIMITER: char = ';';

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to read configuration file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A named operation with its free-form parameter tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    pub params: Vec<String>,
}

impl Operation {
    /// Build an operation, case-folding the name and every parameter.
    pub fn new<S: AsRef<str>>(name: &str, params: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.to_lowercase(),
            params: params.into_iter().map(|p| p.as_ref().to_lowercase()).collect(),
        }
    }
}

/// Ordered operations from one configuration line.
///
/// Never empty when produced by [`parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    /// 1-based line number in the configuration text.
    pub line: usize,
    pub operations: Vec<Operation>,
}

/// All chains of a run, in line order. No deduplication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    pub chains: Vec<Chain>,
}

impl Configuration {
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chain> {
        self.chains.iter()
    }
}

/// Parse configuration text into chains.
pub fn parse(text: &str) -> Configuration {
    let chains = text
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let operations: Vec<Operation> = line
                .split(CHAIN_DELIMITER)
                .filter_map(parse_segment)
                .collect();
            (!operations.is_empty()).then_some(Chain {
                line: idx + 1,
                operations,
            })
        })
        .collect();
    Configuration { chains }
}

fn parse_segment(segment: &str) -> Option<Operation> {
    let mut tokens = segment.split_whitespace();
    let name = tokens.next()?;
    Some(Operation::new(name, tokens))
}

/// Read and parse a configuration file.
pub fn load(path: &Path) -> Result<Configuration, ParseError> {
    let text = fs::read_to_string(path).map_err(|source| ParseError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse(&text))
}

/// Like [`load`], but an unreadable file is reported and yields an empty
/// configuration, which makes the run a no-op.
pub fn load_or_empty(path: &Path) -> Configuration {
    load(path).unwrap_or_else(|e| {
        tracing::error!("{e}");
        Configuration::default()
    })
}
