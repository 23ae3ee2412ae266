//! Output file naming.
//!
//! Every written variant is named after its source and the chain that made it:
//!
//! ```text
//! <basename>_<op1>-<p1>-<p2>---<op2>-<p1>_<index>.<extension>
//! photo_rotate-90---flip-vertical_3.png
//! ```
//!
//! - Each operation contributes its name followed by its canonical
//!   parameters, all joined with `-`. An operation without parameters
//!   contributes its bare name.
//! - Operations of one chain are joined with `---`.
//! - `index` is the run-wide sequence index, unique per output, so two
//!   outputs never share a name even when the textual part collides.

use crate::chain::Operation;

/// Joins an operation name and its parameters.
pub const PARAM_SEPARATOR: &str = "-";
/// Joins the operations of one chain.
pub const OPERATION_SEPARATOR: &str = "---";

/// A source file name split into basename and extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceName {
    pub basename: String,
    pub extension: String,
}

/// Split `file_name` at its last `.`.
///
/// Returns `None` when either side would be empty (`README`, `.hidden`,
/// `trailing.`), since such entries cannot be named or encoded.
///
/// - `"cat.png"` → basename=`cat`, extension=`png`
/// - `"cat.v2.png"` → basename=`cat.v2`, extension=`png`
pub fn split_source_name(file_name: &str) -> Option<SourceName> {
    let (basename, extension) = file_name.rsplit_once('.')?;
    if basename.is_empty() || extension.is_empty() {
        return None;
    }
    Some(SourceName {
        basename: basename.to_string(),
        extension: extension.to_string(),
    })
}

/// The chain part of a name: `rotate-90---flip-vertical`.
pub fn chain_fragment<'a>(operations: impl IntoIterator<Item = &'a Operation>) -> String {
    operations
        .into_iter()
        .map(|op| {
            std::iter::once(op.name.as_str())
                .chain(op.params.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(PARAM_SEPARATOR)
        })
        .collect::<Vec<_>>()
        .join(OPERATION_SEPARATOR)
}

/// Full output file name for one source and one chain.
pub fn name_for<'a>(
    basename: &str,
    extension: &str,
    operations: impl IntoIterator<Item = &'a Operation>,
    sequence_index: u64,
) -> String {
    format!(
        "{}_{}_{}.{}",
        basename,
        chain_fragment(operations),
        sequence_index,
        extension
    )
}
