//! Error type shared by the container, table and glyph layers.

use crate::tag::{DisplayTag, Tag};

/// Errors that can occur while loading a face or decoding its tables.
///
/// Only the five required tables (`head`, `maxp`, `hhea`, `hmtx`, `cmap`)
/// fail a face. Optional tables that do not parse are reported through
/// `tracing` and treated as absent, and per-glyph failures yield the
/// neutral value for that glyph only.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The buffer is a recognized container this crate refuses to load
    /// directly (WOFF1, a font collection) or carries an unknown magic.
    #[error("unsupported container: {0}")]
    UnsupportedContainer(&'static str),
    /// The SFNT header or table directory is inconsistent.
    #[error("malformed table directory: {0}")]
    MalformedDirectory(&'static str),
    /// A table required for basic operation is not present.
    #[error("missing required table {}", DisplayTag(*.0))]
    MissingRequiredTable(Tag),
    /// A table was present but internally inconsistent.
    #[error("malformed {} table: {reason}", DisplayTag(*.tag))]
    MalformedTable {
        tag: Tag,
        reason: &'static str,
    },
    /// A read would have crossed the end of a bounded view.
    #[error("read past the end of a table view")]
    OutOfBounds,
    /// Composite glyph expansion revisited a glyph.
    #[error("cycle detected in composite glyph")]
    CycleDetected,
    /// The charstring interpreter exceeded its depth or operator budget.
    #[error("charstring operator or subroutine budget exceeded")]
    CharstringLimit,
}

impl Error {
    pub(crate) fn malformed(tag: Tag, reason: &'static str) -> Self {
        Self::MalformedTable { tag, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::tag_from_bytes;

    #[test]
    fn messages_name_the_table() {
        let err = Error::MissingRequiredTable(tag_from_bytes(b"hmtx"));
        assert_eq!(err.to_string(), "missing required table hmtx");
        let err = Error::malformed(tag_from_bytes(b"fvar"), "axis count mismatch");
        assert_eq!(err.to_string(), "malformed fvar table: axis count mismatch");
    }
}
