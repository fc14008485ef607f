use thiserror::Error;

/// Caller mistakes. Degenerate text never produces one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("invalid option: {0}")]
    InvalidOption(String),
    #[error(
        "unknown sort key `{0}` (expected time-asc, time-desc, name-asc, name-desc, number-asc or number-desc)"
    )]
    UnknownSortKey(String),
    #[error("unknown layout `{0}` (expected grid, cloud or swarm)")]
    UnknownLayout(String),
}

/// Raised by a glyph renderer when the signature cannot be laid out. Always recovered by the
/// plain text label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StampError {
    #[error("{words} words do not fit the stamp (at most {max})")]
    TooManyWords { words: usize, max: usize },
    #[error("no glyph for {0:?}")]
    UnsupportedGlyph(char),
}
