use thiserror::Error;

/// All errors generated in `oddsboard`.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum BoardError {
    #[error("malformed cell address: {0}")]
    Address(String),

    #[error("failed to generate table: {0}")]
    Render(String),

    #[error("duplicate cell address in one render: {0}")]
    DuplicateAddress(String),
}

impl BoardError {
    /// Whether a failure invalidates the whole table. Per-record problems
    /// are skipped by the batch applier instead of surfacing here.
    pub fn is_render_fatal(&self) -> bool {
        matches!(self, BoardError::Render(_) | BoardError::DuplicateAddress(_))
    }
}
