/// Rejection from an indexer operation.
///
/// The display form is the textual reason the bridge puts on the wire, so it
/// must never be empty.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{reason}")]
pub struct IndexError {
    reason: String,
}

impl IndexError {
    /// Creates a rejection with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    /// Returns the rejection reason.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}
