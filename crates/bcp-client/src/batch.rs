//! Batch commit policy.

/// Decides when the rows appended so far form a batch to commit.
///
/// The controller counts rows since the last commit rather than deriving
/// the batch position from the session total, so the batch size can change
/// between rows without skipping or doubling a commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchController {
    batch_size: u64,
    pending: u64,
    batches_committed: u64,
}

impl BatchController {
    /// Create a controller committing every `batch_size` rows (0 = never).
    #[must_use]
    pub fn new(batch_size: u64) -> Self {
        Self {
            batch_size,
            pending: 0,
            batches_committed: 0,
        }
    }

    /// Get the configured batch size.
    #[must_use]
    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// Change the batch size; applies from the next row on.
    pub fn set_batch_size(&mut self, batch_size: u64) {
        self.batch_size = batch_size;
    }

    /// Get the rows appended since the last commit.
    #[must_use]
    pub fn pending(&self) -> u64 {
        self.pending
    }

    /// Get the number of batches committed so far.
    #[must_use]
    pub fn batches_committed(&self) -> u64 {
        self.batches_committed
    }

    /// Record one appended row; returns true if the batch is now full.
    pub fn record_row(&mut self) -> bool {
        self.pending += 1;
        self.batch_size > 0 && self.pending >= self.batch_size
    }

    /// Record a successful commit of the pending rows.
    pub fn record_commit(&mut self) {
        self.pending = 0;
        self.batches_committed += 1;
    }

    /// Forget the pending rows after a failed commit; returns how many there were.
    pub fn discard_pending(&mut self) -> u64 {
        std::mem::take(&mut self.pending)
    }
}
