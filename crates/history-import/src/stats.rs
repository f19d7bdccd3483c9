//! Per-page import outcome.

/// What happened to one page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageStats {
    /// Records in the incoming page
    pub received: usize,
    /// Records dropped by filtering, resolution, or dedup
    pub dropped: usize,
    /// Documents handed to the executor
    pub submitted: usize,
    /// The page triggered a cursor reset instead of a job
    pub reset_requested: bool,
}

impl PageStats {
    /// Stats for a page of `received` records.
    pub fn new(received: usize) -> Self {
        Self {
            received,
            ..Self::default()
        }
    }

    /// Record a dropped record.
    pub fn record_drop(&mut self) {
        self.dropped += 1;
    }

    /// Record several dropped records.
    pub fn record_drops(&mut self, count: usize) {
        self.dropped += count;
    }

    /// Whether a job was submitted for this page.
    pub fn has_job(&self) -> bool {
        self.submitted > 0
    }

    /// Merge another page into this one.
    pub fn merge(&mut self, other: &PageStats) {
        self.received += other.received;
        self.dropped += other.dropped;
        self.submitted += other.submitted;
        self.reset_requested |= other.reset_requested;
    }
}
