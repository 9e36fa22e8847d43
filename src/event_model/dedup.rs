/// Result of comparing a notification's version against the watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupDecision {
    /// Version is newer than anything durably recorded.
    Accept,
    /// Version is at or below the watermark; already recorded (or never will be).
    Drop,
}

impl DedupDecision {
    pub fn is_accept(self) -> bool {
        matches!(self, DedupDecision::Accept)
    }
}

/// Accepts only versions strictly above the watermark.
pub fn check(watermark: u64, version: u64) -> DedupDecision {
    if version > watermark {
        DedupDecision::Accept
    } else {
        DedupDecision::Drop
    }
}
