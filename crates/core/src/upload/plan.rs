//! Part planning and per-part state
//!
//! A plan tiles `[0, size)` into contiguous ranges of `part_size` bytes; the
//! last range may be shorter. Part numbers start at 1.

use std::ops::Range;

use mgsdb_domain::{PartStatus, UploadError};

/// How a file of a given size is split into parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartPlan {
    size: u64,
    part_size: u64,
    total_parts: u32,
}

impl PartPlan {
    /// # Errors
    /// Returns `UploadError::InvalidInput` for a zero part size or a file
    /// that would need more than `u32::MAX` parts.
    pub fn new(size: u64, part_size: u64) -> Result<Self, UploadError> {
        if part_size == 0 {
            return Err(UploadError::InvalidInput("part size must be greater than zero".into()));
        }
        let total_parts = u32::try_from(size.div_ceil(part_size)).map_err(|_| {
            UploadError::InvalidInput(format!(
                "{size} bytes in parts of {part_size} exceeds the part number limit"
            ))
        })?;
        Ok(Self { size, part_size, total_parts })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn part_size(&self) -> u64 {
        self.part_size
    }

    pub fn total_parts(&self) -> u32 {
        self.total_parts
    }

    /// Byte range of `part_number` (1-based).
    pub fn range(&self, part_number: u32) -> Range<u64> {
        let start = u64::from(part_number.saturating_sub(1)) * self.part_size;
        let end = (start + self.part_size).min(self.size);
        start.min(self.size)..end
    }

    pub fn part_numbers(&self) -> impl Iterator<Item = u32> {
        1..=self.total_parts
    }

    /// One `Pending` task per part, indexed by `part_number - 1`.
    pub fn tasks(&self) -> Vec<PartTask> {
        self.part_numbers().map(|n| PartTask::new(n, self.range(n))).collect()
    }
}

/// Bookkeeping for one part, owned by the scheduler's coordinating task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartTask {
    pub part_number: u32,
    pub range: Range<u64>,
    status: PartStatus,
    attempts: u32,
}

impl PartTask {
    fn new(part_number: u32, range: Range<u64>) -> Self {
        Self { part_number, range, status: PartStatus::Pending, attempts: 0 }
    }

    pub fn len(&self) -> u64 {
        self.range.end - self.range.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn status(&self) -> PartStatus {
        self.status
    }

    /// Attempts started so far, including the one in flight.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// `Pending → InFlight`
    pub fn start(&mut self) {
        debug_assert_eq!(self.status, PartStatus::Pending);
        self.status = PartStatus::InFlight;
        self.attempts += 1;
    }

    /// `InFlight → Done`
    pub fn complete(&mut self) {
        debug_assert_eq!(self.status, PartStatus::InFlight);
        self.status = PartStatus::Done;
    }

    /// `InFlight → Failed`
    pub fn fail(&mut self) {
        debug_assert_eq!(self.status, PartStatus::InFlight);
        self.status = PartStatus::Failed;
    }

    /// `Failed → Pending`
    pub fn requeue(&mut self) {
        debug_assert_eq!(self.status, PartStatus::Failed);
        self.status = PartStatus::Pending;
    }
}
