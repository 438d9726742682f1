/// Percent-complete reporting for an organize job.
///
/// Converts processed/total entry counts into integer percentages and feeds
/// them to a [`ProgressSink`], keeping the sequence monotonic and ending it at
/// exactly 100.
use crate::sink::ProgressSink;

/// Computes `floor(processed * 100 / total)`, clamped to 100.
///
/// A job with no entries is complete by definition.
///
/// # Examples
///
/// ```
/// use extsort::progress::percent;
///
/// assert_eq!(percent(1, 3), 33);
/// assert_eq!(percent(2, 3), 66);
/// assert_eq!(percent(3, 3), 100);
/// assert_eq!(percent(0, 0), 100);
/// ```
pub fn percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let value = (processed as u128 * 100) / total as u128;
    value.min(100) as u8
}

/// Tracks progress over a fixed number of entries.
pub struct ProgressTracker {
    total: usize,
    processed: usize,
    last_reported: Option<u8>,
}

impl ProgressTracker {
    /// Creates a tracker for a job of `total` entries.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            processed: 0,
            last_reported: None,
        }
    }

    /// Records one processed entry and reports the new percentage.
    pub fn advance(&mut self, sink: &mut dyn ProgressSink) {
        self.processed = (self.processed + 1).min(self.total);
        let value = percent(self.processed, self.total);
        self.report(value, sink);
    }

    /// Forces the final value of 100, unless it was already reported.
    pub fn finish(&mut self, sink: &mut dyn ProgressSink) {
        if self.last_reported != Some(100) {
            self.report(100, sink);
        }
    }

    /// Entries processed so far.
    pub fn processed(&self) -> usize {
        self.processed
    }

    fn report(&mut self, value: u8, sink: &mut dyn ProgressSink) {
        // Never go backwards
        let value = self.last_reported.map_or(value, |last| value.max(last));
        self.last_reported = Some(value);
        sink.progress(value);
    }
}
