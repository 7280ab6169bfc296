//! Integrity summary of an index/data pair

use super::{FileIndexSnapshot, RecordSource, locate_record};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Record counts from [`FileIndex::scan_integrity`](super::FileIndex::scan_integrity)
///
/// Every record is counted in exactly one of `valid`, `invalid` and `empty`.
/// The remaining counters break `patched` and `invalid` down further.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// Number of records in the index
    pub entry_count: usize,
    /// Records that can be read
    pub valid: usize,
    /// Non-empty records that cannot be read
    pub invalid: usize,
    /// Records with a negative offset or no length
    pub empty: usize,
    /// Non-empty records redirected to the overlay
    pub patched: usize,
    /// Unpatched records whose data file is missing
    pub data_missing: usize,
    /// Unpatched records extending past the data file
    pub data_out_of_bounds: usize,
    /// Patched records whose overlay file is missing
    pub overlay_missing: usize,
    /// Patched records extending past the overlay file
    pub overlay_out_of_bounds: usize,
}

impl IntegrityReport {
    pub(crate) fn scan(snapshot: &FileIndexSnapshot) -> Self {
        let mut report = Self {
            entry_count: snapshot.len(),
            ..Self::default()
        };

        for record in &snapshot.entries {
            if record.is_empty() {
                report.empty += 1;
                continue;
            }

            let (source, size) = if record.is_patched() {
                report.patched += 1;
                (RecordSource::Overlay, snapshot.overlay_file_size)
            } else {
                (RecordSource::Data, snapshot.data_file_size)
            };

            if locate_record(record, snapshot.data_file_size, snapshot.overlay_file_size).is_some()
            {
                report.valid += 1;
                continue;
            }

            report.invalid += 1;
            match (source, size.is_some()) {
                (RecordSource::Data, false) => report.data_missing += 1,
                (RecordSource::Data, true) => report.data_out_of_bounds += 1,
                (RecordSource::Overlay, false) => report.overlay_missing += 1,
                (RecordSource::Overlay, true) => report.overlay_out_of_bounds += 1,
            }
        }

        report
    }

    /// Whether every non-empty record is readable
    pub fn is_clean(&self) -> bool {
        self.invalid == 0
    }
}

impl fmt::Display for IntegrityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records: {} valid, {} invalid, {} empty, {} patched",
            self.entry_count, self.valid, self.invalid, self.empty, self.patched
        )
    }
}
