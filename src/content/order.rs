//! Newest-first ordering shared by posts and projects.

use chrono::NaiveDate;

/// An entry that can be placed on a timeline.
pub trait Dated {
    /// `None` means undated; such entries sort after every dated one.
    fn date(&self) -> Option<NaiveDate>;
}

/// Sort entries by date, most recent first.
///
/// The sort is stable: entries sharing a date (or both undated)
/// keep their discovery order.
pub fn newest_first<T: Dated>(entries: &mut [T]) {
    entries.sort_by(|a, b| b.date().cmp(&a.date()));
}
