// Stable ranking by cumulative total.

use serde::Deserialize;

use crate::entry::Entry;

/// How a rank is assigned to the first entry after a run of tied totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankStyle {
    /// Tied totals share a rank; the next total gets that rank + 1.
    /// `[100, 100, 90]` ranks `[1, 1, 2]`.
    #[default]
    Dense,
    /// Tied totals share a rank; the next total gets its 1-based position.
    /// `[100, 100, 90]` ranks `[1, 1, 3]`.
    Competition,
}

/// Sort `entries` by total, highest first, and overwrite every rank.
///
/// The sort is stable: entries with equal totals keep their relative order.
/// Running it again on its own output changes nothing.
pub fn rank_entries(entries: &mut [Entry], style: RankStyle) {
    entries.sort_by(|a, b| b.total.cmp(&a.total));

    let mut previous: Option<(i32, u32)> = None;
    for (index, entry) in entries.iter_mut().enumerate() {
        let position = index as u32 + 1;
        entry.rank = match previous {
            None => 1,
            Some((total, rank)) if total == entry.total => rank,
            Some((_, rank)) => match style {
                RankStyle::Dense => rank + 1,
                RankStyle::Competition => position,
            },
        };
        previous = Some((entry.total, entry.rank));
    }
}
