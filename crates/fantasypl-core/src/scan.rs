// Weekly extremum scan: the highest net score of each game week and the
// entrants who achieved it.

use crate::entry::Entry;

/// Highest score of one game week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekSummary<'a> {
    pub week: u32,
    /// Highest net score among entrants with data for the week, floored at 0.
    pub highest: i32,
    /// Entrants whose score equals `highest`, in input order.
    pub winners: Vec<&'a Entry>,
}

/// Scan weeks `1..=current_week`.
///
/// An entrant without data for a week did not play it and is ignored for
/// that week. The maximum starts at 0, so a week nobody played (or where
/// every score is negative) reports a highest of 0 and no winners.
pub fn scan_weeks(entries: &[Entry], current_week: u32) -> Vec<WeekSummary<'_>> {
    (1..=current_week)
        .map(|week| scan_week(entries, week))
        .collect()
}

fn scan_week(entries: &[Entry], week: u32) -> WeekSummary<'_> {
    let highest = entries
        .iter()
        .filter_map(|e| e.week_points(week))
        .fold(0, i32::max);

    let winners = entries
        .iter()
        .filter(|e| e.week_points(week) == Some(highest))
        .collect();

    WeekSummary {
        week,
        highest,
        winners,
    }
}
