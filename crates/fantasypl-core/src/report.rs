// Plain-text weekly and final reports.
//
// Every line, the header included, starts with a newline so that reports
// read cleanly when appended to a log line.

use std::fmt::Write;

use crate::entry::League;
use crate::scan::WeekSummary;

/// League header, current week, then each week's highest score and winners.
pub fn weekly_report(league: &League, weeks: &[WeekSummary<'_>], current_week: u32) -> String {
    let mut out = header(league, current_week);
    for summary in weeks {
        let _ = write!(out, "\n- Week {}", summary.week);
        let _ = write!(out, "\n\tHighest point: {}", summary.highest);
        for winner in &summary.winners {
            let _ = write!(out, "\n\t+ [{}] {}", winner.entry_name, winner.player_name);
        }
    }
    out
}

/// League header, current week, then one line per entry in its current
/// order. Expects the entries to have been ranked already.
pub fn final_report(league: &League, current_week: u32) -> String {
    let mut out = header(league, current_week);
    for entry in &league.entries {
        let _ = write!(
            out,
            "\n+ Top {:2}: {}: [{}] {}",
            entry.rank, entry.total, entry.entry_name, entry.player_name
        );
    }
    out
}

fn header(league: &League, current_week: u32) -> String {
    format!(
        "\n[{}] {}\nCurrent week: {}",
        league.id, league.name, current_week
    )
}
