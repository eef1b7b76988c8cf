// Fetch-aggregate-rank core of the fantasy league crawler.
//
// Everything network- or filesystem-shaped lives in the application crate;
// this crate receives raw history bytes through `HistorySource` and returns
// ranked leagues and report text.

pub mod aggregate;
pub mod dispatch;
pub mod entry;
pub mod error;
pub mod ranking;
pub mod report;
pub mod scan;

pub use aggregate::EntryAggregator;
pub use dispatch::{DispatchOutcome, DispatchPolicy, Dispatcher, HistorySource};
pub use entry::{Entry, EntryHistory, ExclusionSet, League, LeagueHeader, StandingsRow, WeekScore};
pub use error::{DispatchError, EntryFailure, FetchError};
pub use ranking::{rank_entries, RankStyle};
pub use report::{final_report, weekly_report};
pub use scan::{scan_weeks, WeekSummary};
