// Run orchestration.
//
// Leagues are processed one after another. For each league:
// 1. Fetch the standings (every page, or only the first in legacy mode)
// 2. Dispatch one history fetch per standings row and join them all
// 3. Scan weekly highs over the aggregated entries
// 4. Rank the entries and render both reports
// 5. Hand the reports to the sink
//
// A league whose standings cannot be fetched is skipped and recorded; the
// run only fails outright when the current week cannot be determined or a
// fail-fast dispatch aborts.

use std::sync::Arc;

use fantasypl_core::{
    final_report, rank_entries, scan_weeks, weekly_report, DispatchError, Dispatcher,
    EntryFailure, FetchError, League, LeagueHeader, RankStyle, StandingsRow,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::client::FantasyApi;
use crate::config::{Config, StandingsPages};
use crate::output::{LeagueReport, ReportSink};

// ---------------------------------------------------------------------------
// Error and summary types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read game metadata")]
    GameMetadata(#[source] FetchError),

    #[error("league {league_id} aborted")]
    Aborted {
        league_id: String,
        #[source]
        source: DispatchError,
    },
}

/// A league that produced no report because its standings failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueFailure {
    pub league_id: String,
    pub error: FetchError,
}

/// What happened during a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub current_week: u32,
    /// League ids whose reports were published, in processing order.
    pub leagues_reported: Vec<String>,
    /// League ids skipped because no entry survived the fetch phase.
    pub leagues_empty: Vec<String>,
    pub failed_leagues: Vec<LeagueFailure>,
    /// Entry failures, keyed by league id.
    pub failed_entries: Vec<(String, EntryFailure)>,
    pub entries_excluded: usize,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed_leagues.is_empty() || !self.failed_entries.is_empty()
    }

    /// Log the summary: `info` for a clean run, `warn` otherwise, with one
    /// `warn` line per failure.
    pub fn log(&self) {
        let line = format!(
            "Run complete: week {}, {} league(s) reported, {} empty, {} failed, {} entr(y/ies) failed, {} excluded",
            self.current_week,
            self.leagues_reported.len(),
            self.leagues_empty.len(),
            self.failed_leagues.len(),
            self.failed_entries.len(),
            self.entries_excluded
        );
        if !self.has_failures() {
            info!("{line}");
            return;
        }
        warn!("{line}");
        for failure in &self.failed_leagues {
            warn!("league {}: {}", failure.league_id, failure.error);
        }
        for (league_id, failure) in &self.failed_entries {
            warn!(
                "league {league_id}, entry {}: {}",
                failure.entry_num, failure.error
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

/// Fetch a league's header and standings rows.
///
/// With [`StandingsPages::All`] pages are requested until `has_next` is
/// false and their rows concatenated in page order.
pub async fn fetch_standings<A>(
    api: &A,
    league_id: &str,
    pages: StandingsPages,
) -> Result<(LeagueHeader, Vec<StandingsRow>), FetchError>
where
    A: FantasyApi + ?Sized,
{
    let first = api.standings_page(league_id, 1).await?;
    let mut next = first.next_page();
    let header = first.league;
    let mut rows = first.standings.results;

    if pages == StandingsPages::First {
        if next.is_some() {
            warn!("league {league_id} has more standings pages; only the first is used");
        }
        return Ok((header, rows));
    }

    while let Some(page) = next {
        debug!("league {league_id}: fetching standings page {page}");
        let more = api.standings_page(league_id, page).await?;
        // Never request the same page twice, whatever the server says.
        next = more.next_page().filter(|n| *n > page);
        rows.extend(more.standings.results);
    }

    Ok((header, rows))
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Scan, rank and render one league. Weekly highs are scanned before
/// ranking, so tied winners are listed in fetch-completion order.
pub fn build_report(
    league_id: &str,
    mut league: League,
    current_week: u32,
    style: RankStyle,
) -> LeagueReport {
    let weekly = {
        let weeks = scan_weeks(&league.entries, current_week);
        weekly_report(&league, &weeks, current_week)
    };

    rank_entries(&mut league.entries, style);
    let standings = final_report(&league, current_week);

    LeagueReport {
        league_id: league_id.to_string(),
        weekly,
        standings,
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Process every configured league and publish its reports to `sink`.
pub async fn run<A>(
    api: Arc<A>,
    config: &Config,
    sink: &mut dyn ReportSink,
) -> Result<RunSummary, PipelineError>
where
    A: FantasyApi + ?Sized + 'static,
{
    let current_week = api
        .current_week()
        .await
        .map_err(PipelineError::GameMetadata)?;
    info!("Current week: {current_week}");

    let dispatcher = Dispatcher::new(
        Arc::clone(&api),
        config.exclusions(),
        config.dispatch_policy(),
    );

    let mut summary = RunSummary {
        current_week,
        ..RunSummary::default()
    };

    for league_id in &config.fpl.league_ids {
        let (header, rows) =
            match fetch_standings(&*api, league_id, config.run.standings_pages).await {
                Ok(standings) => standings,
                Err(e) => {
                    error!("league {league_id}: failed to fetch standings: {e}");
                    summary.failed_leagues.push(LeagueFailure {
                        league_id: league_id.clone(),
                        error: e,
                    });
                    continue;
                }
            };
        info!(
            "league {league_id} [{}] {}: {} standings row(s)",
            header.id,
            header.name,
            rows.len()
        );

        let outcome = dispatcher
            .dispatch(header, rows)
            .await
            .map_err(|source| PipelineError::Aborted {
                league_id: league_id.clone(),
                source,
            })?;

        summary.entries_excluded += outcome.excluded;
        summary.failed_entries.extend(
            outcome
                .failures
                .into_iter()
                .map(|failure| (league_id.clone(), failure)),
        );

        if outcome.league.is_empty() {
            info!("league {league_id}: no entries, skipping report");
            summary.leagues_empty.push(league_id.clone());
            continue;
        }

        let report = build_report(
            league_id,
            outcome.league,
            current_week,
            config.run.rank_style,
        );
        sink.publish(&report);
        summary.leagues_reported.push(league_id.clone());
    }

    Ok(summary)
}
