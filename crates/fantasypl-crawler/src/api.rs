// Fantasy Premier League endpoints and the JSON shapes the crawler reads
// from them. History documents are decoded by the core; only game metadata
// and standings are modelled here.

use fantasypl_core::{LeagueHeader, StandingsRow};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

pub const LOGIN_URL: &str = "https://users.premierleague.com/accounts/login/";
pub const LOGIN_APP: &str = "plfpl-web";
pub const LOGIN_REDIRECT_URI: &str = "https://fantasy.premierleague.com/";

pub const API_BASE: &str = "https://fantasy.premierleague.com/api";

pub fn bootstrap_url() -> String {
    format!("{API_BASE}/bootstrap-static/")
}

pub fn standings_url(league_id: &str, page: u32) -> String {
    format!(
        "{API_BASE}/leagues-classic/{league_id}/standings/?page_new_entries=1&page_standings={page}&phase=1"
    )
}

pub fn history_url(entry_num: u64) -> String {
    format!("{API_BASE}/entry/{entry_num}/history/")
}

// ---------------------------------------------------------------------------
// Game metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct GameEvent {
    pub id: u32,
    #[serde(default)]
    pub is_current: bool,
}

/// The parts of `bootstrap-static` the crawler needs.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapStatic {
    #[serde(default)]
    pub events: Vec<GameEvent>,
}

impl BootstrapStatic {
    /// Id of the first event flagged current, or week 1 before the season
    /// has started.
    pub fn current_week(&self) -> u32 {
        self.events
            .iter()
            .find(|e| e.is_current)
            .map(|e| e.id)
            .unwrap_or(1)
    }
}

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct StandingsPage {
    #[serde(default)]
    pub has_next: bool,
    pub page: u32,
    #[serde(default)]
    pub results: Vec<StandingsRow>,
}

/// One page of `leagues-classic/{id}/standings`.
#[derive(Debug, Clone, Deserialize)]
pub struct LeagueStandings {
    pub league: LeagueHeader,
    pub standings: StandingsPage,
}

impl LeagueStandings {
    /// Page number to request after this one, if any.
    pub fn next_page(&self) -> Option<u32> {
        if !self.standings.has_next {
            return None;
        }
        self.standings.page.checked_add(1)
    }
}
