// Report output: every report is logged, and written to text files when an
// export directory is configured.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info};

/// The two rendered reports for one league.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueReport {
    /// League id as given in the config; used to name the report files.
    pub league_id: String,
    pub weekly: String,
    pub standings: String,
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create report directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write report {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Receives each league's reports as soon as they are rendered.
pub trait ReportSink {
    fn publish(&mut self, report: &LeagueReport);
}

/// Logs reports at `info` and optionally exports them as files.
#[derive(Debug, Clone, Default)]
pub struct LogAndFileSink {
    export_dir: Option<PathBuf>,
}

impl LogAndFileSink {
    pub fn new(export_dir: Option<PathBuf>) -> Self {
        Self { export_dir }
    }
}

impl ReportSink for LogAndFileSink {
    fn publish(&mut self, report: &LeagueReport) {
        info!("{}", report.weekly);
        info!("{}", report.standings);

        if let Some(dir) = &self.export_dir {
            match write_report_files(dir, report) {
                Ok(paths) => {
                    for path in paths {
                        info!("Wrote {}", path.display());
                    }
                }
                // A failed export does not stop the remaining leagues.
                Err(e) => error!("{e}"),
            }
        }
    }
}

/// File names for a league's reports: `{id}-weekly.txt` and `{id}-final.txt`.
pub fn report_paths(dir: &Path, league_id: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{league_id}-weekly.txt")),
        dir.join(format!("{league_id}-final.txt")),
    )
}

/// Write both reports into `dir`, creating it if needed. Existing files
/// are overwritten.
pub fn write_report_files(dir: &Path, report: &LeagueReport) -> Result<Vec<PathBuf>, OutputError> {
    std::fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let (weekly_path, final_path) = report_paths(dir, &report.league_id);
    for (path, text) in [(&weekly_path, &report.weekly), (&final_path, &report.standings)] {
        std::fs::write(path, text).map_err(|source| OutputError::Write {
            path: path.clone(),
            source,
        })?;
    }

    Ok(vec![weekly_path, final_path])
}
