// Configuration loading and validation for the crawler's TOML config file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use fantasypl_core::{DispatchPolicy, ExclusionSet, RankStyle};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Config file used when `-c` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "fantasypl-crawler.conf";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    pub fpl: FplConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// `[app]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// A level name, or the integer levels of older config files.
    #[serde(
        default = "default_log_level",
        alias = "loglevel",
        deserialize_with = "deserialize_log_level"
    )]
    pub log_level: String,
    /// Where report files are written. Reports are only logged when unset.
    #[serde(default, alias = "directorytoexport")]
    pub directory_to_export: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            directory_to_export: None,
        }
    }
}

/// `[fpl]` section: account credentials and which leagues to crawl.
#[derive(Clone, Deserialize)]
pub struct FplConfig {
    pub username: String,
    pub password: String,
    #[serde(alias = "leagueids")]
    pub league_ids: Vec<String>,
    /// Account ids dropped from every league.
    #[serde(default, alias = "ignoreentries")]
    pub ignore_entries: Vec<u64>,
}

// Hand-written so the password never reaches a log line.
impl std::fmt::Debug for FplConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FplConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("league_ids", &self.league_ids)
            .field("ignore_entries", &self.ignore_entries)
            .finish()
    }
}

/// `[http]` section: transport timeout and retry policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 2,
            initial_backoff_ms: 500,
            max_backoff_ms: 5_000,
        }
    }
}

/// Which standings pages are aggregated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StandingsPages {
    /// Follow `has_next` and merge every page.
    #[default]
    All,
    /// Only the first page, as older releases did.
    First,
}

/// `[run]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Abort the whole run on the first failed history fetch.
    pub fail_fast: bool,
    pub standings_pages: StandingsPages,
    pub rank_style: RankStyle,
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LogLevelValue {
    Name(String),
    Numeric(i64),
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LogLevelValue::deserialize(deserializer)? {
        LogLevelValue::Name(name) => name,
        LogLevelValue::Numeric(level) => numeric_log_level(level).to_string(),
    })
}

/// Map an integer level (0 = fatal .. 4 = debug) onto a level name.
/// Out-of-range values fall back to `info`.
pub fn numeric_log_level(level: i64) -> &'static str {
    match level {
        0 | 1 => "error",
        2 => "warn",
        3 => "info",
        4 => "debug",
        _ => "info",
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    pub fn exclusions(&self) -> ExclusionSet {
        self.fpl.ignore_entries.iter().copied().collect()
    }

    /// Deadline for one history fetch including every retry: each attempt
    /// may use the full request timeout plus the capped backoff before it.
    pub fn fetch_deadline(&self) -> Duration {
        let retries = self.http.max_retries;
        self.request_timeout().saturating_mul(retries.saturating_add(1))
            + Duration::from_millis(self.http.max_backoff_ms).saturating_mul(retries)
    }

    pub fn dispatch_policy(&self) -> DispatchPolicy {
        DispatchPolicy {
            fetch_timeout: Some(self.fetch_deadline()),
            fail_fast: self.run.fail_fast,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Read, parse and validate the config file at `path`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    parse_config(&text, path)
}

/// Parse config text. `path` is only used in error messages.
pub fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let mut config: Config = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    config.app.log_level = config.app.log_level.trim().to_ascii_lowercase();
    validate(&config)?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if !LOG_LEVELS.contains(&config.app.log_level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "app.log_level".into(),
            message: format!(
                "must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                config.app.log_level
            ),
        });
    }

    let fpl = &config.fpl;
    let required: &[(&str, &str)] = &[
        ("fpl.username", fpl.username.as_str()),
        ("fpl.password", fpl.password.as_str()),
    ];
    for (name, val) in required {
        if val.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must not be empty".into(),
            });
        }
    }

    if fpl.league_ids.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "fpl.league_ids".into(),
            message: "at least one league id is required".into(),
        });
    }
    if fpl.league_ids.iter().any(|id| id.trim().is_empty()) {
        return Err(ConfigError::ValidationError {
            field: "fpl.league_ids".into(),
            message: "league ids must not be empty".into(),
        });
    }

    if config.http.timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "http.timeout_secs".into(),
            message: "must be > 0".into(),
        });
    }

    if config.http.initial_backoff_ms > config.http.max_backoff_ms {
        return Err(ConfigError::ValidationError {
            field: "http.initial_backoff_ms".into(),
            message: format!(
                "must not exceed http.max_backoff_ms ({})",
                config.http.max_backoff_ms
            ),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MINIMAL: &str = r#"
[fpl]
username = "me@example.com"
password = "hunter2"
league_ids = ["12345"]
"#;

    fn parse(text: &str) -> Result<Config, ConfigError> {
        parse_config(text, Path::new("test.conf"))
    }

    fn expect_field(err: ConfigError, expected: &str) {
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let config = parse(MINIMAL).expect("minimal config should load");
        assert_eq!(config.app.log_level, "info");
        assert!(config.app.directory_to_export.is_none());
        assert!(config.fpl.ignore_entries.is_empty());
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.max_retries, 2);
        assert!(!config.run.fail_fast);
        assert_eq!(config.run.standings_pages, StandingsPages::All);
        assert_eq!(config.run.rank_style, RankStyle::Dense);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        // 3 attempts of 30s plus 2 capped backoffs of 5s.
        assert_eq!(config.fetch_deadline(), Duration::from_secs(100));
    }

    #[test]
    fn full_config() {
        let text = r#"
[app]
log_level = "DEBUG"
directory_to_export = "out/reports"

[fpl]
username = "me@example.com"
password = "hunter2"
league_ids = ["12345", "67890"]
ignore_entries = [111, 222]

[http]
timeout_secs = 5
max_retries = 0
initial_backoff_ms = 100
max_backoff_ms = 100

[run]
fail_fast = true
standings_pages = "first"
rank_style = "competition"
"#;
        let config = parse(text).unwrap();
        assert_eq!(config.app.log_level, "debug");
        assert_eq!(
            config.app.directory_to_export,
            Some(PathBuf::from("out/reports"))
        );
        assert_eq!(config.fpl.league_ids, vec!["12345", "67890"]);
        let exclusions = config.exclusions();
        assert!(exclusions.contains(111) && exclusions.contains(222));
        assert_eq!(config.http.max_retries, 0);
        assert_eq!(config.run.standings_pages, StandingsPages::First);
        assert_eq!(config.run.rank_style, RankStyle::Competition);

        let policy = config.dispatch_policy();
        assert!(policy.fail_fast);
        assert_eq!(policy.fetch_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn legacy_key_names_are_accepted() {
        let text = r#"
[app]
loglevel = "warn"
directorytoexport = "reports"

[fpl]
username = "me@example.com"
password = "hunter2"
leagueids = ["1"]
ignoreentries = [7]
"#;
        let config = parse(text).unwrap();
        assert_eq!(config.app.log_level, "warn");
        assert_eq!(config.fpl.league_ids, vec!["1"]);
        assert_eq!(config.fpl.ignore_entries, vec![7]);
    }

    #[test]
    fn legacy_integer_loglevel() {
        let legacy = |level: &str| {
            parse(&format!(
                "[app]\nloglevel = {level}\n[fpl]\nusername = \"u\"\npassword = \"p\"\nleagueids = [\"1\"]\n"
            ))
            .expect("legacy config should load")
            .app
            .log_level
        };
        assert_eq!(legacy("4"), "debug");
        assert_eq!(legacy("3"), "info");
        assert_eq!(legacy("2"), "warn");
        assert_eq!(legacy("0"), "error");
        assert_eq!(legacy("9"), "info");
        assert_eq!(legacy("-1"), "info");
    }

    #[test]
    fn numeric_levels_map_onto_names() {
        assert_eq!(numeric_log_level(1), "error");
        assert_eq!(numeric_log_level(4), "debug");
        assert_eq!(numeric_log_level(i64::MAX), "info");
    }

    #[test]
    fn debug_output_hides_password() {
        let config = parse(MINIMAL).unwrap();
        let printed = format!("{:?}", config.fpl);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("me@example.com"));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let text = format!("[app]\nlog_level = \"loud\"\n{MINIMAL}");
        expect_field(parse(&text).unwrap_err(), "app.log_level");
    }

    #[test]
    fn rejects_empty_password() {
        let text = MINIMAL.replace("hunter2", "");
        expect_field(parse(&text).unwrap_err(), "fpl.password");
    }

    #[test]
    fn rejects_no_leagues() {
        let text = MINIMAL.replace(r#"["12345"]"#, "[]");
        expect_field(parse(&text).unwrap_err(), "fpl.league_ids");
    }

    #[test]
    fn rejects_blank_league_id() {
        let text = MINIMAL.replace(r#"["12345"]"#, r#"["12345", " "]"#);
        expect_field(parse(&text).unwrap_err(), "fpl.league_ids");
    }

    #[test]
    fn rejects_zero_timeout() {
        let text = format!("{MINIMAL}\n[http]\ntimeout_secs = 0\n");
        expect_field(parse(&text).unwrap_err(), "http.timeout_secs");
    }

    #[test]
    fn rejects_backoff_above_cap() {
        let text = format!("{MINIMAL}\n[http]\ninitial_backoff_ms = 900\nmax_backoff_ms = 100\n");
        expect_field(parse(&text).unwrap_err(), "http.initial_backoff_ms");
    }

    #[test]
    fn missing_fpl_section_is_a_parse_error() {
        let err = parse("[app]\nlog_level = \"info\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = parse("this is not valid [[[ toml").unwrap_err();
        match err {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with("test.conf")),
            other => panic!("expected ParseError, got: {other}"),
        }
    }

    #[test]
    fn file_not_found() {
        let path = std::env::temp_dir().join("fantasypl_config_test_missing.conf");
        let _ = fs::remove_file(&path);
        match load_config(&path).unwrap_err() {
            ConfigError::FileNotFound { path: p } => assert_eq!(p, path),
            other => panic!("expected FileNotFound, got: {other}"),
        }
    }

    #[test]
    fn loads_from_disk() {
        let path = std::env::temp_dir().join("fantasypl_config_test_disk.conf");
        fs::write(&path, MINIMAL).unwrap();
        let config = load_config(&path).expect("should load from disk");
        assert_eq!(config.fpl.username, "me@example.com");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn shipped_default_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("defaults/fantasypl-crawler.conf");
        let config = load_config(&path).expect("defaults/fantasypl-crawler.conf should load");
        assert_eq!(config.fpl.league_ids.len(), 2);
    }
}
