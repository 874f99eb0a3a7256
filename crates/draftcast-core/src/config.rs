// Configuration loading and parsing (league.toml, summary.toml, credentials.toml).

use serde::Deserialize;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Environment variable consulted when credentials.toml carries no API key.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
/// Environment variable that overrides `league.id`.
pub const LEAGUE_ID_ENV: &str = "DRAFTCAST_LEAGUE_ID";

const DEFAULT_LLM_API_URL: &str = "https://api.anthropic.com/v1/messages";

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

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },

    #[error("no Anthropic API key: set it in config/credentials.toml or ANTHROPIC_API_KEY")]
    MissingCredential,
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub api: ApiConfig,
    pub llm: LlmConfig,
    pub charts: Vec<ChartConfig>,
    /// `None` when neither credentials.toml nor the environment carries a key.
    /// Only the summary run needs one.
    pub credentials: Option<Credentials>,
}

impl Config {
    /// The resolved Anthropic credentials, or `MissingCredential`.
    pub fn require_credentials(&self) -> Result<&Credentials, ConfigError> {
        self.credentials.as_ref().ok_or(ConfigError::MissingCredential)
    }
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    /// Identifier passed to the league service.
    pub id: String,
    pub name: String,
    /// First names of every participant, in the order prompts list them.
    pub managers: Vec<String>,
    #[serde(default = "default_season_length")]
    pub season_length: u32,
    /// Dollars the last-placed manager pays out at season end.
    #[serde(default = "default_stakes")]
    pub stakes: u32,
}

fn default_season_length() -> u32 {
    38
}

fn default_stakes() -> u32 {
    500
}

// ---------------------------------------------------------------------------
// summary.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire summary.toml file.
#[derive(Debug, Clone, Deserialize)]
struct SummaryFile {
    api: ApiConfig,
    llm: LlmConfig,
    #[serde(default)]
    charts: Vec<ChartConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

fn default_api_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    /// Output ceiling shared by every generation call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_llm_api_url")]
    pub api_url: String,
}

fn default_max_tokens() -> u32 {
    200
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_llm_api_url() -> String {
    DEFAULT_LLM_API_URL.to_string()
}

/// Which league dataset a chart is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartSource {
    MatchResults,
    Squads,
}

/// One entry of the chart caption checklist.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChartConfig {
    /// Key under `chartSummaries` in the output bundle.
    pub key: String,
    /// Human-readable chart name used inside prompts.
    pub chart_type: String,
    pub source: ChartSource,
    /// Hint describing what the chart depicts, used for the subtitle caption.
    pub subtitle_context: String,
    /// When set, a title caption is generated as well.
    #[serde(default)]
    pub title_context: Option<String>,
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
struct CredentialsFile {
    anthropic_api_key: Option<String>,
}

/// Resolved credentials, handed explicitly to the clients that need them.
#[derive(Clone)]
pub struct Credentials {
    pub anthropic_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("anthropic_api_key", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Environment overrides
// ---------------------------------------------------------------------------

/// Values taken from the process environment. Captured once at startup so
/// the rest of the loader is a pure function of files plus this struct.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub league_id: Option<String>,
    pub anthropic_api_key: Option<String>,
}

impl EnvOverrides {
    pub fn from_process() -> Self {
        EnvOverrides {
            league_id: non_empty_var(LEAGUE_ID_ENV),
            anthropic_api_key: non_empty_var(API_KEY_ENV),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml`,
/// `config/summary.toml`, and (optionally) `config/credentials.toml`,
/// all relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path, env: &EnvOverrides) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;
    let mut league = league_file.league;
    if let Some(id) = &env.league_id {
        league.id = id.clone();
    }

    // --- summary.toml (required) ---
    let summary_path = config_dir.join("summary.toml");
    let summary_text = read_file(&summary_path)?;
    let summary_file: SummaryFile =
        toml::from_str(&summary_text).map_err(|e| ConfigError::ParseError {
            path: summary_path.clone(),
            source: e,
        })?;

    // --- credentials.toml (optional, env fallback) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials_file = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsFile::default()
    };
    let credentials = credentials_file
        .anthropic_api_key
        .filter(|k| !k.trim().is_empty())
        .or_else(|| env.anthropic_api_key.clone())
        .map(|anthropic_api_key| Credentials { anthropic_api_key });

    let config = Config {
        league,
        api: summary_file.api,
        llm: summary_file.llm,
        charts: summary_file.charts,
        credentials,
    };

    validate(&config)?;

    Ok(config)
}

/// Files seeded from `defaults/` on first run. Credentials are never seeded;
/// `credentials.toml.example` documents the format instead.
const SEEDED_FILES: [&str; 2] = ["league.toml", "summary.toml"];

/// Seed `config/` with any of `league.toml`/`summary.toml` that are missing,
/// copying them from `defaults/`. Existing files are never touched. Returns
/// the paths that were written.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(Vec::new());
        }
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no defaults/ or config/ directory under {}; run from the project root",
                base_dir.display()
            ),
        });
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("cannot create {}: {e}", config_dir.display()),
    })?;

    let mut seeded = Vec::new();
    for name in SEEDED_FILES {
        let source = defaults_dir.join(name);
        let target = config_dir.join(name);
        if target.exists() || !source.is_file() {
            continue;
        }
        seed_file(&source, &target)?;
        info!(file = %target.display(), "seeded config from defaults");
        seeded.push(target);
    }

    Ok(seeded)
}

/// Copy `source` to `target`, refusing to clobber a file created in between.
fn seed_file(source: &Path, target: &Path) -> Result<(), ConfigError> {
    let copy_error = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("cannot seed {} from {}: {e}", target.display(), source.display()),
    };
    let content = std::fs::read(source).map_err(copy_error)?;
    let mut dest = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .map_err(copy_error)?;
    dest.write_all(&content).map_err(copy_error)
}

/// Convenience wrapper: loads config relative to the current working directory
/// with overrides from the process environment. Ensures default config files
/// are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd, &EnvOverrides::from_process())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.id.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.id".into(),
            message: "must not be empty".into(),
        });
    }

    if !config
        .league
        .id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::ValidationError {
            field: "league.id".into(),
            message: format!(
                "`{}` may only contain ASCII letters, digits, '-' and '_'",
                config.league.id
            ),
        });
    }

    if config.league.managers.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.managers".into(),
            message: "must list at least one manager".into(),
        });
    }

    if config.league.season_length == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.season_length".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.api.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "api.base_url".into(),
            message: "must not be empty".into(),
        });
    }

    if config.llm.max_tokens == 0 {
        return Err(ConfigError::ValidationError {
            field: "llm.max_tokens".into(),
            message: "must be greater than 0".into(),
        });
    }

    let mut seen = HashSet::new();
    for chart in &config.charts {
        if chart.key.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "charts.key".into(),
                message: "must not be empty".into(),
            });
        }
        if !seen.insert(chart.key.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "charts.key".into(),
                message: format!("duplicate chart key `{}`", chart.key),
            });
        }
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

    const LEAGUE_TOML: &str = r#"
[league]
id = "12345"
name = "Test Draft League"
managers = ["Ryan", "Mitchell", "Jay", "Kerrod"]
"#;

    const SUMMARY_TOML: &str = r#"
[api]
base_url = "http://localhost:8080/api"

[llm]
model = "claude-sonnet-4-20250514"

[[charts]]
key = "form"
chart_type = "form"
source = "match_results"
subtitle_context = "Shows each team's points over the last 5 gameweeks."

[[charts]]
key = "bonusPoints"
chart_type = "bonus points"
source = "squads"
subtitle_context = "Bonus points earned by each squad."
title_context = "Name the squad with the most bonus points."
"#;

    /// Write a config/ directory into a fresh temp dir.
    fn write_config(files: &[(&str, &str)]) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let config_dir = tmp.path().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        for (name, content) in files {
            fs::write(config_dir.join(name), content).unwrap();
        }
        tmp
    }

    fn key(config: &Config) -> &str {
        &config.require_credentials().unwrap().anthropic_api_key
    }

    fn env_with_key() -> EnvOverrides {
        EnvOverrides {
            league_id: None,
            anthropic_api_key: Some("sk-ant-env".into()),
        }
    }

    #[test]
    fn load_valid_config() {
        let tmp = write_config(&[
            ("league.toml", LEAGUE_TOML),
            ("summary.toml", SUMMARY_TOML),
            ("credentials.toml", "anthropic_api_key = \"sk-ant-file\"\n"),
        ]);
        let config = load_config_from(tmp.path(), &EnvOverrides::default()).unwrap();

        assert_eq!(config.league.id, "12345");
        assert_eq!(config.league.managers.len(), 4);
        assert_eq!(config.league.season_length, 38);
        assert_eq!(config.league.stakes, 500);
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.llm.max_tokens, 200);
        assert_eq!(config.llm.api_url, DEFAULT_LLM_API_URL);
        assert_eq!(config.charts.len(), 2);
        assert_eq!(config.charts[0].source, ChartSource::MatchResults);
        assert_eq!(config.charts[0].title_context, None);
        assert_eq!(config.charts[1].source, ChartSource::Squads);
        assert!(config.charts[1].title_context.is_some());
        assert_eq!(key(&config), "sk-ant-file");
    }

    #[test]
    fn credentials_file_wins_over_env() {
        let tmp = write_config(&[
            ("league.toml", LEAGUE_TOML),
            ("summary.toml", SUMMARY_TOML),
            ("credentials.toml", "anthropic_api_key = \"sk-ant-file\"\n"),
        ]);
        let config = load_config_from(tmp.path(), &env_with_key()).unwrap();
        assert_eq!(key(&config), "sk-ant-file");
    }

    #[test]
    fn missing_credentials_file_falls_back_to_env() {
        let tmp = write_config(&[("league.toml", LEAGUE_TOML), ("summary.toml", SUMMARY_TOML)]);
        let config = load_config_from(tmp.path(), &env_with_key()).unwrap();
        assert_eq!(key(&config), "sk-ant-env");
    }

    #[test]
    fn empty_key_in_file_falls_back_to_env() {
        let tmp = write_config(&[
            ("league.toml", LEAGUE_TOML),
            ("summary.toml", SUMMARY_TOML),
            ("credentials.toml", "anthropic_api_key = \"\"\n"),
        ]);
        let config = load_config_from(tmp.path(), &env_with_key()).unwrap();
        assert_eq!(key(&config), "sk-ant-env");
    }

    #[test]
    fn no_key_anywhere_loads_but_cannot_be_required() {
        let tmp = write_config(&[("league.toml", LEAGUE_TOML), ("summary.toml", SUMMARY_TOML)]);
        let config = load_config_from(tmp.path(), &EnvOverrides::default()).unwrap();
        assert!(config.credentials.is_none());
        assert!(matches!(
            config.require_credentials(),
            Err(ConfigError::MissingCredential)
        ));
    }

    #[test]
    fn env_overrides_league_id() {
        let tmp = write_config(&[("league.toml", LEAGUE_TOML), ("summary.toml", SUMMARY_TOML)]);
        let env = EnvOverrides {
            league_id: Some("999".into()),
            ..env_with_key()
        };
        let config = load_config_from(tmp.path(), &env).unwrap();
        assert_eq!(config.league.id, "999");
    }

    #[test]
    fn league_id_with_path_characters_fails_validation() {
        for bad in ["11436/../admin", "11436?x=1", "114 36"] {
            let tmp =
                write_config(&[("league.toml", LEAGUE_TOML), ("summary.toml", SUMMARY_TOML)]);
            let env = EnvOverrides {
                league_id: Some(bad.into()),
                ..env_with_key()
            };
            match load_config_from(tmp.path(), &env) {
                Err(ConfigError::ValidationError { field, .. }) => assert_eq!(field, "league.id"),
                other => panic!("{bad} should be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_league_toml_is_file_not_found() {
        let tmp = write_config(&[("summary.toml", SUMMARY_TOML)]);
        let err = load_config_from(tmp.path(), &env_with_key()).unwrap_err();
        match err {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("league.toml")),
            other => panic!("expected FileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn malformed_summary_is_parse_error() {
        let tmp = write_config(&[("league.toml", LEAGUE_TOML), ("summary.toml", "[api\n")]);
        let err = load_config_from(tmp.path(), &env_with_key()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn unknown_chart_source_is_parse_error() {
        let summary = SUMMARY_TOML.replace("source = \"squads\"", "source = \"fixtures\"");
        let tmp = write_config(&[("league.toml", LEAGUE_TOML), ("summary.toml", &summary)]);
        let err = load_config_from(tmp.path(), &env_with_key()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn duplicate_chart_keys_fail_validation() {
        let summary = SUMMARY_TOML.replace("key = \"bonusPoints\"", "key = \"form\"");
        let tmp = write_config(&[("league.toml", LEAGUE_TOML), ("summary.toml", &summary)]);
        let err = load_config_from(tmp.path(), &env_with_key()).unwrap_err();
        match err {
            ConfigError::ValidationError { field, message } => {
                assert_eq!(field, "charts.key");
                assert!(message.contains("form"));
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn empty_managers_fail_validation() {
        let league = LEAGUE_TOML.replace(
            "managers = [\"Ryan\", \"Mitchell\", \"Jay\", \"Kerrod\"]",
            "managers = []",
        );
        let tmp = write_config(&[("league.toml", &league), ("summary.toml", SUMMARY_TOML)]);
        let err = load_config_from(tmp.path(), &env_with_key()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValidationError { ref field, .. } if field == "league.managers"
        ));
    }

    #[test]
    fn zero_max_tokens_fail_validation() {
        let summary = SUMMARY_TOML.replace(
            "model = \"claude-sonnet-4-20250514\"",
            "model = \"claude-sonnet-4-20250514\"\nmax_tokens = 0",
        );
        let tmp = write_config(&[("league.toml", LEAGUE_TOML), ("summary.toml", &summary)]);
        let err = load_config_from(tmp.path(), &env_with_key()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValidationError { ref field, .. } if field == "llm.max_tokens"
        ));
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = Credentials {
            anthropic_api_key: "sk-ant-secret".into(),
        };
        let printed = format!("{creds:?}");
        assert!(!printed.contains("sk-ant-secret"));
    }

    #[test]
    fn ensure_config_files_copies_missing_and_skips_examples() {
        let tmp = tempfile::tempdir().unwrap();
        let defaults = tmp.path().join("defaults");
        fs::create_dir_all(&defaults).unwrap();
        fs::write(defaults.join("league.toml"), LEAGUE_TOML).unwrap();
        fs::write(defaults.join("summary.toml"), SUMMARY_TOML).unwrap();
        fs::write(defaults.join("credentials.toml.example"), "anthropic_api_key = \"\"").unwrap();

        let config_dir = tmp.path().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("summary.toml"), "# user edited").unwrap();

        let copied = ensure_config_files(tmp.path()).unwrap();
        assert_eq!(copied, vec![config_dir.join("league.toml")]);
        assert!(!config_dir.join("credentials.toml.example").exists());
        assert_eq!(
            fs::read_to_string(config_dir.join("summary.toml")).unwrap(),
            "# user edited"
        );

        // Second run finds everything in place.
        assert!(ensure_config_files(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn ensure_config_files_creates_config_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let defaults = tmp.path().join("defaults");
        fs::create_dir_all(&defaults).unwrap();
        fs::write(defaults.join("league.toml"), LEAGUE_TOML).unwrap();
        fs::write(defaults.join("summary.toml"), SUMMARY_TOML).unwrap();
        fs::write(defaults.join("notes.txt"), "not a config file").unwrap();

        let copied = ensure_config_files(tmp.path()).unwrap();
        let config_dir = tmp.path().join("config");
        assert_eq!(
            copied,
            vec![config_dir.join("league.toml"), config_dir.join("summary.toml")]
        );
        assert!(!config_dir.join("notes.txt").exists());
        assert!(load_config_from(tmp.path(), &env_with_key()).is_ok());
    }

    #[test]
    fn ensure_config_files_with_only_config_dir_is_noop() {
        let tmp = write_config(&[("league.toml", LEAGUE_TOML)]);
        assert!(ensure_config_files(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn ensure_config_files_without_any_dir_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ensure_config_files(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::DefaultsCopyError { .. }));
    }

    #[test]
    fn shipped_defaults_parse() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
        let tmp = tempfile::tempdir().unwrap();
        let config_dir = tmp.path().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        for name in ["league.toml", "summary.toml"] {
            fs::copy(root.join("defaults").join(name), config_dir.join(name)).unwrap();
        }

        let config = load_config_from(tmp.path(), &env_with_key()).unwrap();
        assert_eq!(config.league.managers, vec!["Ryan", "Mitchell", "Jay", "Kerrod"]);
        assert!(!config.charts.is_empty());
    }
}
