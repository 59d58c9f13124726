//! Job configuration.
//!
//! Everything the batch needs is read once into [`PipelineConfig`] and passed
//! down explicitly. [`PipelineConfig::from_lookup`] takes the variable source
//! as a function so tests never touch the process environment.

use std::fmt;
use std::path::PathBuf;

use db::ConnectParams;
use tracing::info;

use crate::ConfigError;

/// Repository used when `GITHUB_REPOSITORY` is not set.
pub const DEFAULT_REPOSITORY: &str = "GoogleCloudPlatform/generative-ai-docs";

/// An `owner/repo` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Split `owner/repo` on the first `/`.
    ///
    /// Everything after the first slash belongs to the repo part; both parts
    /// must be non-empty.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => Ok(Self {
                owner: owner.to_string(),
                repo: repo.to_string(),
            }),
            _ => Err(ConfigError::InvalidRepository(value.to_string())),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Full configuration of one batch.
#[derive(Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub repository: RepoRef,
    pub token: String,
    /// GitHub API root, e.g. `https://api.github.com`.
    pub api_url: String,
    pub db: ConnectParams,
    /// DDL script run before the first upsert.
    pub schema_path: PathBuf,
}

// Keep the token and password out of logs.
impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("repository", &self.repository)
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("db_host", &self.db.host)
            .field("db_port", &self.db.port)
            .field("db_user", &self.db.user)
            .field("db_name", &self.db.dbname)
            .field("schema_path", &self.schema_path)
            .finish()
    }
}

impl PipelineConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// | variable               | default                                   |
    /// |------------------------|-------------------------------------------|
    /// | `GITHUB_TOKEN`         | required                                  |
    /// | `GITHUB_REPOSITORY`    | `GoogleCloudPlatform/generative-ai-docs`  |
    /// | `GITHUB_API_URL`       | `https://api.github.com`                  |
    /// | `DB_HOST`              | `localhost`                               |
    /// | `DB_PORT`              | `5432`                                    |
    /// | `DB_USER`              | `postgres`                                |
    /// | `DB_PASSWORD`          | `password`                                |
    /// | `DB_NAME`              | `pipeline_pulse_db`                       |
    /// | `PIPELINE_SCHEMA_PATH` | `schema/schema.sql`                       |
    ///
    /// An empty variable counts as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let token = get("GITHUB_TOKEN").ok_or(ConfigError::MissingToken)?;

        let repository = match get("GITHUB_REPOSITORY") {
            Some(value) => RepoRef::parse(&value)?,
            None => {
                info!("GITHUB_REPOSITORY not set. Using default: {DEFAULT_REPOSITORY}");
                RepoRef::parse(DEFAULT_REPOSITORY)?
            }
        };

        Ok(Self {
            repository,
            token,
            api_url: get("GITHUB_API_URL")
                .unwrap_or_else(|| github::DEFAULT_API_URL.to_string()),
            db: connect_params_from_lookup(&lookup)?,
            schema_path: schema_path_from_lookup(&lookup),
        })
    }
}

/// Layer explicit values (command-line flags) over a variable source. A
/// `Some` override wins over whatever `lookup` returns for that key, so it is
/// the override that gets validated and logged.
pub fn with_overrides<F>(
    lookup: F,
    overrides: Vec<(&'static str, Option<String>)>,
) -> impl Fn(&str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    move |key| {
        overrides
            .iter()
            .find(|(name, value)| *name == key && value.is_some())
            .and_then(|(_, value)| value.clone())
            .or_else(|| lookup(key))
    }
}

/// Database settings alone (`DB_*`), for commands that never call GitHub.
pub fn connect_params_from_lookup<F>(lookup: &F) -> Result<ConnectParams, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
    let defaults = ConnectParams::default();

    let port = match get("DB_PORT") {
        Some(raw) => raw
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
        None => defaults.port,
    };

    Ok(ConnectParams {
        host: get("DB_HOST").unwrap_or(defaults.host),
        port,
        user: get("DB_USER").unwrap_or(defaults.user),
        password: get("DB_PASSWORD").unwrap_or(defaults.password),
        dbname: get("DB_NAME").unwrap_or(defaults.dbname),
    })
}

/// `PIPELINE_SCHEMA_PATH`, or the bundled `schema/schema.sql`.
pub fn schema_path_from_lookup<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup("PIPELINE_SCHEMA_PATH")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(db::schema::DEFAULT_SCHEMA_PATH))
}
