use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Local development database used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432/copydesk";

#[derive(Debug, Clone)]
pub struct Config {
    /// Connection string for the copy store
    pub database_url: String,

    /// Overrides the database named in `database_url`
    pub database_name: Option<String>,

    /// Where language fix reports are written
    pub report_dir: PathBuf,

    /// Attempts made to open the connection before giving up
    pub connect_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let connect_attempts = match std::env::var("CONNECT_ATTEMPTS") {
            Ok(value) => value
                .trim()
                .parse::<u32>()
                .context(format!("CONNECT_ATTEMPTS must be a positive integer, got '{}'", value))?,
            Err(_) => 3,
        };
        if connect_attempts == 0 {
            bail!("CONNECT_ATTEMPTS must be at least 1");
        }

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),

            database_name: std::env::var("DATABASE_NAME")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),

            report_dir: std::env::var("REPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("reports")),

            connect_attempts,
        })
    }

    /// The connection string with any password replaced, for logging.
    pub fn redacted_database_url(&self) -> String {
        let Some((scheme, rest)) = self.database_url.split_once("://") else {
            return self.database_url.clone();
        };
        let Some((credentials, host)) = rest.rsplit_once('@') else {
            return self.database_url.clone();
        };
        match credentials.split_once(':') {
            Some((user, _)) => format!("{}://{}:***@{}", scheme, user, host),
            None => self.database_url.clone(),
        }
    }
}
