//! Configuration loaded from a TOML file.
//!
//! Default location is `$XDG_CONFIG_HOME/dailyqueue-tui/config.toml` (or the
//! platform equivalent via `dirs`). The file is required: without a database
//! URL there is nothing useful to show.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Connection string for the queue database.
    pub database_url: String,
    /// Name recorded against status changes. Falls back to the login user
    /// when unset.
    pub actor: Option<String>,
    #[serde(default)]
    pub queues: QueueSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueSection {
    #[serde(default)]
    pub r26: QueueSettings,
    #[serde(default)]
    pub report_schedule: QueueSettings,
    #[serde(default)]
    pub rpa_detail: QueueSettings,
    #[serde(default)]
    pub sd_report: QueueSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueSettings {
    /// Company filter applied when the screen first loads.
    pub default_company: Option<String>,
    /// Keep rows with staged edits at the top of the grid.
    #[serde(default)]
    pub pending_first: bool,
}

pub fn config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().ok_or_else(|| anyhow!("could not determine config directory"))?;
    Ok(dir.join("dailyqueue-tui").join("config.toml"))
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };
        let contents = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "could not read config at {} (create it with at least a database_url entry)",
                path.display()
            )
        })?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("invalid config at {}", path.display()))?;
        if config.database_url.trim().is_empty() {
            return Err(anyhow!("database_url is empty in {}", path.display()));
        }
        Ok(config)
    }

    /// The name written to audit columns on commit.
    pub fn actor(&self) -> String {
        if let Some(actor) = &self.actor {
            if !actor.trim().is_empty() {
                return actor.trim().to_string();
            }
        }
        std::env::var("USERNAME")
            .or_else(|_| std::env::var("USER"))
            .unwrap_or_else(|_| "dailyqueue".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: Config = toml::from_str(
            r#"
            database_url = "sqlite://queues.db"
            actor = "svc-queues"

            [queues.r26]
            default_company = "Texashvi"
            pending_first = true
            "#,
        )
        .unwrap();
        assert_eq!(config.database_url, "sqlite://queues.db");
        assert_eq!(config.actor(), "svc-queues");
        assert_eq!(
            config.queues.r26.default_company.as_deref(),
            Some("Texashvi")
        );
        assert!(config.queues.r26.pending_first);
        assert!(config.queues.sd_report.default_company.is_none());
    }

    #[test]
    fn queue_sections_are_optional() {
        let config: Config = toml::from_str(r#"database_url = "sqlite://q.db""#).unwrap();
        assert!(!config.queues.report_schedule.pending_first);
    }

    #[test]
    fn blank_actor_falls_back() {
        let config: Config = toml::from_str(
            r#"
            database_url = "sqlite://q.db"
            actor = "   "
            "#,
        )
        .unwrap();
        assert!(!config.actor().trim().is_empty());
        assert_ne!(config.actor(), "   ");
    }
}
