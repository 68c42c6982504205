use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use client_core::http_source::DEFAULT_SEARCH_API;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Fixed dataset after a fixed delay.
    Simulated,
    /// Hacker News search API.
    Http,
    /// Simulated outage, for exercising the error state.
    Failing,
}

impl SourceKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "simulated" => Some(Self::Simulated),
            "http" => Some(Self::Http),
            "failing" => Some(Self::Failing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub source: SourceKind,
    pub http_base_url: String,
    pub delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/stories.db".into(),
            source: SourceKind::Simulated,
            http_base_url: DEFAULT_SEARCH_API.into(),
            delay_ms: 2000,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    database_url: Option<String>,
    source: Option<SourceKind>,
    http_base_url: Option<String>,
    delay_ms: Option<u64>,
}

/// Defaults, then the TOML file at `config_path` if it exists, then
/// `STORIES_*` environment variables.
pub fn load_settings(config_path: &Path) -> Result<Settings> {
    let mut settings = Settings::default();

    if config_path.exists() {
        let raw = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config '{}'", config_path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("invalid config '{}'", config_path.display()))?;
        apply_file(&mut settings, file_cfg);
    }

    apply_env(&mut settings, |name| std::env::var(name).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file_cfg.source {
        settings.source = v;
    }
    if let Some(v) = file_cfg.http_base_url {
        settings.http_base_url = v;
    }
    if let Some(v) = file_cfg.delay_ms {
        settings.delay_ms = v;
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(v) = var("STORIES_DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = var("STORIES_SOURCE") {
        let Some(source) = SourceKind::parse(&v) else {
            bail!("STORIES_SOURCE must be one of simulated, http, failing (got '{v}')");
        };
        settings.source = source;
    }
    if let Some(v) = var("STORIES_HTTP_BASE_URL") {
        settings.http_base_url = v;
    }
    if let Some(v) = var("STORIES_DELAY_MS") {
        settings.delay_ms = v.trim().parse().with_context(|| {
            format!("STORIES_DELAY_MS must be a number of milliseconds (got '{v}')")
        })?;
    }
    Ok(())
}

impl Settings {
    /// The configured database as a sqlx url. Plain file paths are accepted;
    /// `Storage::new` creates their parent directory.
    pub fn database_url(&self) -> String {
        normalize_database_url(&self.database_url)
    }
}

fn normalize_database_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return Settings::default().database_url;
    }
    if raw.starts_with("sqlite:") || raw.contains("://") {
        return raw.to_string();
    }
    format!("sqlite://{}", raw.replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn normalizes_plain_file_path_to_sqlite_url() {
        assert_eq!(
            normalize_database_url("./data/test.db"),
            "sqlite://./data/test.db"
        );
        assert_eq!(
            normalize_database_url("C:\\stories\\test.db"),
            "sqlite://C:/stories/test.db"
        );
        assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(normalize_database_url("sqlite:./x.db"), "sqlite:./x.db");
        assert_eq!(
            normalize_database_url("  "),
            Settings::default().database_url
        );
    }

    #[tokio::test]
    async fn plain_path_opens_storage_in_missing_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let db_path = temp.path().join("data").join("stories.db");
        let settings = Settings {
            database_url: db_path.to_string_lossy().into_owned(),
            ..Settings::default()
        };

        let storage = storage::Storage::new(&settings.database_url())
            .await
            .expect("open sqlite");
        storage.pool().close().await;

        assert!(db_path.exists(), "missing {}", db_path.display());
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let loaded = load_settings(&temp.path().join("absent.toml")).expect("load");
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn config_file_overrides_defaults() {
        let raw = r#"
            database_url = "sqlite://./other.db"
            source = "failing"
            delay_ms = 50
        "#;
        let file_cfg: FileSettings = toml::from_str(raw).expect("parse");
        let mut settings = Settings::default();
        apply_file(&mut settings, file_cfg);

        assert_eq!(settings.database_url, "sqlite://./other.db");
        assert_eq!(settings.source, SourceKind::Failing);
        assert_eq!(settings.delay_ms, 50);
        assert_eq!(settings.http_base_url, DEFAULT_SEARCH_API);
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("stories.toml");
        fs::write(&path, "colour = \"blue\"\n").expect("write config");
        assert!(load_settings(&path).is_err());
    }

    #[test]
    fn env_overrides_settings() {
        let mut settings = Settings::default();
        apply_env(
            &mut settings,
            env_from(&[
                ("STORIES_SOURCE", "HTTP"),
                ("STORIES_HTTP_BASE_URL", "http://localhost:9000/api"),
                ("STORIES_DELAY_MS", "10"),
            ]),
        )
        .expect("env");

        assert_eq!(settings.source, SourceKind::Http);
        assert_eq!(settings.http_base_url, "http://localhost:9000/api");
        assert_eq!(settings.delay_ms, 10);
    }

    #[test]
    fn rejects_bad_env_values() {
        let mut settings = Settings::default();
        assert!(apply_env(&mut settings, env_from(&[("STORIES_SOURCE", "ftp")])).is_err());
        assert!(apply_env(&mut settings, env_from(&[("STORIES_DELAY_MS", "soon")])).is_err());
    }
}
