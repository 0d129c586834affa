use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;
use client_core::DEFAULT_ENDPOINT;

pub const CONFIG_FILE: &str = "crm.toml";
const DEFAULT_DATABASE_URL: &str = "sqlite://./data/crm_client.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint: String,
    pub database_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            database_url: DEFAULT_DATABASE_URL.into(),
        }
    }
}

/// Defaults, then `crm.toml` in the working directory, then environment.
pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    let path = Path::new(CONFIG_FILE);
    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, String>>(raw)?;
    if let Some(v) = file_cfg.get("endpoint") {
        settings.endpoint = v.clone();
    }
    if let Some(v) = file_cfg.get("database_url") {
        settings.database_url = v.clone();
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("CRM_ENDPOINT") {
        settings.endpoint = v;
    }
    if let Some(v) = var("CRM_DATABASE_URL") {
        settings.database_url = v;
    }
}

/// Accepts either a sqlite URL or a bare file path.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
