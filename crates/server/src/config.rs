use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use curation::pagination::{DEFAULT_MAX_VISIBLE_PAGES, DEFAULT_PAGE_SIZE, MIN_VISIBLE_PAGES};
use server_api::PagingDefaults;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub default_page_size: i64,
    pub max_page_size: i64,
    pub max_visible_pages: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            database_url: "sqlite://./data/fcinema.db".into(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: 100,
            max_visible_pages: DEFAULT_MAX_VISIBLE_PAGES,
        }
    }
}

impl Settings {
    /// Paging limits for the API layer, rejecting combinations the
    /// pagination engine would refuse at request time.
    pub fn paging(&self) -> anyhow::Result<PagingDefaults> {
        if self.max_page_size < 1 {
            bail!("max_page_size must be positive, got {}", self.max_page_size);
        }
        if !(1..=self.max_page_size).contains(&self.default_page_size) {
            bail!(
                "default_page_size must be between 1 and {}, got {}",
                self.max_page_size,
                self.default_page_size
            );
        }
        if self.max_visible_pages < MIN_VISIBLE_PAGES {
            bail!(
                "max_visible_pages must be at least {MIN_VISIBLE_PAGES}, got {}",
                self.max_visible_pages
            );
        }
        Ok(PagingDefaults {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
            max_visible_pages: self.max_visible_pages,
        })
    }
}

/// Defaults, then `server.toml` in the working directory, then environment.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        apply_file_overrides(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<HashMap<String, toml::Value>>(raw) {
        Ok(cfg) => cfg,
        Err(error) => {
            warn!(%error, "ignoring unreadable server.toml");
            return;
        }
    };
    let get = |key: &str| {
        file_cfg.get(key).map(|value| match value {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    };

    if let Some(v) = get("bind_addr") {
        settings.server_bind = v;
    }
    if let Some(v) = get("database_url") {
        settings.database_url = v;
    }
    apply_numeric(&mut settings.default_page_size, "default_page_size", get("default_page_size"));
    apply_numeric(&mut settings.max_page_size, "max_page_size", get("max_page_size"));
    apply_numeric(&mut settings.max_visible_pages, "max_visible_pages", get("max_visible_pages"));
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = lookup("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = lookup("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    apply_numeric(
        &mut settings.default_page_size,
        "APP__DEFAULT_PAGE_SIZE",
        lookup("APP__DEFAULT_PAGE_SIZE"),
    );
    apply_numeric(
        &mut settings.max_page_size,
        "APP__MAX_PAGE_SIZE",
        lookup("APP__MAX_PAGE_SIZE"),
    );
    apply_numeric(
        &mut settings.max_visible_pages,
        "APP__MAX_VISIBLE_PAGES",
        lookup("APP__MAX_VISIBLE_PAGES"),
    );
}

fn apply_numeric<T: std::str::FromStr>(target: &mut T, key: &str, raw: Option<String>) {
    let Some(raw) = raw else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(parsed) => *target = parsed,
        Err(_) => warn!(key, value = %raw, "ignoring non-numeric setting"),
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
