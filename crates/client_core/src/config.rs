use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;
use serde::Deserialize;
use url::Url;

pub const SETTINGS_FILE: &str = "tarot.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub server_url: String,
    pub card_route: String,
    pub reading_route: String,
    pub request_timeout_secs: u64,
    pub shuffle: bool,
    pub shuffle_seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            card_route: "/get_card".into(),
            reading_route: "/get_reading".into(),
            request_timeout_secs: 30,
            shuffle: true,
            shuffle_seed: None,
        }
    }
}

impl Settings {
    /// Absolute URL of the per-card metadata endpoint.
    pub fn card_url(&self, card_index: usize) -> anyhow::Result<Url> {
        let route = format!("{}/{card_index}", self.card_route.trim_end_matches('/'));
        join_route(&self.server_url, &route)
    }

    pub fn reading_url(&self) -> anyhow::Result<Url> {
        join_route(&self.server_url, &self.reading_route)
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE))
}

pub fn load_settings_from(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match raw.parse::<toml::Table>() {
            Ok(table) => {
                let file_cfg = flatten_scalars(table);
                apply_overrides(&mut settings, |key| file_cfg.get(key).cloned());
            }
            Err(err) => tracing::warn!("ignoring malformed {}: {err}", path.display()),
        }
    }

    if let Ok(v) = std::env::var("TAROT_SERVER_URL") {
        settings.server_url = v;
    }
    apply_overrides(&mut settings, |key| {
        std::env::var(format!("APP__{}", key.to_ascii_uppercase())).ok()
    });

    settings
}

/// Keys may be written quoted or as native TOML scalars; both end up as the
/// string form the env overrides use.
fn flatten_scalars(table: toml::Table) -> HashMap<String, String> {
    table
        .into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                toml::Value::String(text) => text,
                toml::Value::Integer(number) => number.to_string(),
                toml::Value::Boolean(flag) => flag.to_string(),
                toml::Value::Float(number) => number.to_string(),
                other => {
                    tracing::warn!(key = %key, "ignoring non-scalar setting: {other}");
                    return None;
                }
            };
            Some((key, text))
        })
        .collect()
}

fn apply_overrides<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("server_url") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("card_route") {
        settings.card_route = v;
    }
    if let Some(v) = lookup("reading_route") {
        settings.reading_route = v;
    }
    if let Some(v) = lookup("request_timeout_secs") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
    if let Some(v) = lookup("shuffle") {
        if let Ok(parsed) = v.trim().parse::<bool>() {
            settings.shuffle = parsed;
        }
    }
    if let Some(v) = lookup("shuffle_seed") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.shuffle_seed = Some(parsed);
        }
    }
}

fn join_route(server_url: &str, route: &str) -> anyhow::Result<Url> {
    let base = normalize_server_url(server_url);
    let base = Url::parse(&base).with_context(|| format!("invalid server url '{server_url}'"))?;
    base.join(route.trim_start_matches('/'))
        .with_context(|| format!("invalid route '{route}' for server '{server_url}'"))
}

/// Accepts bare `host:port` and makes sure the base ends with `/` so that
/// routes are joined under any path prefix instead of replacing it.
fn normalize_server_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    if with_scheme.ends_with('/') {
        with_scheme
    } else {
        format!("{with_scheme}/")
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
