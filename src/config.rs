use crate::types::JdkupSettings;
use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::path::PathBuf;

pub const APP_NAME: &str = "jdkup";
pub const CONFIG_FILE_NAME: &str = "config.json";

pub fn get_user_config_dir() -> Result<PathBuf> {
    let path = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join(APP_NAME);
    Ok(path)
}

pub fn get_config_file_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("JDKUP_CONFIG_PATH") {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let path = get_user_config_dir()?.join(CONFIG_FILE_NAME);
    tracing::debug!("Config file path: {}", path.display());
    Ok(path)
}

/// Settings as stored on disk, without environment overrides.
pub fn load_stored_settings() -> Result<JdkupSettings> {
    let config_path = get_config_file_path()?;
    if !config_path.exists() {
        return Ok(JdkupSettings::default());
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Could not read config file at {}", config_path.display()))?;
    serde_json::from_str(&content).with_context(|| "Could not parse config file as JSON")
}

/// Stored settings with `JDKUP_*` environment overrides applied.
pub fn load_settings() -> Result<JdkupSettings> {
    let mut settings = load_stored_settings()?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

pub fn apply_env_overrides(settings: &mut JdkupSettings, lookup: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(dir) = var("JDKUP_CACHE_DIR") {
        settings.cache_dir = dir;
    }
    if let Some(url) = var("JDKUP_ADOPT_API_URL") {
        settings.adopt_api_url = url;
    }
    if let Some(url) = var("JDKUP_ZULU_API_URL") {
        settings.zulu_api_url = url;
    }
    if let Some(retries) = var("JDKUP_HTTP_RETRIES") {
        match retries.parse::<u32>() {
            Ok(retries) => settings.http_retries = retries,
            Err(_) => tracing::warn!("Ignoring invalid JDKUP_HTTP_RETRIES value '{}'", retries),
        }
    }
}

pub fn save_settings(settings: &JdkupSettings) -> Result<()> {
    let config_path = get_config_file_path()?;
    let config_dir = config_path
        .parent()
        .ok_or_else(|| anyhow!("Invalid config path"))?;

    fs::create_dir_all(config_dir)?;

    let content = serde_json::to_string_pretty(settings)?;
    fs::write(&config_path, content)?;

    Ok(())
}

pub fn normalize_key(key: &str) -> String {
    key.replace('-', "_")
        .chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                format!("_{}", c.to_lowercase())
            } else {
                c.to_string()
            }
        })
        .collect::<String>()
        .to_lowercase()
}

pub fn setting_keys() -> Vec<String> {
    match serde_json::to_value(JdkupSettings::default()) {
        Ok(serde_json::Value::Object(map)) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow!(
        "'{}' is not a valid configuration setting. Valid settings: {}",
        key,
        setting_keys().join(", ")
    )
}

fn as_object(settings: &JdkupSettings) -> Result<serde_json::Map<String, serde_json::Value>> {
    match serde_json::to_value(settings)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => bail!("Settings did not serialize to an object"),
    }
}

pub fn get_setting(settings: &JdkupSettings, key: &str) -> Result<String> {
    let key = normalize_key(key);
    let map = as_object(settings)?;
    match map.get(&key) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(unknown_key(&key)),
    }
}

/// Returns `settings` with `key` set to `value`. The value is checked by
/// deserializing the result, so `distribution=foo` is rejected.
pub fn set_setting(settings: &JdkupSettings, key: &str, value: &str) -> Result<JdkupSettings> {
    let key = normalize_key(key);
    let mut map = as_object(settings)?;
    let new_value = match map.get(&key) {
        Some(serde_json::Value::Number(_)) => {
            let n: u64 = value
                .parse()
                .with_context(|| format!("Invalid value for '{}': expected a number", key))?;
            serde_json::Value::from(n)
        }
        Some(_) => serde_json::Value::String(value.to_string()),
        None => return Err(unknown_key(&key)),
    };
    map.insert(key.clone(), new_value);
    serde_json::from_value(serde_json::Value::Object(map))
        .with_context(|| format!("Invalid value '{}' for '{}'", value, key))
}

pub fn unset_setting(settings: &JdkupSettings, key: &str) -> Result<JdkupSettings> {
    let key = normalize_key(key);
    let defaults = as_object(&JdkupSettings::default())?;
    let default_value = defaults.get(&key).cloned().ok_or_else(|| unknown_key(&key))?;
    let mut map = as_object(settings)?;
    map.insert(key, default_value);
    Ok(serde_json::from_value(serde_json::Value::Object(map))?)
}
