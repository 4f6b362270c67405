use std::fs;
use std::path::Path;

use fieldsales_core::config::{
    env_override, resolve_config_path, AppConfig, LoadOptions, Setting, SETTINGS,
};
use serde::Serialize;
use toml::Value;

use crate::commands::CommandResult;

/// One effective setting and where its value came from.
#[derive(Debug, PartialEq, Eq, Serialize)]
struct ConfigField {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let file_path = resolve_config_path(None);
    let file_doc = file_path.as_deref().and_then(load_file_doc);

    let fields: Vec<ConfigField> = SETTINGS
        .iter()
        .map(|setting| ConfigField {
            key: setting.key,
            value: redact_url(setting.key, &config.value_of(setting.key).unwrap_or_default()),
            source: field_source(setting, file_doc.as_ref(), file_path.as_deref()),
        })
        .collect();

    CommandResult::success_with_data(
        "config",
        "effective config (source precedence: env > file > default)",
        fields,
    )
}

fn load_file_doc(path: &Path) -> Option<Value> {
    fs::read_to_string(path).ok()?.parse::<Value>().ok()
}

/// Same precedence as [`AppConfig::load`]: a non-blank env var, then the
/// file, then the default.
fn field_source(setting: &Setting, file_doc: Option<&Value>, file_path: Option<&Path>) -> String {
    if let Some((env_key, _)) = env_override(setting.env) {
        return format!("env ({env_key})");
    }

    if file_doc.is_some_and(|doc| contains_path(doc, setting.key)) {
        let file =
            file_path.map_or_else(|| "config file".to_string(), |path| path.display().to_string());
        return format!("file ({file})");
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

/// Hides credentials embedded in a database URL's query string.
fn redact_url(key_path: &str, value: &str) -> String {
    if key_path != "database.url" {
        return value.to_string();
    }
    match value.split_once('?') {
        Some((base, _)) => format!("{base}?<redacted>"),
        None => value.to_string(),
    }
}
