use std::env;
use std::fs;
use std::path::Path;

use changeorder_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

use crate::commands::{CommandResult, EXIT_CONFIG};

struct Field<'a> {
    key_path: &'a str,
    value: String,
    env_keys: &'a [&'a str],
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let line_item_change_types = config
        .wizard
        .line_item_change_types
        .iter()
        .map(|change_type| change_type.key())
        .collect::<Vec<_>>()
        .join(",");

    let fields = [
        Field {
            key_path: "wizard.product_grid_enabled",
            value: config.wizard.product_grid_enabled.to_string(),
            env_keys: &["CHANGEORDER_PRODUCT_GRID_ENABLED"],
        },
        Field {
            key_path: "wizard.embedded_in_host",
            value: config.wizard.embedded_in_host.to_string(),
            env_keys: &["CHANGEORDER_EMBEDDED_IN_HOST"],
        },
        Field {
            key_path: "wizard.max_opportunities",
            value: config.wizard.max_opportunities.to_string(),
            env_keys: &["CHANGEORDER_MAX_OPPORTUNITIES"],
        },
        Field {
            key_path: "wizard.line_item_change_types",
            value: line_item_change_types,
            env_keys: &["CHANGEORDER_LINE_ITEM_CHANGE_TYPES"],
        },
        Field {
            key_path: "wizard.price_change_warning_pct",
            value: config.wizard.price_change_warning_pct.to_string(),
            env_keys: &["CHANGEORDER_PRICE_CHANGE_WARNING_PCT"],
        },
        Field {
            key_path: "wizard.header_text",
            value: config.wizard.header_text.clone(),
            env_keys: &["CHANGEORDER_HEADER_TEXT"],
        },
        Field {
            key_path: "drafts.url",
            value: config.drafts.url.clone(),
            env_keys: &["CHANGEORDER_DRAFTS_URL"],
        },
        Field {
            key_path: "drafts.max_connections",
            value: config.drafts.max_connections.to_string(),
            env_keys: &["CHANGEORDER_DRAFTS_MAX_CONNECTIONS"],
        },
        Field {
            key_path: "drafts.timeout_secs",
            value: config.drafts.timeout_secs.to_string(),
            env_keys: &["CHANGEORDER_DRAFTS_TIMEOUT_SECS"],
        },
        Field {
            key_path: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["CHANGEORDER_LOG_LEVEL", "CHANGEORDER_LOGGING_LEVEL"],
        },
        Field {
            key_path: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["CHANGEORDER_LOG_FORMAT", "CHANGEORDER_LOGGING_FORMAT"],
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in &fields {
        lines.push(render_line(
            field.key_path,
            &field.value,
            field_source(
                field.key_path,
                field.env_keys,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        ));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
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

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
