use clap::{Parser, Subcommand};
use todosync_core::config::{ConfigOverrides, canonical_key};
use todosync_core::error::AppError;

#[derive(Parser, Debug)]
#[command(author, version, about = "Task list kept in sync with a hosted database", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log store traffic to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: todosync add "Buy milk"
    Add { text: Option<String> },
    /// Flip a task between open and completed
    ///
    /// Example: todosync toggle 3
    Toggle { id: String },
    /// Delete a task
    ///
    /// Example: todosync delete 3
    Delete { id: String },
    /// Fetch and show all tasks, newest first
    ///
    /// Example: todosync list
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    Table,
    TimeoutSecs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let field = canonical_key(key_raw);

    let target = match field.as_str() {
        "" => return Err("override key cannot be empty".to_string()),
        "theme" => ConfigOverrideTarget::Theme,
        "table" => ConfigOverrideTarget::Table,
        "timeout" | "timeout_secs" => ConfigOverrideTarget::TimeoutSecs,
        other => return Err(format!("unknown config field '{other}'")),
    };

    if value.is_empty() {
        return Err(format!("override for '{field}' needs a value"));
    }

    Ok(ParsedConfigOverride { target, value })
}

pub fn collect_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::Table => overrides.table = Some(parsed.value),
            ConfigOverrideTarget::TimeoutSecs => {
                let secs = parsed.value.parse::<u64>().map_err(|_| {
                    AppError::invalid_input(format!(
                        "timeout_secs must be a whole number of seconds, got '{}'",
                        parsed.value
                    ))
                })?;
                overrides.timeout_secs = Some(secs);
            }
        }
    }
    Ok(overrides)
}
