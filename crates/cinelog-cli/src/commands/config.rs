use super::AppContext;
use crate::output::{Output, OutputFormat};
use crate::ConfigCommands;
use cinelog_config::Config;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;

pub fn run_config(context: AppContext, cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show_config(&context, output),
        ConfigCommands::Set { key, value } => set_config(context, &key, &value, output),
        ConfigCommands::Path => {
            let config_file = context.paths.config_file();
            match output.format() {
                OutputFormat::Human => println!("{}", config_file.display()),
                _ => output.json(&json!({ "configFile": config_file })),
            }
            Ok(())
        }
    }
}

fn show_config(context: &AppContext, output: &Output) -> Result<()> {
    let config_file = context.paths.config_file();

    if output.format() != OutputFormat::Human {
        let value = serde_json::to_value(&context.config)?;
        output.json(&json!({ "configFile": config_file, "config": value }));
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    if !config_file.exists() {
        output.warn(format!("No configuration file at {}, showing defaults", config_file.display()));
    }
    println!("{}", "Configuration".bright_cyan().bold());
    println!("{}", settings_table(&context.config));

    let session = match context.credentials.get_username() {
        Some(username) => format!("logged in as {}", username).green().to_string(),
        None => "not logged in".bright_black().to_string(),
    };
    println!("Session: {}", session);
    Ok(())
}

fn set_config(mut context: AppContext, key: &str, value: &str, output: &Output) -> Result<()> {
    context
        .config
        .set_value(key, value)
        .map_err(|e| eyre!("{}", e))?;
    context
        .config
        .validate()
        .map_err(|e| eyre!("Refusing to save: {}", e))?;

    context
        .paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
    let config_file = context.paths.config_file();
    context
        .config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    output.success(format!("Set {} = {}", key, value));
    Ok(())
}

fn settings_table(config: &Config) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Key").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Value").add_attribute(comfy_table::Attribute::Bold),
    ]);
    let rows = [
        ("api.base_url", config.api.base_url.clone()),
        ("api.timeout_seconds", config.api.timeout_seconds.to_string()),
        ("api.user_agent", config.api.user_agent.clone()),
        (
            "catalog.default_watchlist_status",
            config.catalog.default_watchlist_status.to_string(),
        ),
        (
            "catalog.refresh_stats_on_partial_page",
            config.catalog.refresh_stats_on_partial_page.to_string(),
        ),
        ("logging.level", config.logging.level.clone()),
        ("logging.json", config.logging.json.to_string()),
        (
            "logging.file",
            config
                .logging
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(stderr)".to_string()),
        ),
    ];
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    table
}
