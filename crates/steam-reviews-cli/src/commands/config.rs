use super::prompts;
use crate::output::{Output, OutputFormat};
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use steam_reviews_config::{Config, CredentialStore, PathManager};

pub fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(full, output),
        ConfigCommands::SetKey { key } => set_api_key(key, output),
        ConfigCommands::Init { force } => init_config(force, output),
    }
}

fn load_credentials(path_manager: &PathManager) -> Result<CredentialStore> {
    let credentials_file = path_manager.credentials_file();
    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store
        .load()
        .map_err(|e| eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;
    Ok(cred_store)
}

fn show_config(full: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();

    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Using defaults. Run 'steamreviews config init' to write them to disk.");
    }

    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    let cred_store = load_credentials(&path_manager)?;
    let api_key = cred_store.resolve_steam_api_key().unwrap_or_default();
    let shown_key = if full { api_key.clone() } else { mask_string(&api_key) };
    let catalog_path = config.catalog_path(path_manager.catalog_file());

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }

            println!("\n{}", "Configuration".bright_cyan().bold());
            println!();

            let mut info_table = Table::new();
            info_table.set_header(vec![
                Cell::new("Config File").add_attribute(comfy_table::Attribute::Bold),
                Cell::new(config_file.display().to_string()),
            ]);
            info_table.add_row(vec![
                Cell::new("Game Catalog"),
                Cell::new(format!(
                    "{}{}",
                    catalog_path.display(),
                    if catalog_path.exists() { "" } else { " (missing)" }
                )),
            ]);
            info_table.add_row(vec![Cell::new("Steam API Key"), Cell::new(&shown_key)]);
            info_table.load_preset(comfy_table::presets::UTF8_FULL);
            info_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            println!("{}", info_table);
            println!();

            let mut fetch_table = Table::new();
            fetch_table.set_header(vec![Cell::new("Fetch Options")
                .fg(comfy_table::Color::Cyan)
                .add_attribute(comfy_table::Attribute::Bold)]);
            fetch_table.add_row(vec![Cell::new("Source"), Cell::new(format!("{:?}", config.fetch.source).to_lowercase())]);
            fetch_table.add_row(vec![Cell::new("Language"), Cell::new(&config.fetch.language)]);
            fetch_table.add_row(vec![Cell::new("Review Type"), Cell::new(&config.fetch.review_type)]);
            fetch_table.add_row(vec![Cell::new("Count"), Cell::new(config.fetch.count)]);
            fetch_table.add_row(vec![Cell::new("Page Size"), Cell::new(config.fetch.page_size)]);
            fetch_table.add_row(vec![Cell::new("Page Delay"), Cell::new(format!("{} ms", config.fetch.page_delay_ms))]);
            fetch_table.add_row(vec![
                Cell::new("Request Timeout"),
                Cell::new(format!("{} s", config.fetch.request_timeout_secs)),
            ]);
            fetch_table.load_preset(comfy_table::presets::UTF8_FULL);
            fetch_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            println!("{}", fetch_table);
            println!();

            let mut identity_table = Table::new();
            identity_table.set_header(vec![Cell::new("Author Names")
                .fg(comfy_table::Color::Cyan)
                .add_attribute(comfy_table::Attribute::Bold)]);
            identity_table.add_row(vec![
                Cell::new("Enabled"),
                Cell::new(if config.identity.enabled { "Yes".green().to_string() } else { "No".red().to_string() }),
            ]);
            identity_table.add_row(vec![Cell::new("Batch Size"), Cell::new(config.identity.batch_size)]);
            identity_table.add_row(vec![
                Cell::new("Batch Delay"),
                Cell::new(format!("{} ms", config.identity.batch_delay_ms)),
            ]);
            identity_table.add_row(vec![Cell::new("Timeout"), Cell::new(format!("{} s", config.identity.timeout_secs))]);
            identity_table.load_preset(comfy_table::presets::UTF8_FULL);
            identity_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            println!("{}", identity_table);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "config_file": config_file.display().to_string(),
                "catalog_file": catalog_path.display().to_string(),
                "steam_api_key": shown_key,
                "fetch": config.fetch,
                "identity": config.identity,
            }));
        }
    }

    Ok(())
}

fn set_api_key(key_arg: Option<String>, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let mut cred_store = load_credentials(&path_manager)?;

    let key = match key_arg {
        Some(key) => key.trim().to_string(),
        None if prompts::can_prompt() => {
            output.info("Get a key at https://steamcommunity.com/dev/apikey");
            prompts::prompt_secret("Steam Web API key")?
        }
        None => return Err(eyre!("No key given. Use --key KEY or run interactively")),
    };

    if key.is_empty() {
        return Err(eyre!("API key cannot be empty"));
    }

    cred_store.set_steam_api_key(key);
    cred_store
        .save()
        .map_err(|e| eyre!("Failed to save credentials to {}: {}", path_manager.credentials_file().display(), e))?;

    output.success(format!("Steam API key saved to {}", path_manager.credentials_file().display()));
    Ok(())
}

fn init_config(force: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();

    if config_file.exists() && !force {
        let overwrite = prompts::can_prompt()
            && prompts::prompt_yes_no(
                &format!("{} already exists. Overwrite with defaults?", config_file.display()),
                false,
            )?;
        if !overwrite {
            output.warn(format!("Keeping existing configuration at {}", config_file.display()));
            return Ok(());
        }
    }

    path_manager
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create {}: {}", path_manager.config_dir().display(), e))?;
    Config::default()
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    output.success(format!("Default configuration written to {}", config_file.display()));
    if !path_manager.catalog_file().exists() {
        output.info(format!(
            "Place a game catalog (steam_games.json) at {} to look games up by name",
            path_manager.catalog_file().display()
        ));
    }
    Ok(())
}

/// Keep the first and last two characters of a secret
fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}
