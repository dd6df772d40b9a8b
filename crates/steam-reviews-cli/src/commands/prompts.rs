use color_eyre::Result;
use dialoguer::{Confirm, Input, Select};
use std::io::IsTerminal;
use steam_reviews_sources::CatalogEntry;

/// Prompts only make sense when a person is at the keyboard
pub fn can_prompt() -> bool {
    std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
}

/// Prompt for a non-empty string
pub fn prompt_string(prompt: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .validate_with(|input: &String| -> Result<(), &'static str> {
            if input.trim().is_empty() {
                Err("Value cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .map(|s| s.trim().to_string())
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read input: {}", e))
}

/// Prompt for a secret without echoing it
pub fn prompt_secret(prompt: &str) -> Result<String> {
    rpassword::prompt_password(format!("{}: ", prompt))
        .map(|s| s.trim().to_string())
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read input: {}", e))
}

/// Prompt for yes/no with a default
pub fn prompt_yes_no(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read confirmation: {}", e))
}

/// Let the user pick one of several catalog matches
pub fn select_game<'a>(query: &str, matches: &[&'a CatalogEntry]) -> Result<&'a CatalogEntry> {
    let items: Vec<String> = matches
        .iter()
        .map(|entry| format!("{} ({})", entry.name, entry.app_id))
        .collect();

    let index = Select::new()
        .with_prompt(format!("Several games match '{}'", query))
        .items(&items)
        .default(0)
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read selection: {}", e))?;

    matches
        .get(index)
        .copied()
        .ok_or_else(|| color_eyre::eyre::eyre!("Invalid selection"))
}
