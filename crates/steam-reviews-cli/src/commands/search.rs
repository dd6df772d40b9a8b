use crate::output::{Output, OutputFormat};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use serde_json::json;
use steam_reviews_config::{Config, PathManager};
use steam_reviews_sources::GameCatalog;

pub fn run_search(query: &str, limit: usize, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

    let catalog_path = config.catalog_path(path_manager.catalog_file());
    let catalog = GameCatalog::load(&catalog_path).map_err(|e| eyre!("{}", e))?;
    let matches = catalog.search(query, limit);
    tracing::debug!("Catalog search '{}' matched {} games", query, matches.len());

    match output.format() {
        OutputFormat::Human => {
            if matches.is_empty() {
                output.warn(format!("No game in the catalog matches '{}'", query));
                return Ok(());
            }
            if output.is_quiet() {
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(vec![
                Cell::new("App ID").add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Name").add_attribute(comfy_table::Attribute::Bold),
            ]);
            for entry in &matches {
                table.add_row(vec![Cell::new(entry.app_id), Cell::new(&entry.name)]);
            }
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            println!("{}", table);

            if matches.len() == limit {
                output.info(format!("Showing the first {} matches; refine the query to narrow it down", limit));
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "query": query,
                "matches": matches,
            }));
        }
    }

    Ok(())
}
