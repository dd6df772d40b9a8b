use super::fetch_ui::FetchUI;
use super::prompts;
use crate::output::Output;
use clap::{Args, ValueEnum};
use color_eyre::eyre::{eyre, Context};
use color_eyre::{Report, Result};
use serde_json::json;
use std::convert::Infallible;
use std::path::PathBuf;
use steam_reviews_config::{Config, CredentialStore, PathManager, SourceKind};
use steam_reviews_core::{
    write_export, CollectError, CollectorOptions, ExportContext, IdentityResolver, ResolverOptions,
    ReviewCollector,
};
use steam_reviews_models::{ExportFormat, ReviewType};
use steam_reviews_sources::catalog::DEFAULT_SEARCH_LIMIT;
use steam_reviews_sources::steam::create_steam_client;
use steam_reviews_sources::{create_identity_source, create_review_source, fetch_app_name, GameCatalog, SourceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    /// JSON review endpoint
    Api,
    /// Community site review listing
    Community,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Api => SourceKind::Api,
            SourceArg::Community => SourceKind::Community,
        }
    }
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Game name, looked up in the game catalog
    #[arg(long, short = 'g', conflicts_with = "app_id")]
    pub game: Option<String>,

    /// Steam app id (skips the catalog)
    #[arg(long, value_name = "ID")]
    pub app_id: Option<u64>,

    /// Review language, e.g. english, german, schinese
    #[arg(long)]
    pub language: Option<String>,

    /// Which reviews to keep: all, positive or negative (other values go to Steam as given)
    #[arg(long, value_parser = parse_review_type)]
    pub review_type: Option<ReviewType>,

    /// Number of reviews to fetch
    #[arg(long, short = 'n')]
    pub count: Option<usize>,

    /// Where to read reviews from
    #[arg(long, value_enum)]
    pub source: Option<SourceArg>,

    /// Export format (txt, csv, xlsx, docx, json); inferred from --out when omitted
    #[arg(long, short = 'f', value_parser = parse_export_format)]
    pub format: Option<ExportFormat>,

    /// Output file (default: <game>_reviews.<ext> in the current directory)
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,

    /// Skip author name lookups and show Steam ids
    #[arg(long)]
    pub no_names: bool,
}

fn parse_review_type(s: &str) -> Result<ReviewType, Infallible> {
    s.parse()
}

fn parse_export_format(s: &str) -> Result<ExportFormat, String> {
    s.parse()
}

/// The game a fetch is for
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    app_id: u64,
    name: String,
}

pub async fn run_fetch(args: FetchArgs, output: &Output) -> Result<()> {
    tracing::debug!("Fetch command started");

    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config
        .validate()
        .map_err(|e| eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;

    let client = create_steam_client(config.fetch.request_timeout())
        .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;
    let target = resolve_target(&args, &config, &path_manager, &client, output).await?;

    let mut filters = config.fetch.filters();
    if let Some(language) = &args.language {
        filters.language = language.clone();
    }
    if let Some(review_type) = &args.review_type {
        filters.review_type = review_type.clone();
    }
    let count = args.count.unwrap_or(config.fetch.count);
    let source_kind = args.source.map(SourceKind::from).unwrap_or(config.fetch.source);
    let (format, out_path) = resolve_output(args.format, args.out.clone(), &target.name)?;

    let source = create_review_source(source_kind, &config.fetch)
        .map_err(|e| eyre!("Failed to create review source: {}", e))?;
    let resolver = if args.no_names {
        IdentityResolver::disabled()
    } else {
        let mut cred_store = CredentialStore::new(path_manager.credentials_file());
        cred_store
            .load()
            .map_err(|e| eyre!("Failed to load credentials: {}", e))?;
        let identity = create_identity_source(&config.identity, cred_store.resolve_steam_api_key())
            .map_err(|e| eyre!("Failed to create identity source: {}", e))?;
        let resolver = IdentityResolver::from_optional(
            identity,
            ResolverOptions {
                batch_size: config.identity.batch_size,
                batch_delay: config.identity.batch_delay(),
                timeout: config.identity.timeout(),
            },
        );
        if !resolver.is_enabled() {
            output.info("Author name lookups are off; reviews will show Steam ids");
        }
        resolver
    };

    let collector = ReviewCollector::new(
        source,
        resolver,
        CollectorOptions {
            page_size: config.fetch.page_size,
            page_delay: config.fetch.page_delay(),
            request_timeout: config.fetch.request_timeout(),
        },
    );

    output.info(format!(
        "Fetching up to {} {} reviews for '{}' ({}) in {}",
        count, filters.review_type, target.name, target.app_id, filters.language
    ));

    let ui = FetchUI::new(count, output.is_human() && !output.is_quiet());
    let result = collector
        .fetch(&target.app_id.to_string(), count, &filters, Some(&ui))
        .await;

    let entries = match result {
        Ok(entries) => entries,
        Err(CollectError::SourceUnavailable { source_id, source }) => {
            ui.abandon();
            return Err(source_unavailable(&source_id, &source));
        }
    };
    ui.finish(format!("{} reviews", entries.len()));

    if entries.is_empty() {
        output.warn(format!("No reviews found for '{}' with the selected filters", target.name));
        return Ok(());
    }
    if entries.len() < count {
        output.warn(format!(
            "Only {} of {} requested reviews were available",
            entries.len(),
            count
        ));
    }

    let context = ExportContext::new(target.app_id, target.name.clone());
    write_export(&out_path, &entries, format, &context)
        .wrap_err_with(|| format!("Failed to write {}", out_path.display()))?;

    match output.format() {
        crate::output::OutputFormat::Human => {
            output.success(format!(
                "Saved {} reviews for '{}' to {}",
                entries.len(),
                target.name,
                out_path.display()
            ));
        }
        _ => output.json(&json!({
            "type": "result",
            "app_id": target.app_id,
            "game": target.name,
            "reviews": entries.len(),
            "requested": count,
            "format": format.extension(),
            "path": out_path.display().to_string(),
        })),
    }

    Ok(())
}

fn source_unavailable(source_id: &str, cause: &SourceError) -> Report {
    eyre!("Could not reach the review source for app {}: {}", source_id, cause)
}

async fn resolve_target(
    args: &FetchArgs,
    config: &Config,
    path_manager: &PathManager,
    client: &reqwest::Client,
    output: &Output,
) -> Result<Target> {
    if let Some(app_id) = args.app_id {
        let name = match fetch_app_name(client, &app_id.to_string()).await {
            Ok(Some(name)) => name,
            Ok(None) => {
                output.warn(format!("The store does not know app {}; using the id as its name", app_id));
                format!("App {}", app_id)
            }
            Err(e) => {
                tracing::warn!("App name lookup for {} failed: {}", app_id, e);
                format!("App {}", app_id)
            }
        };
        return Ok(Target { app_id, name });
    }

    let query = match &args.game {
        Some(game) => game.trim().to_string(),
        None if prompts::can_prompt() && output.is_human() => prompts::prompt_string("Game name")?,
        None => return Err(eyre!("Specify a game with --game NAME or --app-id ID")),
    };

    let catalog_path = config.catalog_path(path_manager.catalog_file());
    let catalog = GameCatalog::load(&catalog_path)
        .map_err(|e| eyre!("{}. Use --app-id to fetch without a catalog", e))?;

    if let Some(app_id) = catalog.resolve(&query) {
        return Ok(Target { app_id, name: query });
    }

    let matches = catalog.search(&query, DEFAULT_SEARCH_LIMIT);
    match matches.as_slice() {
        [] => Err(eyre!("No game in the catalog matches '{}'", query)),
        [only] => Ok(Target {
            app_id: only.app_id,
            name: only.name.clone(),
        }),
        several if prompts::can_prompt() && output.is_human() => {
            let picked = prompts::select_game(&query, several)?;
            Ok(Target {
                app_id: picked.app_id,
                name: picked.name.clone(),
            })
        }
        several => Err(eyre!(
            "{} games match '{}'. Use a more specific name or --app-id (try 'steamreviews search {}')",
            several.len(),
            query,
            query
        )),
    }
}

/// Pick the export format and output path from the flags.
///
/// An explicit format wins; otherwise the output file extension decides,
/// and plain text is the fallback.
fn resolve_output(format: Option<ExportFormat>, out: Option<PathBuf>, game_name: &str) -> Result<(ExportFormat, PathBuf)> {
    match (format, out) {
        (Some(format), Some(path)) => Ok((format, path)),
        (Some(format), None) => Ok((format, default_output_path(game_name, format))),
        (None, Some(path)) => match ExportFormat::from_path(&path) {
            Some(format) => Ok((format, path)),
            None if path.extension().is_none() => {
                let format = ExportFormat::default();
                Ok((format, path.with_extension(format.extension())))
            }
            None => Err(eyre!(
                "Cannot tell the export format from {}. Use --format txt|csv|xlsx|docx|json",
                path.display()
            )),
        },
        (None, None) => {
            let format = ExportFormat::default();
            Ok((format, default_output_path(game_name, format)))
        }
    }
}

fn default_output_path(game_name: &str, format: ExportFormat) -> PathBuf {
    PathBuf::from(format!("{}_reviews.{}", sanitize_file_stem(game_name), format.extension()))
}

/// Keep letters, digits, '-' and '_'; everything else becomes a single '_'
fn sanitize_file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            stem.push(c);
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "steam".to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("Team Fortress 2"), "Team_Fortress_2");
        assert_eq!(sanitize_file_stem("Half-Life: Alyx"), "Half-Life_Alyx");
        assert_eq!(sanitize_file_stem("  ???  "), "steam");
        assert_eq!(sanitize_file_stem("Ведьмак 3"), "Ведьмак_3");
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path("Portal 2", ExportFormat::Csv),
            PathBuf::from("Portal_2_reviews.csv")
        );
    }

    #[test]
    fn test_format_inferred_from_extension() {
        let (format, path) = resolve_output(None, Some(PathBuf::from("out/tf2.xlsx")), "TF2").unwrap();
        assert_eq!(format, ExportFormat::Xlsx);
        assert_eq!(path, PathBuf::from("out/tf2.xlsx"));
    }

    #[test]
    fn test_explicit_format_wins() {
        let (format, path) = resolve_output(Some(ExportFormat::Json), Some(PathBuf::from("dump.txt")), "TF2").unwrap();
        assert_eq!(format, ExportFormat::Json);
        assert_eq!(path, PathBuf::from("dump.txt"));
    }

    #[test]
    fn test_defaults_to_text_named_after_game() {
        let (format, path) = resolve_output(None, None, "Dota 2").unwrap();
        assert_eq!(format, ExportFormat::Text);
        assert_eq!(path, PathBuf::from("Dota_2_reviews.txt"));
    }

    #[test]
    fn test_missing_extension_gets_text() {
        let (format, path) = resolve_output(None, Some(PathBuf::from("reviews")), "Dota 2").unwrap();
        assert_eq!(format, ExportFormat::Text);
        assert_eq!(path, PathBuf::from("reviews.txt"));
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        assert!(resolve_output(None, Some(PathBuf::from("reviews.pdf")), "Dota 2").is_err());
    }

    #[test]
    fn test_review_type_flag_passes_unknown_values_through() {
        assert_eq!(parse_review_type("negative"), Ok(ReviewType::Negative));
        assert_eq!(parse_review_type("funny"), Ok(ReviewType::Other("funny".to_string())));
    }

    #[test]
    fn test_source_unavailable_report_names_app_and_cause() {
        let cause = SourceError::Status {
            status: 503,
            url: "https://store.steampowered.com/appreviews/440".to_string(),
        };
        let message = source_unavailable("440", &cause).to_string();
        assert!(message.contains("app 440"));
        assert!(message.contains(&cause.to_string()));
    }

    #[test]
    fn test_source_arg_maps_to_kind() {
        assert_eq!(SourceKind::from(SourceArg::Community), SourceKind::Community);
        assert_eq!(SourceKind::from(SourceArg::Api), SourceKind::Api);
    }
}
