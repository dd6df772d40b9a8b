use anyhow::Result;
use std::io;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Filter directives for a verbosity level.
///
/// 0 = info, 1 = debug with connection-pool chatter from hyper suppressed,
/// 2+ = trace.
fn default_directives(verbose_level: u8) -> &'static str {
    match verbose_level {
        0 => "info",
        1 => "debug,hyper::proto::h1=warn,hyper::client::pool=warn,html5ever=info,selectors=info",
        _ => "trace",
    }
}

fn build_filter(verbose_level: u8, quiet: bool) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }
    // RUST_LOG wins over the verbosity flags
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose_level)))
}

/// JSON lines when `RUST_LOG_JSON=true`, or when stdout is not a terminal
fn use_json() -> bool {
    std::env::var("RUST_LOG_JSON")
        .map(|v| v == "true")
        .unwrap_or_else(|_| !io::stdout().is_terminal())
}

/// Split `logs/steamreviews.log` into the directory and the rotation prefix `steamreviews`
fn rolling_parts(log_path: &Path) -> Result<(PathBuf, String)> {
    let log_dir = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let log_filename = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename: {}", log_path.display()))?;

    let prefix = match log_filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => log_filename,
    };
    Ok((log_dir, prefix.to_string()))
}

pub fn init_logging_with_file(verbose_level: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let registry = Registry::default().with(build_filter(verbose_level, quiet));
    let json = use_json();

    match log_file {
        Some(log_path) => {
            let (log_dir, prefix) = rolling_parts(&log_path)?;
            std::fs::create_dir_all(&log_dir)?;

            // steamreviews.2026-10-16, steamreviews.2026-10-17, ...
            let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, prefix);

            if json {
                let layer = fmt::layer()
                    .json()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(file_appender);
                registry.with(layer).try_init()?;
            } else {
                let layer = fmt::layer()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(file_appender);
                registry.with(layer).try_init()?;
            }
        }
        None if json => {
            let layer = fmt::layer()
                .json()
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(io::stderr);
            registry.with(layer).try_init()?;
        }
        None => {
            let layer = fmt::layer().with_timer(ChronoUtc::rfc_3339()).with_writer(io::stderr);
            registry.with(layer).try_init()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_directives() {
        assert_eq!(default_directives(0), "info");
        assert!(default_directives(1).starts_with("debug,"));
        assert_eq!(default_directives(5), "trace");
    }

    #[test]
    fn test_rolling_parts_strip_extension() {
        let (dir, prefix) = rolling_parts(Path::new("/var/log/steamreviews.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/var/log"));
        assert_eq!(prefix, "steamreviews");
    }

    #[test]
    fn test_rolling_parts_bare_filename() {
        let (dir, prefix) = rolling_parts(Path::new("fetch")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(prefix, "fetch");
    }
}
