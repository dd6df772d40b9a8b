use clap::ValueEnum;
use owo_colors::OwoColorize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

#[derive(Debug, Clone, Copy)]
enum Level {
    Success,
    Info,
    Warning,
    Error,
}

impl Level {
    fn as_str(&self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

/// User-facing messages, separate from tracing logs.
///
/// Human mode prints decorated lines; the JSON modes print one object per
/// message so scripts can consume the stream.
pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        self.message(Level::Success, msg.as_ref());
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.message(Level::Info, msg.as_ref());
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.message(Level::Warning, msg.as_ref());
    }

    /// Shown even in quiet mode
    pub fn error(&self, msg: impl AsRef<str>) {
        self.message(Level::Error, msg.as_ref());
    }

    /// Print a structured result; ignored in human mode when quiet
    pub fn json(&self, data: &serde_json::Value) {
        if self.quiet && self.is_human() {
            return;
        }
        self.print_json(data);
    }

    fn message(&self, level: Level, msg: &str) {
        if self.quiet && !matches!(level, Level::Error) {
            return;
        }

        match self.format {
            OutputFormat::Human => match level {
                Level::Success => println!("{} {}", "✓".green(), msg),
                Level::Info => println!("{}", msg),
                Level::Warning => println!("{} {}", "⚠".yellow(), msg),
                Level::Error => eprintln!("{} {}", "✗".red(), msg),
            },
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.print_json(&json!({
                    "type": level.as_str(),
                    "message": msg
                }));
            }
        }
    }

    fn print_json(&self, data: &serde_json::Value) {
        match self.format {
            OutputFormat::JsonPretty => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            OutputFormat::Json | OutputFormat::Human => {
                println!("{}", serde_json::to_string(data).unwrap_or_default());
            }
        }
    }
}
