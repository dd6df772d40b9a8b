use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Text,
    Csv,
    Xlsx,
    Docx,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Docx => "docx",
            ExportFormat::Json => "json",
        }
    }

    /// Infer the format from a file extension, case-insensitively
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "txt" => Some(ExportFormat::Text),
            "csv" => Some(ExportFormat::Csv),
            "xlsx" => Some(ExportFormat::Xlsx),
            "docx" => Some(ExportFormat::Docx),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "txt" | "text" => Ok(ExportFormat::Text),
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "docx" | "word" => Ok(ExportFormat::Docx),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("Unknown export format: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("out/reviews.CSV")), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_path(Path::new("reviews.xlsx")), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::from_path(Path::new("reviews")), None);
        assert_eq!(ExportFormat::from_path(Path::new("reviews.pdf")), None);
    }

    #[test]
    fn test_extension_matches_parse() {
        for format in [ExportFormat::Text, ExportFormat::Csv, ExportFormat::Xlsx, ExportFormat::Docx, ExportFormat::Json] {
            assert_eq!(format.extension().parse::<ExportFormat>().unwrap(), format);
        }
    }
}
