use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Verdict filter. Values other than the three known ones are kept as
/// given and forwarded to the source untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReviewType {
    #[default]
    All,
    Positive,
    Negative,
    Other(String),
}

impl ReviewType {
    pub fn as_str(&self) -> &str {
        match self {
            ReviewType::All => "all",
            ReviewType::Positive => "positive",
            ReviewType::Negative => "negative",
            ReviewType::Other(value) => value,
        }
    }

    /// Whether a review with the given verdict passes this filter.
    /// Unknown filters let everything through.
    pub fn accepts(&self, recommended: bool) -> bool {
        match self {
            ReviewType::All | ReviewType::Other(_) => true,
            ReviewType::Positive => recommended,
            ReviewType::Negative => !recommended,
        }
    }
}

impl fmt::Display for ReviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ReviewType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "all" => ReviewType::All,
            "positive" => ReviewType::Positive,
            "negative" => ReviewType::Negative,
            _ => ReviewType::Other(value),
        }
    }
}

impl From<ReviewType> for String {
    fn from(review_type: ReviewType) -> Self {
        match review_type {
            ReviewType::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for ReviewType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ReviewType::from(s.to_string()))
    }
}

/// Query constraints handed to the review source untouched
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewFilters {
    pub language: String,
    pub review_type: ReviewType,
}

impl ReviewFilters {
    pub fn new(language: impl Into<String>, review_type: ReviewType) -> Self {
        Self {
            language: language.into(),
            review_type,
        }
    }
}

impl Default for ReviewFilters {
    fn default() -> Self {
        Self::new("english", ReviewType::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_type_parse() {
        assert_eq!("Positive".parse::<ReviewType>().unwrap(), ReviewType::Positive);
        assert_eq!(" all ".parse::<ReviewType>().unwrap(), ReviewType::All);
        assert_eq!(
            "mixed".parse::<ReviewType>().unwrap(),
            ReviewType::Other("mixed".to_string())
        );
    }

    #[test]
    fn test_review_type_accepts() {
        assert!(ReviewType::All.accepts(false));
        assert!(ReviewType::Positive.accepts(true));
        assert!(!ReviewType::Positive.accepts(false));
        assert!(ReviewType::Negative.accepts(false));
        assert!(ReviewType::Other("funny".to_string()).accepts(false));
    }

    #[test]
    fn test_unknown_review_type_passes_through() {
        let review_type: ReviewType = "Funny".parse().unwrap();
        assert_eq!(review_type.as_str(), "Funny");

        let filters = ReviewFilters::new("", review_type);
        let json = serde_json::to_string(&filters).unwrap();
        assert_eq!(json, r#"{"language":"","review_type":"Funny"}"#);

        let back: ReviewFilters = serde_json::from_str(r#"{"language":"all","review_type":"NEGATIVE"}"#).unwrap();
        assert_eq!(back.review_type, ReviewType::Negative);
    }
}
