use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::error::SourceError;
use crate::steam::client::check_status;

const APP_DETAILS_URL: &str = "https://store.steampowered.com/api/appdetails";

#[derive(Debug, Deserialize)]
struct AppDetails {
    #[serde(default)]
    success: bool,
    data: Option<AppData>,
}

#[derive(Debug, Deserialize)]
struct AppData {
    name: String,
}

/// Extract the app name from an `appdetails` body; `None` when the store does not know the id
pub fn parse_app_details(body: &str, app_id: &str) -> Result<Option<String>, SourceError> {
    let details: HashMap<String, AppDetails> = serde_json::from_str(body)?;
    Ok(details
        .get(app_id)
        .filter(|d| d.success)
        .and_then(|d| d.data.as_ref())
        .map(|data| data.name.clone()))
}

/// Look up an application's display name on the store
pub async fn fetch_app_name(client: &Client, app_id: &str) -> Result<Option<String>, SourceError> {
    let response = client
        .get(APP_DETAILS_URL)
        .query(&[("appids", app_id)])
        .send()
        .await?;
    let response = check_status(response)?;
    let body = response.text().await?;

    let name = parse_app_details(&body, app_id)?;
    debug!("App details: app={}, name={:?}", app_id, name);
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_app_details() {
        let body = r#"{"620": {"success": true, "data": {"type": "game", "name": "Portal 2", "steam_appid": 620}}}"#;
        assert_eq!(parse_app_details(body, "620").unwrap(), Some("Portal 2".to_string()));
    }

    #[test]
    fn test_parse_app_details_unknown_app() {
        let body = r#"{"999999999": {"success": false}}"#;
        assert_eq!(parse_app_details(body, "999999999").unwrap(), None);
        assert_eq!(parse_app_details(body, "620").unwrap(), None);
    }
}
