use reqwest::{Client, Response};
use std::time::Duration;

use crate::error::SourceError;

pub const USER_AGENT: &str = "SteamReviewFetcher/1.0";

/// HTTP client shared by the Steam endpoints; `timeout` bounds every request
pub fn create_steam_client(timeout: Duration) -> Result<Client, SourceError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(SourceError::from)
}

/// Turn a non-2xx response into [`SourceError::Status`]
pub(crate) fn check_status(response: Response) -> Result<Response, SourceError> {
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }
    Ok(response)
}
