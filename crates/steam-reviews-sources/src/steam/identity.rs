use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::SourceError;
use crate::steam::client::{check_status, create_steam_client};
use crate::traits::IdentitySource;

const PLAYER_SUMMARIES_URL: &str = "https://api.steampowered.com/ISteamUser/GetPlayerSummaries/v2/";

#[derive(Debug, Deserialize)]
struct PlayerSummariesResponse {
    response: PlayerList,
}

#[derive(Debug, Default, Deserialize)]
struct PlayerList {
    #[serde(default)]
    players: Vec<Player>,
}

#[derive(Debug, Deserialize)]
struct Player {
    steamid: String,
    personaname: Option<String>,
}

/// Parse a GetPlayerSummaries body into steamid -> persona name.
/// Players without a persona name are left out.
pub fn parse_player_summaries(body: &str) -> Result<HashMap<String, String>, SourceError> {
    let parsed: PlayerSummariesResponse = serde_json::from_str(body)?;
    Ok(parsed
        .response
        .players
        .into_iter()
        .filter_map(|player| {
            let name = player.personaname.filter(|n| !n.trim().is_empty())?;
            Some((player.steamid, name))
        })
        .collect())
}

/// Persona names from the Steam Web API, authenticated with a static key
#[derive(Clone)]
pub struct SteamPlayerSummaries {
    client: Arc<Client>,
    api_key: String,
}

impl SteamPlayerSummaries {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self::with_client(create_steam_client(timeout)?, api_key))
    }

    pub fn with_client(client: Client, api_key: String) -> Self {
        Self {
            client: Arc::new(client),
            api_key,
        }
    }
}

#[async_trait]
impl IdentitySource for SteamPlayerSummaries {
    fn source_name(&self) -> &str {
        "steam-player-summaries"
    }

    async fn lookup(&self, ids: &[String]) -> Result<HashMap<String, String>, SourceError> {
        let steamids = ids.join(",");
        let response = self
            .client
            .get(PLAYER_SUMMARIES_URL)
            .query(&[("key", self.api_key.as_str()), ("steamids", steamids.as_str())])
            .send()
            .await?;
        let response = check_status(response)?;
        let body = response.text().await?;

        let names = parse_player_summaries(&body)?;
        debug!("Player summaries: requested={}, named={}", ids.len(), names.len());
        Ok(names)
    }
}
