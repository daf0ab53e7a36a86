// File: idlewatch-core/src/activity/riot.rs

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use idlewatch_common::traits::ActivitySource;

use crate::http::{HttpClient, HttpResponse};
use crate::utils::time::from_epoch_millis;
use crate::Error;

#[derive(Debug, Deserialize)]
struct Account {
    puuid: String,
}

#[derive(Debug, Deserialize)]
struct MatchDetails {
    info: MatchInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchInfo {
    game_end_timestamp: Option<i64>,
    game_creation: Option<i64>,
}

/// Last-played lookup through the official match-history API.
///
/// Riot IDs (`Name#Tag`) are resolved through account-v1 on the regional host;
/// bare summoner names go through summoner-v4 on the platform host. The end
/// time of the most recent match is the last activity.
pub struct RiotActivitySource {
    http: Arc<dyn HttpClient>,
    api_key: String,
    platform_base: String,
    regional_base: String,
}

impl RiotActivitySource {
    /// - `platform`: platform routing value, e.g. `jp1`, `euw1`
    /// - `region`: regional routing value, e.g. `asia`, `europe`
    pub fn new(http: Arc<dyn HttpClient>, api_key: String, platform: &str, region: &str) -> Self {
        Self::with_base_urls(
            http,
            api_key,
            format!("https://{platform}.api.riotgames.com"),
            format!("https://{region}.api.riotgames.com"),
        )
    }

    pub fn with_base_urls(
        http: Arc<dyn HttpClient>,
        api_key: String,
        platform_base: String,
        regional_base: String,
    ) -> Self {
        Self {
            http,
            api_key,
            platform_base,
            regional_base,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<Option<T>, Error> {
        let mut headers = HashMap::new();
        headers.insert("X-Riot-Token".to_string(), self.api_key.clone());

        let resp: HttpResponse = self.http.get(url.clone(), headers).await?;
        match resp.status {
            404 => Ok(None),
            429 => Err(Error::ActivitySource(format!("rate limited by Riot API ({url})"))),
            401 | 403 => Err(Error::ActivitySource(format!(
                "Riot API rejected the key (status {})",
                resp.status
            ))),
            _ if resp.is_success() => Ok(Some(serde_json::from_str(&resp.body)?)),
            status => {
                let snippet: String = resp.body.chars().take(200).collect();
                Err(Error::ActivitySource(format!("Riot API status {status}: {snippet}")))
            }
        }
    }

    async fn resolve_puuid(&self, game_identity: &str) -> Result<String, Error> {
        let url = match game_identity.split_once('#') {
            Some((name, tag)) => format!(
                "{}/riot/account/v1/accounts/by-riot-id/{}/{}",
                self.regional_base,
                urlencoding::encode(name.trim()),
                urlencoding::encode(tag.trim())
            ),
            None => format!(
                "{}/lol/summoner/v4/summoners/by-name/{}",
                self.platform_base,
                urlencoding::encode(game_identity.trim())
            ),
        };

        match self.get_json::<Account>(url).await? {
            Some(account) => Ok(account.puuid),
            None => Err(Error::NotFound(format!("Riot account '{game_identity}'"))),
        }
    }

    async fn latest_match_id(&self, puuid: &str) -> Result<Option<String>, Error> {
        let url = format!(
            "{}/lol/match/v5/matches/by-puuid/{}/ids?start=0&count=1",
            self.regional_base, puuid
        );
        let ids: Vec<String> = self.get_json(url).await?.unwrap_or_default();
        Ok(ids.into_iter().next())
    }
}

#[async_trait]
impl ActivitySource for RiotActivitySource {
    async fn last_activity_of(&self, game_identity: &str) -> Result<Option<DateTime<Utc>>, Error> {
        let puuid = self.resolve_puuid(game_identity).await?;

        let Some(match_id) = self.latest_match_id(&puuid).await? else {
            debug!("{} has no match history", game_identity);
            return Ok(None);
        };

        let url = format!("{}/lol/match/v5/matches/{}", self.regional_base, match_id);
        let Some(details) = self.get_json::<MatchDetails>(url).await? else {
            warn!("Match {} listed for {} but not retrievable", match_id, game_identity);
            return Err(Error::ActivitySource(format!("match {match_id} not found")));
        };

        let millis = details
            .info
            .game_end_timestamp
            .or(details.info.game_creation)
            .ok_or_else(|| Error::ActivitySource(format!("match {match_id} has no timestamps")))?;
        Ok(from_epoch_millis(millis))
    }

    fn name(&self) -> &'static str {
        "riot"
    }
}
