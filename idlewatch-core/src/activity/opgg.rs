use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use idlewatch_common::traits::ActivitySource;

use crate::http::HttpClient;
use crate::Error;

const DEFAULT_PROFILE_URL: &str = "https://www.op.gg/summoner/userName=";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

static RELATIVE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:(分|時間|日)前|(minute|hour|day)s?\s+ago)")
        .expect("relative time pattern is valid")
});

static GAME_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"class="[^"]*\bTime\b[^"]*"[^>]*>([^<]*)<"#).expect("game time pattern is valid")
});

/// Marker class of one row in the profile's match list.
const GAME_LIST_ITEM: &str = "GameListItem";

/// Scrapes the match list on an OP.GG profile page. The `Time` element of the
/// first `GameListItem` ("3時間前", "2 days ago") belongs to the most recent
/// game; relative times elsewhere on the page are ignored.
pub struct OpggActivitySource {
    http: Arc<dyn HttpClient>,
    profile_url: String,
}

impl OpggActivitySource {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self::with_profile_url(http, DEFAULT_PROFILE_URL)
    }

    /// `profile_url` is the prefix the url-encoded identity is appended to.
    pub fn with_profile_url(http: Arc<dyn HttpClient>, profile_url: impl Into<String>) -> Self {
        Self {
            http,
            profile_url: profile_url.into(),
        }
    }
}

/// Finds the first relative time expression in `text` and converts it to an
/// absolute timestamp relative to `now`.
pub fn parse_relative_time(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let caps = RELATIVE_TIME.captures(text)?;
    let value: i64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2).or_else(|| caps.get(3))?.as_str().to_ascii_lowercase();
    let delta = match unit.as_str() {
        "分" | "minute" => Duration::minutes(value),
        "時間" | "hour" => Duration::hours(value),
        "日" | "day" => Duration::days(value),
        _ => return None,
    };
    Some(now - delta)
}

/// Last game time from a profile page, or `None` when the match list is
/// empty or the first row carries no readable time.
pub fn parse_last_game_time(page: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let start = page.find(GAME_LIST_ITEM)?;
    let caps = GAME_TIME.captures(&page[start..])?;
    parse_relative_time(caps.get(1)?.as_str(), now)
}

#[async_trait]
impl ActivitySource for OpggActivitySource {
    async fn last_activity_of(&self, game_identity: &str) -> Result<Option<DateTime<Utc>>, Error> {
        let url = format!("{}{}", self.profile_url, urlencoding::encode(game_identity.trim()));
        let mut headers = HashMap::new();
        headers.insert("User-Agent".to_string(), USER_AGENT.to_string());

        let resp = self.http.get(url, headers).await?;
        if !resp.is_success() {
            return Err(Error::ActivitySource(format!("OP.GG returned status {}", resp.status)));
        }
        Ok(parse_last_game_time(&resp.body, Utc::now()))
    }

    fn name(&self) -> &'static str {
        "opgg"
    }
}
