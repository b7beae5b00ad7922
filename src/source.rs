// 🌐 Source Client - fetch and parse the external data sources
// One GET per required source, fail-fast on any network or payload problem:
// a partial character set would silently corrupt the reconciliation join,
// so required fetches are never retried or papered over.

use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::time::Duration;

/// Source identity carried in SourceUnavailable errors
pub const CHARACTER_SOURCE: &str = "characters";
pub const BANNER_SOURCE: &str = "banner-dates";

const USER_AGENT: &str = concat!("banner-tracker/", env!("CARGO_PKG_VERSION"));

/// Character name -> ordered (start, end) date pairs, as served by the
/// secondary source
pub type BannerDateMap = HashMap<String, Vec<(String, String)>>;

/// One character record as served by the primary source, before filtering
#[derive(Debug, Clone, Deserialize)]
pub struct RawCharacter {
    pub name: String,

    /// Element tag; the source renamed this field across revisions,
    /// so both spellings are accepted.
    #[serde(default)]
    element: Option<String>,
    #[serde(default, rename = "elementText")]
    element_text: Option<String>,

    /// Rarity tier, normalized to a string. The source has served this as
    /// both a JSON string ("5") and a bare integer (5).
    #[serde(default, deserialize_with = "de_rarity")]
    pub rarity: Option<String>,

    /// Release-version label, e.g. "1.0"; absent for unreleased entries
    #[serde(default)]
    pub version: Option<String>,
}

impl RawCharacter {
    /// Element tag, preferring the original field spelling
    pub fn element(&self) -> &str {
        self.element
            .as_deref()
            .or(self.element_text.as_deref())
            .unwrap_or("")
    }

    /// Rarity as a normalized string ("" when absent)
    pub fn rarity_str(&self) -> &str {
        self.rarity.as_deref().unwrap_or("")
    }
}

/// Accept rarity as either a JSON string or a number
fn de_rarity<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;

    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "rarity must be a string or number, got {}",
            other
        ))),
    }
}

/// Per-character detail payload; only the icon path is of interest
#[derive(Debug, Deserialize)]
struct CharacterDetail {
    #[serde(default)]
    images: Option<DetailImages>,
}

#[derive(Debug, Deserialize)]
struct DetailImages {
    #[serde(default)]
    icon: Option<String>,
}

/// Parse the primary source payload: a JSON array of character objects
pub fn parse_characters(body: &str) -> Result<Vec<RawCharacter>> {
    serde_json::from_str(body).map_err(|e| TrackerError::source_unavailable(CHARACTER_SOURCE, e))
}

/// Parse the secondary source payload: a JSON object mapping character name
/// to an array of [start, end] date pairs
pub fn parse_banner_dates(body: &str) -> Result<BannerDateMap> {
    serde_json::from_str(body).map_err(|e| TrackerError::source_unavailable(BANNER_SOURCE, e))
}

/// Extract the icon URI from a detail payload; None when absent or malformed
fn parse_icon(body: &str) -> Option<String> {
    let detail: CharacterDetail = serde_json::from_str(body).ok()?;
    detail.images.and_then(|images| images.icon)
}

/// Blocking HTTP client over the two required sources plus the optional
/// per-character detail source
pub struct SourceClient {
    http: reqwest::blocking::Client,
    character_url: String,
    banner_url: String,
    detail_url: String,
}

impl SourceClient {
    pub fn new(config: &TrackerConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TrackerError::source_unavailable("http-client", e))?;

        Ok(SourceClient {
            http,
            character_url: config.character_url.clone(),
            banner_url: config.banner_url.clone(),
            detail_url: config.detail_url.clone(),
        })
    }

    /// Fetch the raw character records from the primary source.
    /// Fatal on any HTTP or payload failure.
    pub fn fetch_characters(&self) -> Result<Vec<RawCharacter>> {
        let body = self.get_text(CHARACTER_SOURCE, &self.character_url)?;
        parse_characters(&body)
    }

    /// Fetch the historical banner date map from the secondary source.
    /// Fatal on any HTTP or payload failure.
    pub fn fetch_banner_dates(&self) -> Result<BannerDateMap> {
        let body = self.get_text(BANNER_SOURCE, &self.banner_url)?;
        parse_banner_dates(&body)
    }

    /// Fetch the icon URI for one character. Non-fatal: any failure is
    /// logged and degrades to None, leaving the icon column empty.
    pub fn fetch_icon(&self, name: &str) -> Option<String> {
        match self.try_fetch_icon(name) {
            Ok(icon) => icon,
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        }
    }

    fn try_fetch_icon(&self, name: &str) -> Result<Option<String>> {
        let detail_failed = |cause: &dyn std::fmt::Display| TrackerError::DetailFetchFailed {
            name: name.to_string(),
            cause: cause.to_string(),
        };

        let response = self
            .http
            .get(&self.detail_url)
            .query(&[("query", name)])
            .send()
            .map_err(|e| detail_failed(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(detail_failed(&format!("HTTP status {}", status)));
        }

        let body = response.text().map_err(|e| detail_failed(&e))?;
        Ok(parse_icon(&body))
    }

    fn get_text(&self, source: &str, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| TrackerError::source_unavailable(source, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::source_unavailable(
                source,
                format!("HTTP status {}", status),
            ));
        }

        response
            .text()
            .map_err(|e| TrackerError::source_unavailable(source, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_characters_string_rarity() {
        let body = r#"[
            {"name": "Hu Tao", "element": "Pyro", "rarity": "5", "version": "1.3"},
            {"name": "Xingqiu", "element": "Hydro", "rarity": "4", "version": "1.0"}
        ]"#;

        let characters = parse_characters(body).unwrap();

        assert_eq!(characters.len(), 2);
        assert_eq!(characters[0].name, "Hu Tao");
        assert_eq!(characters[0].element(), "Pyro");
        assert_eq!(characters[0].rarity_str(), "5");
        assert_eq!(characters[0].version.as_deref(), Some("1.3"));
    }

    #[test]
    fn test_parse_characters_integer_rarity() {
        let body = r#"[{"name": "Nahida", "element": "Dendro", "rarity": 5, "version": "3.2"}]"#;

        let characters = parse_characters(body).unwrap();

        assert_eq!(characters[0].rarity_str(), "5");
    }

    #[test]
    fn test_parse_characters_element_text_revision() {
        // Later source revision renamed "element" to "elementText"
        let body = r#"[{"name": "Furina", "elementText": "Hydro", "rarity": "5", "version": "4.2"}]"#;

        let characters = parse_characters(body).unwrap();

        assert_eq!(characters[0].element(), "Hydro");
    }

    #[test]
    fn test_parse_characters_missing_version() {
        let body = r#"[{"name": "Upcoming", "element": "Cryo", "rarity": "5"}]"#;

        let characters = parse_characters(body).unwrap();

        assert_eq!(characters[0].version, None);
    }

    #[test]
    fn test_parse_characters_malformed_is_source_unavailable() {
        let err = parse_characters("{not json").unwrap_err();

        match err {
            TrackerError::SourceUnavailable { name, .. } => {
                assert_eq!(name, CHARACTER_SOURCE);
            }
            other => panic!("expected SourceUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_banner_dates() {
        let body = r#"{
            "Hu Tao": [["2021-03-02", "2021-03-23"], ["2021-11-02", "2021-11-23"]],
            "Nahida": [["2022-11-02", "2022-11-18"]]
        }"#;

        let map = parse_banner_dates(body).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map["Hu Tao"].len(), 2);
        assert_eq!(
            map["Hu Tao"][0],
            ("2021-03-02".to_string(), "2021-03-23".to_string())
        );
    }

    #[test]
    fn test_parse_banner_dates_malformed_is_source_unavailable() {
        let err = parse_banner_dates(r#"["not", "a", "map"]"#).unwrap_err();

        match err {
            TrackerError::SourceUnavailable { name, .. } => {
                assert_eq!(name, BANNER_SOURCE);
            }
            other => panic!("expected SourceUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_icon_fixed_path() {
        let body = r#"{"name": "Hu Tao", "images": {"icon": "https://cdn.example/hutao.png"}}"#;

        assert_eq!(
            parse_icon(body),
            Some("https://cdn.example/hutao.png".to_string())
        );
    }

    #[test]
    fn test_parse_icon_degrades_on_malformed_body() {
        assert_eq!(parse_icon("<html>error</html>"), None);
        assert_eq!(parse_icon(r#"{"name": "Hu Tao"}"#), None);
    }
}
