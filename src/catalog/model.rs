// Response DTOs for the game catalog.
//
// Rows come out of Postgres as JSON objects keyed by the stored snake_case column
// names; the same structs serialize with camelCase keys for API consumers. The
// rename happens in the serde attributes, nothing is transformed by hand.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Storefront a catalog entry is listed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStore {
    Steam,
    Epic,
}

/// DRM platform tied to a listing. Kept apart from [`GameStore`] even though the
/// members currently coincide: a store can sell keys for another platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameDrm {
    Steam,
    Epic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Game,
    Dlc,
    Bundle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpenCriticTier {
    Mighty,
    Strong,
    Fair,
    Weak,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct MetaCriticResponse {
    pub meta_score_url: String,
    pub meta_score: Option<i32>,
    pub user_score_url: String,
    pub user_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct OpenCriticResponse {
    pub url: String,
    pub tier: Option<OpenCriticTier>,
    pub top_critic_score: Option<f64>,
    pub percent_recommended: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct SteamScoreResponse {
    pub url: String,
    pub total: Option<i64>,
    pub positive: Option<i64>,
}

/// Full storefront listing, as embedded in the game detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct GameCatalogResponse {
    pub id: i64,
    pub game_id: Option<i64>,
    pub url: String,
    pub store: GameStore,
    pub drm: GameDrm,
    pub regular_price: Option<i64>,
    pub current_price: Option<i64>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub current_price_expire_at: Option<DateTime<Utc>>,
    pub lowest_price: Option<i64>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub lowest_price_updated_at: Option<DateTime<Utc>>,
}

/// Listing subset shown on catalog pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct GameCatalogPreviewResponse {
    pub id: i64,
    pub game_id: Option<i64>,
    pub store: GameStore,
    pub drm: GameDrm,
    pub regular_price: Option<i64>,
    pub current_price: Option<i64>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub current_price_expire_at: Option<DateTime<Utc>>,
    pub lowest_price: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct GameResponse {
    pub id: i64,
    pub public_id: String,
    pub is_free: bool,
    pub title: Option<String>,
    pub title_ko: Option<String>,
    #[serde(rename = "type")]
    pub game_type: GameType,
    pub release_year: Option<i32>,
    pub release_month: Option<i32>,
    pub release_day: Option<i32>,
    pub main_image: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub base_game_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub screenshots: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub developers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub publishers: Vec<String>,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub meta_critic: Option<MetaCriticResponse>,
    pub open_critic: Option<OpenCriticResponse>,
    pub steam_score: Option<SteamScoreResponse>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub game_catalog: Vec<GameCatalogResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct GamePreviewResponse {
    pub id: i64,
    pub public_id: String,
    pub title: Option<String>,
    pub title_ko: Option<String>,
    #[serde(rename = "type")]
    pub game_type: GameType,
    pub main_image: Option<String>,
    pub is_free: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub game_catalog: Vec<GameCatalogPreviewResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetGamesResponse {
    pub games: Vec<GamePreviewResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetGameResponse {
    pub game: GameResponse,
}

/// One closed or open price interval of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct PriceHistoryRecordResponse {
    pub id: i64,
    pub game_catalog_id: Option<i64>,
    pub regular_price: i64,
    pub current_price: i64,
    #[serde(deserialize_with = "timestamp")]
    pub start_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub end_at: Option<DateTime<Utc>>,
}

/// A listing together with its price intervals, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct PriceHistoryCatalogResponse {
    pub id: i64,
    pub game_id: Option<i64>,
    pub store: GameStore,
    pub drm: GameDrm,
    #[serde(
        rename(serialize = "gamePriceHistory", deserialize = "game_price_log"),
        default,
        deserialize_with = "null_as_empty"
    )]
    pub game_price_history: Vec<PriceHistoryRecordResponse>,
}

impl PriceHistoryCatalogResponse {
    /// The interval that is still running (no `endAt`), if any.
    pub fn active_record(&self) -> Option<&PriceHistoryRecordResponse> {
        self.game_price_history
            .iter()
            .rev()
            .find(|record| record.end_at.is_none())
    }

    pub(crate) fn sort_chronologically(&mut self) {
        self.game_price_history
            .sort_by(|a, b| a.start_at.cmp(&b.start_at).then(a.id.cmp(&b.id)));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct GetPriceHistoryResponse {
    pub id: i64,
    pub public_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub game_catalog: Vec<PriceHistoryCatalogResponse>,
}

/// Typed request for the catalog listing. `ids: None` means every game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetGamesOptions {
    pub ids: Option<Vec<i64>>,
}

// `timestamptz` columns carry an offset; plain `timestamp` columns are read as UTC.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Ok(ts.with_timezone(&Utc)),
        Err(_) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .map(|naive| naive.and_utc()),
    }
}

fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_timestamp(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

// Postgres hands back NULL for empty arrays and missing aggregates.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
