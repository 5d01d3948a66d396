use async_trait::async_trait;
use itertools::Itertools;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::catalog::model::{
    GamePreviewResponse, GameResponse, GetGameResponse, GetGamesOptions, GetGamesResponse,
    GetPriceHistoryResponse,
};
use crate::catalog::query::{GameFilter, GameQuery, GameSelection};
use crate::error::{DataError, DataResult};
use crate::util::db::Db;

/// Read access to games, their storefront listings and price history.
///
/// Handlers and the CLI depend on this trait rather than on a pool so the store can
/// be swapped out (tests use an in-memory implementation).
#[async_trait]
pub trait GameRepository: Send + Sync {
    /// Catalog previews, restricted to `options.ids` when given.
    async fn get_games(&self, options: &GetGamesOptions) -> DataResult<GetGamesResponse>;

    /// Full detail of exactly one game.
    async fn get_game(&self, public_id: &str) -> DataResult<GetGameResponse>;

    /// Price intervals of every listing of one game, grouped by listing.
    async fn get_price_history(&self, public_id: &str) -> DataResult<GetPriceHistoryResponse>;

    /// Whether the backing store answers at all.
    async fn ping(&self) -> bool;
}

/// Postgres-backed [`GameRepository`].
#[derive(Clone)]
pub struct Games {
    db: Db,
}

impl Games {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    async fn fetch(&self, query: &GameQuery) -> DataResult<Vec<Value>> {
        let mut qb = query.build();
        let rows = qb
            .build_query_scalar::<Value>()
            .persistent(false)
            .fetch_all(&self.db.pool)
            .await?;
        debug!(rows = rows.len(), single = query.is_single(), "game query returned");
        Ok(rows)
    }
}

#[async_trait]
impl GameRepository for Games {
    #[instrument(skip(self))]
    async fn get_games(&self, options: &GetGamesOptions) -> DataResult<GetGamesResponse> {
        let query = GameQuery::new(GameSelection::Preview).filter(options.to_filter());
        let games = decode_rows::<GamePreviewResponse>("game", self.fetch(&query).await?)?;
        Ok(GetGamesResponse { games })
    }

    #[instrument(skip(self))]
    async fn get_game(&self, public_id: &str) -> DataResult<GetGameResponse> {
        let query = GameQuery::new(GameSelection::Detail)
            .filter(GameFilter::all().public_id(public_id))
            .single();
        let row = exactly_one("game", public_id, self.fetch(&query).await?)?;
        let game = decode_row::<GameResponse>("game", row)?;
        Ok(GetGameResponse { game })
    }

    #[instrument(skip(self))]
    async fn get_price_history(&self, public_id: &str) -> DataResult<GetPriceHistoryResponse> {
        let query = GameQuery::new(GameSelection::PriceHistory)
            .filter(GameFilter::all().public_id(public_id))
            .single();
        let row = exactly_one("game", public_id, self.fetch(&query).await?)?;
        decode_price_history(row)
    }

    async fn ping(&self) -> bool {
        self.db.ping().await
    }
}

impl GetGamesOptions {
    pub fn to_filter(&self) -> GameFilter {
        match &self.ids {
            Some(ids) => GameFilter::all().ids(ids.clone()),
            None => GameFilter::all(),
        }
    }
}

/// Assert a lookup matched exactly one row.
pub fn exactly_one<T>(entity: &'static str, key: &str, rows: Vec<T>) -> DataResult<T> {
    let matched = rows.len();
    rows.into_iter().exactly_one().map_err(|_| {
        if matched == 0 {
            DataError::NotFound {
                entity,
                key: key.to_string(),
            }
        } else {
            DataError::Ambiguous {
                entity,
                key: key.to_string(),
            }
        }
    })
}

/// Shape one raw snake_case row into its response type.
pub fn decode_row<T: DeserializeOwned>(entity: &'static str, row: Value) -> DataResult<T> {
    serde_json::from_value(row).map_err(|source| DataError::Decode { entity, source })
}

pub fn decode_rows<T: DeserializeOwned>(entity: &'static str, rows: Vec<Value>) -> DataResult<Vec<T>> {
    rows.into_iter().map(|row| decode_row(entity, row)).collect()
}

/// Decode a price-history row and put every listing's intervals in start order.
pub fn decode_price_history(row: Value) -> DataResult<GetPriceHistoryResponse> {
    let mut history = decode_row::<GetPriceHistoryResponse>("game", row)?;
    for catalog in &mut history.game_catalog {
        catalog.sort_chronologically();
    }
    Ok(history)
}
