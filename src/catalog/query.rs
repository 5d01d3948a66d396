// Declarative SELECT construction for the game tables.
//
// Each selection is a static tree of columns and embedded relations. It renders to
// a single `json_build_object(..)` expression per game row, with one-to-many
// relations folded in through correlated `json_agg` subqueries, so a lookup is
// always one round trip.

use std::fmt::Write;

use sqlx::{Postgres, QueryBuilder};

/// Part of a row projection.
#[derive(Debug)]
pub enum Projection {
    /// Stored column, emitted under its own name.
    Column(&'static str),
    /// Zero or one related row, embedded as an object or `null`.
    One(Relation),
    /// Related rows embedded as an array (`[]` when there are none).
    Many(Relation),
}

#[derive(Debug)]
pub struct Relation {
    /// Key the embedded value is emitted under.
    pub key: &'static str,
    pub table: &'static str,
    pub alias: &'static str,
    /// Column on `table` referencing the parent's `id`.
    pub foreign_key: &'static str,
    /// Sort column for `Many` relations. `One` relations are unique on the
    /// foreign key and are never sorted.
    pub order_by: Option<&'static str>,
    pub fields: &'static [Projection],
}

use Projection::{Column, Many, One};

const GAME_TABLE: &str = "game";
const GAME_ALIAS: &str = "g";

const CATALOG_PREVIEW_FIELDS: &[Projection] = &[
    Column("id"),
    Column("game_id"),
    Column("store"),
    Column("drm"),
    Column("regular_price"),
    Column("current_price"),
    Column("current_price_expire_at"),
    Column("lowest_price"),
];

const CATALOG_FIELDS: &[Projection] = &[
    Column("id"),
    Column("game_id"),
    Column("url"),
    Column("store"),
    Column("drm"),
    Column("regular_price"),
    Column("current_price"),
    Column("current_price_expire_at"),
    Column("lowest_price"),
    Column("lowest_price_updated_at"),
];

const PRICE_LOG_FIELDS: &[Projection] = &[
    Column("id"),
    Column("game_catalog_id"),
    Column("regular_price"),
    Column("current_price"),
    Column("start_at"),
    Column("end_at"),
];

const CATALOG_HISTORY_FIELDS: &[Projection] = &[
    Column("id"),
    Column("game_id"),
    Column("store"),
    Column("drm"),
    Many(Relation {
        key: "game_price_log",
        table: "game_price_log",
        alias: "gpl",
        foreign_key: "game_catalog_id",
        order_by: Some("start_at"),
        fields: PRICE_LOG_FIELDS,
    }),
];

const GAME_PREVIEW_FIELDS: &[Projection] = &[
    Column("id"),
    Column("public_id"),
    Column("title"),
    Column("title_ko"),
    Column("type"),
    Column("main_image"),
    Column("is_free"),
    Many(Relation {
        key: "game_catalog",
        table: "game_catalog",
        alias: "gc",
        foreign_key: "game_id",
        order_by: Some("id"),
        fields: CATALOG_PREVIEW_FIELDS,
    }),
];

const GAME_DETAIL_FIELDS: &[Projection] = &[
    Column("id"),
    Column("public_id"),
    Column("title"),
    Column("title_ko"),
    Column("type"),
    Column("release_year"),
    Column("release_month"),
    Column("release_day"),
    Column("main_image"),
    Column("is_free"),
    Column("description"),
    Column("summary"),
    Column("base_game_id"),
    Column("tags"),
    Column("screenshots"),
    Column("developers"),
    Column("publishers"),
    Column("created_at"),
    One(Relation {
        key: "meta_critic",
        table: "meta_critic",
        alias: "mc",
        foreign_key: "game_id",
        order_by: None,
        fields: &[
            Column("meta_score_url"),
            Column("meta_score"),
            Column("user_score_url"),
            Column("user_score"),
        ],
    }),
    One(Relation {
        key: "open_critic",
        table: "open_critic",
        alias: "oc",
        foreign_key: "game_id",
        order_by: None,
        fields: &[
            Column("url"),
            Column("tier"),
            Column("top_critic_score"),
            Column("percent_recommended"),
        ],
    }),
    One(Relation {
        key: "steam_score",
        table: "steam_score",
        alias: "ss",
        foreign_key: "game_id",
        order_by: None,
        fields: &[Column("url"), Column("total"), Column("positive")],
    }),
    Many(Relation {
        key: "game_catalog",
        table: "game_catalog",
        alias: "gc",
        foreign_key: "game_id",
        order_by: Some("id"),
        fields: CATALOG_FIELDS,
    }),
];

const GAME_HISTORY_FIELDS: &[Projection] = &[
    Column("id"),
    Column("public_id"),
    Many(Relation {
        key: "game_catalog",
        table: "game_catalog",
        alias: "gc",
        foreign_key: "game_id",
        order_by: Some("id"),
        fields: CATALOG_HISTORY_FIELDS,
    }),
];

/// Which shape of game row to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameSelection {
    Preview,
    Detail,
    PriceHistory,
}

impl GameSelection {
    fn fields(self) -> &'static [Projection] {
        match self {
            GameSelection::Preview => GAME_PREVIEW_FIELDS,
            GameSelection::Detail => GAME_DETAIL_FIELDS,
            GameSelection::PriceHistory => GAME_HISTORY_FIELDS,
        }
    }
}

/// Restrictions on the selected games. Build it first, then hand it to [`GameQuery`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameFilter {
    ids: Option<Vec<i64>>,
    public_id: Option<String>,
}

impl GameFilter {
    pub fn all() -> Self {
        Self::default()
    }

    /// Keep exactly these ids. An empty list matches nothing.
    pub fn ids(mut self, ids: Vec<i64>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn public_id(mut self, public_id: impl Into<String>) -> Self {
        self.public_id = Some(public_id.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct GameQuery {
    selection: GameSelection,
    filter: GameFilter,
    single: bool,
}

impl GameQuery {
    pub fn new(selection: GameSelection) -> Self {
        Self {
            selection,
            filter: GameFilter::all(),
            single: false,
        }
    }

    pub fn filter(mut self, filter: GameFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Expect one row. Fetches at most two so ambiguity can still be detected.
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    pub fn is_single(&self) -> bool {
        self.single
    }

    /// Render into a bound query yielding one JSON column named `payload`.
    pub fn build(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(render_object(GAME_ALIAS, self.selection.fields()));
        qb.push(format!(" AS payload FROM {GAME_TABLE} {GAME_ALIAS}"));

        let mut keyword = " WHERE ";
        if let Some(ids) = &self.filter.ids {
            qb.push(keyword)
                .push(format!("{GAME_ALIAS}.id = ANY("))
                .push_bind(ids.clone())
                .push(")");
            keyword = " AND ";
        }
        if let Some(public_id) = &self.filter.public_id {
            qb.push(keyword)
                .push(format!("{GAME_ALIAS}.public_id = "))
                .push_bind(public_id.clone());
        }

        qb.push(format!(" ORDER BY {GAME_ALIAS}.id"));
        if self.single {
            qb.push(" LIMIT 2");
        }
        qb
    }
}

/// `json_build_object('col', alias.col, ...)` for a projection list.
pub fn render_object(alias: &str, fields: &[Projection]) -> String {
    let mut out = String::from("json_build_object(");
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        match field {
            Column(column) => {
                let _ = write!(out, "'{column}', {alias}.{column}");
            }
            One(rel) => {
                let _ = write!(
                    out,
                    "'{key}', (SELECT {object} FROM {table} {ra} WHERE {ra}.{fk} = {alias}.id LIMIT 1)",
                    key = rel.key,
                    object = render_object(rel.alias, rel.fields),
                    table = rel.table,
                    ra = rel.alias,
                    fk = rel.foreign_key,
                );
            }
            Many(rel) => {
                let _ = write!(
                    out,
                    "'{key}', COALESCE((SELECT json_agg({object} ORDER BY {order}) FROM {table} {ra} WHERE {ra}.{fk} = {alias}.id), '[]'::json)",
                    key = rel.key,
                    object = render_object(rel.alias, rel.fields),
                    table = rel.table,
                    ra = rel.alias,
                    fk = rel.foreign_key,
                    order = order_clause(rel),
                );
            }
        }
    }
    out.push(')');
    out
}

// Ties on the sort column fall back to id so aggregation order is stable.
fn order_clause(rel: &Relation) -> String {
    match rel.order_by {
        None | Some("id") => format!("{}.id", rel.alias),
        Some(col) => format!("{ra}.{col}, {ra}.id", ra = rel.alias),
    }
}
