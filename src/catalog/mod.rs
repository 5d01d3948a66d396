//! Read-side access to games, storefront listings and price history.
//!
//! `query` renders declarative selections into SQL, `model` holds the response
//! shapes (snake_case in, camelCase out) and `repository` runs the queries.

pub mod model;
pub mod query;
pub mod repository;

pub use model::*;
pub use query::{GameFilter, GameQuery, GameSelection};
pub use repository::{GameRepository, Games};
