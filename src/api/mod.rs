// HTTP surface over the game catalog and the core API OAuth flow

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{ApiServer, AppState, HttpSettings};
