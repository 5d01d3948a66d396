//! Game price tracker: catalog reads with embedded listings and price history,
//! derived discount state, and a session bridge to the core API OAuth flow.

pub mod api;
pub mod catalog;
pub mod core_api;
pub mod error;
pub mod pricing;
pub mod session;
pub mod telemetry;

pub mod util {
    pub mod db;
    pub mod env;
}

pub use catalog::{GameRepository, Games};
pub use error::{DataError, DataResult};
