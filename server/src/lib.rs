//! Payment settlement service for the booking marketplace.
//!
//! A verified gateway callback confirms a pending booking, commits its seats
//! on the slot's ledger entry and produces the fee split that is sent to the
//! buyer as a confirmation.

pub mod config;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod routes;
pub mod settlement;
pub mod state;
pub mod store;
pub mod utils;

pub use routes::{create_routes, HttpPolicy};
pub use state::AppState;
