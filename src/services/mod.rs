//! Services layer for the London Travel site API.

pub mod metrics;
mod user_store;

pub use user_store::{PgUserStore, UserStore};
