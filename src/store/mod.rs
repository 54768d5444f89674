pub mod player_database;
pub mod player_store;

pub use player_store::{JsonPlayerStore, PlayerStore, SharedPlayerStore};
