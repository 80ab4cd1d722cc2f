//! Work dispatch for `POST /next_game`

pub mod commands;
pub mod routes;

pub use commands::NextGameError;
pub use routes::work_routes;
