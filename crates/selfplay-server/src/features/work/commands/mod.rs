pub mod next_game;

pub use next_game::NextGameError;
