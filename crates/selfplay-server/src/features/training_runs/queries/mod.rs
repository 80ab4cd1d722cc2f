pub mod get_active;

pub use get_active::{find_active, ActiveTrainingRun, GetActiveTrainingRunError};
