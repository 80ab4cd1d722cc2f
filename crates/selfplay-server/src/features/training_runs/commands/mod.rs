pub mod create;
pub mod promote;

pub use create::{CreateTrainingRunCommand, CreateTrainingRunError};
pub use promote::{promote, PromoteNetworkCommand, PromoteNetworkError};
