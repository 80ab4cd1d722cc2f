pub mod record_game;
pub mod upload;

pub use record_game::{RecordGameCommand, RecordGameError, RecordGameResponse};
pub use upload::{UploadNetworkCommand, UploadNetworkError};
