pub mod allocate_game;
pub mod complete;
pub mod create;
pub mod record_result;

pub use allocate_game::{allocate, AllocatedGame};
pub use complete::{complete, CompleteMatchCommand, CompleteMatchError};
pub use create::{CreateMatchCommand, CreateMatchError};
pub use record_result::{
    RecordMatchResultCommand, RecordMatchResultError, RecordMatchResultResponse,
};
