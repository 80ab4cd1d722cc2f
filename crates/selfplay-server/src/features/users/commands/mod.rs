pub mod upsert;

pub use upsert::{upsert, UpsertUserCommand, UpsertUserError, UserRecord};
