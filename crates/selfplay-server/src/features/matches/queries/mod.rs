pub mod open_match;
pub mod tally;

pub use open_match::{find_open, OpenMatch};
pub use tally::{tally, MatchTally, MatchTallyError, MatchTallyQuery};
