mod client;
mod errors;
mod outcome;
mod user_agent;
pub use self::client::{parse_retry_after, Client, PageSource};
pub use self::errors::Error;
pub use self::outcome::FetchOutcome;
pub use self::user_agent::{get_user_agent, USER_AGENTS};
