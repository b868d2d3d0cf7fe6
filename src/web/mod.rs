mod cors;
mod error;
pub mod guard;
mod log;
pub mod midware;
pub mod routes;
pub mod serve;
pub mod types;

pub use cors::CorsPolicy;
pub use error::{ClientError, Error, WebResult};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
