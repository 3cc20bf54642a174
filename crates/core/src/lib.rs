pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod types;

pub use config::AppConfig;
pub use error::NegotiationError;
pub use request::{parse, RawOptions, Request};
pub use response::{error_map, reply_map, Response, ResponseBuilder};
pub use types::*;
