pub mod fetch_error;
pub mod http_fetcher;

pub use fetch_error::FetchError;
pub use http_fetcher::*;
