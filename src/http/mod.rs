//! HTTP client for fetching release archives.

mod client;
mod status;

pub use client::HttpClient;
pub use status::{HttpError, classify_error, classify_status};
