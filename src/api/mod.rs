pub mod rate_client;

pub use rate_client::{ErApiClient, RateFetcher};

#[cfg(test)]
pub use rate_client::MockRateFetcher;
