pub mod aggregate;
pub mod backup;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod global;
pub mod http;
pub mod normalize;
pub mod resilience;
pub mod scraper;
pub mod stores;
pub mod types;
pub mod util;
