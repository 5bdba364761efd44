pub mod aggregate;
pub mod listing;

pub use aggregate::{AggregateResult, Buckets, Category, PlatformBuckets};
pub use listing::{Discount, GameListing, Platform};
