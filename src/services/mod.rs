// Service exports
pub mod backend;
pub mod cache;
pub mod notify;
pub mod postgres;

pub use backend::{BackendClient, BackendCollections, BackendError};
pub use cache::{CacheError, CacheKey, CacheManager, CacheStats};
pub use notify::NotificationClient;
pub use postgres::{PostgresClient, StatusValue, StoreError, VoteValue};
