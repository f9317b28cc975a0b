pub mod cache;
pub mod memory;
pub mod redis;

pub use cache::{CacheKey, CacheStore, RecommendationCache};
pub use memory::{Clock, ManualClock, MemoryStore, SystemClock};
pub use self::redis::{create_redis_client, RedisStore};
