pub mod memory;
pub mod redis_cache;
pub mod traits;

pub use memory::MemoryCache;
pub use redis_cache::RedisCache;
pub use traits::{Cache, CacheError, CacheResult};
