mod memory_cache_repository;
mod pg_cache_repository;
mod router;
mod traits;

pub use memory_cache_repository::MemoryCacheRepository;
pub use pg_cache_repository::{PgCacheRepository, Route, StoreOp};
pub use router::{ConnectionRouter, PgRouter};
pub use traits::CacheStore;
