pub mod cache_operations;
pub mod operation;

pub use cache_operations::EventCache;
pub use operation::CacheOperations;
