pub mod schema;
pub mod store;
pub mod verdict_cache;

pub use store::Store;
pub use verdict_cache::VerdictCache;
