mod refresh_record_store_redis;

pub use refresh_record_store_redis::*;
