mod refresh_record_store_memory;

pub use refresh_record_store_memory::*;
