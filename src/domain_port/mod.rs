mod refresh_record_store;

pub use refresh_record_store::*;
