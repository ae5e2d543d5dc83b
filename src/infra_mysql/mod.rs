mod refresh_record_store_mysql;

pub use refresh_record_store_mysql::*;

mod util;
