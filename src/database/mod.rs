// Database module
// SQLite storage for per-user request counters

pub mod sqlite;

pub use sqlite::*;
