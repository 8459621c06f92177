// SQLite persistence for tournament runs.

pub mod db;

pub use db::Database;
