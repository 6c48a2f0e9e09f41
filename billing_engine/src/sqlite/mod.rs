//! SQLite backend for the billing engine.
//!
//! [`db`] holds the low-level queries; [`SqliteDatabase`] composes them into transactions and implements the backend
//! traits.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
