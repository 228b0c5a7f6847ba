//! Database initialization and schema

pub mod init;

pub use init::{init_database, init_in_memory, PERSONS_TABLE};
