//! Database layer for the offline queue

mod connection;
mod migrations;
mod queue_repository;

pub use connection::Database;
pub use migrations::CURRENT_VERSION;
pub use queue_repository::{LibSqlQueueRepository, QueueRepository};
