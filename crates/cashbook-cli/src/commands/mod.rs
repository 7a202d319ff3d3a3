pub mod add;
pub mod clear;
pub mod common;
pub mod evict;
pub mod list;
pub mod status;
pub mod sync;
pub mod watch;
