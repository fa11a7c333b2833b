// Library root: re-exports all modules so integration tests and external
// consumers can access the crate's public API.

pub mod config;
pub mod db;
pub mod draft;
pub mod identity;
pub mod protocol;
pub mod relay;
pub mod session;
pub mod sync;
