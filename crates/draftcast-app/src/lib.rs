// Library root: re-exports all modules so integration tests and the binary
// share the same public API.

pub mod cli;
pub mod export;
pub mod output;
pub mod source;
pub mod summary;
