// Library root: exposes the crawler's modules to the binary and to the
// integration tests.

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod output;
pub mod pipeline;
