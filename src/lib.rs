//! votebot library
//!
//! Chat-command bot that opens reaction polls in a channel and tallies the
//! results when the poll is closed.

pub mod channels;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod polls;
pub mod server;
