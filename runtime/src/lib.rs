//! Binary support for the pan/tilt tracker: command line options, logging,
//! the web console and the wiring between them.

pub mod app;
pub mod cli;
pub mod logger;
pub mod server;
